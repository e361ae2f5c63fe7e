//! Sōzō (synthetic data) types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use serde_json::Value;

use super::{lenient, Row};
use crate::error::{KaizenError, Result};

wire_enum! {
    /// Direction of a correlation between two generated columns.
    Correlation, field = "correlations" {
        Positive => "positive",
        Negative => "negative",
    }
}

/// Parameters of `POST /v1/sozo/generate`.
///
/// Either a built-in `schema_name` or an inline `schema` must be given. Inline
/// type specs (e.g. `"float:0-500"`, `"choice:free,pro"`) are interpreted by
/// the server; locally they are only checked for being non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub records: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub correlations: BTreeMap<String, Correlation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerateRequest {
    pub fn new(records: i64) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Use one of the server's predefined schemas.
    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    /// Replace the inline schema.
    pub fn schema<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.schema = Some(
            fields
                .into_iter()
                .map(|(name, spec)| (name.into(), spec.into()))
                .collect(),
        );
        self
    }

    /// Add one field to the inline schema.
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.schema
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), spec.into());
        self
    }

    /// Correlate two columns; `pair` is `"left:right"`.
    pub fn correlation(mut self, pair: impl Into<String>, direction: Correlation) -> Self {
        self.correlations.insert(pair.into(), direction);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let has_inline = self.schema.as_ref().is_some_and(|s| !s.is_empty());
        let has_named = self.schema_name.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_inline && !has_named {
            return Err(KaizenError::validation(
                "schema",
                "either schema or schema_name is required",
            ));
        }
        if self.records <= 0 {
            return Err(KaizenError::validation("records", "must be a positive integer"));
        }
        if let Some(schema) = &self.schema {
            for (name, spec) in schema {
                if name.trim().is_empty() {
                    return Err(KaizenError::validation("schema", "field names must not be empty"));
                }
                if spec.trim().is_empty() {
                    return Err(KaizenError::validation(
                        format!("schema.{name}"),
                        "type spec must not be empty",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Summary statistics the server computes per generated column.
///
/// Every member is optional and parsed leniently: a value of an unexpected
/// type is dropped rather than failing the whole dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnStats {
    #[serde(rename = "type", deserialize_with = "lenient::type_name")]
    pub column_type: String,
    /// Lower bound. Numeric for number columns; date and other ordered
    /// columns may report a string.
    #[serde(deserialize_with = "lenient::opt_scalar")]
    pub min: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_scalar")]
    pub max: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub mean: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_count")]
    pub unique_count: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_counts")]
    pub values: Option<BTreeMap<String, u64>>,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            column_type: "unknown".to_string(),
            min: None,
            max: None,
            mean: None,
            unique_count: None,
            values: None,
        }
    }
}

/// A generated table. Read-only; exports derive new values from it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct GeneratedDataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    stats: BTreeMap<String, ColumnStats>,
}

impl GeneratedDataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>, stats: BTreeMap<String, ColumnStats>) -> Self {
        Self {
            columns,
            rows,
            stats,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn stats(&self) -> &BTreeMap<String, ColumnStats> {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A predefined schema: column name to type spec.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SchemaList {
    pub schemas: Vec<SchemaInfo>,
}
