//! Akuma (natural language to SQL) types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{require, Row};
use crate::error::{KaizenError, Result};

wire_enum! {
    /// SQL dialect the generated query targets.
    Dialect, field = "dialect" {
        Postgres => "postgres",
        Mysql => "mysql",
        Snowflake => "snowflake",
        Bigquery => "bigquery",
    }
}

wire_enum! {
    /// What the server should return alongside the SQL.
    QueryMode, field = "mode" {
        SqlOnly => "sql-only",
        SqlAndResults => "sql-and-results",
        Explain => "explain",
    }
}

impl QueryMode {
    /// Whether result rows are part of the contract for this mode.
    pub fn includes_results(self) -> bool {
        matches!(self, QueryMode::SqlAndResults)
    }
}

impl Default for QueryMode {
    fn default() -> Self {
        QueryMode::SqlOnly
    }
}

/// Constraints the server enforces on a generated query.
///
/// Forwarded as-is; nothing here is checked locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardrails {
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allow_tables: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny_tables: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny_columns: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u32>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            read_only: true,
            allow_tables: BTreeSet::new(),
            deny_tables: BTreeSet::new(),
            deny_columns: BTreeSet::new(),
            max_rows: None,
            timeout_secs: None,
        }
    }
}

impl Guardrails {
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn allow_table(mut self, table: impl Into<String>) -> Self {
        self.allow_tables.insert(table.into());
        self
    }

    pub fn deny_table(mut self, table: impl Into<String>) -> Self {
        self.deny_tables.insert(table.into());
        self
    }

    pub fn deny_column(mut self, column: impl Into<String>) -> Self {
        self.deny_columns.insert(column.into());
        self
    }

    pub fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
            description: String::new(),
            examples: Vec::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }
}

/// Database schema sent as context with queries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self {
            version: None,
            tables,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, table) in self.tables.iter().enumerate() {
            require(&format!("tables[{i}].name"), &table.name)?;
            for (j, column) in table.columns.iter().enumerate() {
                require(&format!("tables[{i}].columns[{j}].name"), &column.name)?;
            }
        }
        Ok(())
    }
}

/// Parameters of an Akuma query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub dialect: Dialect,
    pub prompt: String,
    pub mode: QueryMode,
    pub max_rows: Option<u32>,
    pub guardrails: Option<Guardrails>,
}

impl QueryRequest {
    pub fn new(dialect: Dialect, prompt: impl Into<String>) -> Self {
        Self {
            dialect,
            prompt: prompt.into(),
            mode: QueryMode::default(),
            max_rows: None,
            guardrails: None,
        }
    }

    /// Build from untyped strings, failing locally on an unknown dialect or mode.
    pub fn parse(dialect: &str, prompt: impl Into<String>, mode: &str) -> Result<Self> {
        Ok(Self::new(dialect.parse()?, prompt).mode(mode.parse()?))
    }

    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn guardrails(mut self, guardrails: Guardrails) -> Self {
        self.guardrails = Some(guardrails);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require("prompt", &self.prompt)?;
        if self.max_rows == Some(0) {
            return Err(KaizenError::validation("max_rows", "must be positive"));
        }
        Ok(())
    }
}

/// Wire body of `POST /v1/akuma/query`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryBody<'a> {
    pub dialect: Dialect,
    pub prompt: &'a str,
    pub mode: QueryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<&'a Guardrails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a SchemaDescriptor>,
}

/// Wire body of `POST /v1/akuma/explain`.
#[derive(Debug, Serialize)]
pub(crate) struct ExplainBody<'a> {
    pub sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a SchemaDescriptor>,
}

/// Result of a query. `rows` is only ever set in `sql-and-results` mode.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct QueryResult {
    pub sql: String,
    pub rows: Option<Vec<Row>>,
    pub explanation: Option<String>,
    pub tables: Option<Vec<String>>,
    pub warnings: Option<Vec<String>>,
    /// Error reported inside a successful response, e.g. a guardrail refusal.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ExplainResult {
    pub sql: String,
    pub explanation: String,
}

/// Server acknowledgement of an uploaded schema.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SchemaAck {
    pub status: String,
    pub tables: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guardrails_serialize_only_set_members() {
        let guardrails = Guardrails::default().allow_table("users").max_rows(100);
        assert_eq!(
            serde_json::to_value(&guardrails).unwrap(),
            json!({"readOnly": true, "allowTables": ["users"], "maxRows": 100})
        );
    }

    #[test]
    fn dialect_and_mode_parse_wire_names() {
        assert_eq!("bigquery".parse::<Dialect>().unwrap(), Dialect::Bigquery);
        assert_eq!("sql-and-results".parse::<QueryMode>().unwrap(), QueryMode::SqlAndResults);
        assert_eq!(QueryMode::Explain.to_string(), "explain");
    }

    #[test]
    fn unknown_dialect_names_the_field() {
        let err = "oracle".parse::<Dialect>().unwrap_err();
        match err {
            KaizenError::Validation { field, message, .. } => {
                assert_eq!(field.as_deref(), Some("dialect"));
                assert!(message.contains("postgres, mysql, snowflake, bigquery"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn table_serializes_camel_case_keys() {
        let table = TableDescriptor::new("orders")
            .column(ColumnDescriptor::new("id", "uuid"))
            .column(ColumnDescriptor::new("user_id", "uuid").example("u-1"))
            .primary_key(["id"])
            .foreign_key(ForeignKey {
                columns: vec!["user_id".to_string()],
                ref_table: "users".to_string(),
                ref_columns: vec!["id".to_string()],
            });
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["primaryKey"], json!(["id"]));
        assert_eq!(value["foreignKeys"][0]["refTable"], "users");
        assert_eq!(value["columns"][0]["type"], "uuid");
        assert!(value["columns"][0].get("examples").is_none());
        assert_eq!(value["columns"][1]["examples"], json!(["u-1"]));
    }

    #[test]
    fn query_result_ignores_unknown_fields() {
        let result: QueryResult =
            serde_json::from_value(json!({"sql": "select 1", "latencyMs": 12})).unwrap();
        assert_eq!(result.sql, "select 1");
        assert!(result.rows.is_none());
    }
}
