//! Tabular exports of a [`GeneratedDataset`].
//!
//! CSV and JSON Lines are always available and purely in-memory. Arrow
//! export needs the `dataframe` feature; without it the call fails with
//! [`ExportError::FeatureUnavailable`] instead of failing to compile, so
//! code can probe for the capability at run time.

use serde_json::Value;
use thiserror::Error;

use crate::types::sozo::GeneratedDataset;

/// Errors from dataset exports. Separate from `KaizenError`: exports never
/// touch the network.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("optional feature `{feature}` is not enabled in this build")]
    FeatureUnavailable { feature: &'static str },

    #[error("dataframe conversion failed: {0}")]
    Dataframe(String),
}

/// Arrow record batch produced by [`GeneratedDataset::to_dataframe`].
#[cfg(feature = "dataframe")]
pub type DataFrame = arrow::record_batch::RecordBatch;

/// Placeholder for the Arrow record batch; uninhabited without the
/// `dataframe` feature.
#[cfg(not(feature = "dataframe"))]
#[derive(Debug)]
pub enum DataFrame {}

impl GeneratedDataset {
    /// CSV with a header row in `columns` order. Missing and null values are
    /// empty; fields containing a comma, quote or line break are quoted.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.len() + 1);
        lines.push(
            self.columns()
                .iter()
                .map(|c| escape_csv(c))
                .collect::<Vec<_>>()
                .join(","),
        );
        for row in self.rows() {
            let line = self
                .columns()
                .iter()
                .map(|column| escape_csv(&render_cell(row.get(column))))
                .collect::<Vec<_>>()
                .join(",");
            lines.push(line);
        }
        lines.join("\n")
    }

    /// One JSON object per line.
    pub fn to_jsonl(&self) -> String {
        self.rows()
            .iter()
            .map(|row| Value::Object(row.clone()).to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Arrow record batch with one column per dataset column.
    pub fn to_dataframe(&self) -> Result<DataFrame, ExportError> {
        #[cfg(feature = "dataframe")]
        {
            arrow_export::to_record_batch(self)
        }
        #[cfg(not(feature = "dataframe"))]
        {
            Err(ExportError::FeatureUnavailable {
                feature: "dataframe",
            })
        }
    }
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_csv(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(feature = "dataframe")]
mod arrow_export {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::{RecordBatch, RecordBatchOptions};
    use serde_json::Value;

    use super::{render_cell, ExportError};
    use crate::types::sozo::GeneratedDataset;

    /// Narrowest Arrow type that holds every non-null value of a column.
    fn infer(dataset: &GeneratedDataset, column: &str) -> DataType {
        let mut values = dataset
            .rows()
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null())
            .peekable();
        if values.peek().is_none() {
            return DataType::Utf8;
        }
        let (mut all_bool, mut all_int, mut all_num) = (true, true, true);
        for value in values {
            all_bool &= value.is_boolean();
            all_int &= value.is_i64();
            all_num &= value.is_number();
        }
        if all_bool {
            DataType::Boolean
        } else if all_int {
            DataType::Int64
        } else if all_num {
            DataType::Float64
        } else {
            DataType::Utf8
        }
    }

    pub(super) fn to_record_batch(dataset: &GeneratedDataset) -> Result<RecordBatch, ExportError> {
        let mut fields = Vec::with_capacity(dataset.columns().len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(dataset.columns().len());

        for column in dataset.columns() {
            let data_type = infer(dataset, column);
            let cells = dataset.rows().iter().map(|row| row.get(column).filter(|v| !v.is_null()));
            let array: ArrayRef = match data_type {
                DataType::Boolean => {
                    let mut builder = BooleanBuilder::new();
                    cells.for_each(|v| builder.append_option(v.and_then(Value::as_bool)));
                    Arc::new(builder.finish())
                }
                DataType::Int64 => {
                    let mut builder = Int64Builder::new();
                    cells.for_each(|v| builder.append_option(v.and_then(Value::as_i64)));
                    Arc::new(builder.finish())
                }
                DataType::Float64 => {
                    let mut builder = Float64Builder::new();
                    cells.for_each(|v| builder.append_option(v.and_then(Value::as_f64)));
                    Arc::new(builder.finish())
                }
                _ => {
                    let mut builder = StringBuilder::new();
                    cells.for_each(|v| match v {
                        Some(value) => builder.append_value(render_cell(Some(value))),
                        None => builder.append_null(),
                    });
                    Arc::new(builder.finish())
                }
            };
            fields.push(Field::new(column, data_type, true));
            arrays.push(array);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(dataset.len()));
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
            .map_err(|e| ExportError::Dataframe(e.to_string()))
    }
}
