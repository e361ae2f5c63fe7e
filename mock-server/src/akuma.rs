use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{authorize, AppState, MockError};

const DIALECTS: [&str; 4] = ["postgres", "mysql", "snowflake", "bigquery"];
const MODES: [&str; 3] = ["sql-only", "sql-and-results", "explain"];
const DEFAULT_TABLE: &str = "events";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    pub dialect: String,
    pub prompt: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub max_rows: Option<u64>,
    pub guardrails: Option<Value>,
    pub schema: Option<Value>,
}

fn default_mode() -> String {
    "sql-only".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExplainBody {
    pub sql: String,
    pub schema: Option<Value>,
}

fn schema_tables(schema: Option<&Value>) -> Vec<String> {
    schema
        .and_then(|s| s.get("tables"))
        .and_then(Value::as_array)
        .map(|tables| {
            tables
                .iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn quote_identifier(dialect: &str, name: &str) -> String {
    match dialect {
        "mysql" | "bigquery" => format!("`{name}`"),
        _ => format!("\"{name}\""),
    }
}

pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<QueryBody>,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    if !DIALECTS.contains(&body.dialect.as_str()) {
        return Err(MockError::invalid(
            StatusCode::UNPROCESSABLE_ENTITY,
            "dialect",
            format!("unsupported dialect '{}'", body.dialect),
        ));
    }
    if !MODES.contains(&body.mode.as_str()) {
        return Err(MockError::invalid(
            StatusCode::UNPROCESSABLE_ENTITY,
            "mode",
            format!("unsupported mode '{}'", body.mode),
        ));
    }
    if body.prompt.trim().is_empty() {
        return Err(MockError::invalid(StatusCode::BAD_REQUEST, "prompt", "prompt is empty"));
    }

    let tables = schema_tables(body.schema.as_ref());
    let table = tables.first().map(String::as_str).unwrap_or(DEFAULT_TABLE);
    let guardrail_limit = body
        .guardrails
        .as_ref()
        .and_then(|g| g.get("maxRows"))
        .and_then(Value::as_u64);
    let limit = match (body.max_rows, guardrail_limit) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b).unwrap_or(3),
    };

    let sql = format!(
        "SELECT * FROM {} LIMIT {limit};",
        quote_identifier(&body.dialect, table)
    );
    // Rows are returned regardless of mode; the client decides what to keep.
    let rows: Vec<Value> = (1..=limit.min(3)).map(|n| json!({"row": n, "table": table})).collect();
    let mut response = json!({
        "sql": sql,
        "rows": rows,
        "tables": [table],
        "warnings": [],
        "dialect": body.dialect,
    });
    if body.mode == "explain" {
        response["explanation"] = json!(format!("Reads up to {limit} rows from {table}."));
    }
    Ok(Json(response))
}

pub async fn explain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ExplainBody>,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    if body.sql.trim().is_empty() {
        return Err(MockError::invalid(StatusCode::BAD_REQUEST, "sql", "sql is empty"));
    }
    let known = schema_tables(body.schema.as_ref());
    let explanation = if known.is_empty() {
        "Runs the statement without schema context.".to_string()
    } else {
        format!("Runs the statement against {}.", known.join(", "))
    };
    Ok(Json(json!({"sql": body.sql, "explanation": explanation})))
}

pub async fn upload_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    let tables = schema_tables(Some(&body));
    Ok(Json(json!({"status": "ok", "tables": tables.len()})))
}
