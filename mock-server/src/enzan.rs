use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{authorize, AppState, MockError};

const WINDOWS: [&str; 4] = ["1h", "24h", "7d", "30d"];
const DIMENSIONS: [&str; 5] = ["project", "model", "team", "provider", "endpoint"];
const ALERT_TYPES: [&str; 4] = [
    "cost_threshold",
    "usage_spike",
    "idle_resource",
    "budget_exceeded",
];
const TIMESTAMP: &str = "2026-02-17T12:00:00Z";

/// Raw usage the summary endpoint aggregates, per 24h.
const USAGE: [(&str, &str, &str, &str, &str, f64, f64, u64); 3] = [
    ("core", "llama-3-70b", "platform", "aws", "/v1/akuma/query", 2.5, 1.25, 5),
    ("core", "mixtral-8x7b", "platform", "gcp", "/v1/sozo/generate", 1.0, 0.5, 3),
    ("research", "llama-3-70b", "ml", "aws", "/v1/akuma/explain", 4.0, 2.0, 8),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

fn default_window() -> String {
    "24h".to_string()
}

fn window_factor(window: &str) -> f64 {
    match window {
        "1h" => 1.0 / 24.0,
        "7d" => 7.0,
        "30d" => 30.0,
        _ => 1.0,
    }
}

pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SummaryBody>,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    if !WINDOWS.contains(&body.window.as_str()) {
        return Err(MockError::invalid(StatusCode::BAD_REQUEST, "window", "unsupported window"));
    }
    if let Some(bad) = body.group_by.iter().find(|d| !DIMENSIONS.contains(&d.as_str())) {
        return Err(MockError::invalid(
            StatusCode::BAD_REQUEST,
            "groupBy",
            format!("unknown dimension '{bad}'"),
        ));
    }

    let factor = window_factor(&body.window);
    let mut rows: Vec<Map<String, Value>> = Vec::new();
    for (project, model, team, provider, endpoint, cost, hours, requests) in USAGE {
        let dims = [
            ("project", project),
            ("model", model),
            ("team", team),
            ("provider", provider),
            ("endpoint", endpoint),
        ];
        let excluded = body.filters.iter().any(|(dimension, allowed)| {
            let value = dims
                .iter()
                .find(|(d, _)| *d == dimension.as_str())
                .map(|(_, v)| *v);
            let allowed = allowed.as_array().cloned().unwrap_or_default();
            value.is_some_and(|v| !allowed.iter().any(|a| a.as_str() == Some(v)))
        });
        if excluded {
            continue;
        }

        let key: Vec<(&str, &str)> = dims
            .iter()
            .filter(|(d, _)| body.group_by.iter().any(|g| g.as_str() == *d))
            .copied()
            .collect();
        let index = match rows.iter().position(|row| {
            key.iter()
                .all(|(d, v)| row.get(*d).and_then(Value::as_str) == Some(*v))
        }) {
            Some(index) => index,
            None => {
                let mut row = Map::new();
                for (d, v) in &key {
                    row.insert((*d).to_string(), json!(v));
                }
                for metric in ["cost_usd", "gpu_hours", "requests", "tokens_in", "tokens_out"] {
                    row.insert(metric.to_string(), json!(0));
                }
                rows.push(row);
                rows.len() - 1
            }
        };
        let row = &mut rows[index];
        add(row, "cost_usd", cost * factor);
        add(row, "gpu_hours", hours * factor);
        add(row, "requests", (requests as f64 * factor).round());
        add(row, "tokens_in", (requests * 100) as f64 * factor);
        add(row, "tokens_out", (requests * 40) as f64 * factor);
    }

    let total = |metric: &str| -> f64 {
        rows.iter()
            .filter_map(|r| r.get(metric).and_then(Value::as_f64))
            .sum()
    };
    let total_cost = total("cost_usd");
    let total_hours = total("gpu_hours");
    let total_requests = total("requests");

    Ok(Json(json!({
        "window": body.window,
        "startTime": "2026-02-17T00:00:00Z",
        "endTime": "2026-02-17T23:59:59Z",
        "rows": rows,
        "total": {
            "cost_usd": total_cost,
            "gpu_hours": total_hours,
            "requests": total_requests as u64,
        },
        "apiCosts": {
            "totalCostUsd": 0.42,
            "promptTokens": 1000,
            "outputTokens": 200,
            "queries": 5,
        },
    })))
}

fn add(row: &mut Map<String, Value>, metric: &str, amount: f64) {
    let current = row.get(metric).and_then(Value::as_f64).unwrap_or(0.0);
    let next = current + amount;
    let value = if matches!(metric, "requests" | "tokens_in" | "tokens_out") {
        json!(next.round() as u64)
    } else {
        json!(next)
    };
    row.insert(metric.to_string(), value);
}

pub async fn burn(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    let resources = state.resources.read().await;
    let rate: f64 = resources
        .iter()
        .filter_map(|r| r.get("hourlyRate").and_then(Value::as_f64))
        .sum();
    Ok(Json(json!({"burn_rate_usd_per_hour": rate, "timestamp": TIMESTAMP})))
}

fn require_fields(body: &Value, fields: &[&'static str]) -> Result<(), MockError> {
    for field in fields {
        let present = match body.get(*field) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if !present {
            return Err(MockError::invalid(
                StatusCode::UNPROCESSABLE_ENTITY,
                field,
                format!("{field} is required"),
            ));
        }
    }
    Ok(())
}

/// Insert or replace by `id`.
async fn upsert(store: &tokio::sync::RwLock<Vec<Value>>, record: Value) {
    let mut records = store.write().await;
    match records.iter_mut().find(|r| r.get("id") == record.get("id")) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

pub async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    let resources = state.resources.read().await;
    Ok(Json(json!({"resources": *resources})))
}

pub async fn register_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    authorize(&state, &headers)?;
    require_fields(&body, &["id", "provider", "gpuType", "gpuCount", "hourlyRate"])?;
    let id = body["id"].clone();
    upsert(&state.resources, body).await;
    Ok((StatusCode::CREATED, Json(json!({"id": id, "status": "registered"}))))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    let alerts = state.alerts.read().await;
    Ok(Json(json!({"alerts": *alerts})))
}

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    authorize(&state, &headers)?;
    require_fields(&body, &["id", "name", "type", "threshold", "window"])?;
    if !body["type"].as_str().is_some_and(|t| ALERT_TYPES.contains(&t)) {
        return Err(MockError::invalid(
            StatusCode::UNPROCESSABLE_ENTITY,
            "type",
            "unknown alert type",
        ));
    }
    let id = body["id"].clone();
    upsert(&state.alerts, body).await;
    Ok((StatusCode::CREATED, Json(json!({"id": id, "status": "created"}))))
}
