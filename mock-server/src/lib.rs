//! In-process stub of the Kaizen API.
//!
//! Answers every endpoint the client uses with deterministic data: the same
//! request (and, for generation, the same seed) always yields the same
//! response. Requests must carry `Authorization: Bearer <api_key>`; an
//! optional request budget makes the server answer 429 once exhausted.

mod akuma;
mod enzan;
mod sozo;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub use sozo::BUILTIN_SCHEMAS;

pub const TEST_API_KEY: &str = "test-key";

/// Behaviour knobs for a stub instance.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub api_key: String,
    /// Authenticated requests allowed before every further one gets 429.
    pub request_budget: Option<usize>,
    /// `Retry-After` value sent with 429 responses.
    pub retry_after: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: TEST_API_KEY.to_string(),
            request_budget: None,
            retry_after: 12,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    config: Arc<MockConfig>,
    requests: Arc<AtomicUsize>,
    pub(crate) resources: Arc<RwLock<Vec<Value>>>,
    pub(crate) alerts: Arc<RwLock<Vec<Value>>>,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        requests: Arc::new(AtomicUsize::new(0)),
        resources: Arc::new(RwLock::new(Vec::new())),
        alerts: Arc::new(RwLock::new(Vec::new())),
    };
    Router::new()
        .route("/health", get(health))
        .route("/v1/akuma/query", post(akuma::query))
        .route("/v1/akuma/explain", post(akuma::explain))
        .route("/v1/akuma/schema", post(akuma::upload_schema))
        .route("/v1/enzan/summary", post(enzan::summary))
        .route("/v1/enzan/burn", get(enzan::burn))
        .route(
            "/v1/enzan/resources",
            get(enzan::list_resources).post(enzan::register_resource),
        )
        .route(
            "/v1/enzan/alerts",
            get(enzan::list_alerts).post(enzan::create_alert),
        )
        .route("/v1/sozo/generate", post(sozo::generate))
        .route("/v1/sozo/schemas", get(sozo::list_schemas))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Error response in the shape the real API uses.
#[derive(Debug)]
pub(crate) struct MockError {
    status: StatusCode,
    message: String,
    field: Option<&'static str>,
    retry_after: Option<u64>,
}

impl MockError {
    pub(crate) fn invalid(
        status: StatusCode,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            field: Some(field),
            retry_after: None,
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid or missing API key".to_string(),
            field: None,
            retry_after: None,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let mut body = json!({"error": self.message});
        if let Some(field) = self.field {
            body["field"] = json!(field);
        }
        if let Some(secs) = self.retry_after {
            body["retry_after"] = json!(secs);
        }
        let mut response = (self.status, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert("x-request-id", HeaderValue::from_static("mock-request"));
        if let Some(secs) = self.retry_after {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Check the bearer token and the request budget.
pub(crate) fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), MockError> {
    let expected = format!("Bearer {}", state.config.api_key);
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected.as_str()) {
        tracing::debug!("rejecting request with bad credentials");
        return Err(MockError::unauthorized());
    }

    let seen = state.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(budget) = state.config.request_budget {
        if seen >= budget {
            return Err(MockError {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Rate limit exceeded".to_string(),
                field: None,
                retry_after: Some(state.config.retry_after),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(budget: Option<usize>) -> AppState {
        AppState {
            config: Arc::new(MockConfig {
                request_budget: budget,
                ..MockConfig::default()
            }),
            requests: Arc::new(AtomicUsize::new(0)),
            resources: Arc::new(RwLock::new(Vec::new())),
            alerts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn authorize_accepts_configured_key() {
        assert!(authorize(&state(None), &bearer(TEST_API_KEY)).is_ok());
    }

    #[test]
    fn authorize_rejects_wrong_or_missing_key() {
        let state = state(None);
        let err = authorize(&state, &bearer("nope")).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        let err = authorize(&state, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn budget_exhaustion_yields_429() {
        let state = state(Some(1));
        assert!(authorize(&state, &bearer(TEST_API_KEY)).is_ok());
        let err = authorize(&state, &bearer(TEST_API_KEY)).unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after, Some(12));
    }

    #[test]
    fn error_body_includes_field() {
        let err = MockError::invalid(StatusCode::UNPROCESSABLE_ENTITY, "dialect", "unsupported");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()["x-request-id"], "mock-request");
    }
}
