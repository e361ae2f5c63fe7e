//! The client core: configuration, request construction, and the single
//! request path every facade goes through.
//!
//! # Design
//! `KaizenClient` owns one `ClientCore` behind an `Arc` and one instance of
//! each facade. Facades never see the transport; they call
//! [`ClientCore::get`] / [`ClientCore::post`], which build the request,
//! attach credentials, execute it, and classify the response.
//!
//! The API key is checked when a request is built, not when the client is
//! constructed, so `KaizenClient::new()` always succeeds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::classify::classify;
use crate::config::{ClientConfig, ClientOptions, API_KEY_ENV};
use crate::error::{KaizenError, Result};
use crate::facade::{AkumaClient, EnzanClient, SozoClient};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};

pub const USER_AGENT: &str = concat!("kaizen-rust/", env!("CARGO_PKG_VERSION"));
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-client-request-id";

/// Client for the Kaizen API.
///
/// Configuration is fixed at construction. Facades are reached through
/// [`akuma`](Self::akuma), [`enzan`](Self::enzan) and [`sozo`](Self::sozo).
pub struct KaizenClient {
    core: Arc<ClientCore>,
    akuma: AkumaClient,
    enzan: EnzanClient,
    sozo: SozoClient,
}

impl KaizenClient {
    /// Client configured entirely from the environment and defaults.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> KaizenClientBuilder {
        KaizenClientBuilder::default()
    }

    /// Client for an already-resolved configuration, using the `ureq` transport.
    pub fn with_config(config: ClientConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(config.timeout()));
        Self::with_transport(config, transport)
    }

    /// Client for an already-resolved configuration and a caller-provided transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let core = Arc::new(ClientCore { config, transport });
        Self {
            akuma: AkumaClient::new(Arc::clone(&core)),
            enzan: EnzanClient::new(Arc::clone(&core)),
            sozo: SozoClient::new(Arc::clone(&core)),
            core,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.core.config
    }

    /// NL-to-SQL facade.
    pub fn akuma(&self) -> &AkumaClient {
        &self.akuma
    }

    /// GPU cost facade.
    pub fn enzan(&self) -> &EnzanClient {
        &self.enzan
    }

    /// Synthetic data facade.
    pub fn sozo(&self) -> &SozoClient {
        &self.sozo
    }

    /// `GET /health`. Does not require an API key.
    pub fn health(&self) -> Result<Map<String, Value>> {
        self.core
            .perform(HttpMethod::Get, "/health", None, Credentials::Optional)
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.core.transport)
    }
}

impl Default for KaizenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KaizenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaizenClient")
            .field("config", &self.core.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`KaizenClient`]. Unset values fall back to the environment.
#[derive(Default)]
pub struct KaizenClientBuilder {
    options: ClientOptions,
    transport: Option<Arc<dyn Transport>>,
}

impl KaizenClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.options.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Replace the default `ureq` transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> KaizenClient {
        let config = ClientConfig::resolve(self.options);
        match self.transport {
            Some(transport) => KaizenClient::with_transport(config, transport),
            None => KaizenClient::with_config(config),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Credentials {
    Required,
    Optional,
}

/// Shared request path used by every facade.
pub(crate) struct ClientCore {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl ClientCore {
    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.perform(HttpMethod::Get, path, None, Credentials::Required)?;
        decode(body)
    }

    pub(crate) fn post<B, T>(&self, path: &str, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let encoded =
            serde_json::to_string(payload).map_err(|e| KaizenError::Serialization(e.to_string()))?;
        let body = self.perform(HttpMethod::Post, path, Some(encoded), Credentials::Required)?;
        decode(body)
    }

    /// Build, execute and classify one request.
    pub(crate) fn perform(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        credentials: Credentials,
    ) -> Result<Map<String, Value>> {
        let request = self.build_request(method, path, body, credentials)?;
        tracing::debug!(method = method.as_str(), url = %request.url, "sending request");

        let started = Instant::now();
        let response = self.transport.execute(&request).map_err(|err| {
            tracing::warn!(
                method = method.as_str(),
                url = %request.url,
                error = %err,
                "transport failure"
            );
            KaizenError::Transport(err)
        })?;
        tracing::debug!(
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );

        classify(&response)
    }

    pub(crate) fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        credentials: Credentials,
    ) -> Result<HttpRequest> {
        let mut headers = vec![
            ("user-agent".to_string(), USER_AGENT.to_string()),
            (CLIENT_REQUEST_ID_HEADER.to_string(), Uuid::new_v4().to_string()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        match (self.config.api_key(), credentials) {
            (Some(key), _) => headers.push(("authorization".to_string(), format!("Bearer {key}"))),
            (None, Credentials::Optional) => {}
            (None, Credentials::Required) => {
                return Err(KaizenError::Configuration(format!(
                    "no API key configured; pass one explicitly or set {API_KEY_ENV}"
                )))
            }
        }

        Ok(HttpRequest {
            method,
            url: format!("{}{}", self.config.base_url(), path),
            headers,
            body,
        })
    }
}

fn decode<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| KaizenError::Deserialization(e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn construction_without_key_succeeds() {
        let (client, stub) = client_with(None);
        assert!(client.config().api_key().is_none());
        assert!(stub.sent().is_empty());
    }

    #[test]
    fn missing_key_fails_at_call_time_without_network() {
        let (client, stub) = client_with(None);
        let err = client.enzan().burn().unwrap_err();
        assert!(matches!(err, KaizenError::Configuration(_)));
        assert!(stub.sent().is_empty());
    }

    #[test]
    fn health_does_not_need_a_key() {
        let (client, stub) = client_with(None);
        stub.respond(200, r#"{"status":"ok"}"#);
        let health = client.health().unwrap();
        assert_eq!(health["status"], "ok");
        let sent = stub.sent();
        assert_eq!(sent[0].url, "http://kaizen.test/health");
        assert!(sent[0].header("authorization").is_none());
    }

    #[test]
    fn requests_carry_bearer_and_identity_headers() {
        let (client, stub) = client();
        stub.respond(200, r#"{"burn_rate_usd_per_hour": 1.5}"#);
        client.enzan().burn().unwrap();

        let req = &stub.sent()[0];
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.header("Authorization"), Some("Bearer test-key"));
        assert_eq!(req.header("user-agent"), Some(USER_AGENT));
        assert!(req.header("content-type").is_none());
        let id = req.header(CLIENT_REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn post_sets_json_content_type() {
        let (client, stub) = client();
        stub.respond(200, r#"{"sql":"select 1","explanation":"one"}"#);
        client.akuma().explain("select 1").unwrap();
        let req = &stub.sent()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn transport_failure_surfaces_as_transport_error() {
        let (client, _stub) = client();
        let err = client.enzan().burn().unwrap_err();
        assert!(matches!(err, KaizenError::Transport(_)));
    }

    #[test]
    fn wrong_body_shape_is_deserialization_error() {
        let (client, stub) = client();
        stub.respond(200, r#"{"burn_rate_usd_per_hour": "a lot"}"#);
        let err = client.enzan().burn().unwrap_err();
        assert!(matches!(err, KaizenError::Deserialization(_)));
    }
}
