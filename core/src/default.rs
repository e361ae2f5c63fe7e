//! Process-wide default client.
//!
//! One named slot holds the client used by code that does not carry its own
//! [`KaizenClient`]. [`set_api_key`] and [`set_base_url`] swap in a new
//! client; the last writer wins and nothing isolates threads from each
//! other's changes. Facade state held by the replaced client (such as an
//! Akuma schema) goes with it. Code that needs isolation should construct a
//! client and pass it around instead.

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ClientConfig, ClientOptions};
use crate::KaizenClient;

static DEFAULT_CLIENT: RwLock<Option<Arc<KaizenClient>>> = RwLock::new(None);

/// The current default client, built from the environment on first use.
pub fn default_client() -> Arc<KaizenClient> {
    if let Some(client) = DEFAULT_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(client);
    }
    let mut slot = DEFAULT_CLIENT.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| Arc::new(KaizenClient::new())))
}

/// Replace the default client with one using `key`.
pub fn set_api_key(key: &str) {
    replace_with(|config| config.with_api_key(key));
}

/// Replace the default client with one talking to `url`.
pub fn set_base_url(url: &str) {
    replace_with(|config| config.with_base_url(url));
}

/// Install `client` as the default.
pub fn set_default_client(client: KaizenClient) {
    *DEFAULT_CLIENT.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(client));
}

fn replace_with<F>(update: F)
where
    F: FnOnce(&ClientConfig) -> ClientConfig,
{
    let mut slot = DEFAULT_CLIENT.write().unwrap_or_else(PoisonError::into_inner);
    let next = match slot.as_ref() {
        Some(current) => {
            KaizenClient::with_transport(update(current.config()), current.transport())
        }
        None => {
            let resolved = ClientConfig::resolve(ClientOptions::default());
            KaizenClient::with_config(update(&resolved))
        }
    };
    tracing::debug!(base_url = next.config().base_url(), "replacing default client");
    *slot = Some(Arc::new(next));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::StubTransport;

    // Single test: the slot is process-global and tests run in parallel.
    #[test]
    fn default_slot_is_last_writer_wins() {
        let stub = Arc::new(StubTransport::default());
        let config = ClientConfig::resolve_with(
            ClientOptions {
                api_key: Some("first".to_string()),
                base_url: Some("http://one.test".to_string()),
                timeout: None,
            },
            |_| None,
        );
        set_default_client(KaizenClient::with_transport(config, stub.clone()));
        assert_eq!(default_client().config().api_key(), Some("first"));

        let before = default_client();
        set_api_key("second");
        set_api_key("third");
        let after = default_client();
        assert_eq!(after.config().api_key(), Some("third"));
        assert_eq!(after.config().base_url(), "http://one.test");
        assert_eq!(before.config().api_key(), Some("first"));

        set_base_url("http://two.test/");
        assert_eq!(default_client().config().base_url(), "http://two.test");
        assert_eq!(default_client().config().api_key(), Some("third"));

        stub.respond(200, r#"{"burn_rate_usd_per_hour": 2.0}"#);
        default_client().enzan().burn().unwrap();
        let sent = stub.sent();
        assert_eq!(sent[0].url, "http://two.test/v1/enzan/burn");
        assert_eq!(sent[0].header("authorization"), Some("Bearer third"));
    }
}
