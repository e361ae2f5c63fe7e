//! Blocking client for the Kaizen AI platform API.
//!
//! # Overview
//! Three products sit behind one client:
//! - **Akuma**: natural language to SQL ([`AkumaClient`]).
//! - **Enzan**: GPU cost reporting ([`EnzanClient`]).
//! - **Sōzō**: synthetic data generation ([`SozoClient`]).
//!
//! All computation happens server-side. This crate builds requests,
//! authenticates them, and turns responses into typed values or a
//! [`KaizenError`].
//!
//! # Design
//! - `KaizenClient` resolves its configuration once (explicit value, then
//!   `KAIZEN_*` environment variables, then defaults) and never fails to
//!   construct. A missing API key is reported by the first call needing it.
//! - Every facade call goes through one request path: build, execute via a
//!   [`Transport`], classify. Inputs that can be checked locally are checked
//!   before anything is sent.
//! - Errors are classified, never retried. Rate-limit errors carry the
//!   server's `retry_after` hint.
//! - A process-wide default client ([`default_client`]) serves code that
//!   does not pass a client around. It is last-writer-wins.
//!
//! ```no_run
//! use kaizen_core::{Dialect, KaizenClient, QueryMode, QueryRequest};
//!
//! let client = KaizenClient::builder().api_key("sk-...").build();
//! let request = QueryRequest::new(Dialect::Postgres, "Top 10 customers by MRR last month")
//!     .mode(QueryMode::SqlOnly);
//! let result = client.akuma().query(&request)?;
//! println!("{}", result.sql);
//! # Ok::<(), kaizen_core::KaizenError>(())
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod default;
pub mod error;
pub mod export;
pub mod facade;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{KaizenClient, KaizenClientBuilder};
pub use config::{ClientConfig, ClientOptions};
pub use default::{default_client, set_api_key, set_base_url, set_default_client};
pub use error::{KaizenError, Result, TransportError};
pub use export::{DataFrame, ExportError};
pub use facade::{AkumaClient, EnzanClient, SozoClient};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::akuma::{
    ColumnDescriptor, Dialect, ExplainResult, ForeignKey, Guardrails, QueryMode, QueryRequest,
    QueryResult, SchemaAck, SchemaDescriptor, TableDescriptor,
};
pub use types::enzan::{
    Accepted, Alert, AlertType, ApiCostSummary, BurnRate, CostRow, CostSummary, GroupByDimension,
    Resource, SummaryRequest, TimeWindow,
};
pub use types::sozo::{ColumnStats, Correlation, GenerateRequest, GeneratedDataset, SchemaInfo};
pub use types::Row;
