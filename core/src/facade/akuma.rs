//! Akuma: natural language to SQL.
//!
//! The facade keeps an optional database schema. Once set, it is sent with
//! every query and explain call until replaced or cleared. The slot is
//! last-writer-wins across threads sharing the client.

use std::sync::{Arc, PoisonError, RwLock};

use crate::client::ClientCore;
use crate::error::{KaizenError, Result};
use crate::types::akuma::{
    ExplainBody, ExplainResult, QueryBody, QueryRequest, QueryResult, SchemaAck, SchemaDescriptor,
};
use crate::types::require;

pub struct AkumaClient {
    core: Arc<ClientCore>,
    schema: RwLock<Option<SchemaDescriptor>>,
}

impl AkumaClient {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self {
            core,
            schema: RwLock::new(None),
        }
    }

    /// Translate a natural-language prompt into SQL.
    ///
    /// Rows are only returned in `sql-and-results` mode; in any other mode
    /// rows sent by the server are dropped.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        request.validate()?;
        let schema = self.schema();
        let body = QueryBody {
            dialect: request.dialect,
            prompt: &request.prompt,
            mode: request.mode,
            max_rows: request.max_rows,
            guardrails: request.guardrails.as_ref(),
            schema: schema.as_ref(),
        };
        let mut result: QueryResult = self.core.post("/v1/akuma/query", &body)?;
        if !request.mode.includes_results() {
            result.rows = None;
        }
        if let Some(error) = &result.error {
            tracing::debug!(%error, "query returned an in-band error");
        }
        Ok(result)
    }

    /// Explain a SQL statement in plain English.
    pub fn explain(&self, sql: &str) -> Result<ExplainResult> {
        require("sql", sql)?;
        let schema = self.schema();
        let body = ExplainBody {
            sql,
            schema: schema.as_ref(),
        };
        let mut result: ExplainResult = self.core.post("/v1/akuma/explain", &body)?;
        if result.sql.is_empty() {
            result.sql = sql.to_string();
        }
        Ok(result)
    }

    /// Store `schema` for subsequent calls, replacing any previous one.
    /// Nothing is sent to the server.
    pub fn set_schema(&self, schema: SchemaDescriptor) -> Result<()> {
        schema.validate()?;
        tracing::debug!(tables = schema.tables.len(), "akuma schema set");
        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = Some(schema);
        Ok(())
    }

    /// Remove the stored schema, returning it.
    pub fn clear_schema(&self) -> Option<SchemaDescriptor> {
        self.schema
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Copy of the stored schema.
    pub fn schema(&self) -> Option<SchemaDescriptor> {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Upload the stored schema so the server can cache it.
    pub fn push_schema(&self) -> Result<SchemaAck> {
        let schema = self
            .schema()
            .ok_or_else(|| KaizenError::validation("schema", "no schema has been set"))?;
        self.core.post("/v1/akuma/schema", &schema)
    }
}

impl std::fmt::Debug for AkumaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AkumaClient")
            .field("schema", &self.schema())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::client::test_support::client;
    use crate::error::KaizenError;
    use crate::types::akuma::*;

    fn schema(table: &str) -> SchemaDescriptor {
        SchemaDescriptor::new(vec![TableDescriptor::new(table)
            .column(ColumnDescriptor::new("id", "uuid"))
            .primary_key(["id"])])
        .version("v1")
    }

    #[test]
    fn every_dialect_and_mode_sends_exactly_three_fields() {
        for dialect in Dialect::ALL {
            for mode in QueryMode::ALL {
                let (client, stub) = client();
                stub.respond(200, r#"{"sql":"select 1"}"#);
                let request = QueryRequest::new(*dialect, "count users").mode(*mode);
                client.akuma().query(&request).unwrap();
                assert_eq!(
                    stub.last_body(),
                    json!({
                        "dialect": dialect.as_str(),
                        "prompt": "count users",
                        "mode": mode.as_str(),
                    })
                );
                assert_eq!(stub.sent()[0].url, "http://kaizen.test/v1/akuma/query");
            }
        }
    }

    #[test]
    fn string_parameters_are_validated_before_sending() {
        let (client, stub) = client();
        for (dialect, mode, field) in [
            ("oracle", "sql-only", "dialect"),
            ("postgres", "results-only", "mode"),
        ] {
            let err = QueryRequest::parse(dialect, "count users", mode)
                .and_then(|request| client.akuma().query(&request))
                .unwrap_err();
            match err {
                KaizenError::Validation { field: f, status, .. } => {
                    assert_eq!(f.as_deref(), Some(field));
                    assert_eq!(status, None);
                }
                other => panic!("expected Validation, got {other:?}"),
            }
        }
        assert!(stub.sent().is_empty());
    }

    #[test]
    fn empty_prompt_is_rejected_locally() {
        let (client, stub) = client();
        let err = client
            .akuma()
            .query(&QueryRequest::new(Dialect::Mysql, "   "))
            .unwrap_err();
        assert!(matches!(err, KaizenError::Validation { .. }));
        assert!(stub.sent().is_empty());
    }

    #[test]
    fn sql_only_never_returns_rows() {
        let (client, stub) = client();
        stub.respond(200, r#"{"sql":"select 1","rows":[{"n":1}]}"#);
        let result = client
            .akuma()
            .query(&QueryRequest::new(Dialect::Postgres, "one row"))
            .unwrap();
        assert_eq!(result.sql, "select 1");
        assert!(result.rows.is_none());
    }

    #[test]
    fn sql_and_results_keeps_rows() {
        let (client, stub) = client();
        stub.respond(200, r#"{"sql":"select 1 as n","rows":[{"n":1}],"warnings":["full scan"]}"#);
        let request =
            QueryRequest::new(Dialect::Snowflake, "one row").mode(QueryMode::SqlAndResults);
        let result = client.akuma().query(&request).unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], 1);
        assert_eq!(result.warnings.unwrap(), vec!["full scan".to_string()]);
    }

    #[test]
    fn guardrails_and_max_rows_are_forwarded() {
        let (client, stub) = client();
        stub.respond(200, r#"{"sql":"select 1"}"#);
        let request = QueryRequest::new(Dialect::Postgres, "top customers")
            .max_rows(50)
            .guardrails(Guardrails::default().deny_column("ssn"));
        client.akuma().query(&request).unwrap();
        let body = stub.last_body();
        assert_eq!(body["maxRows"], 50);
        assert_eq!(body["guardrails"], json!({"readOnly": true, "denyColumns": ["ssn"]}));
    }

    #[test]
    fn stored_schema_is_sent_and_replaced_not_merged() {
        let (client, stub) = client();
        client.akuma().set_schema(schema("users")).unwrap();
        assert!(stub.sent().is_empty());

        stub.respond(200, r#"{"sql":"select 1"}"#);
        client.akuma().query(&QueryRequest::new(Dialect::Postgres, "q")).unwrap();
        let body = stub.last_body();
        assert_eq!(body["schema"]["tables"][0]["name"], "users");
        assert_eq!(body["schema"]["version"], "v1");

        client
            .akuma()
            .set_schema(SchemaDescriptor::new(vec![TableDescriptor::new("orders")]))
            .unwrap();
        stub.respond(200, r#"{"sql":"select 1"}"#);
        client.akuma().query(&QueryRequest::new(Dialect::Postgres, "q")).unwrap();
        let body = stub.last_body();
        assert_eq!(
            body["schema"],
            json!({"tables": [{"name": "orders", "description": "", "columns": []}]})
        );
    }

    #[test]
    fn explain_includes_schema_and_falls_back_to_input_sql() {
        let (client, stub) = client();
        client.akuma().set_schema(schema("users")).unwrap();
        stub.respond(200, r#"{"explanation":"Counts users."}"#);
        let result = client.akuma().explain("select count(*) from users").unwrap();
        assert_eq!(result.sql, "select count(*) from users");
        assert_eq!(result.explanation, "Counts users.");
        assert_eq!(stub.last_body()["schema"]["tables"][0]["name"], "users");
    }

    #[test]
    fn cleared_schema_is_no_longer_sent() {
        let (client, stub) = client();
        client.akuma().set_schema(schema("users")).unwrap();
        assert!(client.akuma().clear_schema().is_some());
        stub.respond(200, r#"{"sql":"select 1"}"#);
        client.akuma().query(&QueryRequest::new(Dialect::Postgres, "q")).unwrap();
        assert!(stub.last_body().get("schema").is_none());
    }

    #[test]
    fn push_schema_requires_a_stored_schema() {
        let (client, stub) = client();
        assert!(client.akuma().push_schema().is_err());
        assert!(stub.sent().is_empty());

        client.akuma().set_schema(schema("users")).unwrap();
        stub.respond(200, r#"{"status":"ok","tables":1}"#);
        let ack = client.akuma().push_schema().unwrap();
        assert_eq!(ack, SchemaAck { status: "ok".to_string(), tables: 1 });
        assert_eq!(stub.sent()[0].url, "http://kaizen.test/v1/akuma/schema");
    }
}
