//! Sōzō: synthetic data generation.

use std::sync::Arc;

use crate::client::ClientCore;
use crate::error::Result;
use crate::types::sozo::{GenerateRequest, GeneratedDataset, SchemaInfo, SchemaList};

pub struct SozoClient {
    core: Arc<ClientCore>,
}

impl SozoClient {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    /// Generate a dataset. The seed is forwarded; reproducibility is the
    /// server's guarantee, not this client's.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GeneratedDataset> {
        request.validate()?;
        let dataset: GeneratedDataset = self.core.post("/v1/sozo/generate", request)?;
        tracing::debug!(
            records = dataset.len(),
            columns = dataset.columns().len(),
            "generated dataset"
        );
        Ok(dataset)
    }

    /// Predefined schemas usable as `schema_name`.
    pub fn list_schemas(&self) -> Result<Vec<SchemaInfo>> {
        let list: SchemaList = self.core.get("/v1/sozo/schemas")?;
        Ok(list.schemas)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::client;
    use crate::error::KaizenError;
    use crate::types::sozo::*;

    #[test]
    fn missing_schema_fails_without_network() {
        let (client, stub) = client();
        let err = client.sozo().generate(&GenerateRequest::new(10)).unwrap_err();
        assert!(matches!(err, KaizenError::Validation { .. }));
        let err = client
            .sozo()
            .generate(&GenerateRequest::new(0).schema_name("saas_customers_v1"))
            .unwrap_err();
        assert!(matches!(err, KaizenError::Validation { .. }));
        assert!(stub.sent().is_empty());
    }

    #[test]
    fn generate_parses_dataset_and_stats() {
        let (client, stub) = client();
        stub.respond(
            200,
            r#"{
                "columns": ["plan", "mrr"],
                "rows": [{"plan": "pro", "mrr": 120.5}, {"plan": "free", "mrr": 0}],
                "stats": {
                    "plan": {"type": "choice", "values": {"pro": 1, "free": 1}},
                    "mrr": {"type": "float", "min": 0, "max": 120.5, "mean": 60.25}
                },
                "generationMs": 3
            }"#,
        );
        let dataset = client
            .sozo()
            .generate(&GenerateRequest::new(2).schema_name("saas_customers_v1").seed(7))
            .unwrap();

        assert_eq!(stub.last_body()["schemaName"], "saas_customers_v1");
        assert_eq!(stub.last_body()["seed"], 7);
        assert_eq!(dataset.columns(), ["plan", "mrr"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.stats()["mrr"].mean, Some(60.25));
        assert_eq!(dataset.stats()["plan"].values.as_ref().unwrap()["pro"], 1);
    }

    #[test]
    fn server_field_errors_surface_as_validation() {
        let (client, stub) = client();
        stub.respond(422, r#"{"error":"unknown schema","field":"schemaName"}"#);
        let err = client
            .sozo()
            .generate(&GenerateRequest::new(5).schema_name("nope"))
            .unwrap_err();
        match err {
            KaizenError::Validation { field, status, .. } => {
                assert_eq!(field.as_deref(), Some("schemaName"));
                assert_eq!(status, Some(422));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn list_schemas_reads_columns() {
        let (client, stub) = client();
        stub.respond(
            200,
            r#"{"schemas":[
                {"name":"saas_customers_v1","columns":{"email":"email","mrr":"float:0-500"}}
            ]}"#,
        );
        let schemas = client.sozo().list_schemas().unwrap();
        assert_eq!(schemas[0].name, "saas_customers_v1");
        assert_eq!(schemas[0].columns["mrr"], "float:0-500");
    }
}
