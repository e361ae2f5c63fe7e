//! Enzan: GPU cost reporting.
//!
//! Registration calls are passed through as-is. Whether a duplicate id is
//! an upsert or an error is decided by the server.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::client::ClientCore;
use crate::error::Result;
use crate::types::enzan::{
    Accepted, Alert, AlertList, BurnRate, CostSummary, Resource, ResourceList, SummaryRequest,
    SummaryWire,
};

pub struct EnzanClient {
    core: Arc<ClientCore>,
}

impl EnzanClient {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    /// Cost breakdown for a window, grouped by the requested dimensions.
    pub fn summary(&self, request: &SummaryRequest) -> Result<CostSummary> {
        let wire: SummaryWire = self.core.post("/v1/enzan/summary", request)?;
        Ok(wire.into_summary(request.window))
    }

    /// Current projected hourly spend.
    pub fn burn(&self) -> Result<BurnRate> {
        self.core.get("/v1/enzan/burn")
    }

    pub fn list_resources(&self) -> Result<Vec<Resource>> {
        let list: ResourceList = self.core.get("/v1/enzan/resources")?;
        Ok(list.resources)
    }

    pub fn register_resource(&self, resource: &Resource) -> Result<Accepted> {
        resource.validate()?;
        let body: Map<String, Value> = self.core.post("/v1/enzan/resources", resource)?;
        Ok(accepted(body, &resource.id))
    }

    pub fn list_alerts(&self) -> Result<Vec<Alert>> {
        let list: AlertList = self.core.get("/v1/enzan/alerts")?;
        Ok(list.alerts)
    }

    pub fn create_alert(&self, alert: &Alert) -> Result<Accepted> {
        alert.validate()?;
        let body: Map<String, Value> = self.core.post("/v1/enzan/alerts", alert)?;
        Ok(accepted(body, &alert.id))
    }
}

/// The server may echo the id, the whole record, or only a status.
fn accepted(body: Map<String, Value>, submitted_id: &str) -> Accepted {
    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
    Accepted {
        id: text("id").unwrap_or_else(|| submitted_id.to_string()),
        status: text("status"),
    }
}
