//! Enzan (GPU cost) types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{lenient, require};
use crate::error::Result;

wire_enum! {
    /// Reporting window for a cost summary.
    TimeWindow, field = "window" {
        Hour => "1h",
        Day => "24h",
        Week => "7d",
        Month => "30d",
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::Day
    }
}

wire_enum! {
    /// Dimension a cost summary can be grouped or filtered by.
    GroupByDimension, field = "group_by" {
        Project => "project",
        Model => "model",
        Team => "team",
        Provider => "provider",
        Endpoint => "endpoint",
    }
}

wire_enum! {
    AlertType, field = "type" {
        CostThreshold => "cost_threshold",
        UsageSpike => "usage_spike",
        IdleResource => "idle_resource",
        BudgetExceeded => "budget_exceeded",
    }
}

/// Parameters of `POST /v1/enzan/summary`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub window: TimeWindow,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<GroupByDimension>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<GroupByDimension, Vec<String>>,
}

impl SummaryRequest {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            ..Default::default()
        }
    }

    pub fn group_by(mut self, dimension: GroupByDimension) -> Self {
        if !self.group_by.contains(&dimension) {
            self.group_by.push(dimension);
        }
        self
    }

    pub fn filter(mut self, dimension: GroupByDimension, value: impl Into<String>) -> Self {
        self.filters.entry(dimension).or_default().push(value.into());
        self
    }
}

/// One grouped line of a cost summary. Dimensions not grouped by are `None`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CostRow {
    #[serde(deserialize_with = "lenient::number")]
    pub cost_usd: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub gpu_hours: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub requests: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub tokens_in: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub tokens_out: u64,
    pub project: Option<String>,
    pub model: Option<String>,
    pub team: Option<String>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
}

impl CostRow {
    pub fn dimension(&self, dimension: GroupByDimension) -> Option<&str> {
        match dimension {
            GroupByDimension::Project => self.project.as_deref(),
            GroupByDimension::Model => self.model.as_deref(),
            GroupByDimension::Team => self.team.as_deref(),
            GroupByDimension::Provider => self.provider.as_deref(),
            GroupByDimension::Endpoint => self.endpoint.as_deref(),
        }
    }
}

/// Cost of hosted API calls, reported next to GPU spend when present.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiCostSummary {
    #[serde(deserialize_with = "lenient::number")]
    pub total_cost_usd: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub prompt_tokens: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub output_tokens: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub queries: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub window: String,
    pub start_time: String,
    pub end_time: String,
    pub rows: Vec<CostRow>,
    pub total_cost_usd: f64,
    pub total_gpu_hours: f64,
    pub total_requests: u64,
    pub api_costs: Option<ApiCostSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SummaryWire {
    window: Option<String>,
    start_time: String,
    end_time: String,
    rows: Vec<CostRow>,
    total: TotalWire,
    api_costs: Option<ApiCostSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TotalWire {
    #[serde(deserialize_with = "lenient::number")]
    cost_usd: f64,
    #[serde(deserialize_with = "lenient::number")]
    gpu_hours: f64,
    #[serde(deserialize_with = "lenient::count")]
    requests: u64,
}

impl SummaryWire {
    pub(crate) fn into_summary(self, requested: TimeWindow) -> CostSummary {
        CostSummary {
            window: self.window.unwrap_or_else(|| requested.as_str().to_string()),
            start_time: self.start_time,
            end_time: self.end_time,
            rows: self.rows,
            total_cost_usd: self.total.cost_usd,
            total_gpu_hours: self.total.gpu_hours,
            total_requests: self.total.requests,
            api_costs: self.api_costs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BurnRate {
    #[serde(deserialize_with = "lenient::number")]
    pub burn_rate_usd_per_hour: f64,
    pub timestamp: String,
}

/// A GPU resource registered for cost tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub provider: String,
    pub gpu_type: String,
    pub gpu_count: u32,
    pub hourly_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        gpu_type: impl Into<String>,
        gpu_count: u32,
        hourly_rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            gpu_type: gpu_type.into(),
            gpu_count,
            hourly_rate,
            region: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require("id", &self.id)?;
        require("provider", &self.provider)?;
        require("gpuType", &self.gpu_type)
    }
}

/// A cost or usage alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub threshold: f64,
    pub window: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Alert {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        alert_type: AlertType,
        threshold: f64,
        window: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            alert_type,
            threshold,
            window: window.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        require("window", &self.window)
    }
}

/// Server acceptance of a registered resource or created alert.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Accepted {
    pub id: String,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResourceList {
    pub resources: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AlertList {
    pub alerts: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_request_omits_empty_members() {
        let body = serde_json::to_value(SummaryRequest::new(TimeWindow::Week)).unwrap();
        assert_eq!(body, json!({"window": "7d"}));
    }

    #[test]
    fn summary_request_keeps_group_order() {
        let request = SummaryRequest::default()
            .group_by(GroupByDimension::Model)
            .group_by(GroupByDimension::Project)
            .group_by(GroupByDimension::Model)
            .filter(GroupByDimension::Team, "ml");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"window": "24h", "groupBy": ["model", "project"], "filters": {"team": ["ml"]}})
        );
    }

    #[test]
    fn resource_uses_camel_case() {
        let resource =
            Resource::new("gpu-001", "aws", "a100_80gb", 8, 32.77).label("project", "ml");
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "id": "gpu-001",
                "provider": "aws",
                "gpuType": "a100_80gb",
                "gpuCount": 8,
                "hourlyRate": 32.77,
                "labels": {"project": "ml"}
            })
        );
    }

    #[test]
    fn alert_defaults_to_enabled() {
        let alert: Alert = serde_json::from_value(json!({
            "id": "a1", "name": "High spend", "type": "cost_threshold",
            "threshold": 1000.0, "window": "24h"
        }))
        .unwrap();
        assert!(alert.enabled);
        assert_eq!(alert.alert_type, AlertType::CostThreshold);
    }

    #[test]
    fn odd_counter_types_do_not_fail_the_summary() {
        let wire: SummaryWire = serde_json::from_value(json!({
            "rows": [
                {"project": "core", "cost_usd": "2.5", "requests": 5.0, "tokens_in": null,
                 "tokens_out": "lots"}
            ],
            "total": {"cost_usd": 2.5, "gpu_hours": "n/a", "requests": 5.0}
        }))
        .unwrap();
        let summary = wire.into_summary(TimeWindow::Day);

        let row = &summary.rows[0];
        assert_eq!(row.project.as_deref(), Some("core"));
        assert_eq!(row.cost_usd, 2.5);
        assert_eq!(row.requests, 5);
        assert_eq!(row.tokens_in, 0);
        assert_eq!(row.tokens_out, 0);
        assert_eq!(summary.total_requests, 5);
        assert_eq!(summary.total_gpu_hours, 0.0);
    }

    #[test]
    fn resource_requires_identity_fields() {
        let err = Resource::new("", "aws", "h100", 1, 2.0).validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid id: is required");
    }
}
