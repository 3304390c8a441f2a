//! Core metric types.

use serde::Serialize;
use std::collections::HashMap;

/// One decoded OTLP data point: metric name, numeric value and the
/// string-valued attributes it carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDataPoint {
    name: String,
    value: f64,
    attributes: HashMap<String, String>,
}

impl MetricDataPoint {
    pub fn new(name: impl Into<String>, value: f64, attributes: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            value,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Look up a single string attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Metric names emitted by the Claude Code OTLP exporter.
pub mod names {
    pub const TOKEN_USAGE: &str = "claude_code.token.usage";
    pub const COST_USAGE: &str = "claude_code.cost.usage";
    pub const SESSION_COUNT: &str = "claude_code.session.count";
    pub const LINES_OF_CODE: &str = "claude_code.lines_of_code.count";
    pub const COMMIT_COUNT: &str = "claude_code.commit.count";
    pub const PR_COUNT: &str = "claude_code.pr.count";
    pub const ACTIVE_TIME: &str = "claude_code.active_time.duration";
}
