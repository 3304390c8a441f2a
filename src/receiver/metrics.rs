//! OTLP/JSON metrics decoding.
//!
//! Walks `resourceMetrics[].scopeMetrics[].metrics[]` and emits one
//! [`MetricDataPoint`] per entry in a metric's `sum` or `gauge` data point
//! list. Any missing or mistyped field makes its subtree contribute nothing;
//! decoding never fails.

use crate::metrics::MetricDataPoint;
use serde_json::Value;
use std::collections::HashMap;

/// Decode an OTLP/JSON metrics export body into normalized data points.
pub fn decode_metrics(body: &[u8]) -> Vec<MetricDataPoint> {
    let json: Value = match serde_json::from_slice(body) {
        Ok(json) => json,
        Err(e) => {
            tracing::debug!("Discarding metrics body that is not valid JSON: {}", e);
            return Vec::new();
        },
    };

    let mut points = Vec::new();

    for resource_metrics in array_field(&json, "resourceMetrics") {
        for scope_metrics in array_field(resource_metrics, "scopeMetrics") {
            for metric in array_field(scope_metrics, "metrics") {
                decode_metric(metric, &mut points);
            }
        }
    }

    points
}

fn decode_metric(metric: &Value, points: &mut Vec<MetricDataPoint>) {
    let Some(name) = metric.get("name").and_then(Value::as_str) else {
        return;
    };

    for kind in ["sum", "gauge"] {
        let Some(data) = metric.get(kind).filter(|v| v.is_object()) else {
            continue;
        };
        for data_point in array_field(data, "dataPoints") {
            points.push(MetricDataPoint::new(
                name,
                extract_value(data_point),
                extract_attributes(data_point),
            ));
        }
    }
}

/// Iterate a field that should be an array of objects. Yields nothing unless
/// every element is an object.
fn array_field<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .filter(|items| items.iter().all(Value::is_object))
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// Numeric value of a data point. `asInt` is usually a decimal string in
/// OTLP/JSON; numbers are accepted too. Falls back to 0.
fn extract_value(data_point: &Value) -> f64 {
    let as_int = data_point.get("asInt");
    if let Some(v) = as_int.and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()) {
        return v;
    }
    if let Some(v) = as_int.and_then(Value::as_f64) {
        return v;
    }

    match data_point.get("asDouble") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String-valued attributes only; other attribute kinds are dropped.
fn extract_attributes(data_point: &Value) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    for attr in array_field(data_point, "attributes") {
        let key = attr.get("key").and_then(Value::as_str);
        let value = attr
            .get("value")
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str);

        if let (Some(key), Some(value)) = (key, value) {
            attributes.insert(key.to_string(), value.to_string());
        }
    }

    attributes
}
