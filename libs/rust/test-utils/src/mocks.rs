//! Canned Prometheus HTTP API responses.
//!
//! Mount these on a [`wiremock::MockServer`] to exercise a client end to end.

use serde_json::{Value, json};
use wiremock::ResponseTemplate;

/// Path of the instant query endpoint.
pub const QUERY_PATH: &str = "/api/v1/query";

/// Path of the range query endpoint.
pub const QUERY_RANGE_PATH: &str = "/api/v1/query_range";

/// Path of the series endpoint.
pub const SERIES_PATH: &str = "/api/v1/series";

/// `{"status":"success","data":...}`.
#[must_use]
pub fn success_envelope(data: Value) -> Value {
    json!({ "status": "success", "data": data })
}

/// `{"status":"error","errorType":...,"error":...}`.
#[must_use]
pub fn error_envelope(error_type: &str, message: &str) -> Value {
    json!({ "status": "error", "errorType": error_type, "error": message })
}

/// Instant vector data with one sample per label set, all at `timestamp`.
#[must_use]
pub fn vector_data(samples: &[(&[(&str, &str)], &str)], timestamp: f64) -> Value {
    let result: Vec<Value> = samples
        .iter()
        .map(|(labels, value)| json!({ "metric": labels_object(labels), "value": [timestamp, value] }))
        .collect();
    json!({ "resultType": "vector", "result": result })
}

/// Series endpoint data.
#[must_use]
pub fn series_data(series: &[&[(&str, &str)]]) -> Value {
    Value::Array(series.iter().map(|labels| labels_object(labels)).collect())
}

/// 200 response carrying `data`.
#[must_use]
pub fn prometheus_ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(success_envelope(data))
}

/// Error envelope with the given status.
#[must_use]
pub fn prometheus_error(status: u16, error_type: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_envelope(error_type, message))
}

fn labels_object(labels: &[(&str, &str)]) -> Value {
    Value::Object(
        labels
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect(),
    )
}
