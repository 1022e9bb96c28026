//! Typed Prometheus queries on top of a [`GenericApiClient`].

use crate::{
    api::{GenericApiClient, PrometheusApiClient},
    error::QueryError,
    instrument::InstrumentedApiClient,
};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::BTreeMap, time::Duration};

const QUERY_PATH: &str = "/api/v1/query";
const QUERY_RANGE_PATH: &str = "/api/v1/query_range";
const SERIES_PATH: &str = "/api/v1/series";

/// Label set identifying a series.
pub type Metric = BTreeMap<String, String>;

/// Time span and resolution for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Inclusive end
    pub end: DateTime<Utc>,
    /// Evaluation step
    pub step: Duration,
}

/// Optional time bounds for series lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    /// Lower bound
    pub start: Option<DateTime<Utc>>,
    /// Upper bound
    pub end: Option<DateTime<Utc>>,
}

/// A `[timestamp, "value"]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "(f64, String)")]
pub struct SamplePair {
    /// Unix seconds
    pub timestamp: f64,
    /// Sample value
    pub value: f64,
}

impl TryFrom<(f64, String)> for SamplePair {
    type Error = String;

    fn try_from((timestamp, raw): (f64, String)) -> Result<Self, Self::Error> {
        let value = raw
            .parse::<f64>()
            .map_err(|e| format!("invalid sample value {raw:?}: {e}"))?;
        Ok(Self { timestamp, value })
    }
}

/// A `[timestamp, "string"]` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(f64, String)")]
pub struct StringPair {
    /// Unix seconds
    pub timestamp: f64,
    /// Raw string value
    pub value: String,
}

impl From<(f64, String)> for StringPair {
    fn from((timestamp, value): (f64, String)) -> Self {
        Self { timestamp, value }
    }
}

/// One element of an instant vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sample {
    /// Series labels
    #[serde(default)]
    pub metric: Metric,
    /// Value at the evaluation time
    pub value: SamplePair,
}

/// One series of a range vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleStream {
    /// Series labels
    #[serde(default)]
    pub metric: Metric,
    /// Values over the range
    pub values: Vec<SamplePair>,
}

/// Expression evaluation result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryResult {
    /// Instant vector
    Vector(Vec<Sample>),
    /// Range vector
    Matrix(Vec<SampleStream>),
    /// Scalar
    Scalar(SamplePair),
    /// String
    String(StringPair),
}

impl QueryResult {
    /// Number of series, or 1 for scalar and string results.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Vector(samples) => samples.len(),
            Self::Matrix(streams) => streams.len(),
            Self::Scalar(_) | Self::String(_) => 1,
        }
    }

    /// Whether a vector or matrix result is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prometheus client used by the adapter.
#[derive(Debug)]
pub struct PrometheusClient<C = InstrumentedApiClient<PrometheusApiClient>> {
    api: C,
}

impl<C: GenericApiClient> PrometheusClient<C> {
    /// Wrap an API client.
    pub const fn new(api: C) -> Self {
        Self { api }
    }

    /// Underlying API client.
    pub const fn api(&self) -> &C {
        &self.api
    }

    /// Evaluate `expr` at `time`, or at the server's current time.
    ///
    /// # Errors
    ///
    /// [`QueryError`] from the request or when the result cannot be decoded.
    pub async fn query(
        &self,
        expr: &str,
        time: Option<DateTime<Utc>>,
    ) -> Result<QueryResult, QueryError> {
        let mut params = vec![("query".to_string(), expr.to_string())];
        if let Some(time) = time {
            params.push(("time".to_string(), format_timestamp(time)));
        }
        self.call(QUERY_PATH, &params).await
    }

    /// Evaluate `expr` over `range`.
    ///
    /// # Errors
    ///
    /// [`QueryError`] from the request or when the result cannot be decoded.
    pub async fn query_range(&self, expr: &str, range: &Range) -> Result<QueryResult, QueryError> {
        let params = vec![
            ("query".to_string(), expr.to_string()),
            ("start".to_string(), format_timestamp(range.start)),
            ("end".to_string(), format_timestamp(range.end)),
            ("step".to_string(), range.step.as_secs_f64().to_string()),
        ];
        self.call(QUERY_RANGE_PATH, &params).await
    }

    /// Label sets of the series matching any of `matchers`.
    ///
    /// # Errors
    ///
    /// [`QueryError`] from the request or when the result cannot be decoded.
    pub async fn series(
        &self,
        interval: &Interval,
        matchers: &[&str],
    ) -> Result<Vec<Metric>, QueryError> {
        let mut params: Vec<(String, String)> = matchers
            .iter()
            .map(|m| ("match[]".to_string(), (*m).to_string()))
            .collect();
        if let Some(start) = interval.start {
            params.push(("start".to_string(), format_timestamp(start)));
        }
        if let Some(end) = interval.end {
            params.push(("end".to_string(), format_timestamp(end)));
        }
        self.call(SERIES_PATH, &params).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T, QueryError> {
        let response = self.api.execute(Method::GET, endpoint, params).await?;
        Ok(serde_json::from_value(response.data)?)
    }
}

/// Unix seconds with millisecond precision, as the API expects.
fn format_timestamp(time: DateTime<Utc>) -> String {
    let millis = time.timestamp_millis();
    let sign = if millis < 0 { "-" } else { "" };
    let abs = millis.unsigned_abs();
    format!("{sign}{}.{:03}", abs / 1000, abs % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, ResponseStatus};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        data: serde_json::Value,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl Recorder {
        fn returning(data: serde_json::Value) -> Self {
            Self {
                data,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl GenericApiClient for Recorder {
        async fn execute(
            &self,
            _method: Method,
            endpoint: &str,
            query: &[(String, String)],
        ) -> Result<ApiResponse, QueryError> {
            self.calls.lock().push((endpoint.to_string(), query.to_vec()));
            Ok(ApiResponse {
                status: ResponseStatus::Success,
                data: self.data.clone(),
                error_type: String::new(),
                error: String::new(),
                warnings: Vec::new(),
            })
        }
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[tokio::test]
    async fn test_instant_query_decodes_vector() {
        let client = PrometheusClient::new(Recorder::returning(json!({
            "resultType": "vector",
            "result": [{"metric": {"job": "node"}, "value": [1700000000.5, "3"]}]
        })));
        let time = Utc.timestamp_millis_opt(1_700_000_000_250).unwrap();

        let result = client.query("up", Some(time)).await.unwrap();
        let QueryResult::Vector(samples) = result else {
            panic!("expected vector");
        };
        assert_eq!(samples[0].metric["job"], "node");
        assert!((samples[0].value.value - 3.0).abs() < f64::EPSILON);

        let calls = client.api().calls.lock();
        assert_eq!(calls[0].0, "/api/v1/query");
        assert_eq!(calls[0].1, [pair("query", "up"), pair("time", "1700000000.250")]);
    }

    #[tokio::test]
    async fn test_range_query_params() {
        let client = PrometheusClient::new(Recorder::returning(json!({
            "resultType": "matrix",
            "result": [{"metric": {}, "values": [[1.0, "1"], [31.0, "+Inf"]]}]
        })));
        let range = Range {
            start: Utc.timestamp_opt(100, 0).unwrap(),
            end: Utc.timestamp_opt(200, 0).unwrap(),
            step: Duration::from_secs(30),
        };

        let result = client.query_range("rate(x[1m])", &range).await.unwrap();
        let QueryResult::Matrix(streams) = result else {
            panic!("expected matrix");
        };
        assert!(streams[0].values[1].value.is_infinite());

        let calls = client.api().calls.lock();
        assert_eq!(calls[0].0, "/api/v1/query_range");
        assert_eq!(
            calls[0].1,
            [
                pair("query", "rate(x[1m])"),
                pair("start", "100.000"),
                pair("end", "200.000"),
                pair("step", "30"),
            ]
        );
    }

    #[tokio::test]
    async fn test_series_repeats_matchers() {
        let client = PrometheusClient::new(Recorder::returning(json!([
            {"__name__": "up", "job": "node"}
        ])));

        let series = client
            .series(&Interval::default(), &["up", "process_start_time_seconds"])
            .await
            .unwrap();
        assert_eq!(series[0]["__name__"], "up");

        let calls = client.api().calls.lock();
        assert_eq!(
            calls[0].1,
            [pair("match[]", "up"), pair("match[]", "process_start_time_seconds")]
        );
    }

    #[test]
    fn test_scalar_and_string_results() {
        let scalar: QueryResult =
            serde_json::from_value(json!({"resultType": "scalar", "result": [5.0, "NaN"]})).unwrap();
        assert!(matches!(scalar, QueryResult::Scalar(p) if p.value.is_nan()));

        let string: QueryResult =
            serde_json::from_value(json!({"resultType": "string", "result": [5.0, "hello"]})).unwrap();
        assert_eq!(string.len(), 1);
    }

    #[test]
    fn test_bad_sample_value() {
        let err = serde_json::from_value::<SamplePair>(json!([1.0, "abc"])).unwrap_err();
        assert!(err.to_string().contains("invalid sample value"));
    }

    #[test]
    fn test_timestamps_keep_millisecond_precision() {
        let at = |millis| Utc.timestamp_millis_opt(millis).unwrap();
        assert_eq!(format_timestamp(at(1_700_000_000_123)), "1700000000.123");
        assert_eq!(format_timestamp(at(0)), "0.000");
        assert_eq!(format_timestamp(at(5)), "0.005");
    }

    #[test]
    fn test_pre_epoch_timestamps() {
        let at = |millis| Utc.timestamp_millis_opt(millis).unwrap();
        assert_eq!(format_timestamp(at(-1_500)), "-1.500");
        assert_eq!(format_timestamp(at(-250)), "-0.250");
        assert_eq!(format_timestamp(at(-3_000)), "-3.000");
    }
}
