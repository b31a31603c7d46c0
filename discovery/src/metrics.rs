//! Usage metrics responses (event rate, query counts).
//!
//! Metric aggregations are always date histograms of one event type, so they
//! are plain records rather than a discriminated union.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricResponse {
    #[serde(deserialize_with = "crate::de::null_as_empty")]
    pub aggregations: Vec<MetricAggregation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricAggregation {
    /// Bucket width, e.g. `1d`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(deserialize_with = "crate::de::null_as_empty")]
    pub results: Vec<MetricAggregationResult>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricAggregationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    /// Bucket start in milliseconds since the Unix epoch.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_i64"
    )]
    pub key: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_rate: Option<f64>,
}

impl MetricAggregationResult {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.key
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Click,
    Query,
    #[serde(other)]
    Other,
}

impl MetricResponse {
    /// Mean event rate over every bucket that reports one.
    pub fn mean_event_rate(&self) -> Option<f64> {
        let rates: Vec<f64> = self
            .aggregations
            .iter()
            .flat_map(|a| a.results.iter())
            .filter_map(|r| r.event_rate)
            .collect();
        if rates.is_empty() {
            None
        } else {
            Some(rates.iter().sum::<f64>() / rates.len() as f64)
        }
    }
}
