//! Query and notices response envelopes.
//!
//! Deserializing these through serde decodes their aggregations with the
//! lenient policy. [`AggregationDecoder::decode_query_response`] and
//! [`AggregationDecoder::decode_notices_response`] apply a chosen policy.
//!
//! [`AggregationDecoder::decode_query_response`]: crate::AggregationDecoder::decode_query_response
//! [`AggregationDecoder::decode_notices_response`]: crate::AggregationDecoder::decode_notices_response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregations::QueryAggregation;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResponse {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(deserialize_with = "crate::de::null_as_empty")]
    pub results: Vec<QueryResult>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::de::null_as_empty"
    )]
    pub aggregations: Vec<QueryAggregation>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::de::null_as_empty"
    )]
    pub passages: Vec<QueryPassage>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub duplicates_removed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_details: Option<RetrievalDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_query: Option<String>,
}

impl QueryResponse {
    /// Every aggregation in the response, depth-first, with its depth.
    pub fn all_aggregations(&self) -> Vec<(&QueryAggregation, usize)> {
        let mut out = Vec::new();
        for agg in &self.aggregations {
            agg.walk(&mut |a, depth| out.push((a, depth)));
        }
        out
    }
}

/// One matching document. Keys beyond `id` and `result_metadata` are the
/// document's own fields and are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_metadata: Option<QueryResultMetadata>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResultMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_retrieval_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPassage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_text: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub start_offset: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub end_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_retrieval_strategy: Option<DocumentRetrievalStrategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRetrievalStrategy {
    Untrained,
    RelevancyTraining,
    ContinuousRelevancyTraining,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryNoticesResponse {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(deserialize_with = "crate::de::null_as_empty")]
    pub results: Vec<QueryNoticesResult>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::de::null_as_empty"
    )]
    pub aggregations: Vec<QueryAggregation>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::de::null_as_empty"
    )]
    pub passages: Vec<QueryPassage>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub duplicates_removed: Option<u64>,
}

/// A document that produced notices during ingestion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryNoticesResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_i64"
    )]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::de::null_as_empty"
    )]
    pub notices: Vec<Notice>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<NoticeSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Warning,
    Error,
    #[serde(other)]
    Other,
}
