use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use discovery::{AggregationDecoder, QueryAggregation, QueryNoticesResponse, QueryResponse};

/// A decoded input file, keeping the top-level shape it was read from.
#[derive(Debug)]
pub enum Payload {
    /// Full query response envelope
    Response(Box<QueryResponse>),
    /// Notices response envelope
    Notices(Box<QueryNoticesResponse>),
    /// Bare aggregation object
    Aggregation(Box<QueryAggregation>),
    /// Array of aggregation objects
    Aggregations(Vec<QueryAggregation>),
}

impl Payload {
    pub fn aggregations(&self) -> &[QueryAggregation] {
        match self {
            Payload::Response(response) => &response.aggregations,
            Payload::Notices(response) => &response.aggregations,
            Payload::Aggregation(agg) => std::slice::from_ref(agg.as_ref()),
            Payload::Aggregations(aggs) => aggs,
        }
    }
}

/// Read a JSON file and decode it with the given decoder.
///
/// An object carrying a `type` key is taken to be a single aggregation. Any
/// other object is a response envelope, read as a notices response when its
/// results look like notice documents.
pub fn load_payload(path: &Path, decoder: &AggregationDecoder) -> Result<Payload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{:?} is not valid JSON", path))?;
    decode_payload(value, decoder).with_context(|| format!("Failed to decode {:?}", path))
}

pub fn decode_payload(value: Value, decoder: &AggregationDecoder) -> Result<Payload> {
    let payload = match value {
        Value::Array(_) => Payload::Aggregations(decoder.decode_all(value)?),
        Value::Object(ref fields) if fields.contains_key("type") => {
            Payload::Aggregation(Box::new(decoder.decode(value)?))
        }
        Value::Object(_) if is_notices_response(&value) => {
            Payload::Notices(Box::new(decoder.decode_notices_response(value)?))
        }
        Value::Object(_) => Payload::Response(Box::new(decoder.decode_query_response(value)?)),
        other => anyhow::bail!("Expected a JSON object or array, found {}", other),
    };
    Ok(payload)
}

/// Notice documents carry a `notices` list or an ingestion status `code`.
fn is_notices_response(value: &Value) -> bool {
    value
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .any(|r| r.get("notices").is_some() || r.get("code").is_some())
        })
        .unwrap_or(false)
}
