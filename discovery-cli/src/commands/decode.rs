use anyhow::Result;
use serde_json::Value;
use std::path::Path;

use discovery::AggregationDecoder;

use super::input::{load_payload, Payload};

/// Decode a saved payload and print its typed form as JSON
pub fn run_decode(path: &Path, decoder: &AggregationDecoder, pretty: bool) -> Result<()> {
    let payload = load_payload(path, decoder)?;
    let value = to_json(&payload)?;

    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", output);
    Ok(())
}

/// Typed form of a payload, with the same top-level shape as the input.
pub fn to_json(payload: &Payload) -> Result<Value> {
    let value = match payload {
        Payload::Response(response) => serde_json::to_value(response)?,
        Payload::Notices(response) => serde_json::to_value(response)?,
        Payload::Aggregation(agg) => serde_json::to_value(agg)?,
        Payload::Aggregations(aggs) => serde_json::to_value(aggs)?,
    };
    Ok(value)
}
