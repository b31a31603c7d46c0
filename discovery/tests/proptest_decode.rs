//! Property-based tests over randomly shaped aggregation trees.
//!
//! Generates nested aggregation payloads mixing every known discriminator
//! with unknown ones and checks that decoding is deterministic, that nesting
//! depth survives decoding, and that re-encoding a decoded tree decodes back
//! to the same tree.

use discovery::aggregations::known_types;
use discovery::{AggregationDecoder, Error};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn field_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}"
}

/// Discriminators that are guaranteed not to be in the decoder's table.
fn unknown_type() -> impl Strategy<Value = String> {
    "x_[a-z]{1,8}"
}

/// Quarter steps keep calculation values exact through JSON.
fn metric_value() -> impl Strategy<Value = f64> {
    (0u32..40_000).prop_map(|v| v as f64 / 4.0)
}

/// A childless aggregation object.
fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        (field_name(), 1u64..100, 0u64..1000).prop_map(|(field, count, matching)| json!({
            "type": "term",
            "field": field,
            "count": count,
            "matching_results": matching,
            "results": [{"key": "k", "matching_results": matching}]
        })),
        (field_name(), 1i64..500).prop_map(|(field, interval)| json!({
            "type": "histogram",
            "field": field,
            "interval": interval,
            "results": [{"key": 0, "matching_results": 1}, {"key": interval, "matching_results": 2}]
        })),
        (field_name(), any::<bool>()).prop_map(|(field, anomaly)| json!({
            "type": "timeslice",
            "field": field,
            "interval": "1day",
            "anomaly": anomaly,
            "results": [{"key": 1533513600000_i64, "key_as_string": "2018-08-06T00:00:00.000Z", "matching_results": 3}]
        })),
        (1u64..10).prop_map(|size| json!({
            "type": "top_hits",
            "size": size,
            "hits": {"matching_results": size, "hits": [{"id": "doc"}]}
        })),
        (
            prop::sample::select(vec!["max", "min", "average", "sum", "unique_count"]),
            field_name(),
            metric_value()
        )
            .prop_map(|(kind, field, value)| json!({"type": kind, "field": field, "value": value})),
        (unknown_type(), 0u64..50).prop_map(|(kind, matching)| json!({
            "type": kind,
            "matching_results": matching
        })),
    ]
}

/// An aggregation tree paired with its expected depth.
fn tree() -> impl Strategy<Value = (Value, usize)> {
    leaf()
        .prop_map(|v| (v, 1))
        .prop_recursive(4, 32, 4, |inner| {
            (
                prop::sample::select(vec!["filter", "nested", "term", "x_container"]),
                field_name(),
                prop::collection::vec(inner, 1..4),
            )
                .prop_map(|(kind, target, children)| {
                    let depth = 1 + children.iter().map(|(_, d)| *d).max().unwrap_or(0);
                    let mut obj = Map::new();
                    obj.insert("type".into(), json!(kind));
                    match kind {
                        "filter" => {
                            obj.insert("match".into(), json!(format!("{}:value", target)));
                        }
                        "nested" => {
                            obj.insert("path".into(), json!(target));
                        }
                        "term" => {
                            obj.insert("field".into(), json!(target));
                        }
                        _ => {}
                    }
                    obj.insert(
                        "aggregations".into(),
                        Value::Array(children.into_iter().map(|(v, _)| v).collect()),
                    );
                    (Value::Object(obj), depth)
                })
        })
}

fn contains_unknown(value: &Value) -> bool {
    let own = value["type"]
        .as_str()
        .map(|t| !known_types().any(|k| k == t))
        .unwrap_or(false);
    own || value["aggregations"]
        .as_array()
        .map(|children| children.iter().any(contains_unknown))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_decoding_is_deterministic((value, _) in tree()) {
        let decoder = AggregationDecoder::lenient();
        let first = decoder.decode(value.clone()).unwrap();
        let second = decoder.decode(value).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_depth_is_preserved((value, depth) in tree()) {
        let agg = AggregationDecoder::lenient().decode(value).unwrap();
        prop_assert_eq!(agg.depth(), depth);
    }

    #[test]
    fn test_reencoded_tree_decodes_to_itself((value, _) in tree()) {
        let decoder = AggregationDecoder::lenient();
        let decoded = decoder.decode(value).unwrap();
        let reencoded = serde_json::to_value(&decoded).unwrap();
        prop_assert_eq!(decoder.decode(reencoded).unwrap(), decoded);
    }

    #[test]
    fn test_strict_fails_only_on_unknown((value, _) in tree()) {
        let result = AggregationDecoder::strict().decode(value.clone());
        if contains_unknown(&value) {
            let is_unknown_type_error = matches!(result, Err(Error::UnknownAggregationType { .. }));
            prop_assert!(is_unknown_type_error);
        } else {
            prop_assert_eq!(result.unwrap(), AggregationDecoder::lenient().decode(value).unwrap());
        }
    }
}
