//! Discriminator-driven decoding of aggregation payloads.
//!
//! Dispatch is a single lookup of the `type` string in [`DISCRIMINATORS`].
//! Each constructor pulls the nested `aggregations` arrays (at aggregation and
//! bucket level) out of the JSON object and decodes them recursively with the
//! same decoder, then binds the remaining keys to the variant's fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::types::*;
use crate::error::{Error, Result};
use crate::query::{QueryNoticesResponse, QueryResponse};

pub(crate) const TYPE_FIELD: &str = "type";
const AGGREGATIONS_FIELD: &str = "aggregations";
const RESULTS_FIELD: &str = "results";
const ROOT_PATH: &str = "$";

/// What to do with a `type` value that is not in the discriminator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTypePolicy {
    /// Decode to [`QueryAggregation::Generic`] with the common fields.
    #[default]
    Lenient,
    /// Fail with [`Error::UnknownAggregationType`].
    Strict,
}

impl fmt::Display for UnknownTypePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for UnknownTypePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown policy '{}', expected 'lenient' or 'strict'",
                other
            )),
        }
    }
}

type Constructor = fn(&AggregationDecoder, Map<String, Value>, &str) -> Result<QueryAggregation>;

/// Discriminator string to variant constructor.
const DISCRIMINATORS: &[(&str, Constructor)] = &[
    ("term", AggregationDecoder::decode_variant::<TermAggregation>),
    ("filter", AggregationDecoder::decode_variant::<FilterAggregation>),
    ("histogram", AggregationDecoder::decode_variant::<HistogramAggregation>),
    ("nested", AggregationDecoder::decode_variant::<NestedAggregation>),
    ("timeslice", AggregationDecoder::decode_variant::<TimesliceAggregation>),
    ("top_hits", AggregationDecoder::decode_variant::<TopHitsAggregation>),
    ("max", AggregationDecoder::decode_variant::<CalculationAggregation>),
    ("min", AggregationDecoder::decode_variant::<CalculationAggregation>),
    ("average", AggregationDecoder::decode_variant::<CalculationAggregation>),
    ("sum", AggregationDecoder::decode_variant::<CalculationAggregation>),
    ("unique_count", AggregationDecoder::decode_variant::<CalculationAggregation>),
];

/// Discriminator strings with a dedicated variant.
pub fn known_types() -> impl Iterator<Item = &'static str> {
    DISCRIMINATORS.iter().map(|(name, _)| *name)
}

fn lookup(type_name: &str) -> Option<Constructor> {
    DISCRIMINATORS
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, ctor)| *ctor)
}

/// Converts decoded JSON into [`QueryAggregation`] trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationDecoder {
    policy: UnknownTypePolicy,
}

impl AggregationDecoder {
    pub fn new(policy: UnknownTypePolicy) -> Self {
        Self { policy }
    }

    pub fn lenient() -> Self {
        Self::new(UnknownTypePolicy::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(UnknownTypePolicy::Strict)
    }

    pub fn policy(&self) -> UnknownTypePolicy {
        self.policy
    }

    /// Decode one aggregation object.
    pub fn decode(&self, value: Value) -> Result<QueryAggregation> {
        self.decode_at(value, ROOT_PATH)
    }

    /// Decode a JSON array of aggregation objects, keeping their order.
    pub fn decode_all(&self, value: Value) -> Result<Vec<QueryAggregation>> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.decode_at(item, &format!("{}[{}]", ROOT_PATH, i)))
                .collect(),
            other => Err(Error::malformed(
                ROOT_PATH,
                format!("expected an array of aggregations, found {}", json_kind(&other)),
            )),
        }
    }

    /// Decode a query response, routing its aggregations through this decoder.
    pub fn decode_query_response(&self, value: Value) -> Result<QueryResponse> {
        let (fields, aggregations) = self.split_envelope(value)?;
        let mut response: QueryResponse = serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        response.aggregations = aggregations;
        Ok(response)
    }

    /// Decode a notices response, routing its aggregations through this decoder.
    pub fn decode_notices_response(&self, value: Value) -> Result<QueryNoticesResponse> {
        let (fields, aggregations) = self.split_envelope(value)?;
        let mut response: QueryNoticesResponse = serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        response.aggregations = aggregations;
        Ok(response)
    }

    fn split_envelope(
        &self,
        value: Value,
    ) -> Result<(Map<String, Value>, Vec<QueryAggregation>)> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::MalformedResponse(format!(
                    "expected an object, found {}",
                    json_kind(&other)
                )))
            }
        };
        let aggregations = self.take_aggregations(&mut fields, ROOT_PATH)?;
        Ok((fields, aggregations))
    }

    fn decode_at(&self, value: Value, path: &str) -> Result<QueryAggregation> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::malformed(
                    path,
                    format!("expected an object, found {}", json_kind(&other)),
                ))
            }
        };

        let type_name = match fields.get(TYPE_FIELD) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(Error::malformed(
                    path,
                    format!("`type` must be a string, found {}", json_kind(other)),
                ))
            }
            None => return Err(Error::malformed(path, "missing `type` field")),
        };

        match lookup(&type_name) {
            Some(ctor) => {
                tracing::debug!(path, aggregation_type = %type_name, "decoding aggregation");
                ctor(self, fields, path)
            }
            None => match self.policy {
                UnknownTypePolicy::Strict => Err(Error::UnknownAggregationType {
                    path: path.to_string(),
                    type_name,
                }),
                UnknownTypePolicy::Lenient => {
                    tracing::warn!(
                        path,
                        aggregation_type = %type_name,
                        "unknown aggregation type, keeping common fields only"
                    );
                    self.decode_variant::<GenericAggregation>(fields, path)
                }
            },
        }
    }

    fn decode_variant<V: Variant>(
        &self,
        mut fields: Map<String, Value>,
        path: &str,
    ) -> Result<QueryAggregation> {
        let aggregations = self.take_aggregations(&mut fields, path)?;
        let results = self.take_results::<V::Bucket>(&mut fields, path)?;
        let mut variant: V = bind(fields, path)?;
        variant.attach(results, aggregations);
        Ok(variant.into_aggregation())
    }

    fn take_aggregations(
        &self,
        fields: &mut Map<String, Value>,
        path: &str,
    ) -> Result<Vec<QueryAggregation>> {
        match fields.remove(AGGREGATIONS_FIELD) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    self.decode_at(item, &format!("{}.{}[{}]", path, AGGREGATIONS_FIELD, i))
                })
                .collect(),
            Some(other) => Err(Error::malformed(
                path,
                format!("`aggregations` must be an array, found {}", json_kind(&other)),
            )),
        }
    }

    fn take_results<B: BucketFields>(
        &self,
        fields: &mut Map<String, Value>,
        path: &str,
    ) -> Result<Vec<B>> {
        let items = match fields.remove(RESULTS_FIELD) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::malformed(
                    path,
                    format!("`results` must be an array, found {}", json_kind(&other)),
                ))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let bucket_path = format!("{}.{}[{}]", path, RESULTS_FIELD, i);
                let mut bucket_fields = match item {
                    Value::Object(map) => map,
                    other => {
                        return Err(Error::malformed(
                            &bucket_path,
                            format!("expected a result object, found {}", json_kind(&other)),
                        ))
                    }
                };
                let aggregations = self.take_aggregations(&mut bucket_fields, &bucket_path)?;
                let mut bucket: B = bind(bucket_fields, &bucket_path)?;
                bucket.set_aggregations(aggregations);
                Ok(bucket)
            })
            .collect()
    }
}

/// Bind the remaining keys of an object to a typed shape.
fn bind<T: DeserializeOwned>(fields: Map<String, Value>, path: &str) -> Result<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| Error::malformed(path, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Per-variant wiring
// ---------------------------------------------------------------------------

trait BucketFields: DeserializeOwned {
    fn set_aggregations(&mut self, aggregations: Vec<QueryAggregation>);
}

trait Variant: DeserializeOwned {
    type Bucket: BucketFields;

    fn attach(&mut self, results: Vec<Self::Bucket>, aggregations: Vec<QueryAggregation>);
    fn into_aggregation(self) -> QueryAggregation;
}

macro_rules! bucket_fields {
    ($($bucket:ty),* $(,)?) => {
        $(
            impl BucketFields for $bucket {
                fn set_aggregations(&mut self, aggregations: Vec<QueryAggregation>) {
                    self.aggregations = aggregations;
                }
            }
        )*
    };
}

bucket_fields!(AggregationResult, TermResult, HistogramResult, TimesliceResult);

macro_rules! variant {
    ($($shape:ty => $bucket:ty, $ctor:path);* $(;)?) => {
        $(
            impl Variant for $shape {
                type Bucket = $bucket;

                fn attach(&mut self, results: Vec<$bucket>, aggregations: Vec<QueryAggregation>) {
                    self.results = results;
                    self.aggregations = aggregations;
                }

                fn into_aggregation(self) -> QueryAggregation {
                    $ctor(self)
                }
            }
        )*
    };
}

variant! {
    TermAggregation => TermResult, QueryAggregation::Term;
    FilterAggregation => AggregationResult, QueryAggregation::Filter;
    HistogramAggregation => HistogramResult, QueryAggregation::Histogram;
    NestedAggregation => AggregationResult, QueryAggregation::Nested;
    TimesliceAggregation => TimesliceResult, QueryAggregation::Timeslice;
    TopHitsAggregation => AggregationResult, QueryAggregation::TopHits;
    CalculationAggregation => AggregationResult, QueryAggregation::Calculation;
    GenericAggregation => AggregationResult, QueryAggregation::Generic;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_table_entry_dispatches_to_its_own_type() {
        for type_name in known_types() {
            let agg = AggregationDecoder::strict()
                .decode(json!({"type": type_name}))
                .unwrap();
            assert_eq!(agg.type_name(), type_name);
            assert!(agg.is_known());
        }
    }

    #[test]
    fn test_calculation_types_share_one_variant() {
        for kind in CalculationKind::ALL {
            let agg = AggregationDecoder::default()
                .decode(json!({"type": kind.as_str(), "field": "price", "value": 4.5}))
                .unwrap();
            match agg {
                QueryAggregation::Calculation(c) => {
                    assert_eq!(c.operation, kind);
                    assert_eq!(c.field.as_deref(), Some("price"));
                    assert_eq!(c.value, Some(4.5));
                }
                other => panic!("Expected Calculation, got {}", other.type_name()),
            }
        }
    }

    #[test]
    fn test_default_policy_is_lenient() {
        assert_eq!(AggregationDecoder::default().policy(), UnknownTypePolicy::Lenient);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<UnknownTypePolicy>().unwrap(), UnknownTypePolicy::Strict);
        assert_eq!(" Lenient ".parse::<UnknownTypePolicy>().unwrap(), UnknownTypePolicy::Lenient);
        assert!("sometimes".parse::<UnknownTypePolicy>().is_err());
    }

    #[test]
    fn test_error_path_points_at_nested_bucket() {
        let err = AggregationDecoder::default()
            .decode(json!({
                "type": "term",
                "results": [
                    {"key": "a", "matching_results": 1},
                    {"key": "b", "aggregations": [{"type": 7}]}
                ]
            }))
            .unwrap_err();
        match err {
            Error::MalformedAggregation { path, reason } => {
                assert_eq!(path, "$.results[1].aggregations[0]");
                assert!(reason.contains("`type` must be a string"));
            }
            other => panic!("Expected MalformedAggregation, got {:?}", other),
        }
    }

    #[test]
    fn test_aggregations_not_an_array() {
        let err = AggregationDecoder::default()
            .decode(json!({"type": "filter", "aggregations": {"type": "term"}}))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAggregation { ref path, .. } if path == "$"));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = AggregationDecoder::default()
            .decode(json!({"type": "term", "count": "many"}))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAggregation { .. }));
    }

    #[test]
    fn test_null_nested_arrays_are_empty() {
        let agg = AggregationDecoder::default()
            .decode(json!({"type": "nested", "path": "enriched_text.entities", "results": null, "aggregations": null}))
            .unwrap();
        assert!(agg.aggregations().is_empty());
        assert!(agg.buckets().is_empty());
    }

    #[test]
    fn test_decode_all_requires_array() {
        let err = AggregationDecoder::default()
            .decode_all(json!({"type": "term"}))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAggregation { .. }));
    }

    #[test]
    fn test_decode_all_paths_are_indexed() {
        let err = AggregationDecoder::strict()
            .decode_all(json!([{"type": "term"}, {"type": "mystery"}]))
            .unwrap_err();
        match err {
            Error::UnknownAggregationType { path, type_name } => {
                assert_eq!(path, "$[1]");
                assert_eq!(type_name, "mystery");
            }
            other => panic!("Expected UnknownAggregationType, got {:?}", other),
        }
    }
}
