//! Aggregation result shapes.
//!
//! Every element of an `aggregations` array decodes to one [`QueryAggregation`]
//! variant. All variants share the common fields `matching_results`, `results`
//! and `aggregations`; the rest depend on the discriminator.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{self, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::decoder::{AggregationDecoder, TYPE_FIELD};

/// Decoded aggregation: a closed union keyed by the wire `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAggregation {
    Term(TermAggregation),
    Filter(FilterAggregation),
    Histogram(HistogramAggregation),
    Nested(NestedAggregation),
    Timeslice(TimesliceAggregation),
    TopHits(TopHitsAggregation),
    Calculation(CalculationAggregation),
    /// Discriminator not known to this crate. Only the common fields are kept.
    Generic(GenericAggregation),
}

/// `term`: most frequent values of a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TermResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

/// `filter`: documents matching a filter expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterAggregation {
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_expr: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<AggregationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

/// `histogram`: numeric field bucketed by a fixed interval.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_i64"
    )]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<HistogramResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

/// `nested`: re-roots the sub-aggregations at a nested document path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<AggregationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

/// `timeslice`: date field bucketed by a calendar interval such as `1day`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesliceAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TimesliceResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

/// `top_hits`: the highest scoring documents of the enclosing bucket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopHitsAggregation {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<TopHitsResults>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<AggregationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopHitsResults {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(deserialize_with = "crate::de::null_as_empty")]
    pub hits: Vec<Map<String, Value>>,
}

/// Single-value metric: `max`, `min`, `average`, `sum` or `unique_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationAggregation {
    #[serde(rename = "type")]
    pub operation: CalculationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<AggregationResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    Max,
    Min,
    Average,
    Sum,
    UniqueCount,
}

impl CalculationKind {
    pub const ALL: [CalculationKind; 5] = [
        Self::Max,
        Self::Min,
        Self::Average,
        Self::Sum,
        Self::UniqueCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Average => "average",
            Self::Sum => "sum",
            Self::UniqueCount => "unique_count",
        }
    }
}

/// Fallback shape for discriminators this crate does not model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericAggregation {
    #[serde(rename = "type")]
    pub aggregation_type: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<AggregationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

// ---------------------------------------------------------------------------
// Result buckets
// ---------------------------------------------------------------------------

/// Read access shared by every result bucket type.
pub trait Bucket {
    /// Printable bucket key.
    fn key_label(&self) -> String;
    fn matching_results(&self) -> Option<u64>;
    fn aggregations(&self) -> &[QueryAggregation];
}

/// Untyped result entry used by variants without a dedicated bucket shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermResult {
    #[serde(
        deserialize_with = "deserialize_scalar_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub key: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub matching_results: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevancy: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub total_matching_documents: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::de::whole_u64"
    )]
    pub estimated_matching_documents: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramResult {
    /// Lower bound of the bucket.
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesliceResult {
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
    pub anomaly: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<QueryAggregation>,
}

impl TimesliceResult {
    /// Bucket start as a UTC timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.key
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

impl Bucket for AggregationResult {
    fn key_label(&self) -> String {
        match &self.key {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        }
    }

    fn matching_results(&self) -> Option<u64> {
        self.matching_results
    }

    fn aggregations(&self) -> &[QueryAggregation] {
        &self.aggregations
    }
}

impl Bucket for TermResult {
    fn key_label(&self) -> String {
        self.key.clone().unwrap_or_else(|| "-".to_string())
    }

    fn matching_results(&self) -> Option<u64> {
        self.matching_results
    }

    fn aggregations(&self) -> &[QueryAggregation] {
        &self.aggregations
    }
}

impl Bucket for HistogramResult {
    fn key_label(&self) -> String {
        self.key
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    fn matching_results(&self) -> Option<u64> {
        self.matching_results
    }

    fn aggregations(&self) -> &[QueryAggregation] {
        &self.aggregations
    }
}

impl Bucket for TimesliceResult {
    fn key_label(&self) -> String {
        if let Some(s) = &self.key_as_string {
            return s.clone();
        }
        match self.timestamp() {
            Some(ts) => ts.to_rfc3339(),
            None => "-".to_string(),
        }
    }

    fn matching_results(&self) -> Option<u64> {
        self.matching_results
    }

    fn aggregations(&self) -> &[QueryAggregation] {
        &self.aggregations
    }
}

/// Term keys are strings on the wire, but numeric and boolean fields come back
/// as bare scalars.
fn deserialize_scalar_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a scalar bucket key, found {}",
            other
        ))),
    }
}

// ---------------------------------------------------------------------------
// QueryAggregation accessors
// ---------------------------------------------------------------------------

impl QueryAggregation {
    /// Wire discriminator of this aggregation.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Term(_) => "term",
            Self::Filter(_) => "filter",
            Self::Histogram(_) => "histogram",
            Self::Nested(_) => "nested",
            Self::Timeslice(_) => "timeslice",
            Self::TopHits(_) => "top_hits",
            Self::Calculation(c) => c.operation.as_str(),
            Self::Generic(g) => &g.aggregation_type,
        }
    }

    /// False for [`QueryAggregation::Generic`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Generic(_))
    }

    pub fn matching_results(&self) -> Option<u64> {
        match self {
            Self::Term(a) => a.matching_results,
            Self::Filter(a) => a.matching_results,
            Self::Histogram(a) => a.matching_results,
            Self::Nested(a) => a.matching_results,
            Self::Timeslice(a) => a.matching_results,
            Self::TopHits(a) => a.matching_results,
            Self::Calculation(a) => a.matching_results,
            Self::Generic(a) => a.matching_results,
        }
    }

    /// Aggregation-level children, in server order.
    pub fn aggregations(&self) -> &[QueryAggregation] {
        match self {
            Self::Term(a) => &a.aggregations,
            Self::Filter(a) => &a.aggregations,
            Self::Histogram(a) => &a.aggregations,
            Self::Nested(a) => &a.aggregations,
            Self::Timeslice(a) => &a.aggregations,
            Self::TopHits(a) => &a.aggregations,
            Self::Calculation(a) => &a.aggregations,
            Self::Generic(a) => &a.aggregations,
        }
    }

    /// Result buckets, in server order.
    pub fn buckets(&self) -> Vec<&dyn Bucket> {
        fn erase<B: Bucket>(items: &[B]) -> Vec<&dyn Bucket> {
            items.iter().map(|b| b as &dyn Bucket).collect()
        }

        match self {
            Self::Term(a) => erase(&a.results),
            Self::Filter(a) => erase(&a.results),
            Self::Histogram(a) => erase(&a.results),
            Self::Nested(a) => erase(&a.results),
            Self::Timeslice(a) => erase(&a.results),
            Self::TopHits(a) => erase(&a.results),
            Self::Calculation(a) => erase(&a.results),
            Self::Generic(a) => erase(&a.results),
        }
    }

    /// Field, path or filter expression the aggregation operates on.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Term(a) => a.field.as_deref(),
            Self::Filter(a) => a.match_expr.as_deref(),
            Self::Histogram(a) => a.field.as_deref(),
            Self::Nested(a) => a.path.as_deref(),
            Self::Timeslice(a) => a.field.as_deref(),
            Self::TopHits(_) | Self::Generic(_) => None,
            Self::Calculation(a) => a.field.as_deref(),
        }
    }

    /// Optional user-assigned name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Term(a) => a.name.as_deref(),
            Self::Histogram(a) => a.name.as_deref(),
            Self::Timeslice(a) => a.name.as_deref(),
            Self::TopHits(a) => a.name.as_deref(),
            _ => None,
        }
    }

    /// Every directly nested aggregation: first the aggregation-level
    /// children, then those of each bucket.
    pub fn children(&self) -> impl Iterator<Item = &QueryAggregation> + '_ {
        self.aggregations().iter().chain(
            self.buckets()
                .into_iter()
                .flat_map(|bucket| bucket.aggregations().iter()),
        )
    }

    /// Depth-first, pre-order traversal. The root is visited at depth 0.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a QueryAggregation, usize),
    {
        self.walk_at(0, visit);
    }

    fn walk_at<'a, F>(&'a self, depth: usize, visit: &mut F)
    where
        F: FnMut(&'a QueryAggregation, usize),
    {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Number of levels in the tree rooted here; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map(|c| c.depth()).max().unwrap_or(0)
    }
}

impl fmt::Display for QueryAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())?;
        if let Some(target) = self.target() {
            write!(f, "({})", target)?;
        }
        if let Some(name) = self.name() {
            write!(f, " as {}", name)?;
        }

        match self {
            Self::Term(a) => {
                if let Some(count) = a.count {
                    write!(f, " count={}", count)?;
                }
            }
            Self::Histogram(a) => {
                if let Some(interval) = a.interval {
                    write!(f, " interval={}", interval)?;
                }
            }
            Self::Timeslice(a) => {
                if let Some(interval) = &a.interval {
                    write!(f, " interval={}", interval)?;
                }
                if a.anomaly == Some(true) {
                    write!(f, " anomaly")?;
                }
            }
            Self::TopHits(a) => {
                if let Some(size) = a.size {
                    write!(f, " size={}", size)?;
                }
            }
            Self::Calculation(a) => {
                if let Some(value) = a.value {
                    write!(f, " value={}", value)?;
                }
            }
            Self::Filter(_) | Self::Nested(_) | Self::Generic(_) => {}
        }

        if let Some(n) = self.matching_results() {
            write!(f, ", {} matching", n)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// serde
// ---------------------------------------------------------------------------

impl Serialize for QueryAggregation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let body = match self {
            Self::Term(a) => serde_json::to_value(a),
            Self::Filter(a) => serde_json::to_value(a),
            Self::Histogram(a) => serde_json::to_value(a),
            Self::Nested(a) => serde_json::to_value(a),
            Self::Timeslice(a) => serde_json::to_value(a),
            Self::TopHits(a) => serde_json::to_value(a),
            Self::Calculation(a) => serde_json::to_value(a),
            Self::Generic(a) => serde_json::to_value(a),
        }
        .map_err(ser::Error::custom)?;

        let fields = match body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(TYPE_FIELD, self.type_name())?;
        for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != TYPE_FIELD) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Decodes with the lenient policy. Use [`AggregationDecoder`] directly to
/// reject unknown discriminators.
impl<'de> Deserialize<'de> for QueryAggregation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        AggregationDecoder::lenient()
            .decode(value)
            .map_err(de::Error::custom)
    }
}
