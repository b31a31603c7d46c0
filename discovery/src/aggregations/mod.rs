//! Aggregation results and the `type`-keyed decoder that builds them.
//!
//! Supported discriminators:
//! - `term`, `filter`, `histogram`, `nested`, `timeslice`, `top_hits`
//! - `max` / `min` / `average` / `sum` / `unique_count` (one calculation shape)
//!
//! Anything else decodes to [`QueryAggregation::Generic`] under the default
//! lenient policy.

mod decoder;
mod expr;
mod types;

pub use decoder::{known_types, AggregationDecoder, UnknownTypePolicy};
pub use expr::{AggregationExpr, AggregationType, Operator};
pub use types::{
    AggregationResult, Bucket, CalculationAggregation, CalculationKind, FilterAggregation,
    GenericAggregation, HistogramAggregation, HistogramResult, NestedAggregation,
    QueryAggregation, TermAggregation, TermResult, TimesliceAggregation, TimesliceResult,
    TopHitsAggregation, TopHitsResults,
};
