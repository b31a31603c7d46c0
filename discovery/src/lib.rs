//! Typed query model for the Watson Discovery API.
//!
//! The service returns aggregation results as one heterogeneous JSON array in
//! which every element names its own shape through a `type` field. This crate
//! turns those arrays into a closed [`QueryAggregation`] sum type, recursively,
//! and models the response envelopes that carry them.
//!
//! # Decoding
//!
//! ```
//! use discovery::{AggregationDecoder, QueryAggregation};
//! use serde_json::json;
//!
//! let agg = AggregationDecoder::default()
//!     .decode(json!({"type": "term", "field": "author", "count": 42, "results": []}))
//!     .unwrap();
//!
//! match agg {
//!     QueryAggregation::Term(term) => {
//!         assert_eq!(term.field.as_deref(), Some("author"));
//!         assert_eq!(term.count, Some(42));
//!     }
//!     other => panic!("unexpected variant: {}", other.type_name()),
//! }
//! ```
//!
//! Unknown discriminators fall back to [`QueryAggregation::Generic`] unless the
//! decoder is built with [`UnknownTypePolicy::Strict`].

pub mod aggregations;
pub mod config;
mod de;
pub mod error;
pub mod metrics;
pub mod query;

pub use aggregations::{
    AggregationDecoder, AggregationExpr, AggregationType, QueryAggregation, UnknownTypePolicy,
};
pub use config::Config;
pub use error::{Error, Result};
pub use query::{QueryNoticesResponse, QueryOptions, QueryResponse};
