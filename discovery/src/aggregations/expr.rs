//! Request-side aggregation expressions.
//!
//! The query `aggregation` parameter is a small expression language:
//! `type(arg,arg,...)` terms chained with `.` to nest one aggregation inside
//! another, e.g. `nested(enriched_text.entities).term(enriched_text.entities.text,count:10)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Histogram,
    Max,
    Min,
    Average,
    Sum,
    Term,
    Filter,
    Nested,
    Timeslice,
    TopHits,
    UniqueCount,
}

impl AggregationType {
    pub const ALL: [AggregationType; 11] = [
        Self::Histogram,
        Self::Max,
        Self::Min,
        Self::Average,
        Self::Sum,
        Self::Term,
        Self::Filter,
        Self::Nested,
        Self::Timeslice,
        Self::TopHits,
        Self::UniqueCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Max => "max",
            Self::Min => "min",
            Self::Average => "average",
            Self::Sum => "sum",
            Self::Term => "term",
            Self::Filter => "filter",
            Self::Nested => "nested",
            Self::Timeslice => "timeslice",
            Self::TopHits => "top_hits",
            Self::UniqueCount => "unique_count",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::InvalidAggregationType(s.to_string()))
    }
}

/// Operators of the Discovery query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    OpeningGrouping,
    ClosingGrouping,
    And,
    Or,
    NestAggregation,
    Contains,
    Matches,
    DoesNotContain,
    DoesNotMatch,
    Not,
    GreaterThan,
    LessThan,
    GreaterThanOrEquals,
    LessThanOrEquals,
    Boost,
    Fuzzy,
    Wildcard,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::OpeningGrouping => "(",
            Self::ClosingGrouping => ")",
            Self::And => ",",
            Self::Or => "|",
            Self::NestAggregation => ".",
            Self::Contains => ":",
            Self::Matches => "::",
            Self::DoesNotContain => ":!",
            Self::DoesNotMatch => "::!",
            Self::Not => "!",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEquals => ">=",
            Self::LessThanOrEquals => "<=",
            Self::Boost => "^",
            Self::Fuzzy => "~",
            Self::Wildcard => "*",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Stage {
    kind: AggregationType,
    args: Vec<String>,
}

/// A chain of aggregation terms, rendered with `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationExpr {
    stages: Vec<Stage>,
}

impl AggregationExpr {
    pub fn new<I, S>(kind: AggregationType, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stages: vec![Stage {
                kind,
                args: args.into_iter().map(Into::into).collect(),
            }],
        }
    }

    pub fn term(field: &str) -> Self {
        Self::new(AggregationType::Term, [field])
    }

    /// `term(field,count:N)`
    pub fn term_with_count(field: &str, count: u64) -> Self {
        Self::new(
            AggregationType::Term,
            [field.to_string(), format!("count{}{}", Operator::Contains, count)],
        )
    }

    pub fn histogram(field: &str, interval: i64) -> Self {
        Self::new(
            AggregationType::Histogram,
            [field.to_string(), interval.to_string()],
        )
    }

    pub fn filter(expression: &str) -> Self {
        Self::new(AggregationType::Filter, [expression])
    }

    pub fn nested(path: &str) -> Self {
        Self::new(AggregationType::Nested, [path])
    }

    /// `timeslice(field,interval[,time_zone])`
    pub fn timeslice(field: &str, interval: &str, time_zone: Option<&str>) -> Self {
        let mut args = vec![field.to_string(), interval.to_string()];
        if let Some(tz) = time_zone {
            args.push(tz.to_string());
        }
        Self::new(AggregationType::Timeslice, args)
    }

    pub fn top_hits(size: u64) -> Self {
        Self::new(AggregationType::TopHits, [size.to_string()])
    }

    /// `max`, `min`, `average`, `sum` or `unique_count` over one field.
    pub fn calculation(kind: AggregationType, field: &str) -> Result<Self, Error> {
        match kind {
            AggregationType::Max
            | AggregationType::Min
            | AggregationType::Average
            | AggregationType::Sum
            | AggregationType::UniqueCount => Ok(Self::new(kind, [field])),
            other => Err(Error::InvalidAggregationType(format!(
                "{} is not a calculation",
                other
            ))),
        }
    }

    /// Nest `child` inside the innermost term of this chain.
    pub fn nest(mut self, child: AggregationExpr) -> Self {
        self.stages.extend(child.stages);
        self
    }

    /// Aggregation types in the chain, outermost first.
    pub fn kinds(&self) -> impl Iterator<Item = AggregationType> + '_ {
        self.stages.iter().map(|s| s.kind)
    }
}

impl fmt::Display for AggregationExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Operator::NestAggregation)?;
            }
            write!(
                f,
                "{}{}{}{}",
                stage.kind,
                Operator::OpeningGrouping,
                stage.args.join(Operator::And.symbol()),
                Operator::ClosingGrouping
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_with_count() {
        assert_eq!(
            AggregationExpr::term_with_count("author", 10).to_string(),
            "term(author,count:10)"
        );
    }

    #[test]
    fn test_histogram() {
        assert_eq!(
            AggregationExpr::histogram("price", 5).to_string(),
            "histogram(price,5)"
        );
    }

    #[test]
    fn test_nested_then_term() {
        let expr = AggregationExpr::nested("enriched_text.entities")
            .nest(AggregationExpr::term("enriched_text.entities.text"));
        assert_eq!(
            expr.to_string(),
            "nested(enriched_text.entities).term(enriched_text.entities.text)"
        );
        assert_eq!(
            expr.kinds().collect::<Vec<_>>(),
            vec![AggregationType::Nested, AggregationType::Term]
        );
    }

    #[test]
    fn test_timeslice_with_and_without_zone() {
        assert_eq!(
            AggregationExpr::timeslice("time", "1day", Some("EST")).to_string(),
            "timeslice(time,1day,EST)"
        );
        assert_eq!(
            AggregationExpr::timeslice("time", "1day", None).to_string(),
            "timeslice(time,1day)"
        );
    }

    #[test]
    fn test_filter_and_top_hits_chain() {
        let expr = AggregationExpr::filter("enriched_text.sentiment.document.label::positive")
            .nest(AggregationExpr::top_hits(3));
        assert_eq!(
            expr.to_string(),
            "filter(enriched_text.sentiment.document.label::positive).top_hits(3)"
        );
    }

    #[test]
    fn test_calculation_rejects_bucket_types() {
        assert_eq!(
            AggregationExpr::calculation(AggregationType::Sum, "price")
                .unwrap()
                .to_string(),
            "sum(price)"
        );
        assert!(AggregationExpr::calculation(AggregationType::Term, "price").is_err());
    }

    #[test]
    fn test_aggregation_type_names_round_trip() {
        for kind in AggregationType::ALL {
            assert_eq!(kind.name().parse::<AggregationType>().unwrap(), kind);
        }
        assert!(matches!(
            "frobnicate".parse::<AggregationType>(),
            Err(Error::InvalidAggregationType(_))
        ));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::Matches.to_string(), "::");
        assert_eq!(Operator::DoesNotContain.to_string(), ":!");
        assert_eq!(Operator::GreaterThanOrEquals.to_string(), ">=");
    }
}
