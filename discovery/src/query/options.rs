//! Query request parameters.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::aggregations::AggregationExpr;
use crate::error::Result;

/// Parameters of a collection query.
///
/// `environment_id` and `collection_id` are path parameters and are not part
/// of the request body. Unset options are left out of the body so the service
/// applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOptions {
    #[serde(skip)]
    pub environment_id: String,
    #[serde(skip)]
    pub collection_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_language_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passages: Option<bool>,
    /// Aggregation expression, see [`AggregationExpr`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(
        rename = "return",
        serialize_with = "comma_joined",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub return_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(serialize_with = "comma_joined", skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    #[serde(
        rename = "passages.fields",
        serialize_with = "comma_joined",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub passages_fields: Vec<String>,
    #[serde(rename = "passages.count", skip_serializing_if = "Option::is_none")]
    pub passages_count: Option<u64>,
    #[serde(rename = "passages.characters", skip_serializing_if = "Option::is_none")]
    pub passages_characters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicate: Option<bool>,
    #[serde(rename = "deduplicate.field", skip_serializing_if = "Option::is_none")]
    pub deduplicate_field: Option<String>,
    #[serde(serialize_with = "comma_joined", skip_serializing_if = "Vec::is_empty")]
    pub collection_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar: Option<bool>,
    #[serde(
        rename = "similar.document_ids",
        serialize_with = "comma_joined",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub similar_document_ids: Vec<String>,
    #[serde(
        rename = "similar.fields",
        serialize_with = "comma_joined",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub similar_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spelling_suggestions: Option<bool>,
}

impl QueryOptions {
    pub fn new(environment_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            collection_id: collection_id.into(),
            ..Default::default()
        }
    }

    /// Set the aggregation parameter from a composed expression.
    pub fn with_aggregation(mut self, expr: &AggregationExpr) -> Self {
        self.aggregation = Some(expr.to_string());
        self
    }

    /// Path of the query endpoint, relative to the service URL.
    pub fn endpoint_path(&self) -> String {
        format!(
            "/v1/environments/{}/collections/{}/query",
            self.environment_id, self.collection_id
        )
    }

    /// JSON request body.
    pub fn to_body(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn comma_joined<S>(values: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&values.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_options_serialize_to_empty_body() {
        let options = QueryOptions::new("env", "coll");
        assert_eq!(options.to_body().unwrap(), json!({}));
    }

    #[test]
    fn test_dotted_keys_and_joined_lists() {
        let options = QueryOptions {
            natural_language_query: Some("who wrote it".to_string()),
            return_fields: vec!["title".to_string(), "author".to_string()],
            passages_fields: vec!["text".to_string()],
            passages_count: Some(5),
            deduplicate_field: Some("title".to_string()),
            similar_document_ids: vec!["a".to_string(), "b".to_string()],
            ..QueryOptions::new("env", "coll")
        };
        assert_eq!(
            options.to_body().unwrap(),
            json!({
                "natural_language_query": "who wrote it",
                "return": "title,author",
                "passages.fields": "text",
                "passages.count": 5,
                "deduplicate.field": "title",
                "similar.document_ids": "a,b"
            })
        );
    }

    #[test]
    fn test_with_aggregation_and_path() {
        let options = QueryOptions::new("env-1", "coll-2")
            .with_aggregation(&AggregationExpr::term_with_count("author", 10));
        assert_eq!(options.aggregation.as_deref(), Some("term(author,count:10)"));
        assert_eq!(
            options.endpoint_path(),
            "/v1/environments/env-1/collections/coll-2/query"
        );
        let body = options.to_body().unwrap();
        assert!(body.get("environment_id").is_none());
        assert_eq!(body["aggregation"], "term(author,count:10)");
    }
}
