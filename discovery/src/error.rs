use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed aggregation at {path}: {reason}")]
    MalformedAggregation { path: String, reason: String },

    #[error("Unknown aggregation type '{type_name}' at {path}")]
    UnknownAggregationType { path: String, type_name: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid aggregation type: {0}")]
    InvalidAggregationType(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAggregation {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised while decoding aggregation payloads.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedAggregation { .. }
                | Self::UnknownAggregationType { .. }
                | Self::MalformedResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
