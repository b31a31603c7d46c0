//! Query request parameters and response envelopes.

mod options;
mod response;

pub use options::QueryOptions;
pub use response::{
    DocumentRetrievalStrategy, Notice, NoticeSeverity, QueryNoticesResponse, QueryNoticesResult,
    QueryPassage, QueryResponse, QueryResult, QueryResultMetadata, RetrievalDetails,
};
