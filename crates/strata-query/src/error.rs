//! Error types for query chain construction

use thiserror::Error;

/// Misuse of the term chain builder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A term was appended without any term text
    #[error("Term text is required")]
    MissingTerm,

    /// A term was appended without a relationship name
    #[error("Relationship name is required for term '{0}'")]
    MissingRelationship(String),

    /// A factory was attached before any term was appended
    #[error("Cannot attach a factory to an empty query chain")]
    NoTerm,
}

/// Result type for query chain operations
pub type QueryResult<T> = Result<T, QueryError>;
