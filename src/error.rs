use thiserror::Error;

/// Errors surfaced by the computation layer.
///
/// Market-data failures never appear here: the quote resolver absorbs them
/// into a degraded [`crate::market::Quote`] instead (see `QuoteSource`).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad numeric or range input, rejected before any computation runs.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}
