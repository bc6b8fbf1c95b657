use stockroom_core::error::CoreError;

/// Error type for the data-access layer.
///
/// Wraps [`CoreError`] for domain errors and `sqlx::Error` for storage
/// errors. Storage errors are propagated as-is (no masking, no automatic
/// retry); validation and business errors are recoverable by the caller
/// adjusting input.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A domain-level error from `stockroom_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for service and repository return values.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Whether this is a unique-constraint violation (PostgreSQL 23505 on a
    /// `uq_`-prefixed constraint), which the consuming layer maps to a
    /// conflict rather than an internal error.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
                    && db_err.constraint().is_some_and(|c| c.starts_with("uq_"))
            }
            _ => false,
        }
    }
}
