use crate::integrity::Reference;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed sort/filter/field syntax. Reported before any database
    /// access; the message names the offending parameter.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A per-entity business rule rejected the input (422-class).
    #[error("Business rule violated [{code}]: {message}")]
    BusinessRule {
        code: &'static str,
        message: String,
    },

    /// Delete blocked by non-cascading dependent rows. Carries the full
    /// blocking-reference list for client display.
    #[error("Cannot delete {entity}: referenced by dependent records")]
    ReferenceConflict {
        entity: &'static str,
        references: Vec<Reference>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
