//! Referential-integrity report types.
//!
//! The database-facing checker lives in the `stockroom-db` crate; the
//! classification rule is pure and lives here so it can be tested without a
//! connection.

use serde::Serialize;

/// One dependent table holding rows that reference the delete target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub table: &'static str,
    pub field: &'static str,
    pub count: i64,
    pub cascade: bool,
}

/// Outcome of a pre-delete integrity probe.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteCheck {
    pub can_delete: bool,
    /// Every dependent relationship with at least one referencing row,
    /// cascading ones included.
    pub blocked_by: Vec<Reference>,
}

impl DeleteCheck {
    /// Classify a set of non-empty references: deletion is permitted only
    /// when there are no references at all or every one of them cascades.
    pub fn from_references(blocked_by: Vec<Reference>) -> Self {
        let can_delete = blocked_by.is_empty() || blocked_by.iter().all(|r| r.cascade);
        Self { can_delete, blocked_by }
    }

    /// The subset of references that actually block deletion.
    pub fn blocking(&self) -> Vec<Reference> {
        self.blocked_by.iter().filter(|r| !r.cascade).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
