//! Pre-delete referential-integrity verification.
//!
//! Probes every dependent table declared in an entity's metadata for rows
//! referencing the delete target and classifies each as cascading or
//! blocking. Cascade execution is not performed here: tables flagged
//! `cascade: true` are expected to carry `ON DELETE CASCADE` constraints at
//! the storage layer.

use sqlx::PgPool;

use stockroom_core::integrity::{DeleteCheck, Reference};
use stockroom_core::metadata::EntityMetadata;
use stockroom_core::types::DbId;

pub struct IntegrityChecker;

impl IntegrityChecker {
    /// Count referencing rows per dependent relationship and classify.
    ///
    /// The check and the eventual delete run as separate statements, so a
    /// blocking row inserted between them is not caught here (TOCTOU). The
    /// database's foreign-key constraints remain the authoritative guard;
    /// callers needing strict consistency must re-run the check inside the
    /// same transaction as the delete.
    pub async fn can_be_deleted(
        pool: &PgPool,
        meta: &EntityMetadata,
        id: DbId,
    ) -> Result<DeleteCheck, sqlx::Error> {
        let mut references = Vec::new();

        for dep in meta.dependents {
            let query = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = $1",
                dep.table, dep.column
            );
            let count: (i64,) = sqlx::query_as(&query).bind(id).fetch_one(pool).await?;

            if count.0 > 0 {
                references.push(Reference {
                    table: dep.table,
                    field: dep.column,
                    count: count.0,
                    cascade: dep.cascade,
                });
            }
        }

        Ok(DeleteCheck::from_references(references))
    }
}
