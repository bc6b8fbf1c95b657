//! Declarative per-entity metadata.
//!
//! One generic engine, N small config objects: each entity module declares a
//! static [`EntityMetadata`] describing its table, column kinds, searchable
//! columns, sort aliases, per-role field allow-lists, audit-column flags,
//! and dependent relationships. The query parser, field policy, repository,
//! and integrity checker are all driven by this table.

use crate::fields::Role;

/// Storage type of a column, used to parse filter values safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

impl ColumnKind {
    /// Range (`_min` / `_max`) filters only apply to ordered scalar kinds.
    pub const fn supports_range(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Timestamp)
    }
}

/// A persisted column and its kind.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// A table that holds foreign keys pointing at this entity.
///
/// `cascade: true` means dependent rows are removed by the storage layer
/// (`ON DELETE CASCADE`) and are reported but do not block deletion.
#[derive(Debug, Clone, Copy)]
pub struct DependentRef {
    pub table: &'static str,
    pub column: &'static str,
    pub cascade: bool,
}

/// Static description of one entity, consumed by the generic engine.
#[derive(Debug, Clone, Copy)]
pub struct EntityMetadata {
    /// Human-readable entity name used in errors and logs.
    pub entity: &'static str,
    /// Backing table name.
    pub table: &'static str,
    /// Primary key column.
    pub primary_key: &'static str,
    /// Every persisted column with its kind.
    pub columns: &'static [Column],
    /// Columns matched by free-text search (`ILIKE`).
    pub searchable: &'static [&'static str],
    /// Caller-facing sort names that map to a different column.
    pub sort_aliases: &'static [(&'static str, &'static str)],
    /// Column used for the implicit `DESC` sort when none is requested.
    pub default_sort_column: &'static str,
    /// Field allow-list for unauthenticated callers.
    pub public_fields: &'static [&'static str],
    /// Field allow-list for authenticated users.
    pub user_fields: &'static [&'static str],
    /// Field allow-list for administrators.
    pub admin_fields: &'static [&'static str],
    pub has_created_at: bool,
    pub has_updated_at: bool,
    pub has_created_by: bool,
    pub has_updated_by: bool,
    /// Tables to probe before a delete.
    pub dependents: &'static [DependentRef],
}

impl EntityMetadata {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `name` is a persisted column.
    pub fn is_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Resolve a caller-supplied sort field to a real column.
    ///
    /// Direct column names win, then the alias table; anything else falls
    /// back to the primary key so ordering is never silently dropped.
    pub fn resolve_sort_column(&self, name: &str) -> &'static str {
        if let Some(col) = self.column(name) {
            return col.name;
        }
        self.sort_aliases
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, col)| *col)
            .unwrap_or(self.primary_key)
    }

    /// Field allow-list for a role.
    pub fn allow_list(&self, role: Role) -> &'static [&'static str] {
        match role {
            Role::Public => self.public_fields,
            Role::User => self.user_fields,
            Role::Admin => self.admin_fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
