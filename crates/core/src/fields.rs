//! Role-scoped field projection.
//!
//! Given a caller's role and the fields they asked for, compute the set of
//! fields the response may contain. The returned set is always a subset of
//! the role's allow-list; requested fields outside it are dropped and
//! reported as policy violations for audit, never silently included.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::metadata::EntityMetadata;
use crate::types::DbId;

/// Caller role, supplied by the surrounding auth layer as an opaque string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Public,
    User,
    Admin,
}

impl Role {
    /// Parse a role string. Unknown roles resolve to [`Role::Public`]
    /// (fail-closed, never fail-open).
    pub fn parse(s: &str) -> Self {
        match s {
            "user" => Self::User,
            "admin" => Self::Admin,
            _ => Self::Public,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Public
    }
}

/// Request-scoped caller identity, used for audit fields and violation logs.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    pub role: Role,
    /// Authenticated user id, merged into `created_by` / `updated_by`.
    pub actor: Option<DbId>,
    /// Source address, recorded alongside policy violations.
    pub ip: Option<String>,
}

/// A requested field that the caller's role may not see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyViolation {
    pub entity: &'static str,
    pub field: String,
    pub role: Role,
}

/// Outcome of resolving a field request against a role's allow-list.
#[derive(Debug, Clone)]
pub struct FieldResolution {
    /// Columns the response may contain. Never empty.
    pub allowed: BTreeSet<String>,
    /// Requested-but-disallowed fields, for the caller to record.
    pub violations: Vec<PolicyViolation>,
}

/// Compute the projection for a list/get request.
///
/// - No requested fields: the role's full allow-list.
/// - Requested fields: `requested ∩ allowlist(role)`; everything dropped is
///   reported as a violation. An empty intersection falls back to the full
///   allow-list so the caller never receives a schema-less response.
pub fn resolve(
    requested: Option<&BTreeSet<String>>,
    role: Role,
    meta: &EntityMetadata,
) -> FieldResolution {
    let allow_list: BTreeSet<String> = meta
        .allow_list(role)
        .iter()
        .map(|f| (*f).to_string())
        .collect();

    let Some(requested) = requested.filter(|r| !r.is_empty()) else {
        return FieldResolution {
            allowed: allow_list,
            violations: Vec::new(),
        };
    };

    let mut allowed = BTreeSet::new();
    let mut violations = Vec::new();
    for field in requested {
        if allow_list.contains(field) {
            allowed.insert(field.clone());
        } else {
            violations.push(PolicyViolation {
                entity: meta.entity,
                field: field.clone(),
                role,
            });
        }
    }

    // Caller asked only for fields it may not see: fall back to the role's
    // default projection rather than returning nothing.
    if allowed.is_empty() {
        allowed = allow_list;
    }

    FieldResolution { allowed, violations }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Column, ColumnKind};

    const COLUMNS: &[Column] = &[
        Column { name: "id", kind: ColumnKind::Integer },
        Column { name: "name", kind: ColumnKind::Text },
        Column { name: "cost", kind: ColumnKind::Float },
        Column { name: "created_by", kind: ColumnKind::Integer },
    ];

    const META: EntityMetadata = EntityMetadata {
        entity: "Widget",
        table: "widgets",
        primary_key: "id",
        columns: COLUMNS,
        searchable: &["name"],
        sort_aliases: &[],
        default_sort_column: "id",
        public_fields: &["id", "name"],
        user_fields: &["id", "name", "cost"],
        admin_fields: &["id", "name", "cost", "created_by"],
        has_created_at: false,
        has_updated_at: false,
        has_created_by: true,
        has_updated_by: false,
        dependents: &[],
    };

    fn set(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|f| (*f).to_string()).collect()
    }

    // -- Role::parse ---------------------------------------------------------

    #[test]
    fn known_roles_parse() {
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("public"), Role::Public);
    }

    #[test]
    fn unknown_roles_fail_closed() {
        assert_eq!(Role::parse("superadmin"), Role::Public);
        assert_eq!(Role::parse("ADMIN"), Role::Public);
        assert_eq!(Role::parse(""), Role::Public);
    }

    // -- resolve -------------------------------------------------------------

    #[test]
    fn no_request_returns_full_allow_list() {
        let res = resolve(None, Role::User, &META);
        assert_eq!(res.allowed, set(&["id", "name", "cost"]));
        assert!(res.violations.is_empty());
    }

    #[test]
    fn empty_request_returns_full_allow_list() {
        let empty = BTreeSet::new();
        let res = resolve(Some(&empty), Role::Public, &META);
        assert_eq!(res.allowed, set(&["id", "name"]));
        assert!(res.violations.is_empty());
    }

    #[test]
    fn request_is_intersected_with_allow_list() {
        let req = set(&["id", "cost"]);
        let res = resolve(Some(&req), Role::Public, &META);
        assert_eq!(res.allowed, set(&["id"]));
        assert_eq!(res.violations.len(), 1);
        assert_eq!(res.violations[0].field, "cost");
    }

    #[test]
    fn disallowed_field_is_recorded_not_errored() {
        // Scenario: public caller asks for an admin-only column.
        let req = set(&["id", "created_by"]);
        let res = resolve(Some(&req), Role::Public, &META);
        assert_eq!(res.allowed, set(&["id"]));
        assert_eq!(
            res.violations,
            vec![PolicyViolation {
                entity: "Widget",
                field: "created_by".to_string(),
                role: Role::Public,
            }]
        );
    }

    #[test]
    fn empty_intersection_falls_back_to_allow_list() {
        let req = set(&["created_by", "cost"]);
        let res = resolve(Some(&req), Role::Public, &META);
        assert_eq!(res.allowed, set(&["id", "name"]));
        assert_eq!(res.violations.len(), 2);
    }

    #[test]
    fn adversarial_input_never_escapes_allow_list() {
        let req = set(&[
            "id; DROP TABLE widgets--",
            "created_by",
            "password",
            "name' OR '1'='1",
            "name",
        ]);
        for role in [Role::Public, Role::User, Role::Admin] {
            let res = resolve(Some(&req), role, &META);
            let allow: BTreeSet<String> =
                META.allow_list(role).iter().map(|f| (*f).to_string()).collect();
            assert!(res.allowed.is_subset(&allow), "role {role:?} escaped its allow-list");
        }
    }

    #[test]
    fn admin_sees_audit_columns() {
        let req = set(&["created_by"]);
        let res = resolve(Some(&req), Role::Admin, &META);
        assert_eq!(res.allowed, set(&["created_by"]));
        assert!(res.violations.is_empty());
    }
}
