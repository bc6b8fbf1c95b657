//! Category entity: the product classification tree's flat nodes.
//!
//! Categories carry no business rules, so the service uses
//! [`crate::service::DefaultHooks`].

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stockroom_core::metadata::{Column, ColumnKind, DependentRef, EntityMetadata};
use stockroom_core::patch::Patch;
use stockroom_core::types::{DbId, Timestamp};

use crate::repository::{push_patch, EntityDef, SqlValue, ToRow};

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for partially updating a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub is_active: Patch<bool>,
}

impl ToRow for CreateCategory {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = vec![("name", SqlValue::Text(Some(self.name.clone())))];
        if let Some(v) = &self.description {
            row.push(("description", SqlValue::Text(Some(v.clone()))));
        }
        if let Some(v) = self.is_active {
            row.push(("is_active", SqlValue::Boolean(Some(v))));
        }
        row
    }
}

impl ToRow for UpdateCategory {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = Vec::new();
        push_patch(&mut row, "name", &self.name, SqlValue::Text);
        push_patch(&mut row, "description", &self.description, SqlValue::Text);
        push_patch(&mut row, "is_active", &self.is_active, SqlValue::Boolean);
        row
    }
}

const CATEGORY_COLUMNS: &[Column] = &[
    Column { name: "id", kind: ColumnKind::Integer },
    Column { name: "name", kind: ColumnKind::Text },
    Column { name: "description", kind: ColumnKind::Text },
    Column { name: "is_active", kind: ColumnKind::Boolean },
    Column { name: "created_at", kind: ColumnKind::Timestamp },
    Column { name: "updated_at", kind: ColumnKind::Timestamp },
];

pub struct CategoryDef;

impl EntityDef for CategoryDef {
    type Row = Category;
    type Create = CreateCategory;
    type Update = UpdateCategory;

    const META: EntityMetadata = EntityMetadata {
        entity: "Category",
        table: "categories",
        primary_key: "id",
        columns: CATEGORY_COLUMNS,
        searchable: &["name", "description"],
        sort_aliases: &[("created", "created_at")],
        default_sort_column: "created_at",
        public_fields: &["id", "name", "description"],
        user_fields: &["id", "name", "description", "is_active", "created_at", "updated_at"],
        admin_fields: &["id", "name", "description", "is_active", "created_at", "updated_at"],
        has_created_at: true,
        has_updated_at: true,
        has_created_by: false,
        has_updated_by: false,
        dependents: &[
            DependentRef { table: "products", column: "category_id", cascade: false },
        ],
    };
}
