//! Product entity: catalogue items tracked in inventory.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stockroom_core::error::CoreError;
use stockroom_core::metadata::{Column, ColumnKind, DependentRef, EntityMetadata};
use stockroom_core::patch::Patch;
use stockroom_core::types::{DbId, Timestamp};

use crate::repository::{push_patch, EntityDef, SqlValue, ToRow};
use crate::service::Hooks;

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Discontinued => "discontinued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "discontinued" => Some(Self::Discontinued),
            _ => None,
        }
    }
}

impl TryFrom<String> for ProductStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown product status '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Row and DTOs
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub status: ProductStatus,
    pub unit_price: f64,
    pub cost: Option<f64>,
    pub quantity: i64,
    pub min_quantity: i64,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    pub status: Option<ProductStatus>,
    pub unit_price: f64,
    pub cost: Option<f64>,
    pub quantity: Option<i64>,
    pub min_quantity: Option<i64>,
    pub notes: Option<String>,
}

/// DTO for partially updating a product. Absent fields stay unchanged; an
/// explicit `null` clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub sku: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<DbId>,
    #[serde(default)]
    pub supplier_id: Patch<DbId>,
    #[serde(default)]
    pub status: Patch<ProductStatus>,
    #[serde(default)]
    pub unit_price: Patch<f64>,
    #[serde(default)]
    pub cost: Patch<f64>,
    #[serde(default)]
    pub quantity: Patch<i64>,
    #[serde(default)]
    pub min_quantity: Patch<i64>,
    #[serde(default)]
    pub notes: Patch<String>,
}

impl ToRow for CreateProduct {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = vec![
            ("sku", SqlValue::Text(Some(self.sku.clone()))),
            ("name", SqlValue::Text(Some(self.name.clone()))),
            ("unit_price", SqlValue::Float(Some(self.unit_price))),
        ];
        if let Some(v) = &self.description {
            row.push(("description", SqlValue::Text(Some(v.clone()))));
        }
        if let Some(v) = self.category_id {
            row.push(("category_id", SqlValue::Integer(Some(v))));
        }
        if let Some(v) = self.supplier_id {
            row.push(("supplier_id", SqlValue::Integer(Some(v))));
        }
        if let Some(v) = self.status {
            row.push(("status", SqlValue::Text(Some(v.as_str().to_string()))));
        }
        if let Some(v) = self.cost {
            row.push(("cost", SqlValue::Float(Some(v))));
        }
        if let Some(v) = self.quantity {
            row.push(("quantity", SqlValue::Integer(Some(v))));
        }
        if let Some(v) = self.min_quantity {
            row.push(("min_quantity", SqlValue::Integer(Some(v))));
        }
        if let Some(v) = &self.notes {
            row.push(("notes", SqlValue::Text(Some(v.clone()))));
        }
        row
    }
}

impl ToRow for UpdateProduct {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = Vec::new();
        push_patch(&mut row, "sku", &self.sku, SqlValue::Text);
        push_patch(&mut row, "name", &self.name, SqlValue::Text);
        push_patch(&mut row, "description", &self.description, SqlValue::Text);
        push_patch(&mut row, "category_id", &self.category_id, SqlValue::Integer);
        push_patch(&mut row, "supplier_id", &self.supplier_id, SqlValue::Integer);
        push_patch(&mut row, "status", &self.status, |v| {
            SqlValue::Text(v.map(|s| s.as_str().to_string()))
        });
        push_patch(&mut row, "unit_price", &self.unit_price, SqlValue::Float);
        push_patch(&mut row, "cost", &self.cost, SqlValue::Float);
        push_patch(&mut row, "quantity", &self.quantity, SqlValue::Integer);
        push_patch(&mut row, "min_quantity", &self.min_quantity, SqlValue::Integer);
        push_patch(&mut row, "notes", &self.notes, SqlValue::Text);
        row
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &[Column] = &[
    Column { name: "id", kind: ColumnKind::Integer },
    Column { name: "sku", kind: ColumnKind::Text },
    Column { name: "name", kind: ColumnKind::Text },
    Column { name: "description", kind: ColumnKind::Text },
    Column { name: "category_id", kind: ColumnKind::Integer },
    Column { name: "supplier_id", kind: ColumnKind::Integer },
    Column { name: "status", kind: ColumnKind::Text },
    Column { name: "unit_price", kind: ColumnKind::Float },
    Column { name: "cost", kind: ColumnKind::Float },
    Column { name: "quantity", kind: ColumnKind::Integer },
    Column { name: "min_quantity", kind: ColumnKind::Integer },
    Column { name: "notes", kind: ColumnKind::Text },
    Column { name: "created_by", kind: ColumnKind::Integer },
    Column { name: "updated_by", kind: ColumnKind::Integer },
    Column { name: "created_at", kind: ColumnKind::Timestamp },
    Column { name: "updated_at", kind: ColumnKind::Timestamp },
];

pub struct ProductDef;

impl EntityDef for ProductDef {
    type Row = Product;
    type Create = CreateProduct;
    type Update = UpdateProduct;

    const META: EntityMetadata = EntityMetadata {
        entity: "Product",
        table: "products",
        primary_key: "id",
        columns: PRODUCT_COLUMNS,
        searchable: &["sku", "name", "description"],
        sort_aliases: &[
            ("price", "unit_price"),
            ("created", "created_at"),
            ("updated", "updated_at"),
        ],
        default_sort_column: "created_at",
        public_fields: &["id", "sku", "name", "description", "status", "unit_price", "created_at"],
        user_fields: &[
            "id", "sku", "name", "description", "status", "unit_price", "created_at",
            "category_id", "supplier_id", "quantity", "min_quantity", "notes", "updated_at",
        ],
        admin_fields: &[
            "id", "sku", "name", "description", "status", "unit_price", "created_at",
            "category_id", "supplier_id", "quantity", "min_quantity", "notes", "updated_at",
            "cost", "created_by", "updated_by",
        ],
        has_created_at: true,
        has_updated_at: true,
        has_created_by: true,
        has_updated_by: true,
        dependents: &[
            DependentRef { table: "purchase_order_items", column: "product_id", cascade: false },
            DependentRef { table: "product_price_history", column: "product_id", cascade: true },
        ],
    };
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Reject negative monetary and stock values.
fn check_non_negative(value: f64, code: &'static str, field: &str) -> Result<(), CoreError> {
    if value < 0.0 {
        return Err(CoreError::BusinessRule {
            code,
            message: format!("{field} must not be negative, got {value}"),
        });
    }
    Ok(())
}

pub struct ProductHooks;

#[async_trait::async_trait]
impl Hooks<ProductDef> for ProductHooks {
    async fn validate_create(&self, dto: &CreateProduct) -> Result<(), CoreError> {
        check_non_negative(dto.unit_price, "INVALID_UNIT_PRICE", "unit_price")?;
        if let Some(cost) = dto.cost {
            check_non_negative(cost, "INVALID_COST", "cost")?;
        }
        if let Some(quantity) = dto.quantity {
            check_non_negative(quantity as f64, "INVALID_QUANTITY", "quantity")?;
        }
        Ok(())
    }

    async fn validate_update(&self, dto: &UpdateProduct) -> Result<(), CoreError> {
        if let Patch::Value(v) = dto.unit_price {
            check_non_negative(v, "INVALID_UNIT_PRICE", "unit_price")?;
        }
        if let Patch::Value(v) = dto.cost {
            check_non_negative(v, "INVALID_COST", "cost")?;
        }
        if let Patch::Value(v) = dto.quantity {
            check_non_negative(v as f64, "INVALID_QUANTITY", "quantity")?;
        }
        Ok(())
    }

    async fn after_create(&self, entity: &Product) -> Result<(), CoreError> {
        tracing::info!(id = entity.id, sku = %entity.sku, "Product created");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
