//! Supplier entity: vendors products are procured from.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stockroom_core::error::CoreError;
use stockroom_core::metadata::{Column, ColumnKind, DependentRef, EntityMetadata};
use stockroom_core::patch::Patch;
use stockroom_core::types::{DbId, Timestamp};

use crate::repository::{push_patch, EntityDef, SqlValue, ToRow};
use crate::service::Hooks;

/// Payment terms agreed with a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    Net30,
    Net60,
    Cod,
    Prepaid,
}

impl PaymentTerms {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Net30 => "net_30",
            Self::Net60 => "net_60",
            Self::Cod => "cod",
            Self::Prepaid => "prepaid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "net_30" => Some(Self::Net30),
            "net_60" => Some(Self::Net60),
            "cod" => Some(Self::Cod),
            "prepaid" => Some(Self::Prepaid),
            _ => None,
        }
    }
}

impl TryFrom<String> for PaymentTerms {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown payment terms '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Row and DTOs
// ---------------------------------------------------------------------------

/// A row from the `suppliers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Supplier {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub contact_email: Option<String>,
    #[sqlx(try_from = "String")]
    pub payment_terms: PaymentTerms,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSupplier {
    pub code: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub payment_terms: Option<PaymentTerms>,
    pub is_active: Option<bool>,
}

/// DTO for partially updating a supplier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSupplier {
    #[serde(default)]
    pub code: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub contact_email: Patch<String>,
    #[serde(default)]
    pub payment_terms: Patch<PaymentTerms>,
    #[serde(default)]
    pub is_active: Patch<bool>,
}

impl ToRow for CreateSupplier {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = vec![
            ("code", SqlValue::Text(Some(self.code.clone()))),
            ("name", SqlValue::Text(Some(self.name.clone()))),
        ];
        if let Some(v) = &self.contact_email {
            row.push(("contact_email", SqlValue::Text(Some(v.clone()))));
        }
        if let Some(v) = self.payment_terms {
            row.push(("payment_terms", SqlValue::Text(Some(v.as_str().to_string()))));
        }
        if let Some(v) = self.is_active {
            row.push(("is_active", SqlValue::Boolean(Some(v))));
        }
        row
    }
}

impl ToRow for UpdateSupplier {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)> {
        let mut row = Vec::new();
        push_patch(&mut row, "code", &self.code, SqlValue::Text);
        push_patch(&mut row, "name", &self.name, SqlValue::Text);
        push_patch(&mut row, "contact_email", &self.contact_email, SqlValue::Text);
        push_patch(&mut row, "payment_terms", &self.payment_terms, |v| {
            SqlValue::Text(v.map(|t| t.as_str().to_string()))
        });
        push_patch(&mut row, "is_active", &self.is_active, SqlValue::Boolean);
        row
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

const SUPPLIER_COLUMNS: &[Column] = &[
    Column { name: "id", kind: ColumnKind::Integer },
    Column { name: "code", kind: ColumnKind::Text },
    Column { name: "name", kind: ColumnKind::Text },
    Column { name: "contact_email", kind: ColumnKind::Text },
    Column { name: "payment_terms", kind: ColumnKind::Text },
    Column { name: "is_active", kind: ColumnKind::Boolean },
    Column { name: "created_at", kind: ColumnKind::Timestamp },
    Column { name: "updated_at", kind: ColumnKind::Timestamp },
];

pub struct SupplierDef;

impl EntityDef for SupplierDef {
    type Row = Supplier;
    type Create = CreateSupplier;
    type Update = UpdateSupplier;

    const META: EntityMetadata = EntityMetadata {
        entity: "Supplier",
        table: "suppliers",
        primary_key: "id",
        columns: SUPPLIER_COLUMNS,
        searchable: &["code", "name"],
        sort_aliases: &[("created", "created_at")],
        default_sort_column: "created_at",
        public_fields: &["id", "code", "name"],
        user_fields: &[
            "id", "code", "name", "contact_email", "payment_terms", "is_active",
            "created_at", "updated_at",
        ],
        admin_fields: &[
            "id", "code", "name", "contact_email", "payment_terms", "is_active",
            "created_at", "updated_at",
        ],
        has_created_at: true,
        has_updated_at: true,
        has_created_by: false,
        has_updated_by: false,
        dependents: &[
            DependentRef { table: "products", column: "supplier_id", cascade: false },
            DependentRef { table: "supplier_contacts", column: "supplier_id", cascade: true },
        ],
    };
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

fn check_contact_email(email: &str) -> Result<(), CoreError> {
    if !email.contains('@') {
        return Err(CoreError::BusinessRule {
            code: "INVALID_CONTACT_EMAIL",
            message: format!("contact_email '{email}' is not a valid address"),
        });
    }
    Ok(())
}

pub struct SupplierHooks;

#[async_trait::async_trait]
impl Hooks<SupplierDef> for SupplierHooks {
    async fn validate_create(&self, dto: &CreateSupplier) -> Result<(), CoreError> {
        if let Some(email) = &dto.contact_email {
            check_contact_email(email)?;
        }
        Ok(())
    }

    /// Supplier codes are stored upper-cased.
    async fn before_create(&self, mut dto: CreateSupplier) -> Result<CreateSupplier, CoreError> {
        dto.code = dto.code.trim().to_uppercase();
        Ok(dto)
    }

    async fn validate_update(&self, dto: &UpdateSupplier) -> Result<(), CoreError> {
        if let Patch::Value(email) = &dto.contact_email {
            check_contact_email(email)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
