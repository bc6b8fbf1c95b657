//! Integration tests for the generic CRUD engine.
//!
//! Exercises the service/repository stack against a real database:
//! - Create with audit-field population and DB defaults
//! - Partial-update semantics (absent vs null vs value)
//! - Business-rule hooks
//! - Unique constraint classification

use sqlx::PgPool;
use stockroom_core::error::CoreError;
use stockroom_core::fields::{AccessContext, Role};
use stockroom_core::patch::Patch;
use stockroom_db::entities::{
    CategoryDef, CreateCategory, CreateProduct, CreateSupplier, ProductDef, ProductHooks,
    ProductStatus, SupplierDef, SupplierHooks, UpdateCategory, UpdateProduct,
};
use stockroom_db::error::ServiceError;
use stockroom_db::service::{DefaultHooks, Service};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product_service() -> Service<ProductDef, ProductHooks> {
    Service::new(ProductHooks)
}

fn supplier_service() -> Service<SupplierDef, SupplierHooks> {
    Service::new(SupplierHooks)
}

fn category_service() -> Service<CategoryDef, DefaultHooks> {
    Service::new(DefaultHooks)
}

fn admin_ctx() -> AccessContext {
    AccessContext {
        role: Role::Admin,
        actor: Some(42),
        ip: None,
    }
}

fn new_product(sku: &str, name: &str, unit_price: f64) -> CreateProduct {
    CreateProduct {
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        status: None,
        unit_price,
        cost: None,
        quantity: None,
        min_quantity: None,
        notes: None,
    }
}

fn new_supplier(code: &str, name: &str) -> CreateSupplier {
    CreateSupplier {
        code: code.to_string(),
        name: name.to_string(),
        contact_email: None,
        payment_terms: None,
        is_active: None,
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_full_persisted_row(pool: PgPool) {
    let svc = product_service();
    let product = svc
        .create(&pool, new_product("SKU-100", "Hex bolt", 1.25), &admin_ctx())
        .await
        .unwrap();

    assert!(product.id > 0);
    assert_eq!(product.sku, "SKU-100");
    assert_eq!(product.unit_price, 1.25);
    // DB defaults for fields absent from the DTO.
    assert_eq!(product.status, ProductStatus::Active);
    assert_eq!(product.quantity, 0);
    // Audit field merged from the caller context, not the DTO.
    assert_eq!(product.created_by, Some(42));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_without_actor_leaves_audit_fields_null(pool: PgPool) {
    let svc = product_service();
    let ctx = AccessContext::default();
    let product = svc
        .create(&pool, new_product("SKU-101", "Washer", 0.10), &ctx)
        .await
        .unwrap();
    assert_eq!(product.created_by, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_price_is_rejected_before_any_write(pool: PgPool) {
    let svc = product_service();
    let err = svc
        .create(&pool, new_product("SKU-102", "Bad", -1.0), &admin_ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Core(CoreError::BusinessRule { code: "INVALID_UNIT_PRICE", .. })
    ));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_sku_is_a_unique_violation(pool: PgPool) {
    let svc = product_service();
    svc.create(&pool, new_product("SKU-103", "First", 1.0), &admin_ctx())
        .await
        .unwrap();
    let err = svc
        .create(&pool, new_product("SKU-103", "Second", 2.0), &admin_ctx())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn before_create_hook_normalizes_supplier_code(pool: PgPool) {
    let svc = supplier_service();
    let supplier = svc
        .create(&pool, new_supplier("  acme-01 ", "Acme"), &admin_ctx())
        .await
        .unwrap();
    assert_eq!(supplier.code, "ACME-01");
}

// A hook-less entity runs the same pipeline through the default hooks.
#[sqlx::test(migrations = "../../db/migrations")]
async fn category_round_trip_with_default_hooks(pool: PgPool) {
    let svc = category_service();
    let ctx = admin_ctx();
    let dto = CreateCategory {
        name: "Fasteners".to_string(),
        description: Some("Bolts and nuts".to_string()),
        is_active: None,
    };
    let category = svc.create(&pool, dto, &ctx).await.unwrap();
    assert!(category.id > 0);
    assert!(category.is_active);

    let update = UpdateCategory {
        name: Patch::Value("Hardware".to_string()),
        description: Patch::Null,
        ..UpdateCategory::default()
    };
    let updated = svc.update(&pool, category.id, update, &ctx).await.unwrap().unwrap();
    assert_eq!(updated.name, "Hardware");
    assert_eq!(updated.description, None);

    assert!(svc.delete(&pool, category.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_one_returns_none_for_missing_id(pool: PgPool) {
    let svc = product_service();
    assert!(svc.find_one(&pool, 99_999).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn absent_field_leaves_column_unchanged(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let mut dto = new_product("SKU-110", "Nut", 0.50);
    dto.notes = Some("restock weekly".to_string());
    let product = svc.create(&pool, dto, &ctx).await.unwrap();

    let update = UpdateProduct {
        name: Patch::Value("Lock nut".to_string()),
        ..UpdateProduct::default()
    };
    let updated = svc.update(&pool, product.id, update, &ctx).await.unwrap().unwrap();
    assert_eq!(updated.name, "Lock nut");
    assert_eq!(updated.notes.as_deref(), Some("restock weekly"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_null_clears_column(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let mut dto = new_product("SKU-111", "Nut", 0.50);
    dto.notes = Some("restock weekly".to_string());
    let product = svc.create(&pool, dto, &ctx).await.unwrap();

    let update = UpdateProduct { notes: Patch::Null, ..UpdateProduct::default() };
    let updated = svc.update(&pool, product.id, update, &ctx).await.unwrap().unwrap();
    assert_eq!(updated.notes, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_update_is_a_no_op(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let product = svc
        .create(&pool, new_product("SKU-112", "Nut", 0.50), &ctx)
        .await
        .unwrap();

    let updated = svc
        .update(&pool, product.id, UpdateProduct::default(), &ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.updated_at, product.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_stamps_updated_fields(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let product = svc
        .create(&pool, new_product("SKU-113", "Nut", 0.50), &ctx)
        .await
        .unwrap();

    let update = UpdateProduct { quantity: Patch::Value(9), ..UpdateProduct::default() };
    let updated = svc.update(&pool, product.id, update, &ctx).await.unwrap().unwrap();
    assert_eq!(updated.quantity, 9);
    assert_eq!(updated.updated_by, Some(42));
    assert!(updated.updated_at >= product.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_missing_id_returns_none(pool: PgPool) {
    let svc = product_service();
    let update = UpdateProduct { quantity: Patch::Value(1), ..UpdateProduct::default() };
    let result = svc.update(&pool, 99_999, update, &admin_ctx()).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_update_price_rejected(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let product = svc
        .create(&pool, new_product("SKU-114", "Nut", 0.50), &ctx)
        .await
        .unwrap();

    let update = UpdateProduct { unit_price: Patch::Value(-2.0), ..UpdateProduct::default() };
    let err = svc.update(&pool, product.id, update, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Core(CoreError::BusinessRule { code: "INVALID_UNIT_PRICE", .. })
    ));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_row_and_reports_absence(pool: PgPool) {
    let svc = product_service();
    let ctx = admin_ctx();
    let product = svc
        .create(&pool, new_product("SKU-120", "Nut", 0.50), &ctx)
        .await
        .unwrap();

    assert!(svc.delete(&pool, product.id).await.unwrap());
    assert!(svc.find_one(&pool, product.id).await.unwrap().is_none());
    // Second delete: row already gone.
    assert!(!svc.delete(&pool, product.id).await.unwrap());
}
