//! Per-entity configuration objects.
//!
//! Each module declares one entity: its row struct, create/update DTOs,
//! static metadata table, and lifecycle hooks. The generic engine in
//! `repository` / `service` does the rest.

pub mod category;
pub mod product;
pub mod supplier;

pub use category::{Category, CategoryDef, CreateCategory, UpdateCategory};
pub use product::{CreateProduct, Product, ProductDef, ProductHooks, ProductStatus, UpdateProduct};
pub use supplier::{CreateSupplier, PaymentTerms, Supplier, SupplierDef, SupplierHooks, UpdateSupplier};
