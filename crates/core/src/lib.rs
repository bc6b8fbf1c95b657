//! Domain core for the stockroom data-access engine.
//!
//! This crate has zero database dependencies so it can be used by the
//! repository layer, CLI tooling, and tests alike. It covers:
//! - list-request parsing into a normalized [`query::Specification`]
//! - role-scoped field projection ([`fields`])
//! - pagination math ([`pagination`])
//! - partial-update semantics ([`patch`])
//! - per-entity declarative metadata ([`metadata`])
//! - referential-integrity report types ([`integrity`])

pub mod error;
pub mod fields;
pub mod integrity;
pub mod metadata;
pub mod pagination;
pub mod patch;
pub mod query;
pub mod types;
