//! Service orchestration.
//!
//! Fixed pipeline around the repository: validation hooks run before any
//! write, the integrity checker gates every delete, and `after_*`
//! observability hooks can never affect the result (their failures are
//! logged and dropped).

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use stockroom_core::error::CoreError;
use stockroom_core::fields::{self, AccessContext};
use stockroom_core::pagination::Paginated;
use stockroom_core::query::{ListRequest, Specification};
use stockroom_core::types::DbId;

use crate::error::ServiceResult;
use crate::integrity::IntegrityChecker;
use crate::repository::{EntityDef, Repository};

/// Per-entity lifecycle hooks.
///
/// All hooks are overridable; the ordering is fixed by [`Service`].
/// `validate_*` hooks reject input with domain errors; `before_create` may
/// inject defaults; `after_*` hooks are observability-only.
#[async_trait]
pub trait Hooks<D: EntityDef>: Send + Sync {
    /// Business-rule validation before create. Reject with
    /// [`CoreError::BusinessRule`].
    async fn validate_create(&self, _dto: &D::Create) -> Result<(), CoreError> {
        Ok(())
    }

    /// Last chance to adjust the DTO before the insert.
    async fn before_create(&self, dto: D::Create) -> Result<D::Create, CoreError> {
        Ok(dto)
    }

    /// Observability hook after a successful create. A failure here is
    /// logged and never rolls back the create.
    async fn after_create(&self, _entity: &D::Row) -> Result<(), CoreError> {
        Ok(())
    }

    /// Business-rule validation before update.
    async fn validate_update(&self, _dto: &D::Update) -> Result<(), CoreError> {
        Ok(())
    }

    /// Observability hook after a successful update; same rule as
    /// [`Hooks::after_create`].
    async fn after_update(&self, _entity: &D::Row) -> Result<(), CoreError> {
        Ok(())
    }

    /// Extra validation before delete. The referential-integrity check has
    /// already passed when this runs.
    async fn validate_delete(&self, _existing: &D::Row) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Hook implementation with every default: entities without business rules
/// use this directly.
pub struct DefaultHooks;

#[async_trait]
impl<D: EntityDef> Hooks<D> for DefaultHooks {}

/// Orchestrates parsing, field policy, hooks, the repository, and the
/// integrity checker for one entity.
pub struct Service<D: EntityDef, H: Hooks<D>> {
    hooks: H,
    _entity: PhantomData<D>,
}

impl<D: EntityDef, H: Hooks<D>> Service<D, H> {
    pub fn new(hooks: H) -> Self {
        Self { hooks, _entity: PhantomData }
    }

    /// List entities for a caller: parse the raw request, resolve the
    /// field projection for the caller's role (recording violations), then
    /// query.
    pub async fn find_many(
        &self,
        pool: &PgPool,
        req: &ListRequest,
        ctx: &AccessContext,
    ) -> ServiceResult<Paginated<Value>> {
        let spec = Specification::parse(req, &D::META)?;
        let resolution = fields::resolve(spec.fields.as_ref(), ctx.role, &D::META);
        for violation in &resolution.violations {
            tracing::warn!(
                entity = violation.entity,
                field = %violation.field,
                role = violation.role.as_str(),
                actor = ?ctx.actor,
                ip = ?ctx.ip,
                "Requested field denied by role policy"
            );
        }
        Repository::<D>::list(pool, &spec, &resolution.allowed).await
    }

    /// Fetch one entity by id; `None` when absent.
    pub async fn find_one(&self, pool: &PgPool, id: DbId) -> ServiceResult<Option<D::Row>> {
        Repository::<D>::find_by_id(pool, id).await.map_err(Into::into)
    }

    /// Create: `validate_create` → `before_create` → insert → `after_create`.
    pub async fn create(
        &self,
        pool: &PgPool,
        dto: D::Create,
        ctx: &AccessContext,
    ) -> ServiceResult<D::Row> {
        self.hooks.validate_create(&dto).await?;
        let dto = self.hooks.before_create(dto).await?;
        let entity = Repository::<D>::create(pool, &dto, ctx).await?;

        if let Err(err) = self.hooks.after_create(&entity).await {
            tracing::error!(entity = D::META.entity, error = %err, "after_create hook failed");
        }
        Ok(entity)
    }

    /// Partial update: `validate_update` → update → `after_update`.
    /// Returns `None` when the id does not exist.
    pub async fn update(
        &self,
        pool: &PgPool,
        id: DbId,
        dto: D::Update,
        ctx: &AccessContext,
    ) -> ServiceResult<Option<D::Row>> {
        self.hooks.validate_update(&dto).await?;
        let updated = Repository::<D>::update(pool, id, &dto, ctx).await?;

        if let Some(entity) = &updated {
            if let Err(err) = self.hooks.after_update(entity).await {
                tracing::error!(entity = D::META.entity, error = %err, "after_update hook failed");
            }
        }
        Ok(updated)
    }

    /// Delete, gated on the referential-integrity check.
    ///
    /// Returns `Ok(false)` when the id does not exist. A blocking reference
    /// aborts with [`CoreError::ReferenceConflict`] carrying the full
    /// blocking list; the repository delete is never issued in that case.
    pub async fn delete(&self, pool: &PgPool, id: DbId) -> ServiceResult<bool> {
        let Some(existing) = Repository::<D>::find_by_id(pool, id).await? else {
            return Ok(false);
        };

        let check = IntegrityChecker::can_be_deleted(pool, &D::META, id).await?;
        if !check.can_delete {
            tracing::info!(
                entity = D::META.entity,
                id,
                blocked_by = check.blocked_by.len(),
                "Delete blocked by dependent references"
            );
            return Err(CoreError::ReferenceConflict {
                entity: D::META.entity,
                references: check.blocked_by,
            }
            .into());
        }

        self.hooks.validate_delete(&existing).await?;
        Repository::<D>::delete(pool, id).await.map_err(Into::into)
    }
}
