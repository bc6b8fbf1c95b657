//! Generic repository.
//!
//! Translates a normalized [`Specification`] into SQL against the entity's
//! table and maps rows back to domain values. One engine serves every
//! entity: table and column names always come from the entity's static
//! [`EntityMetadata`], never from caller input, and every caller-supplied
//! value is bound as a parameter.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use stockroom_core::error::CoreError;
use stockroom_core::fields::AccessContext;
use stockroom_core::metadata::{Column, ColumnKind, EntityMetadata};
use stockroom_core::pagination::{Paginated, Pagination};
use stockroom_core::query::{FilterValue, Specification};
use stockroom_core::types::{DbId, Timestamp};

use crate::error::{ServiceError, ServiceResult};

/// A value bound into a dynamically built query. Each variant carries an
/// `Option` so an explicit NULL stays typed for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Float(Option<f64>),
    Boolean(Option<bool>),
    Timestamp(Option<Timestamp>),
}

impl From<FilterValue> for SqlValue {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Text(v) => Self::Text(Some(v)),
            FilterValue::Integer(v) => Self::Integer(Some(v)),
            FilterValue::Float(v) => Self::Float(Some(v)),
            FilterValue::Boolean(v) => Self::Boolean(Some(v)),
            FilterValue::Timestamp(v) => Self::Timestamp(Some(v)),
        }
    }
}

/// Conversion from a DTO to the column/value pairs it carries.
///
/// Implementations emit only the fields present in the DTO: an absent
/// update field is simply not emitted, a cleared field is emitted with a
/// `None` payload.
pub trait ToRow {
    fn to_row(&self) -> Vec<(&'static str, SqlValue)>;
}

/// Emit a patch field into a DTO's column/value list when present.
///
/// `Missing` emits nothing; `Null` and `Value` emit through `wrap`, which
/// picks the typed [`SqlValue`] variant.
pub fn push_patch<T: Clone, F>(
    row: &mut Vec<(&'static str, SqlValue)>,
    column: &'static str,
    patch: &stockroom_core::patch::Patch<T>,
    wrap: F,
) where
    F: Fn(Option<T>) -> SqlValue,
{
    if let Some(value) = patch.as_option() {
        row.push((column, wrap(value.cloned())));
    }
}

/// Static definition of an entity the generic engine can serve.
pub trait EntityDef: Send + Sync + 'static {
    /// Full database row shape.
    type Row: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin;
    /// Create DTO.
    type Create: ToRow + Send + Sync;
    /// Update DTO (partial; see `stockroom_core::patch`).
    type Update: ToRow + Send + Sync;

    const META: EntityMetadata;
}

/// Provides CRUD operations for any [`EntityDef`].
pub struct Repository<D: EntityDef>(PhantomData<D>);

impl<D: EntityDef> Repository<D> {
    /// List entities matching a specification, projected to `projection`.
    ///
    /// Returns the page of rows plus a `total` computed by a separate count
    /// query sharing the same WHERE clause, so `total` reflects filters only
    /// and is invariant under `page`/`limit` changes.
    pub async fn list(
        pool: &PgPool,
        spec: &Specification,
        projection: &BTreeSet<String>,
    ) -> ServiceResult<Paginated<Value>> {
        let meta = D::META;
        let columns: Vec<Column> = meta
            .columns
            .iter()
            .filter(|c| projection.contains(c.name))
            .copied()
            .collect();
        // The field policy always produces a non-empty subset of the schema;
        // a projection naming no persisted column is a caller bug and must
        // not widen to the full schema.
        if columns.is_empty() {
            return Err(CoreError::Internal(format!(
                "Projection for {} names no persisted columns",
                meta.entity
            ))
            .into());
        }
        let column_names: Vec<&str> = columns.iter().map(|c| c.name).collect();

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {}",
            column_names.join(", "),
            meta.table
        ));
        push_where(&mut qb, spec, &meta);
        qb.push(" ORDER BY ");
        for (i, key) in spec.sort.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(key.column);
            qb.push(" ");
            qb.push(key.direction.as_sql());
        }
        // Final primary-key tiebreaker keeps pagination stable when the
        // requested keys are not unique.
        if !spec.sort.iter().any(|k| k.column == meta.primary_key) {
            qb.push(", ");
            qb.push(meta.primary_key);
            qb.push(" ASC");
        }
        qb.push(" LIMIT ");
        qb.push_bind(spec.limit);
        qb.push(" OFFSET ");
        qb.push_bind(spec.offset());

        let rows = qb.build().fetch_all(pool).await?;
        let data = rows
            .iter()
            .map(|row| row_to_value(row, &columns))
            .collect::<ServiceResult<Vec<_>>>()?;

        let mut count_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", meta.table));
        push_where(&mut count_qb, spec, &meta);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

        Ok(Paginated {
            data,
            pagination: Pagination::new(spec.page, spec.limit, total),
        })
    }

    /// Find an entity by ID. Returns `None` (not an error) when absent.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<D::Row>, sqlx::Error> {
        let meta = D::META;
        let query = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            column_list(&meta),
            meta.table,
            meta.primary_key
        );
        sqlx::query_as::<_, D::Row>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new entity and return the full persisted row.
    ///
    /// When the schema declares a `created_by` audit column, the
    /// authenticated actor from `ctx` is merged in; it is never taken from
    /// the DTO itself.
    pub async fn create(
        pool: &PgPool,
        dto: &D::Create,
        ctx: &AccessContext,
    ) -> ServiceResult<D::Row> {
        let meta = D::META;
        let mut values = dto.to_row();
        if meta.has_created_by {
            if let Some(actor) = ctx.actor {
                values.retain(|(col, _)| *col != "created_by");
                values.push(("created_by", SqlValue::Integer(Some(actor))));
            }
        }
        if values.is_empty() {
            return Err(CoreError::Validation("No fields provided for create".into()).into());
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", meta.table));
        for (i, (col, _)) in values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*col);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in values.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_bind_value(&mut qb, value);
        }
        qb.push(format!(") RETURNING {}", column_list(&meta)));

        let row = qb.build_query_as::<D::Row>().fetch_one(pool).await?;
        Ok(row)
    }

    /// Partial update: only fields present in the DTO are written. Returns
    /// `None` if no row matched the id.
    ///
    /// A DTO with no present fields performs no write and returns the
    /// current row unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &D::Update,
        ctx: &AccessContext,
    ) -> ServiceResult<Option<D::Row>> {
        let meta = D::META;
        let values = dto.to_row();
        if values.is_empty() {
            return Self::find_by_id(pool, id).await.map_err(Into::into);
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", meta.table));
        for (i, (col, value)) in values.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(col);
            qb.push(" = ");
            push_bind_value(&mut qb, value);
        }
        if meta.has_updated_at {
            qb.push(", updated_at = now()");
        }
        if meta.has_updated_by {
            if let Some(actor) = ctx.actor {
                qb.push(", updated_by = ");
                qb.push_bind(actor);
            }
        }
        qb.push(" WHERE ");
        qb.push(meta.primary_key);
        qb.push(" = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {}", column_list(&meta)));

        let row = qb.build_query_as::<D::Row>().fetch_optional(pool).await?;
        Ok(row)
    }

    /// Physical delete. Returns `false` if no row matched. The service is
    /// responsible for running the integrity check first.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let meta = D::META;
        let query = format!("DELETE FROM {} WHERE {} = $1", meta.table, meta.primary_key);
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Comma-separated list of every persisted column.
fn column_list(meta: &EntityMetadata) -> String {
    meta.columns
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append the WHERE clause shared by the page query and the count query:
/// every filter predicate plus the free-text search over searchable columns.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, spec: &Specification, meta: &EntityMetadata) {
    let mut first = true;
    for filter in &spec.filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
        qb.push(filter.column);
        qb.push(" ");
        qb.push(filter.op.as_sql());
        qb.push(" ");
        push_bind_value(qb, filter.value.clone().into());
    }

    if let Some(search) = &spec.search {
        if !meta.searchable.is_empty() {
            qb.push(if first { " WHERE (" } else { " AND (" });
            let pattern = format!("%{search}%");
            for (i, col) in meta.searchable.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*col);
                qb.push(" ILIKE ");
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

/// Bind a typed value, preserving its SQL type when NULL.
fn push_bind_value(qb: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Text(v) => qb.push_bind(v),
        SqlValue::Integer(v) => qb.push_bind(v),
        SqlValue::Float(v) => qb.push_bind(v),
        SqlValue::Boolean(v) => qb.push_bind(v),
        SqlValue::Timestamp(v) => qb.push_bind(v),
    };
}

/// Map a projected row to a JSON object, column by column.
///
/// This is the single row-to-domain mapping point for list results. It
/// fails fast on a column the metadata does not describe rather than
/// returning a partially populated object.
fn row_to_value(row: &PgRow, columns: &[Column]) -> ServiceResult<Value> {
    let mut map = serde_json::Map::with_capacity(columns.len());
    for col in columns {
        let value = match col.kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(col.name)
                .map(|v| v.map_or(Value::Null, Value::String)),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(col.name)
                .map(|v| v.map_or(Value::Null, Value::from)),
            ColumnKind::Float => row.try_get::<Option<f64>, _>(col.name).map(|v| {
                v.and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(col.name)
                .map(|v| v.map_or(Value::Null, Value::Bool)),
            ColumnKind::Timestamp => row
                .try_get::<Option<Timestamp>, _>(col.name)
                .map(|v| v.map_or(Value::Null, |ts| Value::String(ts.to_rfc3339()))),
        }
        .map_err(|e| {
            ServiceError::Core(CoreError::Internal(format!(
                "Row mapping failed for column '{}': {e}",
                col.name
            )))
        })?;
        map.insert(col.name.to_string(), value);
    }
    Ok(Value::Object(map))
}
