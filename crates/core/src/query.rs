//! List-request parsing.
//!
//! Turns a caller's raw list parameters (pagination, sort string, search,
//! free-form filter keys, requested fields) into a normalized, validated
//! [`Specification`]. Parsing is pure: no side effects, and every
//! malformed parameter is reported as a `Validation` error naming the
//! offending key before any database work happens.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};

use crate::error::CoreError;
use crate::metadata::{ColumnKind, EntityMetadata};
use crate::types::Timestamp;

/// Default page number.
pub const DEFAULT_PAGE: i64 = 1;

/// Default number of rows per page.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum number of rows per page.
pub const MAX_LIMIT: i64 = 100;

/// Maximum number of entries in a `fields` projection request.
pub const MAX_FIELDS: usize = 20;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided page number to be at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(DEFAULT_PAGE).max(1)
}

/// Raw list parameters as handed over by the transport layer.
///
/// `filters` carries every query key that is not one of the reserved
/// parameters; unknown keys are ignored during parsing to keep the surface
/// backward-compatible.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Comma-separated `field[:asc|desc]` tokens.
    pub sort: Option<String>,
    /// Free-text search over the entity's searchable columns.
    pub search: Option<String>,
    /// Comma-separated projection field names.
    pub fields: Option<String>,
    /// Remaining query parameters: `field`, `field_min`, `field_max`.
    pub filters: BTreeMap<String, String>,
}

/// Sort direction. Unrecognized directions default to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One key of a multi-key sort. The column is always a real column of the
/// entity (resolved through the metadata's alias table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Inclusive lower bound (`<field>_min`).
    Gte,
    /// Inclusive upper bound (`<field>_max`).
    Lte,
}

impl FilterOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// A filter value, typed according to the column it applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(Timestamp),
}

/// A single normalized filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// The normalized, validated form of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub page: i64,
    pub limit: i64,
    /// Stable multi-key ordering; never empty.
    pub sort: Vec<SortKey>,
    pub search: Option<String>,
    pub filters: Vec<Filter>,
    /// Requested projection; `None` means "role default".
    pub fields: Option<BTreeSet<String>>,
}

impl Specification {
    /// Parse and validate raw parameters against an entity's metadata.
    pub fn parse(req: &ListRequest, meta: &EntityMetadata) -> Result<Self, CoreError> {
        let page = clamp_page(req.page);
        let limit = clamp_limit(req.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let sort = parse_sort(req.sort.as_deref(), meta)?;
        let search = req
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let fields = parse_fields(req.fields.as_deref())?;
        let filters = parse_filters(&req.filters, meta)?;

        Ok(Self {
            page,
            limit,
            sort,
            search,
            filters,
            fields,
        })
    }

    /// Row offset implied by `page` and `limit`.
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Render the sort sequence back into its canonical string form.
    ///
    /// `parse(render(parse(s))) == parse(s)` holds for every valid input.
    pub fn render_sort(&self) -> String {
        self.sort
            .iter()
            .map(|k| format!("{}:{}", k.column, k.direction.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Check a caller-supplied name against the identifier pattern
/// `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse the sort string grammar: comma-separated `field[:asc|desc]`.
///
/// Field names are resolved through the metadata (unknown names fall back to
/// the primary key); an unrecognized direction defaults to `desc`. A missing
/// or empty sort string yields the default descending creation-time sort.
fn parse_sort(sort: Option<&str>, meta: &EntityMetadata) -> Result<Vec<SortKey>, CoreError> {
    let Some(sort) = sort.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(vec![SortKey {
            column: meta.default_sort_column,
            direction: SortDirection::Desc,
        }]);
    };

    let mut keys = Vec::new();
    for token in sort.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (field, direction) = match token.split_once(':') {
            Some((field, dir)) => {
                let direction = match dir.trim() {
                    "asc" => SortDirection::Asc,
                    _ => SortDirection::Desc,
                };
                (field.trim(), direction)
            }
            None => (token, SortDirection::Desc),
        };

        if !is_identifier(field) {
            return Err(CoreError::Validation(format!(
                "Invalid sort field '{field}' in parameter 'sort'"
            )));
        }

        let column = meta.resolve_sort_column(field);
        // Repeating a column in a multi-key sort adds nothing; keep the
        // first occurrence so ordering stays stable.
        if !keys.iter().any(|k: &SortKey| k.column == column) {
            keys.push(SortKey { column, direction });
        }
    }

    if keys.is_empty() {
        keys.push(SortKey {
            column: meta.default_sort_column,
            direction: SortDirection::Desc,
        });
    }
    Ok(keys)
}

/// Parse the `fields` projection parameter.
fn parse_fields(fields: Option<&str>) -> Result<Option<BTreeSet<String>>, CoreError> {
    let Some(fields) = fields.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let mut set = BTreeSet::new();
    for entry in fields.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if !is_identifier(entry) {
            return Err(CoreError::Validation(format!(
                "Invalid field name '{entry}' in parameter 'fields'"
            )));
        }
        set.insert(entry.to_string());
    }

    if set.is_empty() {
        return Ok(None);
    }
    if set.len() > MAX_FIELDS {
        return Err(CoreError::Validation(format!(
            "Parameter 'fields' names {} fields, maximum is {MAX_FIELDS}",
            set.len()
        )));
    }
    Ok(Some(set))
}

/// Extract equality and range filters from the free-form parameter map.
///
/// A key matching a column becomes an equality filter; `<field>_min` /
/// `<field>_max` become inclusive range filters on range-capable columns.
/// Unknown keys are ignored.
fn parse_filters(
    raw: &BTreeMap<String, String>,
    meta: &EntityMetadata,
) -> Result<Vec<Filter>, CoreError> {
    let mut filters = Vec::new();

    for (key, value) in raw {
        if let Some(col) = meta.column(key) {
            filters.push(Filter {
                column: col.name,
                op: FilterOp::Eq,
                value: parse_value(col.kind, value, key)?,
            });
            continue;
        }

        let (base, op) = if let Some(base) = key.strip_suffix("_min") {
            (base, FilterOp::Gte)
        } else if let Some(base) = key.strip_suffix("_max") {
            (base, FilterOp::Lte)
        } else {
            continue;
        };

        if let Some(col) = meta.column(base) {
            if col.kind.supports_range() {
                filters.push(Filter {
                    column: col.name,
                    op,
                    value: parse_value(col.kind, value, key)?,
                });
            }
        }
    }

    Ok(filters)
}

/// Parse a raw filter value according to its column kind.
fn parse_value(kind: ColumnKind, raw: &str, param: &str) -> Result<FilterValue, CoreError> {
    let raw = raw.trim();
    match kind {
        ColumnKind::Text => Ok(FilterValue::Text(raw.to_string())),
        ColumnKind::Integer => raw
            .parse::<i64>()
            .map(FilterValue::Integer)
            .map_err(|_| invalid_value(param, raw, "an integer")),
        ColumnKind::Float => raw
            .parse::<f64>()
            .map(FilterValue::Float)
            .map_err(|_| invalid_value(param, raw, "a number")),
        ColumnKind::Boolean => match raw {
            "true" | "1" => Ok(FilterValue::Boolean(true)),
            "false" | "0" => Ok(FilterValue::Boolean(false)),
            _ => Err(invalid_value(param, raw, "a boolean")),
        },
        ColumnKind::Timestamp => parse_timestamp(raw)
            .map(FilterValue::Timestamp)
            .ok_or_else(|| invalid_value(param, raw, "an RFC 3339 timestamp or YYYY-MM-DD date")),
    }
}

/// Accept full RFC 3339 timestamps or bare dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn invalid_value(param: &str, raw: &str, expected: &str) -> CoreError {
    CoreError::Validation(format!(
        "Invalid value '{raw}' for parameter '{param}': expected {expected}"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
