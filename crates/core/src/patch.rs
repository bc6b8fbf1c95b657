//! Tri-state partial-update fields.
//!
//! Update DTOs need three distinct cases per field: key absent ("leave
//! unchanged"), explicit `null` ("clear the column"), and a value ("set").
//! A plain `Option<T>` collapses the first two, so update DTOs use
//! [`Patch<T>`] with `#[serde(default)]` instead.

use serde::{Deserialize, Deserializer};

/// A field of an update DTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Key absent from the payload: leave the column unchanged.
    #[default]
    Missing,
    /// Explicit `null`: clear the column.
    Null,
    /// Set the column to this value.
    Value(T),
}

impl<T> Patch<T> {
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// `None` when missing, `Some(None)` for an explicit null,
    /// `Some(Some(v))` for a value.
    pub const fn as_option(&self) -> Option<Option<&T>> {
        match self {
            Self::Missing => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }

    /// Like [`Self::as_option`], consuming the patch.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Missing => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    // Only reached when the key is present; `Missing` comes from
    // `#[serde(default)]` on the DTO field.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Value(v),
            None => Self::Null,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
