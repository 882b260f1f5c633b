// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every fallible operation in this crate.

use alloc::string::String;

use crate::value::TypeId;

/// Errors reported by the property runtime.
///
/// Nothing in this crate unwinds: failures are returned, and callers decide
/// whether to log, fall back to a default, or propagate further.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    /// The requested type does not match the stored type.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The type the container or property holds.
        expected: TypeId,
        /// The type that was requested or supplied.
        found: TypeId,
    },
    /// A dynamic property could not be bound to its engine field.
    #[error("property '{0}' is not resolved")]
    UnresolvedProperty(String),
    /// The underlying object or property handle is gone.
    #[error("invalid handle")]
    InvalidHandle,
    /// An index was outside the bounds of an array value.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The length of the array at the time of the request.
        len: usize,
    },
    /// A property with the same name already exists in the metadata map.
    #[error("property '{0}' already exists")]
    DuplicateProperty(String),
    /// A class with the same id is already registered.
    #[error("class '{0}' is already registered")]
    DuplicateClass(&'static str),
    /// The top value provider does not accept writes.
    #[error("property '{0}' is read-only")]
    ReadOnly(String),
    /// An array operation was applied to a scalar value.
    #[error("value of type {0:?} is not an array")]
    NotAnArray(TypeId),
}

impl MetaError {
    /// Shorthand for a [`MetaError::TypeMismatch`].
    #[must_use]
    pub const fn mismatch(expected: TypeId, found: TypeId) -> Self {
        Self::TypeMismatch { expected, found }
    }
}
