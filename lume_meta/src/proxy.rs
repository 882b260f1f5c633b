// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed handles over type-erased properties.

use core::fmt;
use core::marker::PhantomData;

use crate::error::MetaError;
use crate::object::Object;
use crate::property::Property;
use crate::value::{PropertyType, TypeId};

/// A typed, nullable handle to a [`Property`] holding `T`.
///
/// A proxy is either valid (it wraps a property compatible with `T`) or null.
/// Accessors on a null proxy never fail loudly: reads return `T::default()`
/// and writes report `false`, each with a log line.
///
/// # Example
///
/// ```rust
/// use lume_meta::{Property, PropertyProxy};
///
/// let width = PropertyProxy::<f32>::new(Property::new("Width", 1.0_f32));
/// assert!(width.is_valid());
/// assert!(width.set_value(3.0));
/// assert_eq!(width.get_value(), 3.0);
///
/// // Wrong type: the proxy is null.
/// let wrong = PropertyProxy::<bool>::new(Property::new("Width", 1.0_f32));
/// assert!(!wrong.is_valid());
/// assert!(!wrong.get_value());
/// ```
pub struct PropertyProxy<T> {
    property: Option<Property>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyType> PropertyProxy<T> {
    /// Wraps `property`, or returns a null proxy if it cannot hold `T`.
    #[must_use]
    pub fn new(property: Property) -> Self {
        if property.is_compatible(TypeId::of::<T>()) {
            Self {
                property: Some(property),
                _marker: PhantomData,
            }
        } else {
            log::warn!(
                "property '{}' of type {} does not hold {}",
                property.name(),
                property.type_id(),
                TypeId::of::<T>()
            );
            Self::null()
        }
    }

    /// Wraps an optional property.
    #[must_use]
    pub fn from_option(property: Option<Property>) -> Self {
        property.map_or_else(Self::null, Self::new)
    }

    /// Looks up `name` on `object`.
    #[must_use]
    pub fn from_object<O: Object + ?Sized>(object: &O, name: &str) -> Self {
        Self::from_option(object.property(name))
    }

    /// The null proxy.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            property: None,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the proxy wraps a property.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.property.is_some()
    }

    /// Returns the wrapped property.
    #[must_use]
    #[inline]
    pub fn property(&self) -> Option<&Property> {
        self.property.as_ref()
    }

    /// Reads the value.
    ///
    /// Fails with [`MetaError::InvalidHandle`] on a null proxy.
    pub fn try_get_value(&self) -> Result<T, MetaError> {
        self.property
            .as_ref()
            .ok_or(MetaError::InvalidHandle)?
            .get_value()
    }

    /// Reads the value, or `T::default()` if that fails.
    #[must_use]
    pub fn get_value(&self) -> T {
        self.try_get_value().unwrap_or_else(|err| {
            log::warn!("{self:?}: read failed: {err}");
            T::default()
        })
    }

    /// Writes the value. Returns `true` on success.
    pub fn set_value(&self, value: T) -> bool {
        let result = self
            .property
            .as_ref()
            .ok_or(MetaError::InvalidHandle)
            .and_then(|p| p.set_value(value));
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{self:?}: write failed: {err}");
                false
            }
        }
    }

    /// Resets the property. Does nothing on a null proxy.
    pub fn reset(&self) {
        if let Some(property) = &self.property {
            property.reset_value();
        }
    }
}

impl<T> Clone for PropertyProxy<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: PropertyType> Default for PropertyProxy<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for PropertyProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.property, &other.property) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> fmt::Debug for PropertyProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(p) => f.debug_tuple("PropertyProxy").field(&p.name()).finish(),
            None => f.write_str("PropertyProxy(null)"),
        }
    }
}
