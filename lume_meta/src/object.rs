// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reflective objects.
//!
//! This module provides the [`Object`] trait for anything that exposes named
//! properties, [`ObjectExt`] for typed access by name, and [`ObjectRef`], the
//! identity-compared object value stored in properties.

use alloc::rc::{Rc, Weak};
use core::fmt;

use crate::any::Any;
use crate::error::MetaError;
use crate::metadata::Metadata;
use crate::property::Property;
use crate::value::PropertyType;

/// Identifies an interface an object implements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceId(&'static str);

impl InterfaceId {
    /// Creates an interface id from its name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the interface name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

/// Identifies a concrete object class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(&'static str);

impl ClassId {
    /// Creates a class id from its name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the class name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

/// An object exposing named properties.
///
/// The default [`property`](Self::property) looks the name up in
/// [`metadata`](Self::metadata). Objects whose properties are bound lazily
/// override it to resolve on first access.
///
/// # Example
///
/// ```rust
/// use lume_meta::{ClassId, Metadata, Object, ObjectExt, Property};
///
/// struct Light {
///     metadata: Metadata,
/// }
///
/// impl Object for Light {
///     fn class_id(&self) -> ClassId {
///         ClassId::new("Light")
///     }
///     fn metadata(&self) -> &Metadata {
///         &self.metadata
///     }
///     fn as_any(&self) -> &dyn core::any::Any {
///         self
///     }
/// }
///
/// let light = Light { metadata: Metadata::new() };
/// light.metadata().add_property(Property::new("Intensity", 1.0_f32)).unwrap();
///
/// light.set_value("Intensity", 4.0_f32).unwrap();
/// assert_eq!(light.get_value::<f32>("Intensity"), Ok(4.0));
/// assert!(light.get_value::<f32>("Range").is_err());
/// ```
pub trait Object: 'static {
    /// Returns the class of this object.
    fn class_id(&self) -> ClassId;

    /// Returns the interfaces this object implements.
    fn interfaces(&self) -> &'static [InterfaceId] {
        &[]
    }

    /// Returns the name → property map.
    fn metadata(&self) -> &Metadata;

    /// Looks up a property by name.
    fn property(&self, name: &str) -> Option<Property> {
        self.metadata().get_property(name)
    }

    /// Returns the object this one is attached to, if any.
    fn parent(&self) -> Option<ObjectPtr> {
        None
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn core::any::Any;
}

/// Shared ownership of an object.
pub type ObjectPtr = Rc<dyn Object>;

/// Non-owning handle to an object.
pub type WeakObjectPtr = Weak<dyn Object>;

/// Returns `true` if both pointers refer to the same object.
#[must_use]
pub fn same_object(a: &ObjectPtr, b: &ObjectPtr) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Typed access to an object's properties by name.
pub trait ObjectExt: Object {
    /// Reads a property as `T`.
    ///
    /// Fails with [`MetaError::UnresolvedProperty`] for unknown names.
    fn get_value<T: PropertyType>(&self, name: &str) -> Result<T, MetaError> {
        self.property(name)
            .ok_or_else(|| MetaError::UnresolvedProperty(name.into()))?
            .get_value()
    }

    /// Writes a property.
    ///
    /// Fails with [`MetaError::UnresolvedProperty`] for unknown names.
    fn set_value<T: PropertyType>(&self, name: &str, value: T) -> Result<(), MetaError> {
        self.set_value_any(name, &Any::new(value))
    }

    /// Writes a property from an [`Any`].
    fn set_value_any(&self, name: &str, value: &Any) -> Result<(), MetaError> {
        self.property(name)
            .ok_or_else(|| MetaError::UnresolvedProperty(name.into()))?
            .set_value_any(value)
    }

    /// Returns `true` if the object implements `interface`.
    fn implements(&self, interface: InterfaceId) -> bool {
        self.interfaces().contains(&interface)
    }
}

impl<O: Object + ?Sized> ObjectExt for O {}

/// An object value: a nullable, identity-compared [`ObjectPtr`].
///
/// Two `ObjectRef`s are equal when they point at the same object (or are both
/// null), never by comparing object contents.
#[derive(Clone, Default)]
pub struct ObjectRef(Option<ObjectPtr>);

impl ObjectRef {
    /// Wraps an object.
    #[must_use]
    pub fn new(object: ObjectPtr) -> Self {
        Self(Some(object))
    }

    /// The null reference.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Returns `true` for the null reference.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the referenced object.
    #[must_use]
    pub fn get(&self) -> Option<&ObjectPtr> {
        self.0.as_ref()
    }

    /// Consumes the reference, returning the object.
    #[must_use]
    pub fn into_inner(self) -> Option<ObjectPtr> {
        self.0
    }
}

impl From<ObjectPtr> for ObjectRef {
    fn from(object: ObjectPtr) -> Self {
        Self::new(object)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => same_object(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(object) => f
                .debug_tuple("ObjectRef")
                .field(&object.class_id().name())
                .finish(),
            None => f.write_str("ObjectRef(null)"),
        }
    }
}
