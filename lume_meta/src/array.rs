// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index-addressed properties.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::any::Any;
use crate::error::MetaError;
use crate::property::Property;
use crate::value::{PropertyType, TypeId};

/// A typed view over a property holding an array of `T`.
///
/// Every mutation reads the whole array through the property, edits it and
/// writes it back, so the usual stack and notification rules apply: one
/// change notification per successful mutation that changes the array.
///
/// # Example
///
/// ```rust
/// use lume_meta::ArrayProperty;
///
/// let layers = ArrayProperty::new("Layers", vec![1_u32, 3]);
/// layers.insert_value_at(1, 2).unwrap();
/// assert_eq!(layers.get_value(), vec![1, 2, 3]);
/// assert_eq!(layers.find_first_value_of(&3), Some(2));
///
/// layers.remove_at(0).unwrap();
/// assert_eq!(layers.get_value(), vec![2, 3]);
/// assert!(layers.get_value_at(5).is_err());
/// ```
pub struct ArrayProperty<T> {
    property: Property,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyType> ArrayProperty<T> {
    /// Creates an array property with the given default elements.
    #[must_use]
    pub fn new(name: impl Into<String>, default: Vec<T>) -> Self {
        Self {
            property: Property::from_any(name, Any::new_array(default)),
            _marker: PhantomData,
        }
    }

    /// Views an existing property, if its type is an array of `T`.
    #[must_use]
    pub fn from_property(property: Property) -> Option<Self> {
        (property.type_id() == TypeId::array_of::<T>()).then_some(Self {
            property,
            _marker: PhantomData,
        })
    }

    /// Returns the underlying property.
    #[must_use]
    #[inline]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Returns all elements.
    #[must_use]
    pub fn get_value(&self) -> Vec<T> {
        self.property
            .get_value_any()
            .get_array()
            .unwrap_or_else(|err| {
                log::warn!("array '{}': {err}", self.property.name());
                Vec::new()
            })
    }

    /// Replaces all elements.
    pub fn set_value(&self, values: Vec<T>) -> Result<(), MetaError> {
        self.property.set_value_any(&Any::new_array(values))
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.property.get_value_any().len()
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index`.
    pub fn get_value_at(&self, index: usize) -> Result<T, MetaError> {
        self.property.get_value_any().get_at(index)
    }

    /// Replaces the element at `index`.
    pub fn set_value_at(&self, index: usize, value: T) -> Result<(), MetaError> {
        self.modify(|any| any.set_at(index, value))
    }

    /// Appends an element.
    pub fn add_value(&self, value: T) -> Result<(), MetaError> {
        self.modify(|any| any.push(value))
    }

    /// Inserts an element at `index`; `index == len` appends.
    pub fn insert_value_at(&self, index: usize, value: T) -> Result<(), MetaError> {
        self.modify(|any| any.insert_at(index, value))
    }

    /// Removes the element at `index`.
    pub fn remove_at(&self, index: usize) -> Result<(), MetaError> {
        self.modify(|any| any.remove_at(index))
    }

    /// Returns the index of the first element equal to `value`.
    #[must_use]
    pub fn find_first_value_of(&self, value: &T) -> Option<usize> {
        self.property.get_value_any().find_first(value)
    }

    /// Removes every element.
    pub fn clear(&self) -> Result<(), MetaError> {
        self.set_value(Vec::new())
    }

    fn modify(
        &self,
        edit: impl FnOnce(&mut Any) -> Result<(), MetaError>,
    ) -> Result<(), MetaError> {
        let mut any = self.property.get_value_any();
        edit(&mut any)?;
        self.property.set_value_any(&any)
    }
}

impl<T> Clone for ArrayProperty<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ArrayProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayProperty")
            .field("property", &self.property)
            .finish()
    }
}
