// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object property map.
//!
//! This module provides [`Metadata`], the name → [`Property`] map every
//! [`Object`](crate::Object) exposes for reflection.

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;

use crate::error::MetaError;
use crate::property::Property;

/// A map from property name to [`Property`].
///
/// Names are unique. Lookup is by hash; enumeration follows insertion order.
/// The map uses interior mutability so that objects shared behind `Rc` can
/// add properties lazily.
///
/// # Example
///
/// ```rust
/// use lume_meta::{Metadata, Property};
///
/// let metadata = Metadata::new();
/// metadata.add_property(Property::new("Width", 0.0_f32)).unwrap();
/// metadata.add_property(Property::new("Height", 0.0_f32)).unwrap();
///
/// assert!(metadata.add_property(Property::new("Width", 1.0_f32)).is_err());
/// assert_eq!(metadata.names(), ["Width", "Height"]);
/// assert!(metadata.get_property("Height").is_some());
/// ```
#[derive(Default)]
pub struct Metadata {
    properties: RefCell<Vec<Property>>,
    by_name: RefCell<HashMap<String, usize>>,
}

impl Metadata {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property.
    ///
    /// Fails with [`MetaError::DuplicateProperty`] if the name is taken.
    pub fn add_property(&self, property: Property) -> Result<(), MetaError> {
        let mut by_name = self.by_name.borrow_mut();
        if by_name.contains_key(property.name()) {
            return Err(MetaError::DuplicateProperty(property.name().into()));
        }
        let mut properties = self.properties.borrow_mut();
        by_name.insert(property.name().into(), properties.len());
        properties.push(property);
        Ok(())
    }

    /// Removes a property by name, returning it.
    pub fn remove_property(&self, name: &str) -> Option<Property> {
        let mut by_name = self.by_name.borrow_mut();
        let index = by_name.remove(name)?;
        let mut properties = self.properties.borrow_mut();
        let removed = properties.remove(index);
        for slot in by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<Property> {
        let index = *self.by_name.borrow().get(name)?;
        self.properties.borrow().get(index).cloned()
    }

    /// Returns `true` if a property with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.borrow().contains_key(name)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }

    /// Returns all properties in insertion order.
    #[must_use]
    pub fn properties(&self) -> Vec<Property> {
        self.properties.borrow().clone()
    }

    /// Returns all property names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.properties
            .borrow()
            .iter()
            .map(|p| String::from(p.name()))
            .collect()
    }
}

impl core::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Metadata")
            .field("count", &self.len())
            .field("properties", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    #[test]
    fn metadata_new() {
        let metadata = Metadata::new();
        assert!(metadata.is_empty());
        assert_eq!(metadata.len(), 0);
    }

    #[test]
    fn metadata_lookup_returns_same_property() {
        let metadata = Metadata::new();
        let width = Property::new("Width", 0.0_f32);
        metadata.add_property(width.clone()).unwrap();

        let found = metadata.get_property("Width").unwrap();
        assert!(found.ptr_eq(&width));
        assert!(metadata.get_property("Height").is_none());
    }

    #[test]
    fn metadata_duplicate_name() {
        let metadata = Metadata::new();
        metadata
            .add_property(Property::new("Width", 0.0_f32))
            .unwrap();
        assert_eq!(
            metadata.add_property(Property::new("Width", 0_u32)),
            Err(MetaError::DuplicateProperty("Width".into()))
        );
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn metadata_remove_keeps_order_and_index() {
        let metadata = Metadata::new();
        for name in ["A", "B", "C", "D"] {
            metadata.add_property(Property::new(name, 0_u32)).unwrap();
        }
        assert!(metadata.remove_property("B").is_some());
        assert!(metadata.remove_property("B").is_none());

        assert_eq!(metadata.names(), vec!["A", "C", "D"]);
        assert_eq!(metadata.get_property("D").unwrap().name(), "D");
        assert_eq!(metadata.get_property("C").unwrap().name(), "C");

        // The freed name can be reused.
        metadata.add_property(Property::new("B", 1_u32)).unwrap();
        assert_eq!(metadata.names(), vec!["A", "C", "D", "B"]);
    }

    #[test]
    fn metadata_debug() {
        let metadata = Metadata::new();
        metadata
            .add_property(Property::new("Width", 0.0_f32))
            .unwrap();
        let debug = format!("{:?}", metadata);
        assert!(debug.contains("Metadata"));
        assert!(debug.contains("Width"));
    }
}
