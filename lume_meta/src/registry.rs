// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class registry.
//!
//! This module provides [`ClassRegistry`] for registering object classes once
//! at startup and instantiating them by [`ClassId`] later.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::error::MetaError;
use crate::object::{ClassId, InterfaceId};

/// A registration entry for a class.
pub struct ClassRegistration<T: ?Sized> {
    id: ClassId,
    interfaces: &'static [InterfaceId],
    constructor: fn() -> Rc<T>,
}

impl<T: ?Sized> ClassRegistration<T> {
    /// Returns the class id.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Returns the interfaces instances of this class implement.
    #[must_use]
    #[inline]
    pub fn interfaces(&self) -> &'static [InterfaceId] {
        self.interfaces
    }

    /// Returns `true` if the class implements `interface`.
    #[must_use]
    pub fn implements(&self, interface: InterfaceId) -> bool {
        self.interfaces.contains(&interface)
    }
}

impl<T: ?Sized> core::fmt::Debug for ClassRegistration<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassRegistration")
            .field("id", &self.id)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

/// A registry of constructible classes producing `Rc<T>`.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use lume_meta::{ClassId, ClassRegistry, InterfaceId};
///
/// const IGREETER: InterfaceId = InterfaceId::new("IGreeter");
/// const HELLO: ClassId = ClassId::new("Hello");
///
/// let mut registry: ClassRegistry<str> = ClassRegistry::new();
/// registry.register(HELLO, &[IGREETER], || Rc::from("hello")).unwrap();
///
/// assert!(registry.implements(HELLO, IGREETER));
/// assert_eq!(registry.create(HELLO).as_deref(), Some("hello"));
/// assert!(registry.create(ClassId::new("Missing")).is_none());
/// ```
pub struct ClassRegistry<T: ?Sized> {
    classes: Vec<ClassRegistration<T>>,
    by_id: HashMap<ClassId, usize>,
}

impl<T: ?Sized> Default for ClassRegistry<T> {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T: ?Sized> ClassRegistry<T> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class.
    ///
    /// Fails with [`MetaError::DuplicateClass`] if `id` is already taken.
    pub fn register(
        &mut self,
        id: ClassId,
        interfaces: &'static [InterfaceId],
        constructor: fn() -> Rc<T>,
    ) -> Result<(), MetaError> {
        if self.by_id.contains_key(&id) {
            return Err(MetaError::DuplicateClass(id.name()));
        }
        self.by_id.insert(id, self.classes.len());
        self.classes.push(ClassRegistration {
            id,
            interfaces,
            constructor,
        });
        Ok(())
    }

    /// Returns the registration of `id`.
    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&ClassRegistration<T>> {
        self.by_id.get(&id).map(|&index| &self.classes[index])
    }

    /// Instantiates a class.
    ///
    /// Returns `None` for unknown classes.
    #[must_use]
    pub fn create(&self, id: ClassId) -> Option<Rc<T>> {
        let Some(registration) = self.get(id) else {
            log::error!("class '{}' is not registered", id.name());
            return None;
        };
        Some((registration.constructor)())
    }

    /// Returns `true` if `id` is registered and implements `interface`.
    #[must_use]
    pub fn implements(&self, id: ClassId, interface: InterfaceId) -> bool {
        self.get(id).is_some_and(|r| r.implements(interface))
    }

    /// Returns the number of registered classes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterates over all registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassRegistration<T>> {
        self.classes.iter()
    }
}

impl<T: ?Sized> core::fmt::Debug for ClassRegistry<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("count", &self.classes.len())
            .finish_non_exhaustive()
    }
}
