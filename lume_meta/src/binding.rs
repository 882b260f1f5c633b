// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-way bindings between properties.

use alloc::rc::Rc;

use crate::any::Any;
use crate::error::MetaError;
use crate::property::{Property, WeakProperty};
use crate::stack::ValueProvider;
use crate::value::TypeId;

/// A read-only provider mirroring another property.
///
/// The binding holds the source weakly. Once the source is dropped, reads of
/// the bound property fall back to its stored value or default.
#[derive(Debug)]
pub struct BindingValue {
    source: WeakProperty,
    type_id: TypeId,
    target_name: alloc::string::String,
}

impl BindingValue {
    /// Returns the bound source, if it is still alive.
    #[must_use]
    pub fn source_property(&self) -> Option<Property> {
        self.source.upgrade()
    }
}

impl ValueProvider for BindingValue {
    fn get_value(&self) -> Result<Any, MetaError> {
        self.source
            .upgrade()
            .map(|source| source.get_value_any())
            .ok_or(MetaError::InvalidHandle)
    }

    fn set_value(&self, _value: &Any) -> Result<(), MetaError> {
        Err(MetaError::ReadOnly(self.target_name.clone()))
    }

    fn value_type(&self) -> TypeId {
        self.type_id
    }

    fn is_compatible(&self, type_id: TypeId) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.type_id() == type_id)
    }

    fn source(&self) -> Option<Property> {
        self.source.upgrade()
    }
}

impl Property {
    /// Binds this property to `source`.
    ///
    /// The binding is pushed on top of the stack: reads follow the source,
    /// writes fail with [`MetaError::ReadOnly`] and changes of the source are
    /// reported as changes of this property. [`reset_value`](Self::reset_value)
    /// or [`remove_value`](Self::remove_value) with the returned handle
    /// removes it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lume_meta::{MetaError, Property};
    ///
    /// let master = Property::new("Volume", 0.5_f32);
    /// let mirror = Property::new("Volume", 0.0_f32);
    /// mirror.bind(&master).unwrap();
    ///
    /// master.set_value(0.8_f32).unwrap();
    /// assert_eq!(mirror.get_value::<f32>(), Ok(0.8));
    /// assert!(matches!(mirror.set_value(0.1_f32), Err(MetaError::ReadOnly(_))));
    ///
    /// mirror.reset_value();
    /// assert_eq!(mirror.get_value::<f32>(), Ok(0.0));
    /// ```
    pub fn bind(&self, source: &Self) -> Result<Rc<BindingValue>, MetaError> {
        if self.ptr_eq(source) {
            log::warn!("property '{}' cannot be bound to itself", self.name());
            return Err(MetaError::InvalidHandle);
        }
        if source.type_id() != self.type_id() {
            return Err(MetaError::mismatch(self.type_id(), source.type_id()));
        }
        let binding = Rc::new(BindingValue {
            source: source.downgrade(),
            type_id: source.type_id(),
            target_name: self.name().into(),
        });
        self.push_value(binding.clone())?;
        Ok(binding)
    }
}
