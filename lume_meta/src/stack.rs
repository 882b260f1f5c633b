// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value providers.
//!
//! A [`Property`](crate::Property) keeps a stored value at the bottom and a
//! stack of [`ValueProvider`]s above it. The topmost provider is
//! authoritative for reads and writes; resetting the property walks the stack
//! from the top, asking each provider what to do via
//! [`ValueProvider::process_on_reset`].

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::any::Any;
use crate::error::MetaError;
use crate::property::Property;
use crate::value::TypeId;

/// What a provider wants to happen to it when its property is reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetResult {
    /// Remove the provider from the stack and continue with the next one.
    Pop,
    /// Keep the provider and stop resetting.
    Keep,
}

/// A source of values pushed onto a property's stack.
///
/// Providers are shared (`Rc`) and use interior mutability; every method
/// takes `&self`.
pub trait ValueProvider {
    /// Returns the current value.
    fn get_value(&self) -> Result<Any, MetaError>;

    /// Accepts a new value.
    ///
    /// On failure the provider and anything behind it must be unchanged.
    fn set_value(&self, value: &Any) -> Result<(), MetaError>;

    /// The type of the values this provider produces.
    ///
    /// A provider can only be pushed onto a property of exactly this type.
    fn value_type(&self) -> TypeId;

    /// Returns `true` if values of `type_id` can be exchanged through this
    /// provider. Converting providers accept both sides of the conversion.
    fn is_compatible(&self, type_id: TypeId) -> bool;

    /// Called top-down when the owning property is reset.
    fn process_on_reset(&self, _default: &Any) -> ResetResult {
        ResetResult::Pop
    }

    /// The property this provider derives its value from, if any.
    ///
    /// While the provider is on a stack, changes of the source are reported
    /// as changes of the owning property.
    fn source(&self) -> Option<Property> {
        None
    }
}

impl fmt::Debug for dyn ValueProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueProvider").finish_non_exhaustive()
    }
}

/// Returns `true` if both handles point at the same provider.
#[must_use]
pub fn same_provider(a: &Rc<dyn ValueProvider>, b: &Rc<dyn ValueProvider>) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// A provider that simply holds a value.
///
/// Pushing a `StaticValue` overrides whatever is below it until it is popped
/// or the property is reset.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use lume_meta::{Any, Property, StaticValue};
///
/// let opacity = Property::new("Opacity", 1.0_f32);
/// opacity.push_value(Rc::new(StaticValue::new(Any::new(0.5_f32)))).unwrap();
/// assert_eq!(opacity.get_value::<f32>(), Ok(0.5));
///
/// opacity.reset_value();
/// assert_eq!(opacity.get_value::<f32>(), Ok(1.0));
/// ```
#[derive(Debug)]
pub struct StaticValue {
    value: RefCell<Any>,
}

impl StaticValue {
    /// Creates a provider holding `value`.
    #[must_use]
    pub fn new(value: Any) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Returns a copy of the held value.
    #[must_use]
    pub fn value(&self) -> Any {
        self.value.borrow().clone()
    }
}

impl ValueProvider for StaticValue {
    fn get_value(&self) -> Result<Any, MetaError> {
        Ok(self.value())
    }

    fn set_value(&self, value: &Any) -> Result<(), MetaError> {
        self.value.borrow_mut().copy_from(value)
    }

    fn value_type(&self) -> TypeId {
        self.value.borrow().type_id()
    }

    fn is_compatible(&self, type_id: TypeId) -> bool {
        self.value.borrow().is_compatible(type_id)
    }
}
