// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named, observable, typed value cells.
//!
//! A [`Property`] holds a default value, an optional stored value and a stack
//! of [`ValueProvider`]s. Reads and writes go to the top of the stack:
//!
//! **pushed providers (top first) → stored value → default**
//!
//! # Notification
//!
//! [`Property::on_changed`] fires once for every change of the observable
//! value, whether it came from a write, a push/pop/reset, or from the source
//! property of a provider on the stack. Writes that leave the value as it was
//! do not notify, and neither do failed writes.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::any::Any;
use crate::error::MetaError;
use crate::event::{Event, HandlerId};
use crate::object::InterfaceId;
use crate::stack::{ResetResult, ValueProvider, same_provider};
use crate::value::{PropertyType, TypeId, ValueType};

/// Callback invoked when a property's value changes.
pub type PropertyChangedCallback = alloc::boxed::Box<dyn Fn(&Property)>;

/// Most properties carry at most an engine binding and an animation.
const INLINE_STACK: usize = 2;

struct StackEntry {
    provider: Rc<dyn ValueProvider>,
    subscription: Option<(WeakProperty, HandlerId)>,
}

impl StackEntry {
    fn unsubscribe(&self) {
        if let Some((source, id)) = &self.subscription
            && let Some(source) = source.upgrade()
        {
            source.on_changed().remove_handler(*id);
        }
    }
}

struct PropertyInner {
    name: String,
    type_id: TypeId,
    interface: Option<InterfaceId>,
    default: RefCell<Any>,
    stored: RefCell<Option<Any>>,
    stack: RefCell<SmallVec<[StackEntry; INLINE_STACK]>>,
    observed: RefCell<Any>,
    on_changed: Event<Property>,
    suspended: Cell<u32>,
    evaluating: Cell<bool>,
}

impl Drop for PropertyInner {
    fn drop(&mut self) {
        for entry in self.stack.get_mut().drain(..) {
            entry.unsubscribe();
        }
    }
}

/// A shared handle to a named, typed, observable value.
///
/// Cloning the handle shares the property.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use lume_meta::Property;
///
/// let exposure = Property::new("Exposure", 1.0_f32);
/// let changes = Rc::new(Cell::new(0));
/// let c = changes.clone();
/// exposure.on_changed().add_handler(move |_| c.set(c.get() + 1));
///
/// exposure.set_value(2.0_f32).unwrap();
/// exposure.set_value(2.0_f32).unwrap(); // no-op, no notification
/// assert_eq!(exposure.get_value::<f32>(), Ok(2.0));
/// assert_eq!(changes.get(), 1);
///
/// // Wrong type: rejected, nothing changes, nobody is told.
/// assert!(exposure.set_value(3_u32).is_err());
/// assert_eq!(changes.get(), 1);
/// ```
#[derive(Clone)]
pub struct Property(Rc<PropertyInner>);

/// A weak handle to a [`Property`].
#[derive(Clone, Default)]
pub struct WeakProperty(Weak<PropertyInner>);

impl WeakProperty {
    /// Returns a strong handle if the property is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Property> {
        self.0.upgrade().map(Property)
    }
}

impl fmt::Debug for WeakProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(p) => f.debug_tuple("WeakProperty").field(&p.name()).finish(),
            None => f.write_str("WeakProperty(<dropped>)"),
        }
    }
}

impl Property {
    /// Creates a scalar property with a default value.
    #[must_use]
    pub fn new<T: PropertyType>(name: impl Into<String>, default: T) -> Self {
        PropertyBuilder::new(name, Any::new(default)).build()
    }

    /// Creates a property whose default value is an arbitrary [`Any`].
    #[must_use]
    pub fn from_any(name: impl Into<String>, default: Any) -> Self {
        PropertyBuilder::new(name, default).build()
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the property type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// Returns the interface object values must implement, for object-typed
    /// properties that declare one.
    #[must_use]
    pub fn interface(&self) -> Option<InterfaceId> {
        self.0.interface
    }

    /// Returns `true` if values of `type_id` can be exchanged with this
    /// property, either directly or through the top provider.
    #[must_use]
    pub fn is_compatible(&self, type_id: TypeId) -> bool {
        if self.0.type_id == type_id {
            return true;
        }
        self.top_value().is_some_and(|p| p.is_compatible(type_id))
    }

    /// Returns `true` if this is an object property declared for `interface`.
    #[must_use]
    pub fn is_compatible_interface(&self, interface: InterfaceId) -> bool {
        self.0.type_id == TypeId::scalar(ValueType::Object) && self.0.interface == Some(interface)
    }

    /// Returns `true` if both handles refer to the same property.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakProperty {
        WeakProperty(Rc::downgrade(&self.0))
    }

    /// Event fired after every change of the observable value.
    #[must_use]
    pub fn on_changed(&self) -> &Event<Self> {
        &self.0.on_changed
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Returns the current value.
    ///
    /// A provider that fails to produce a value is skipped in favour of the
    /// stored value or the default; the failure is logged.
    #[must_use]
    pub fn get_value_any(&self) -> Any {
        if self.0.evaluating.replace(true) {
            log::warn!("cyclic read of property '{}'", self.name());
            return self.stored_or_default();
        }
        let value = match self.top_value() {
            Some(provider) => provider.get_value().unwrap_or_else(|err| {
                log::warn!("property '{}': provider read failed: {err}", self.name());
                self.stored_or_default()
            }),
            None => self.stored_or_default(),
        };
        self.0.evaluating.set(false);
        value
    }

    /// Returns the current value as `T`.
    pub fn get_value<T: PropertyType>(&self) -> Result<T, MetaError> {
        self.get_value_any().get_value()
    }

    /// Writes a value through the top of the stack.
    ///
    /// On failure nothing changes and no notification is sent.
    pub fn set_value_any(&self, value: &Any) -> Result<(), MetaError> {
        let result = self.with_notifications_suspended(|| self.write_top(value));
        self.notify_if_changed();
        result
    }

    fn write_top(&self, value: &Any) -> Result<(), MetaError> {
        match self.top_value() {
            Some(provider) => provider.set_value(value),
            None => {
                if value.type_id() != self.0.type_id {
                    return Err(MetaError::mismatch(self.0.type_id, value.type_id()));
                }
                *self.0.stored.borrow_mut() = Some(value.clone());
                Ok(())
            }
        }
    }

    /// Writes a value of type `T`.
    pub fn set_value<T: PropertyType>(&self, value: T) -> Result<(), MetaError> {
        self.set_value_any(&Any::new(value))
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> Any {
        self.0.default.borrow().clone()
    }

    /// Replaces the default value.
    pub fn set_default_value(&self, value: &Any) -> Result<(), MetaError> {
        self.0.default.borrow_mut().copy_from(value)?;
        self.notify_if_changed();
        Ok(())
    }

    /// Returns `true` when neither a stored value nor any provider is present.
    #[must_use]
    pub fn is_default_value(&self) -> bool {
        self.0.stack.borrow().is_empty() && self.0.stored.borrow().is_none()
    }

    /// Returns the stored value, if one has been written below the providers.
    #[must_use]
    pub fn stored_value(&self) -> Option<Any> {
        self.0.stored.borrow().clone()
    }

    /// Removes and returns the stored value. Providers stay in place.
    pub fn take_stored_value(&self) -> Option<Any> {
        let taken = self.0.stored.borrow_mut().take();
        self.notify_if_changed();
        taken
    }

    fn stored_or_default(&self) -> Any {
        match &*self.0.stored.borrow() {
            Some(v) => v.clone(),
            None => self.default_value(),
        }
    }

    // =========================================================================
    // Provider stack
    // =========================================================================

    /// Pushes a provider; it becomes authoritative for reads and writes.
    ///
    /// The provider must produce values of the property type.
    pub fn push_value(&self, provider: Rc<dyn ValueProvider>) -> Result<(), MetaError> {
        let produced = provider.value_type();
        if produced != self.0.type_id {
            return Err(MetaError::mismatch(self.0.type_id, produced));
        }
        let subscription = provider.source().map(|source| {
            let this = self.downgrade();
            let id = source.on_changed().add_handler(move |_| {
                if let Some(this) = this.upgrade() {
                    this.notify_if_changed();
                }
            });
            (source.downgrade(), id)
        });
        self.0.stack.borrow_mut().push(StackEntry {
            provider,
            subscription,
        });
        log::debug!(
            "property '{}': pushed provider (depth {})",
            self.name(),
            self.stack_depth()
        );
        self.notify_if_changed();
        Ok(())
    }

    /// Pops the top provider.
    pub fn pop_value(&self) -> Option<Rc<dyn ValueProvider>> {
        let entry = self.0.stack.borrow_mut().pop()?;
        entry.unsubscribe();
        self.notify_if_changed();
        Some(entry.provider)
    }

    /// Removes `provider` wherever it is on the stack.
    ///
    /// Returns `true` if it was found.
    pub fn remove_value(&self, provider: &Rc<dyn ValueProvider>) -> bool {
        let entry = {
            let mut stack = self.0.stack.borrow_mut();
            let Some(index) = stack
                .iter()
                .position(|e| same_provider(&e.provider, provider))
            else {
                return false;
            };
            stack.remove(index)
        };
        entry.unsubscribe();
        self.notify_if_changed();
        true
    }

    /// Removes `provider` and writes `value` to whatever is below it.
    ///
    /// Listeners see a single change from the old value to the final one.
    pub(crate) fn remove_value_and_set(
        &self,
        provider: &Rc<dyn ValueProvider>,
        value: &Any,
    ) -> Result<(), MetaError> {
        let result = self.with_notifications_suspended(|| {
            let entry = {
                let mut stack = self.0.stack.borrow_mut();
                let index = stack
                    .iter()
                    .position(|e| same_provider(&e.provider, provider));
                index.map(|i| stack.remove(i))
            };
            if let Some(entry) = entry {
                entry.unsubscribe();
            }
            self.write_top(value)
        });
        self.notify_if_changed();
        result
    }

    /// Returns `true` if `provider` is on the stack.
    #[must_use]
    pub fn has_value(&self, provider: &Rc<dyn ValueProvider>) -> bool {
        self.0
            .stack
            .borrow()
            .iter()
            .any(|e| same_provider(&e.provider, provider))
    }

    /// Returns the top provider, if any has been pushed.
    #[must_use]
    pub fn top_value(&self) -> Option<Rc<dyn ValueProvider>> {
        self.0.stack.borrow().last().map(|e| Rc::clone(&e.provider))
    }

    /// Returns the depth of the value stack, counting the stored value at
    /// the bottom. Always at least 1.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.0.stack.borrow().len() + 1
    }

    /// Resets the property.
    ///
    /// Providers are asked top-down via
    /// [`ValueProvider::process_on_reset`]; those answering
    /// [`ResetResult::Pop`] are removed. If every provider was removed, the
    /// stored value is cleared as well. Resetting an already reset property
    /// does nothing.
    pub fn reset_value(&self) {
        let default = self.default_value();
        self.with_notifications_suspended(|| {
            loop {
                let Some(top) = self.top_value() else {
                    *self.0.stored.borrow_mut() = None;
                    break;
                };
                if top.process_on_reset(&default) == ResetResult::Keep {
                    break;
                }
                // The provider may have been removed as a side effect.
                let entry = {
                    let mut stack = self.0.stack.borrow_mut();
                    let index = stack.iter().rposition(|e| same_provider(&e.provider, &top));
                    index.map(|i| stack.remove(i))
                };
                if let Some(entry) = entry {
                    entry.unsubscribe();
                }
            }
        });
        log::debug!(
            "property '{}': reset (depth {})",
            self.name(),
            self.stack_depth()
        );
        self.notify_if_changed();
    }

    // =========================================================================
    // Notification
    // =========================================================================

    /// Compares the current value with the last observed one and notifies
    /// listeners if they differ.
    pub(crate) fn notify_if_changed(&self) {
        if self.0.suspended.get() > 0 {
            return;
        }
        let current = self.get_value_any();
        let changed = {
            let mut observed = self.0.observed.borrow_mut();
            if *observed == current {
                false
            } else {
                *observed = current;
                true
            }
        };
        if changed {
            self.0.on_changed.invoke(self);
        }
    }

    fn with_notifications_suspended<R>(&self, f: impl FnOnce() -> R) -> R {
        self.0.suspended.set(self.0.suspended.get() + 1);
        let result = f();
        self.0.suspended.set(self.0.suspended.get() - 1);
        result
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.0.name)
            .field("type_id", &self.0.type_id)
            .field("depth", &self.stack_depth())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Property`].
///
/// # Example
///
/// ```rust
/// use lume_meta::{Any, InterfaceId, PropertyBuilder, ObjectRef, TypeId};
///
/// const IBLOOM: InterfaceId = InterfaceId::new("IBloom");
///
/// let bloom = PropertyBuilder::new("Bloom", Any::new(ObjectRef::null()))
///     .interface(IBLOOM)
///     .build();
/// assert!(bloom.is_compatible_interface(IBLOOM));
/// assert_eq!(bloom.type_id(), TypeId::of::<ObjectRef>());
/// ```
pub struct PropertyBuilder {
    name: String,
    default: Any,
    interface: Option<InterfaceId>,
    changed_callback: Option<PropertyChangedCallback>,
}

impl fmt::Debug for PropertyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBuilder")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("interface", &self.interface)
            .field("has_changed_callback", &self.changed_callback.is_some())
            .finish()
    }
}

impl PropertyBuilder {
    /// Starts a property with a name and default value; the default's type is
    /// the property type.
    #[must_use]
    pub fn new(name: impl Into<String>, default: Any) -> Self {
        Self {
            name: name.into(),
            default,
            interface: None,
            changed_callback: None,
        }
    }

    /// Declares the interface stored objects implement.
    #[must_use]
    pub fn interface(mut self, interface: InterfaceId) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Registers a change handler at construction.
    #[must_use]
    pub fn on_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Property) + 'static,
    {
        self.changed_callback = Some(alloc::boxed::Box::new(callback));
        self
    }

    /// Builds the property.
    #[must_use]
    pub fn build(self) -> Property {
        let property = Property(Rc::new(PropertyInner {
            type_id: self.default.type_id(),
            interface: self.interface,
            observed: RefCell::new(self.default.clone()),
            default: RefCell::new(self.default),
            name: self.name,
            stored: RefCell::new(None),
            stack: RefCell::new(SmallVec::new()),
            on_changed: Event::new(),
            suspended: Cell::new(0),
            evaluating: Cell::new(false),
        }));
        if let Some(callback) = self.changed_callback {
            property.on_changed().add_handler(callback);
        }
        property
    }
}
