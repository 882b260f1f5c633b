// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lume Meta: reflective property runtime.
//!
//! This crate provides the object model a scene engine exposes to scripting
//! and UI layers: type-erased values, named observable properties, stacked
//! value providers and the converters that bridge exposed properties onto
//! engine-native fields.
//!
//! ## Core Concepts
//!
//! ### Values
//!
//! [`Any`] holds a scalar or an array of one [`ValueType`] out of a closed
//! set. Its [`TypeId`] never changes; mismatched access returns
//! [`MetaError::TypeMismatch`] rather than converting.
//!
//! ### Properties
//!
//! A [`Property`] has a name, a default value, a stored value and a stack of
//! [`ValueProvider`]s:
//!
//! - **Pushed providers** - the topmost is authoritative for reads and writes
//! - **Stored value** - set when no provider is pushed
//! - **Default** - what is left after a reset
//!
//! [`Property::on_changed`] fires once per change of the observable value.
//!
//! ### Providers
//!
//! | Provider | Behavior |
//! |----------|----------|
//! | [`StaticValue`] | Holds a value of its own |
//! | [`ConvertingValue`] | Converts to and from a target property |
//! | [`ConvertingArrayValue`] | Element-wise conversion between arrays |
//! | [`ForwardingValue`] | 1:1 forwarding to a target of the same type |
//! | [`BindingValue`] | Read-only mirror of another property |
//!
//! A provider produces exactly one type ([`ValueProvider::value_type`]) and
//! can only be pushed onto properties of that type.
//!
//! [`PropertyAnimation`] drives a property through a pushed provider.
//!
//! ### Objects
//!
//! An [`Object`] exposes its properties through [`Metadata`]; [`ObjectExt`]
//! adds typed access by name and [`PropertyProxy`] / [`ArrayProperty`] give
//! typed handles. Classes are instantiated through a [`ClassRegistry`].
//!
//! ## Quick Start
//!
//! ```rust
//! use lume_meta::{BitFlagConverter, ConvertingValue, Property};
//!
//! // One flags word shared by two exposed booleans.
//! let flags = Property::new("EnableFlags", 0_u32);
//! let tonemap = Property::new("Enabled", false);
//! let vignette = Property::new("Enabled", false);
//! tonemap.push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(0x1))).unwrap();
//! vignette.push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(0x2))).unwrap();
//!
//! tonemap.set_value(true).unwrap();
//! vignette.set_value(true).unwrap();
//! assert_eq!(flags.get_value::<u32>(), Ok(3));
//!
//! // Resetting writes the default through and removes the converter.
//! vignette.reset_value();
//! assert_eq!(flags.get_value::<u32>(), Ok(1));
//! assert!(tonemap.get_value::<bool>().unwrap());
//! ```
//!
//! ## Threading
//!
//! Properties are `Rc`-based and belong to one thread. Other threads marshal
//! work onto the owning thread instead of sharing properties.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod animation;
mod any;
mod array;
mod binding;
mod converting;
mod error;
mod event;
mod metadata;
mod object;
mod property;
mod proxy;
mod registry;
mod stack;
mod types;
mod value;

pub use animation::{AnimationState, Easing, PropertyAnimation, interpolate};
pub use any::Any;
pub use array::ArrayProperty;
pub use binding::BindingValue;
pub use converting::{
    BitFlagConverter, ColorConverter, Converter, ConvertingArrayValue, ConvertingValue,
    ForwardingValue, Passthrough, WidenInto, Widening,
};
pub use error::MetaError;
pub use event::{Event, HandlerId, ModifiedFlag};
pub use metadata::Metadata;
pub use object::{
    ClassId, InterfaceId, Object, ObjectExt, ObjectPtr, ObjectRef, WeakObjectPtr, same_object,
};
pub use property::{Property, PropertyBuilder, PropertyChangedCallback, WeakProperty};
pub use proxy::PropertyProxy;
pub use registry::{ClassRegistration, ClassRegistry};
pub use stack::{ResetResult, StaticValue, ValueProvider, same_provider};
pub use types::{Color, RenderSort};
pub use value::{Container, PropertyType, TypeId, Value, ValueType};

pub use glam::{Quat, Vec2, Vec3, Vec4};
