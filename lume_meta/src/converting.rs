// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value providers that expose one property through another.
//!
//! A [`ConvertingValue`] is pushed onto an exposed property and forwards reads
//! and writes to a *target* property of a possibly different type, converting
//! with a [`Converter`] on the way. Every conversion towards the target starts
//! from the target's current value, re-read immediately before the write, so
//! several converters sharing one target (for example one flag bit each in a
//! shared flags word) never overwrite each other's state.
//!
//! [`ForwardingValue`] is the untyped 1:1 variant used when the exposed and
//! target types already agree.
//!
//! Converters provided here:
//!
//! | Converter | Exposed | Stored |
//! |-----------|---------|--------|
//! | [`BitFlagConverter`] | `bool` | one bit of a `u32` |
//! | [`ColorConverter`] | [`Color`] | `Vec4` |
//! | [`Widening`] | `i32`, `u32`, `f32` | `i64`, `u64`, `f64` |
//! | [`Passthrough`] | `T` | `T` |

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use glam::Vec4;

use crate::any::Any;
use crate::error::MetaError;
use crate::property::Property;
use crate::stack::{ResetResult, ValueProvider};
use crate::types::Color;
use crate::value::{PropertyType, TypeId};

/// A bidirectional conversion between an exposed source type and a stored
/// target type.
pub trait Converter: 'static {
    /// The type seen by users of the exposed property.
    type Source: PropertyType;
    /// The type stored in the target property.
    type Target: PropertyType;

    /// Derives the exposed value from the target value.
    ///
    /// `cached` is the last source value produced or accepted.
    fn convert_to_source(&self, cached: &Self::Source, target: &Self::Target) -> Self::Source;

    /// Derives the new target value from `source` and the current target value.
    fn convert_to_target(&self, source: &Self::Source, current: &Self::Target) -> Self::Target;
}

/// Exposes one bit of a `u32` flags word as a `bool`.
///
/// Setting the bit leaves every other bit of the current flags untouched.
///
/// ```rust
/// use lume_meta::{BitFlagConverter, Converter};
///
/// let bloom = BitFlagConverter::new(0x200);
/// assert!(bloom.convert_to_source(&false, &0x201));
/// assert_eq!(bloom.convert_to_target(&true, &0x1), 0x201);
/// assert_eq!(bloom.convert_to_target(&false, &0x201), 0x1);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitFlagConverter {
    bit: u32,
}

impl BitFlagConverter {
    /// Creates a converter for the given bit mask.
    #[must_use]
    pub const fn new(bit: u32) -> Self {
        Self { bit }
    }

    /// Returns the bit mask.
    #[must_use]
    #[inline]
    pub const fn bit(self) -> u32 {
        self.bit
    }
}

impl Converter for BitFlagConverter {
    type Source = bool;
    type Target = u32;

    fn convert_to_source(&self, _cached: &bool, flags: &u32) -> bool {
        flags & self.bit != 0
    }

    fn convert_to_target(&self, enabled: &bool, flags: &u32) -> u32 {
        if *enabled {
            flags | self.bit
        } else {
            flags & !self.bit
        }
    }
}

/// Exposes a `Vec4` in `rgba` order as a [`Color`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorConverter;

impl Converter for ColorConverter {
    type Source = Color;
    type Target = Vec4;

    fn convert_to_source(&self, _cached: &Color, target: &Vec4) -> Color {
        Color::from_vec4(*target)
    }

    fn convert_to_target(&self, color: &Color, _current: &Vec4) -> Vec4 {
        color.to_vec4()
    }
}

/// Numbers that widen into `T` without loss.
pub trait WidenInto<T>: PropertyType {
    /// Widens `self`.
    fn widen(&self) -> T;
    /// Narrows `wide` back, saturating at the bounds of `Self`.
    fn narrow(wide: &T) -> Self;
}

impl WidenInto<i64> for i32 {
    fn widen(&self) -> i64 {
        i64::from(*self)
    }

    fn narrow(wide: &i64) -> Self {
        Self::try_from(*wide).unwrap_or(if *wide < 0 { Self::MIN } else { Self::MAX })
    }
}

impl WidenInto<u64> for u32 {
    fn widen(&self) -> u64 {
        u64::from(*self)
    }

    fn narrow(wide: &u64) -> Self {
        Self::try_from(*wide).unwrap_or(Self::MAX)
    }
}

impl WidenInto<f64> for f32 {
    fn widen(&self) -> f64 {
        f64::from(*self)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "out-of-range values saturate to infinity"
    )]
    fn narrow(wide: &f64) -> Self {
        *wide as Self
    }
}

/// Exposes a wider stored number as a narrower one.
///
/// ```rust
/// use lume_meta::{Converter, Widening};
///
/// let count = Widening::<u32, u64>::new();
/// assert_eq!(count.convert_to_target(&7, &0), 7_u64);
/// assert_eq!(count.convert_to_source(&0, &u64::MAX), u32::MAX);
/// ```
pub struct Widening<S, T>(PhantomData<fn() -> (S, T)>);

impl<S, T> Widening<S, T> {
    /// Creates the converter.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<S, T> Default for Widening<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> fmt::Debug for Widening<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Widening")
    }
}

impl<S: WidenInto<T>, T: PropertyType> Converter for Widening<S, T> {
    type Source = S;
    type Target = T;

    fn convert_to_source(&self, _cached: &S, target: &T) -> S {
        S::narrow(target)
    }

    fn convert_to_target(&self, source: &S, _current: &T) -> T {
        source.widen()
    }
}

/// The identity conversion.
pub struct Passthrough<T>(PhantomData<fn() -> T>);

impl<T> Passthrough<T> {
    /// Creates the converter.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Passthrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Passthrough<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passthrough")
    }
}

impl<T: PropertyType> Converter for Passthrough<T> {
    type Source = T;
    type Target = T;

    fn convert_to_source(&self, _cached: &T, target: &T) -> T {
        target.clone()
    }

    fn convert_to_target(&self, source: &T, _current: &T) -> T {
        source.clone()
    }
}

/// A provider converting between its owner's type and a target property.
///
/// Reads are pulled from the target on every call. A write extracts the
/// source value, re-reads the target, converts and writes the target; the
/// cache is updated only after the target accepted the value. Any failure
/// leaves both untouched.
///
/// # Example
///
/// ```rust
/// use lume_meta::{BitFlagConverter, ConvertingValue, Property};
///
/// let flags = Property::new("EnableFlags", 0_u32);
/// let tonemap = Property::new("TonemapEnabled", false);
/// let bloom = Property::new("BloomEnabled", false);
/// tonemap.push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(0x1))).unwrap();
/// bloom.push_value(ConvertingValue::new(flags.clone(), BitFlagConverter::new(0x200))).unwrap();
///
/// tonemap.set_value(true).unwrap();
/// bloom.set_value(true).unwrap();
/// assert_eq!(flags.get_value::<u32>(), Ok(0x201));
///
/// flags.set_value(0x200_u32).unwrap();
/// assert_eq!(tonemap.get_value::<bool>(), Ok(false));
/// assert_eq!(bloom.get_value::<bool>(), Ok(true));
/// ```
pub struct ConvertingValue<C: Converter> {
    target: Property,
    converter: C,
    cache: RefCell<C::Source>,
}

impl<C: Converter> ConvertingValue<C> {
    /// Creates a provider over `target`.
    #[must_use]
    pub fn new(target: Property, converter: C) -> Rc<Self> {
        Rc::new(Self {
            target,
            converter,
            cache: RefCell::new(C::Source::default()),
        })
    }

    /// Returns the target property.
    #[must_use]
    pub fn target(&self) -> &Property {
        &self.target
    }

    /// Returns the converter.
    #[must_use]
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Returns the last source value produced or accepted.
    #[must_use]
    pub fn cached(&self) -> C::Source {
        self.cache.borrow().clone()
    }

    fn write(&self, source: C::Source) -> Result<(), MetaError> {
        let current = self.target.get_value::<C::Target>()?;
        let converted = self.converter.convert_to_target(&source, &current);
        self.target.set_value(converted)?;
        *self.cache.borrow_mut() = source;
        Ok(())
    }
}

impl<C: Converter> ValueProvider for ConvertingValue<C> {
    fn get_value(&self) -> Result<Any, MetaError> {
        let target = self.target.get_value::<C::Target>()?;
        let source = {
            let cached = self.cache.borrow();
            self.converter.convert_to_source(&cached, &target)
        };
        *self.cache.borrow_mut() = source.clone();
        Ok(Any::new(source))
    }

    fn set_value(&self, value: &Any) -> Result<(), MetaError> {
        self.write(value.get_value::<C::Source>()?)
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<C::Source>()
    }

    fn is_compatible(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<C::Source>() || type_id == TypeId::of::<C::Target>()
    }

    fn process_on_reset(&self, default: &Any) -> ResetResult {
        match default.get_value::<C::Source>() {
            Ok(source) => {
                if let Err(err) = self.write(source) {
                    log::warn!(
                        "resetting '{}' through converter failed: {err}",
                        self.target.name()
                    );
                }
            }
            Err(err) => log::warn!("converter reset with foreign default: {err}"),
        }
        ResetResult::Pop
    }

    fn source(&self) -> Option<Property> {
        Some(self.target.clone())
    }
}

impl<C: Converter> fmt::Debug for ConvertingValue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertingValue")
            .field("target", &self.target.name())
            .field("cache", &self.cache.borrow())
            .finish_non_exhaustive()
    }
}

/// Element-wise [`ConvertingValue`] between two array properties.
///
/// Each element is converted against the target element at the same index.
/// When the source array is longer than the target, the missing target
/// elements start from their default.
pub struct ConvertingArrayValue<C: Converter> {
    target: Property,
    converter: C,
    cache: RefCell<Vec<C::Source>>,
}

impl<C: Converter> ConvertingArrayValue<C> {
    /// Creates a provider over `target`, an array-of-`C::Target` property.
    #[must_use]
    pub fn new(target: Property, converter: C) -> Rc<Self> {
        Rc::new(Self {
            target,
            converter,
            cache: RefCell::new(Vec::new()),
        })
    }

    /// Returns the target property.
    #[must_use]
    pub fn target(&self) -> &Property {
        &self.target
    }

    fn write(&self, sources: Vec<C::Source>) -> Result<(), MetaError> {
        let current = self.target.get_value_any().get_array::<C::Target>()?;
        let converted: Vec<C::Target> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let element = current.get(i).cloned().unwrap_or_default();
                self.converter.convert_to_target(source, &element)
            })
            .collect();
        self.target.set_value_any(&Any::new_array(converted))?;
        *self.cache.borrow_mut() = sources;
        Ok(())
    }
}

impl<C: Converter> ValueProvider for ConvertingArrayValue<C> {
    fn get_value(&self) -> Result<Any, MetaError> {
        let targets = self.target.get_value_any().get_array::<C::Target>()?;
        let sources: Vec<C::Source> = {
            let cache = self.cache.borrow();
            targets
                .iter()
                .enumerate()
                .map(|(i, target)| {
                    let cached = cache.get(i).cloned().unwrap_or_default();
                    self.converter.convert_to_source(&cached, target)
                })
                .collect()
        };
        *self.cache.borrow_mut() = sources.clone();
        Ok(Any::new_array(sources))
    }

    fn set_value(&self, value: &Any) -> Result<(), MetaError> {
        self.write(value.get_array::<C::Source>()?)
    }

    fn value_type(&self) -> TypeId {
        TypeId::array_of::<C::Source>()
    }

    fn is_compatible(&self, type_id: TypeId) -> bool {
        type_id == TypeId::array_of::<C::Source>() || type_id == TypeId::array_of::<C::Target>()
    }

    fn process_on_reset(&self, default: &Any) -> ResetResult {
        if let Ok(sources) = default.get_array::<C::Source>()
            && let Err(err) = self.write(sources)
        {
            log::warn!(
                "resetting '{}' through array converter failed: {err}",
                self.target.name()
            );
        }
        ResetResult::Pop
    }

    fn source(&self) -> Option<Property> {
        Some(self.target.clone())
    }
}

impl<C: Converter> fmt::Debug for ConvertingArrayValue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertingArrayValue")
            .field("target", &self.target.name())
            .field("cached", &self.cache.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Forwards reads and writes 1:1 to a target property of the same type.
#[derive(Debug)]
pub struct ForwardingValue {
    target: Property,
}

impl ForwardingValue {
    /// Creates a provider forwarding to `target`.
    #[must_use]
    pub fn new(target: Property) -> Rc<Self> {
        Rc::new(Self { target })
    }

    /// Returns the target property.
    #[must_use]
    pub fn target(&self) -> &Property {
        &self.target
    }
}

impl ValueProvider for ForwardingValue {
    fn get_value(&self) -> Result<Any, MetaError> {
        Ok(self.target.get_value_any())
    }

    fn set_value(&self, value: &Any) -> Result<(), MetaError> {
        self.target.set_value_any(value)
    }

    fn value_type(&self) -> TypeId {
        self.target.type_id()
    }

    fn is_compatible(&self, type_id: TypeId) -> bool {
        self.target.type_id() == type_id
    }

    fn process_on_reset(&self, default: &Any) -> ResetResult {
        if let Err(err) = self.target.set_value_any(default) {
            log::warn!("resetting '{}' failed: {err}", self.target.name());
        }
        ResetResult::Pop
    }

    fn source(&self) -> Option<Property> {
        Some(self.target.clone())
    }
}
