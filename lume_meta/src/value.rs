// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of value types a property can hold.
//!
//! [`Value`] is a tagged union over every supported payload; [`TypeId`]
//! identifies a payload type together with its container kind (scalar or
//! array). [`PropertyType`] maps Rust types onto the set and is what the
//! typed accessors throughout the crate are generic over.

use alloc::string::String;
use core::fmt;

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::object::ObjectRef;
use crate::types::{Color, RenderSort};

/// Tag of a single value payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `bool`
    Bool,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String`
    String,
    /// [`Vec2`]
    Vec2,
    /// [`Vec3`]
    Vec3,
    /// [`Vec4`]
    Vec4,
    /// [`Quat`]
    Quat,
    /// [`Color`]
    Color,
    /// [`RenderSort`]
    RenderSort,
    /// [`ObjectRef`]
    Object,
}

/// Whether a [`TypeId`] names a single value or an ordered sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    /// A single value.
    Scalar,
    /// An ordered sequence of values of the same type.
    Array,
}

/// Runtime identity of a value type.
///
/// # Example
///
/// ```rust
/// use lume_meta::{TypeId, ValueType};
///
/// let id = TypeId::of::<f32>();
/// assert_eq!(id, TypeId::scalar(ValueType::F32));
/// assert!(!id.is_array());
/// assert_eq!(TypeId::array_of::<f32>().element(), id);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeId {
    value: ValueType,
    container: Container,
}

impl TypeId {
    /// A scalar of the given value type.
    #[must_use]
    pub const fn scalar(value: ValueType) -> Self {
        Self {
            value,
            container: Container::Scalar,
        }
    }

    /// An array of the given value type.
    #[must_use]
    pub const fn array(value: ValueType) -> Self {
        Self {
            value,
            container: Container::Array,
        }
    }

    /// The scalar type id of `T`.
    #[must_use]
    pub const fn of<T: PropertyType>() -> Self {
        Self::scalar(T::VALUE_TYPE)
    }

    /// The array type id with element type `T`.
    #[must_use]
    pub const fn array_of<T: PropertyType>() -> Self {
        Self::array(T::VALUE_TYPE)
    }

    /// Returns the payload type.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        self.value
    }

    /// Returns the container kind.
    #[must_use]
    pub const fn container(self) -> Container {
        self.container
    }

    /// Returns `true` for array types.
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self.container, Container::Array)
    }

    /// Returns the scalar type of a single element.
    #[must_use]
    pub const fn element(self) -> Self {
        Self::scalar(self.value)
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            Container::Scalar => write!(f, "{:?}", self.value),
            Container::Array => write!(f, "[{:?}]", self.value),
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single value payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `bool`
    Bool(bool),
    /// `i32`
    I32(i32),
    /// `u32`
    U32(u32),
    /// `i64`
    I64(i64),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `String`
    String(String),
    /// [`Vec2`]
    Vec2(Vec2),
    /// [`Vec3`]
    Vec3(Vec3),
    /// [`Vec4`]
    Vec4(Vec4),
    /// [`Quat`]
    Quat(Quat),
    /// [`Color`]
    Color(Color),
    /// [`RenderSort`]
    RenderSort(RenderSort),
    /// [`ObjectRef`]
    Object(ObjectRef),
}

impl Value {
    /// Returns the payload type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::I32(_) => ValueType::I32,
            Self::U32(_) => ValueType::U32,
            Self::I64(_) => ValueType::I64,
            Self::U64(_) => ValueType::U64,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
            Self::String(_) => ValueType::String,
            Self::Vec2(_) => ValueType::Vec2,
            Self::Vec3(_) => ValueType::Vec3,
            Self::Vec4(_) => ValueType::Vec4,
            Self::Quat(_) => ValueType::Quat,
            Self::Color(_) => ValueType::Color,
            Self::RenderSort(_) => ValueType::RenderSort,
            Self::Object(_) => ValueType::Object,
        }
    }

    /// Returns the default value of a payload type.
    #[must_use]
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Self::Bool(false),
            ValueType::I32 => Self::I32(0),
            ValueType::U32 => Self::U32(0),
            ValueType::I64 => Self::I64(0),
            ValueType::U64 => Self::U64(0),
            ValueType::F32 => Self::F32(0.0),
            ValueType::F64 => Self::F64(0.0),
            ValueType::String => Self::String(String::new()),
            ValueType::Vec2 => Self::Vec2(Vec2::ZERO),
            ValueType::Vec3 => Self::Vec3(Vec3::ZERO),
            ValueType::Vec4 => Self::Vec4(Vec4::ZERO),
            ValueType::Quat => Self::Quat(Quat::IDENTITY),
            ValueType::Color => Self::Color(Color::default()),
            ValueType::RenderSort => Self::RenderSort(RenderSort::default()),
            ValueType::Object => Self::Object(ObjectRef::null()),
        }
    }
}

/// A Rust type that can be stored in a property.
///
/// Implemented for exactly the types listed in [`ValueType`]; the set is
/// closed so that every value crossing the property graph can be checked and
/// cloned without open-ended downcasting.
pub trait PropertyType: Clone + PartialEq + Default + fmt::Debug + 'static {
    /// The payload tag of this type.
    const VALUE_TYPE: ValueType;

    /// Wraps `self` into a [`Value`].
    fn into_value(self) -> Value;

    /// Extracts `Self` from a [`Value`] of the matching tag.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_property_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl PropertyType for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_property_type! {
    bool => Bool,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Quat => Quat,
    Color => Color,
    RenderSort => RenderSort,
    ObjectRef => Object,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn type_id_debug() {
        assert_eq!(format!("{:?}", TypeId::of::<u32>()), "U32");
        assert_eq!(format!("{:?}", TypeId::array_of::<bool>()), "[Bool]");
    }

    #[test]
    fn value_round_trip_through_trait() {
        let v = 7_u32.into_value();
        assert_eq!(v.value_type(), ValueType::U32);
        assert_eq!(u32::from_value(&v), Some(7));
        assert_eq!(i32::from_value(&v), None);
    }

    #[test]
    fn defaults_match_rust_defaults() {
        assert_eq!(Value::default_for(ValueType::F32), f32::default().into_value());
        assert_eq!(
            Value::default_for(ValueType::RenderSort),
            RenderSort::default().into_value()
        );
        assert_eq!(
            Value::default_for(ValueType::String),
            String::default().into_value()
        );
    }

    #[test]
    fn array_and_scalar_ids_differ() {
        assert_ne!(TypeId::of::<f32>(), TypeId::array_of::<f32>());
        assert!(TypeId::array_of::<f32>().is_array());
    }
}
