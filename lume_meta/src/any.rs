// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased value container.
//!
//! This module provides [`Any`], the single currency every property, value
//! provider and converter exchanges.

use alloc::vec::Vec;

use crate::error::MetaError;
use crate::value::{PropertyType, TypeId, Value, ValueType};

#[derive(Clone, Debug, PartialEq)]
enum Data {
    Scalar(Value),
    Array(Vec<Value>),
}

/// A type-erased value with a fixed [`TypeId`].
///
/// An `Any` owns either one value or an ordered sequence of values of a
/// single [`ValueType`]. The type is chosen at construction and never
/// changes: every setter checks it and returns
/// [`MetaError::TypeMismatch`] instead of converting.
///
/// # Example
///
/// ```rust
/// use lume_meta::{Any, MetaError, TypeId};
///
/// let mut any = Any::new(1.5_f32);
/// assert_eq!(any.get_value::<f32>(), Ok(1.5));
///
/// // Wrong type: reported, nothing changes.
/// assert!(matches!(any.set_value(3_u32), Err(MetaError::TypeMismatch { .. })));
/// assert_eq!(any.get_value::<f32>(), Ok(1.5));
///
/// let mut list = Any::new_array(vec![1_u32, 2]);
/// list.push(3_u32).unwrap();
/// assert_eq!(list.get_array::<u32>(), Ok(vec![1, 2, 3]));
/// assert_eq!(list.type_id(), TypeId::array_of::<u32>());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Any {
    type_id: TypeId,
    data: Data,
}

impl Any {
    /// Creates a scalar value.
    #[must_use]
    pub fn new<T: PropertyType>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            data: Data::Scalar(value.into_value()),
        }
    }

    /// Creates an array value.
    #[must_use]
    pub fn new_array<T: PropertyType>(values: Vec<T>) -> Self {
        Self {
            type_id: TypeId::array_of::<T>(),
            data: Data::Array(values.into_iter().map(PropertyType::into_value).collect()),
        }
    }

    /// Creates a scalar value from an untyped payload.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self {
            type_id: TypeId::scalar(value.value_type()),
            data: Data::Scalar(value),
        }
    }

    /// Creates the default value of the given type.
    ///
    /// Arrays default to empty.
    #[must_use]
    pub fn default_of(type_id: TypeId) -> Self {
        let data = if type_id.is_array() {
            Data::Array(Vec::new())
        } else {
            Data::Scalar(Value::default_for(type_id.value_type()))
        };
        Self { type_id, data }
    }

    /// Returns the type of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns `true` if this holds an array.
    #[must_use]
    #[inline]
    pub fn is_array(&self) -> bool {
        self.type_id.is_array()
    }

    /// Returns `true` if `type_id` is the type held by this value.
    #[must_use]
    #[inline]
    pub fn is_compatible(&self, type_id: TypeId) -> bool {
        self.type_id == type_id
    }

    /// Returns `true` if this is a scalar of type `T`.
    #[must_use]
    #[inline]
    pub fn is_compatible_with<T: PropertyType>(&self) -> bool {
        self.is_compatible(TypeId::of::<T>())
    }

    /// Returns the scalar payload, if this is a scalar.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match &self.data {
            Data::Scalar(v) => Some(v),
            Data::Array(_) => None,
        }
    }

    /// Returns the array payload, if this is an array.
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Scalar(_) => None,
            Data::Array(v) => Some(v),
        }
    }

    /// Reads the scalar value as `T`.
    pub fn get_value<T: PropertyType>(&self) -> Result<T, MetaError> {
        let requested = TypeId::of::<T>();
        match &self.data {
            Data::Scalar(v) if self.type_id == requested => {
                T::from_value(v).ok_or(MetaError::mismatch(self.type_id, requested))
            }
            _ => Err(MetaError::mismatch(self.type_id, requested)),
        }
    }

    /// Replaces the scalar value.
    pub fn set_value<T: PropertyType>(&mut self, value: T) -> Result<(), MetaError> {
        self.check(TypeId::of::<T>())?;
        self.data = Data::Scalar(value.into_value());
        Ok(())
    }

    /// Reads the whole array as `Vec<T>`.
    pub fn get_array<T: PropertyType>(&self) -> Result<Vec<T>, MetaError> {
        let requested = TypeId::array_of::<T>();
        if self.type_id != requested {
            return Err(MetaError::mismatch(self.type_id, requested));
        }
        self.array()?
            .iter()
            .map(|v| T::from_value(v).ok_or(MetaError::mismatch(self.type_id, requested)))
            .collect()
    }

    /// Replaces the whole array.
    pub fn set_array<T: PropertyType>(&mut self, values: Vec<T>) -> Result<(), MetaError> {
        self.check(TypeId::array_of::<T>())?;
        self.data = Data::Array(values.into_iter().map(PropertyType::into_value).collect());
        Ok(())
    }

    /// Copies the content of `other` into `self`.
    ///
    /// Both sides must have the same type.
    pub fn copy_from(&mut self, other: &Self) -> Result<(), MetaError> {
        self.check(other.type_id)?;
        self.data = other.data.clone();
        Ok(())
    }

    /// Returns the number of elements: the array length, or `1` for a scalar.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            Data::Scalar(_) => 1,
            Data::Array(v) => v.len(),
        }
    }

    /// Returns `true` for an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the element at `index`.
    pub fn get_at<T: PropertyType>(&self, index: usize) -> Result<T, MetaError> {
        self.check_element::<T>()?;
        let array = self.array()?;
        let value = array.get(index).ok_or(MetaError::IndexOutOfRange {
            index,
            len: array.len(),
        })?;
        T::from_value(value).ok_or(MetaError::mismatch(self.type_id, TypeId::array_of::<T>()))
    }

    /// Replaces the element at `index`.
    pub fn set_at<T: PropertyType>(&mut self, index: usize, value: T) -> Result<(), MetaError> {
        self.check_element::<T>()?;
        let array = self.array_mut()?;
        let len = array.len();
        let slot = array
            .get_mut(index)
            .ok_or(MetaError::IndexOutOfRange { index, len })?;
        *slot = value.into_value();
        Ok(())
    }

    /// Inserts an element at `index`, shifting later elements.
    ///
    /// `index == len` appends.
    pub fn insert_at<T: PropertyType>(&mut self, index: usize, value: T) -> Result<(), MetaError> {
        self.check_element::<T>()?;
        let array = self.array_mut()?;
        if index > array.len() {
            return Err(MetaError::IndexOutOfRange {
                index,
                len: array.len(),
            });
        }
        array.insert(index, value.into_value());
        Ok(())
    }

    /// Appends an element.
    pub fn push<T: PropertyType>(&mut self, value: T) -> Result<(), MetaError> {
        self.check_element::<T>()?;
        self.array_mut()?.push(value.into_value());
        Ok(())
    }

    /// Removes the element at `index`, shifting later elements.
    pub fn remove_at(&mut self, index: usize) -> Result<(), MetaError> {
        let array = self.array_mut()?;
        if index >= array.len() {
            return Err(MetaError::IndexOutOfRange {
                index,
                len: array.len(),
            });
        }
        array.remove(index);
        Ok(())
    }

    /// Returns the index of the first element equal to `value`.
    #[must_use]
    pub fn find_first<T: PropertyType>(&self, value: &T) -> Option<usize> {
        if self.type_id != TypeId::array_of::<T>() {
            return None;
        }
        let needle = value.clone().into_value();
        self.values()?.iter().position(|v| *v == needle)
    }

    /// Replaces every element of an array, keeping the element type.
    pub(crate) fn replace_values(&mut self, values: Vec<Value>) -> Result<(), MetaError> {
        let element = self.type_id.value_type();
        if let Some(foreign) = values.iter().find(|v| v.value_type() != element) {
            return Err(MetaError::mismatch(
                self.type_id,
                TypeId::array(foreign.value_type()),
            ));
        }
        *self.array_mut()? = values;
        Ok(())
    }

    fn check(&self, type_id: TypeId) -> Result<(), MetaError> {
        if self.type_id == type_id {
            Ok(())
        } else {
            Err(MetaError::mismatch(self.type_id, type_id))
        }
    }

    fn check_element<T: PropertyType>(&self) -> Result<(), MetaError> {
        if !self.type_id.is_array() {
            return Err(MetaError::NotAnArray(self.type_id));
        }
        self.check(TypeId::array_of::<T>())
    }

    fn array(&self) -> Result<&Vec<Value>, MetaError> {
        match &self.data {
            Data::Array(v) => Ok(v),
            Data::Scalar(_) => Err(MetaError::NotAnArray(self.type_id)),
        }
    }

    fn array_mut(&mut self) -> Result<&mut Vec<Value>, MetaError> {
        match &mut self.data {
            Data::Array(v) => Ok(v),
            Data::Scalar(_) => Err(MetaError::NotAnArray(self.type_id)),
        }
    }
}

impl<T: PropertyType> From<T> for Any {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl Default for Any {
    /// An `f32` zero; mostly useful as a placeholder before a real value is
    /// copied in.
    fn default() -> Self {
        Self::default_of(TypeId::scalar(ValueType::F32))
    }
}
