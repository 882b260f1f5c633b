// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Null-safe handles for binding layers.
//!
//! These never fail loudly: a null object or a missing property reads as the
//! type's default and writes report `false`, with a log line in either case.

use std::fmt;

use lume_meta::{
    ArrayProperty, MetaError, ModifiedFlag, Object, ObjectPtr, ObjectRef, PropertyProxy,
    PropertyType,
};

/// A nullable object handle with typed, defaulting accessors.
///
/// # Example
///
/// ```rust
/// use lume_meta::ObjectPtr;
/// use lume_scene::{ObjectKit, Scene};
///
/// let scene = Scene::new().unwrap();
/// let cube: ObjectPtr = scene.create_node("cube").unwrap();
/// let node = ObjectKit::from(cube);
/// assert_eq!(node.get_string("Name"), "cube");
/// assert_eq!(node.get_u32("Nonexistent"), 0);
///
/// let mut gone = node.clone();
/// gone.destroy();
/// assert!(!gone.get_bool("Name"));
/// assert_eq!(gone.get_string("Name"), "");
/// ```
#[derive(Clone, Default)]
pub struct ObjectKit {
    object: Option<ObjectPtr>,
}

impl ObjectKit {
    /// Wraps an object handle.
    #[must_use]
    pub fn new(object: Option<ObjectPtr>) -> Self {
        Self { object }
    }

    /// Returns `true` if the handle is empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.object.is_none()
    }

    /// Returns the wrapped object.
    #[must_use]
    pub fn object(&self) -> Option<&ObjectPtr> {
        self.object.as_ref()
    }

    /// Returns a typed proxy over `name`. Null when the object or the
    /// property is missing.
    #[must_use]
    pub fn get_property<T: PropertyType>(&self, name: &str) -> PropertyProxy<T> {
        let Some(object) = &self.object else {
            log::warn!("get_property('{name}') on a null object");
            return PropertyProxy::null();
        };
        let proxy = PropertyProxy::from_object(&**object, name);
        if !proxy.is_valid() {
            log::debug!("{} has no '{name}'", object.class_id().name());
        }
        proxy
    }

    fn read<T: PropertyType>(&self, name: &str) -> T {
        let proxy = self.get_property::<T>(name);
        if proxy.is_valid() {
            proxy.get_value()
        } else {
            T::default()
        }
    }

    /// Reads a `bool`, or `false`.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> bool {
        self.read(name)
    }

    /// Reads a `u32`, or `0`.
    #[must_use]
    pub fn get_u32(&self, name: &str) -> u32 {
        self.read(name)
    }

    /// Reads an `f32`, or `0.0`.
    #[must_use]
    pub fn get_f32(&self, name: &str) -> f32 {
        self.read(name)
    }

    /// Reads a string, or the empty string.
    #[must_use]
    pub fn get_string(&self, name: &str) -> String {
        self.read(name)
    }

    /// Writes `name`. Returns `false` if nothing was written.
    pub fn set_value<T: PropertyType>(&self, name: &str, value: T) -> bool {
        let proxy = self.get_property::<T>(name);
        proxy.is_valid() && proxy.set_value(value)
    }

    /// Releases the handle. Later accesses read defaults.
    pub fn destroy(&mut self) {
        if let Some(object) = self.object.take() {
            log::debug!("released {}", object.class_id().name());
        }
    }
}

impl From<ObjectPtr> for ObjectKit {
    fn from(object: ObjectPtr) -> Self {
        Self::new(Some(object))
    }
}

impl fmt::Debug for ObjectKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => f
                .debug_tuple("ObjectKit")
                .field(&object.class_id().name())
                .finish(),
            None => f.write_str("ObjectKit(null)"),
        }
    }
}

/// An ordered list of effects held in an object-array property.
///
/// Children are found by identity. Operations naming a child that is not in
/// the list, or an index past the end, change nothing. Every change marks
/// [`modified`](Self::modified).
pub struct EffectsContainer {
    effects: ArrayProperty<ObjectRef>,
    modified: ModifiedFlag,
}

impl EffectsContainer {
    /// Wraps an array property.
    #[must_use]
    pub fn new(effects: ArrayProperty<ObjectRef>) -> Self {
        Self {
            effects,
            modified: ModifiedFlag::new(),
        }
    }

    /// Wraps the object-array property `name` of `object`.
    #[must_use]
    pub fn from_object<O: Object + ?Sized>(object: &O, name: &str) -> Option<Self> {
        let property = object.property(name)?;
        ArrayProperty::from_property(property).map(Self::new)
    }

    /// Returns the backing property.
    #[must_use]
    pub fn effects(&self) -> &ArrayProperty<ObjectRef> {
        &self.effects
    }

    /// Returns the flag set by every change.
    #[must_use]
    pub fn modified(&self) -> &ModifiedFlag {
        &self.modified
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn get_child(&self, index: usize) -> Option<ObjectPtr> {
        self.effects.get_value_at(index).ok()?.into_inner()
    }

    /// Returns the number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.effects.len()
    }

    /// Returns the index of `child`.
    #[must_use]
    pub fn index_of(&self, child: &ObjectPtr) -> Option<usize> {
        self.effects.find_first_value_of(&ObjectRef::new(child.clone()))
    }

    /// Appends `child`.
    pub fn append_child(&self, child: ObjectPtr) {
        self.commit(self.effects.add_value(ObjectRef::new(child)));
    }

    /// Inserts `child` right after `sibling`.
    pub fn insert_child_after(&self, child: ObjectPtr, sibling: &ObjectPtr) {
        let Some(index) = self.index_of(sibling) else {
            log::debug!("insert_child_after: sibling not found");
            return;
        };
        self.commit(self.effects.insert_value_at(index + 1, ObjectRef::new(child)));
    }

    /// Removes the first occurrence of `child`.
    pub fn remove_child(&self, child: &ObjectPtr) {
        let Some(index) = self.index_of(child) else {
            log::debug!("remove_child: child not found");
            return;
        };
        self.commit(self.effects.remove_at(index));
    }

    /// Removes every child.
    pub fn clear_children(&self) {
        if self.effects.is_empty() {
            return;
        }
        self.commit(self.effects.clear());
    }

    fn commit(&self, result: Result<(), MetaError>) {
        match result {
            Ok(()) => {
                self.modified.mark_modified(true);
            }
            Err(err) => log::warn!("effects container: {err}"),
        }
    }
}

impl fmt::Debug for EffectsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectsContainer")
            .field("effects", &self.effects.get_value())
            .field("modified", &self.modified.is_modified())
            .finish()
    }
}
