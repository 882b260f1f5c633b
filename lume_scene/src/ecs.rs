// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal entity/component store.
//!
//! Components are named bags of [`Property`] fields, so the engine side of
//! the bridge presents the same property contract as the reflective side.
//! Fields are addressed by `"Component.field"` paths; the component name is
//! everything before the first `.`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use lume_meta::{MetaError, Metadata, Property};

/// An entity handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A named set of fields.
///
/// # Example
///
/// ```rust
/// use lume_meta::Property;
/// use lume_scene::Component;
///
/// let camera = Component::new("CameraComponent")
///     .with_field(Property::new("zNear", 0.3_f32))
///     .with_field(Property::new("zFar", 1000.0_f32));
/// assert_eq!(camera.field("zFar").unwrap().get_value::<f32>(), Ok(1000.0));
/// assert!(camera.field("yFov").is_none());
/// ```
pub struct Component {
    name: String,
    fields: Metadata,
}

impl Component {
    /// Creates a component without fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Metadata::new(),
        }
    }

    /// Adds a field. Duplicate field names are ignored with a warning.
    #[must_use]
    pub fn with_field(self, field: Property) -> Self {
        if let Err(err) = self.fields.add_property(field) {
            log::warn!("component '{}': {err}", self.name);
        }
        self
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Property> {
        self.fields.get_property(name)
    }

    /// Returns the field map.
    #[must_use]
    pub fn fields(&self) -> &Metadata {
        &self.fields
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("fields", &self.fields.names())
            .finish()
    }
}

/// Entities and their components.
#[derive(Default)]
pub struct World {
    next_entity: Cell<u32>,
    entities: RefCell<HashMap<Entity, Vec<Rc<Component>>>>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Creates an entity without components.
    pub fn create_entity(&self) -> Entity {
        let entity = Entity(self.next_entity.get());
        self.next_entity.set(entity.0 + 1);
        self.entities.borrow_mut().insert(entity, Vec::new());
        entity
    }

    /// Destroys an entity and its components. Returns `true` if it was alive.
    pub fn destroy_entity(&self, entity: Entity) -> bool {
        self.entities.borrow_mut().remove(&entity).is_some()
    }

    /// Returns `true` if the entity exists.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.borrow().contains_key(&entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.borrow().len()
    }

    /// Adds a component, replacing one with the same name.
    ///
    /// Fails with [`MetaError::InvalidHandle`] for dead entities.
    pub fn add_component(
        &self,
        entity: Entity,
        component: Component,
    ) -> Result<Rc<Component>, MetaError> {
        let mut entities = self.entities.borrow_mut();
        let components = entities
            .get_mut(&entity)
            .ok_or(MetaError::InvalidHandle)?;
        let component = Rc::new(component);
        components.retain(|c| c.name() != component.name());
        components.push(component.clone());
        log::debug!("entity {}: added '{}'", entity.0, component.name());
        Ok(component)
    }

    /// Removes a component by name.
    pub fn remove_component(&self, entity: Entity, name: &str) -> Option<Rc<Component>> {
        let mut entities = self.entities.borrow_mut();
        let components = entities.get_mut(&entity)?;
        let index = components.iter().position(|c| c.name() == name)?;
        Some(components.remove(index))
    }

    /// Looks up a component by name.
    #[must_use]
    pub fn component(&self, entity: Entity, name: &str) -> Option<Rc<Component>> {
        self.entities
            .borrow()
            .get(&entity)?
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Looks up a field by `"Component.field"` path.
    #[must_use]
    pub fn property_at(&self, entity: Entity, path: &str) -> Option<Property> {
        let (component, field) = path.split_once('.')?;
        self.component(entity, component)?.field(field)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entity_count())
            .finish_non_exhaustive()
    }
}

/// A handle to one entity of a world.
///
/// Scene objects hold this to resolve their properties against the live
/// components of their entity. The world is held weakly.
#[derive(Clone)]
pub struct EcsObject {
    world: Weak<World>,
    entity: Entity,
}

impl EcsObject {
    /// Creates a handle.
    #[must_use]
    pub fn new(world: &Rc<World>, entity: Entity) -> Self {
        Self {
            world: Rc::downgrade(world),
            entity,
        }
    }

    /// Returns the entity.
    #[must_use]
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns the world, if it is still alive.
    #[must_use]
    pub fn world(&self) -> Option<Rc<World>> {
        self.world.upgrade()
    }

    /// Returns `true` if both the world and the entity are alive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.world().is_some_and(|w| w.is_alive(self.entity))
    }

    /// Looks up a field of this entity by `"Component.field"` path.
    #[must_use]
    pub fn property_at(&self, path: &str) -> Option<Property> {
        self.world()?.property_at(self.entity, path)
    }
}

impl fmt::Debug for EcsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcsObject")
            .field("entity", &self.entity)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_sort() -> (Rc<World>, Entity) {
        let world = World::new();
        let entity = world.create_entity();
        world
            .add_component(
                entity,
                Component::new("RenderSortComponent")
                    .with_field(Property::new("renderSort", lume_meta::RenderSort::default())),
            )
            .unwrap();
        (world, entity)
    }

    #[test]
    fn paths_split_at_the_first_dot() {
        let world = World::new();
        let entity = world.create_entity();
        world
            .add_component(
                entity,
                Component::new("PostProcessComponent")
                    .with_field(Property::new("bloomConfiguration.thresholdHard", 1.0_f32)),
            )
            .unwrap();
        let p = world
            .property_at(entity, "PostProcessComponent.bloomConfiguration.thresholdHard")
            .unwrap();
        assert_eq!(p.get_value::<f32>(), Ok(1.0));
        assert!(world.property_at(entity, "PostProcessComponent").is_none());
        assert!(world.property_at(entity, "Missing.field").is_none());
    }

    #[test]
    fn components_follow_entity_lifetime() {
        let (world, entity) = world_with_sort();
        let ecs = EcsObject::new(&world, entity);
        assert!(ecs.is_valid());
        assert!(ecs.property_at("RenderSortComponent.renderSort").is_some());

        assert!(world.remove_component(entity, "RenderSortComponent").is_some());
        assert!(ecs.property_at("RenderSortComponent.renderSort").is_none());

        assert!(world.destroy_entity(entity));
        assert!(!ecs.is_valid());
        assert_eq!(
            world
                .add_component(entity, Component::new("NameComponent"))
                .unwrap_err(),
            MetaError::InvalidHandle
        );
    }

    #[test]
    fn adding_replaces_by_name() {
        let (world, entity) = world_with_sort();
        let before = world.property_at(entity, "RenderSortComponent.renderSort").unwrap();
        world
            .add_component(
                entity,
                Component::new("RenderSortComponent")
                    .with_field(Property::new("renderSort", lume_meta::RenderSort::new(1, 1))),
            )
            .unwrap();
        let after = world.property_at(entity, "RenderSortComponent.renderSort").unwrap();
        assert!(!before.ptr_eq(&after));
    }

    #[test]
    fn dropped_world_invalidates_handles() {
        let (world, entity) = world_with_sort();
        let ecs = EcsObject::new(&world, entity);
        drop(world);
        assert!(ecs.world().is_none());
        assert!(ecs.property_at("RenderSortComponent.renderSort").is_none());
    }
}
