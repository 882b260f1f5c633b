// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy binding of declared properties to ECS fields.
//!
//! Scene objects declare their properties up front ([`PropertyDecl`]) but
//! only bind them to the engine on first touch. Binding a property means
//! pushing a provider onto it that forwards to the field found at
//! [`EngineObject::component_path`] + field name. Fields of the exposed type
//! are forwarded directly; other fields go through a converter picked by
//! [`engine_converter`]. Objects can claim names before the generic path
//! applies through [`EngineObject::init_special_property`].
//!
//! A value written to a property before it could bind is carried over to the
//! engine field when it binds. Values already held by an entity win when an
//! object is moved to another entity with [`rebind_dynamic_properties`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use lume_meta::{
    Any, Color, ColorConverter, ConvertingValue, ForwardingValue, InterfaceId, Metadata, Object,
    Property, PropertyBuilder, PropertyType, TypeId, ValueProvider, Vec4, Widening,
};

use crate::ecs::EcsObject;

/// Declaration of one property of a scene object.
#[derive(Clone, Debug)]
pub struct PropertyDecl {
    name: &'static str,
    default: Any,
    field: Option<&'static str>,
    interface: Option<InterfaceId>,
    local: bool,
}

impl PropertyDecl {
    /// Declares an engine-backed property.
    ///
    /// The field name defaults to `name` in lower camel case.
    #[must_use]
    pub fn new(name: &'static str, default: impl Into<Any>) -> Self {
        Self {
            name,
            default: default.into(),
            field: None,
            interface: None,
            local: false,
        }
    }

    /// Declares a property that lives on the object only and never binds to
    /// the engine.
    #[must_use]
    pub fn local(name: &'static str, default: impl Into<Any>) -> Self {
        Self {
            local: true,
            ..Self::new(name, default)
        }
    }

    /// Overrides the engine field name.
    #[must_use]
    pub fn field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    /// Declares the interface of object values.
    #[must_use]
    pub fn interface(mut self, interface: InterfaceId) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> &Any {
        &self.default
    }

    /// Returns `true` for object-only properties.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Returns the engine field name.
    #[must_use]
    pub fn field_name(&self) -> String {
        self.field.map_or_else(|| lower_camel(self.name), String::from)
    }
}

/// `"EnableFlags"` → `"enableFlags"`.
#[must_use]
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Binding state of a declared property.
#[derive(Clone, Default)]
pub enum Resolution {
    /// Not bound to the engine yet.
    #[default]
    Unresolved,
    /// Bound through this provider.
    Resolved(Rc<dyn ValueProvider>),
    /// Lives on the object only.
    Local,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("Unresolved"),
            Self::Resolved(_) => f.write_str("Resolved"),
            Self::Local => f.write_str("Local"),
        }
    }
}

struct Entry {
    field: String,
    resolution: Resolution,
}

/// The declared properties of a scene object and their binding states.
pub struct DynamicProperties {
    metadata: Metadata,
    entries: RefCell<HashMap<String, Entry>>,
}

impl DynamicProperties {
    /// Creates the properties for `decls`.
    ///
    /// Declarations repeating an earlier name are skipped with a warning.
    #[must_use]
    pub fn new(decls: impl IntoIterator<Item = PropertyDecl>) -> Self {
        let metadata = Metadata::new();
        let mut entries = HashMap::new();
        for decl in decls {
            let mut builder = PropertyBuilder::new(decl.name, decl.default.clone());
            if let Some(interface) = decl.interface {
                builder = builder.interface(interface);
            }
            if let Err(err) = metadata.add_property(builder.build()) {
                log::warn!("{err}");
                continue;
            }
            let resolution = if decl.local {
                Resolution::Local
            } else {
                Resolution::Unresolved
            };
            entries.insert(
                decl.name.into(),
                Entry {
                    field: decl.field_name(),
                    resolution,
                },
            );
        }
        Self {
            metadata,
            entries: RefCell::new(entries),
        }
    }

    /// Returns the property map.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns a declared property without binding it.
    #[must_use]
    pub fn declared(&self, name: &str) -> Option<Property> {
        self.metadata.get_property(name)
    }

    /// Returns the binding state of `name`.
    #[must_use]
    pub fn resolution(&self, name: &str) -> Option<Resolution> {
        self.entries.borrow().get(name).map(|e| e.resolution.clone())
    }

    /// Returns `true` if `name` is bound or local.
    #[must_use]
    pub fn is_resolved(&self, name: &str) -> bool {
        matches!(
            self.resolution(name),
            Some(Resolution::Resolved(_) | Resolution::Local)
        )
    }

    /// Returns the engine field name of `name`.
    #[must_use]
    pub fn field_name(&self, name: &str) -> Option<String> {
        self.entries.borrow().get(name).map(|e| e.field.clone())
    }

    fn set_resolved(&self, name: &str, provider: Rc<dyn ValueProvider>) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(name) {
            entry.resolution = Resolution::Resolved(provider);
        }
    }

    /// Marks every bound property unbound and returns the providers it held.
    fn take_resolved(&self) -> Vec<(String, Rc<dyn ValueProvider>)> {
        let mut entries = self.entries.borrow_mut();
        entries
            .iter_mut()
            .filter_map(|(name, entry)| match std::mem::take(&mut entry.resolution) {
                Resolution::Resolved(provider) => Some((name.clone(), provider)),
                other => {
                    entry.resolution = other;
                    None
                }
            })
            .collect()
    }
}

impl fmt::Debug for DynamicProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = self
            .entries
            .borrow()
            .values()
            .filter(|e| matches!(e.resolution, Resolution::Resolved(_)))
            .count();
        f.debug_struct("DynamicProperties")
            .field("declared", &self.metadata.len())
            .field("resolved", &resolved)
            .finish()
    }
}

/// A scene object whose declared properties bind lazily to ECS fields.
pub trait EngineObject: Object {
    /// Returns the declared properties.
    fn dynamic_properties(&self) -> &DynamicProperties;

    /// Returns the entity this object is bound to.
    fn ecs_object(&self) -> Option<EcsObject>;

    /// Returns the path prefix of engine fields, e.g. `"CameraComponent."`.
    fn component_path(&self) -> String;

    /// Binds properties that do not follow the generic path.
    ///
    /// Returns the provider to push, or `None` to fall through to the
    /// generic path.
    fn init_special_property(&self, _property: &Property) -> Option<Rc<dyn ValueProvider>> {
        None
    }
}

/// Returns a converting provider exposing `engine` as `exposed`, for the
/// type pairs the bridge knows how to convert.
///
/// | Exposed | Engine field |
/// |---------|--------------|
/// | `Color` | `Vec4` |
/// | `i32` | `i64` |
/// | `u32` | `u64` |
/// | `f32` | `f64` |
#[must_use]
pub fn engine_converter(exposed: TypeId, engine: &Property) -> Option<Rc<dyn ValueProvider>> {
    fn is<S: PropertyType, T: PropertyType>(pair: (TypeId, TypeId)) -> bool {
        pair == (TypeId::of::<S>(), TypeId::of::<T>())
    }

    let target = engine.clone();
    let pair = (exposed, engine.type_id());
    let provider: Rc<dyn ValueProvider> = if is::<Color, Vec4>(pair) {
        ConvertingValue::new(target, ColorConverter)
    } else if is::<i32, i64>(pair) {
        ConvertingValue::new(target, Widening::<i32, i64>::new())
    } else if is::<u32, u64>(pair) {
        ConvertingValue::new(target, Widening::<u32, u64>::new())
    } else if is::<f32, f64>(pair) {
        ConvertingValue::new(target, Widening::<f32, f64>::new())
    } else {
        return None;
    };
    Some(provider)
}

/// Binds `property` to the engine field `engine`.
///
/// Matching types are forwarded 1:1, known pairs go through
/// [`engine_converter`] and anything else is left unbound.
pub fn attach_engine_property(
    property: &Property,
    engine: &Property,
) -> Option<Rc<dyn ValueProvider>> {
    let provider: Rc<dyn ValueProvider> = if property.type_id() == engine.type_id() {
        ForwardingValue::new(engine.clone())
    } else if let Some(provider) = engine_converter(property.type_id(), engine) {
        provider
    } else {
        log::warn!(
            "cannot bind '{}' ({}) to engine field '{}' ({})",
            property.name(),
            property.type_id(),
            engine.name(),
            engine.type_id()
        );
        return None;
    };
    push_carrying_local(property, provider)
}

/// Pushes `provider`, first handing it any value stored on `property`.
fn push_carrying_local(
    property: &Property,
    provider: Rc<dyn ValueProvider>,
) -> Option<Rc<dyn ValueProvider>> {
    let carried = property
        .stored_value()
        .is_some_and(|local| match provider.set_value(&local) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("carrying '{}' over: {err}", property.name());
                false
            }
        });
    if let Err(err) = property.push_value(provider.clone()) {
        log::warn!("binding '{}': {err}", property.name());
        return None;
    }
    if carried {
        property.take_stored_value();
    }
    Some(provider)
}

/// Binds the declared property `name` of `object`, if not already bound.
///
/// Returns `true` if the property is bound (or local) afterwards. A provider
/// that has been reset off the stack is pushed again without recomputing the
/// path.
pub fn init_dynamic_property<O: EngineObject + ?Sized>(object: &O, name: &str) -> bool {
    let dynamic = object.dynamic_properties();
    let Some(property) = dynamic.declared(name) else {
        log::debug!("'{name}' is not declared on {}", object.class_id().name());
        return false;
    };
    match dynamic.resolution(name) {
        Some(Resolution::Local) => return true,
        Some(Resolution::Resolved(provider)) => {
            if !property.has_value(&provider)
                && let Err(err) = property.push_value(provider)
            {
                log::warn!("rebinding '{name}': {err}");
                return false;
            }
            return true;
        }
        Some(Resolution::Unresolved) | None => {}
    }

    if let Some(provider) = object.init_special_property(&property) {
        return match push_carrying_local(&property, provider) {
            Some(provider) => {
                log::debug!("'{name}' bound by {}", object.class_id().name());
                dynamic.set_resolved(name, provider);
                true
            }
            None => false,
        };
    }

    let Some(ecs) = object.ecs_object() else {
        log::debug!("'{name}' has no entity to bind to");
        return false;
    };
    let Some(field) = dynamic.field_name(name) else {
        return false;
    };
    let path = format!("{}{field}", object.component_path());
    let Some(engine) = ecs.property_at(&path) else {
        log::debug!("'{name}': no engine field at '{path}'");
        return false;
    };
    match attach_engine_property(&property, &engine) {
        Some(provider) => {
            log::debug!("'{name}' bound to '{path}'");
            dynamic.set_resolved(name, provider);
            true
        }
        None => false,
    }
}

/// Drops every engine binding of `object` and binds the same properties again
/// against its current entity.
///
/// Call after the entity or any other input of
/// [`EngineObject::init_special_property`] changed. The values held by the
/// new entity win; properties that cannot bind there read their stored value
/// or default. Returns the number of properties bound again.
pub fn rebind_dynamic_properties<O: EngineObject + ?Sized>(object: &O) -> usize {
    let dynamic = object.dynamic_properties();
    let bound = dynamic.take_resolved();
    let mut rebound = 0;
    for (name, provider) in bound {
        if let Some(property) = dynamic.declared(&name) {
            property.remove_value(&provider);
        }
        if init_dynamic_property(object, &name) {
            rebound += 1;
        }
    }
    log::debug!("{}: rebound {rebound} properties", object.class_id().name());
    rebound
}

/// Looks up a declared property, binding it on first access.
///
/// Undeclared names return `None`. Declared properties that cannot be bound
/// are still returned and read their default.
pub fn resolve_property<O: EngineObject + ?Sized>(object: &O, name: &str) -> Option<Property> {
    let property = object.dynamic_properties().declared(name)?;
    init_dynamic_property(object, name);
    Some(property)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, World};
    use lume_meta::{ClassId, ObjectExt, ResetResult};

    struct Lamp {
        dynamic: DynamicProperties,
        ecs: RefCell<Option<EcsObject>>,
    }

    impl Lamp {
        fn new(decls: impl IntoIterator<Item = PropertyDecl>, ecs: Option<EcsObject>) -> Self {
            Self {
                dynamic: DynamicProperties::new(decls),
                ecs: RefCell::new(ecs),
            }
        }

        fn entity(&self) -> crate::ecs::Entity {
            self.ecs.borrow().as_ref().unwrap().entity()
        }
    }

    impl Object for Lamp {
        fn class_id(&self) -> ClassId {
            ClassId::new("Lamp")
        }
        fn metadata(&self) -> &Metadata {
            self.dynamic.metadata()
        }
        fn property(&self, name: &str) -> Option<Property> {
            resolve_property(self, name)
        }
        fn as_any(&self) -> &dyn core::any::Any {
            self
        }
    }

    impl EngineObject for Lamp {
        fn dynamic_properties(&self) -> &DynamicProperties {
            &self.dynamic
        }
        fn ecs_object(&self) -> Option<EcsObject> {
            self.ecs.borrow().clone()
        }
        fn component_path(&self) -> String {
            "LampComponent.".into()
        }
    }

    fn lamp(with_component: bool) -> (Rc<World>, Lamp) {
        let world = World::new();
        let entity = world.create_entity();
        if with_component {
            world
                .add_component(
                    entity,
                    Component::new("LampComponent")
                        .with_field(Property::new("intensity", 2.0_f32))
                        .with_field(Property::new("radiusMeters", 5.0_f32)),
                )
                .unwrap();
        }
        let lamp = Lamp::new(
            [
                PropertyDecl::new("Intensity", 1.0_f32),
                PropertyDecl::new("Radius", 1.0_f32).field("radiusMeters"),
                PropertyDecl::local("Label", String::from("lamp")),
            ],
            Some(EcsObject::new(&world, entity)),
        );
        (world, lamp)
    }

    #[test]
    fn lower_camel_case() {
        assert_eq!(lower_camel("EnableFlags"), "enableFlags");
        assert_eq!(lower_camel("X"), "x");
        assert_eq!(lower_camel(""), "");
    }

    #[test]
    fn first_lookup_binds_to_the_field() {
        let (world, lamp) = lamp(true);
        assert!(!lamp.dynamic.is_resolved("Intensity"));
        assert_eq!(lamp.get_value::<f32>("Intensity"), Ok(2.0));
        assert!(lamp.dynamic.is_resolved("Intensity"));

        lamp.set_value("Radius", 9.0_f32).unwrap();
        let field = world
            .property_at(lamp.entity(), "LampComponent.radiusMeters")
            .unwrap();
        assert_eq!(field.get_value::<f32>(), Ok(9.0));
    }

    #[test]
    fn reset_off_the_stack_is_rebound() {
        let (_world, lamp) = lamp(true);
        let intensity = lamp.property("Intensity").unwrap();
        assert_eq!(intensity.stack_depth(), 2);

        intensity.reset_value();
        assert_eq!(intensity.stack_depth(), 1);
        let again = lamp.property("Intensity").unwrap();
        assert!(again.ptr_eq(&intensity));
        assert_eq!(intensity.stack_depth(), 2);
        // The reset wrote the default through to the field.
        assert_eq!(intensity.get_value::<f32>(), Ok(1.0));
    }

    #[test]
    fn missing_component_stays_unresolved() {
        let (_world, lamp) = lamp(false);
        assert!(!init_dynamic_property(&lamp, "Intensity"));
        assert_eq!(lamp.get_value::<f32>("Intensity"), Ok(1.0));
        assert!(!lamp.dynamic.is_resolved("Intensity"));
        assert!(lamp.property("Nonexistent").is_none());
        assert!(!init_dynamic_property(&lamp, "Nonexistent"));
    }

    #[test]
    fn local_properties_never_bind() {
        let (_world, lamp) = lamp(false);
        assert!(init_dynamic_property(&lamp, "Label"));
        assert_eq!(lamp.get_value::<String>("Label"), Ok(String::from("lamp")));
        assert_eq!(lamp.property("Label").unwrap().stack_depth(), 1);
    }

    #[test]
    fn type_mismatch_is_not_bound() {
        let world = World::new();
        let entity = world.create_entity();
        world
            .add_component(
                entity,
                Component::new("LampComponent").with_field(Property::new("intensity", 2_u32)),
            )
            .unwrap();
        let lamp = Lamp::new(
            [PropertyDecl::new("Intensity", 1.0_f32)],
            Some(EcsObject::new(&world, entity)),
        );
        assert!(!init_dynamic_property(&lamp, "Intensity"));
        assert_eq!(lamp.get_value::<f32>("Intensity"), Ok(1.0));
    }

    struct Pinned;

    impl ValueProvider for Pinned {
        fn get_value(&self) -> Result<Any, lume_meta::MetaError> {
            Ok(Any::new(42.0_f32))
        }
        fn set_value(&self, _value: &Any) -> Result<(), lume_meta::MetaError> {
            Ok(())
        }
        fn value_type(&self) -> TypeId {
            TypeId::of::<f32>()
        }
        fn is_compatible(&self, type_id: TypeId) -> bool {
            type_id == TypeId::of::<f32>()
        }
        fn process_on_reset(&self, _default: &Any) -> ResetResult {
            ResetResult::Keep
        }
    }

    struct Special(Lamp);

    impl Object for Special {
        fn class_id(&self) -> ClassId {
            ClassId::new("Special")
        }
        fn metadata(&self) -> &Metadata {
            self.0.dynamic.metadata()
        }
        fn property(&self, name: &str) -> Option<Property> {
            resolve_property(self, name)
        }
        fn as_any(&self) -> &dyn core::any::Any {
            self
        }
    }

    impl EngineObject for Special {
        fn dynamic_properties(&self) -> &DynamicProperties {
            &self.0.dynamic
        }
        fn ecs_object(&self) -> Option<EcsObject> {
            self.0.ecs.borrow().clone()
        }
        fn component_path(&self) -> String {
            self.0.component_path()
        }
        fn init_special_property(&self, property: &Property) -> Option<Rc<dyn ValueProvider>> {
            (property.name() == "Intensity").then(|| Rc::new(Pinned) as Rc<dyn ValueProvider>)
        }
    }

    #[test]
    fn exception_table_wins_over_the_path() {
        let (_world, lamp) = lamp(true);
        let special = Special(lamp);
        assert_eq!(special.get_value::<f32>("Intensity"), Ok(42.0));
        assert_eq!(special.get_value::<f32>("Radius"), Ok(5.0));
    }

    fn lamp_entity(world: &Rc<World>, intensity: f32) -> EcsObject {
        let entity = world.create_entity();
        world
            .add_component(
                entity,
                Component::new("LampComponent")
                    .with_field(Property::new("intensity", intensity))
                    .with_field(Property::new("tint", Vec4::new(1.0, 0.5, 0.0, 1.0)))
                    .with_field(Property::new("flicker", 3_u64)),
            )
            .unwrap();
        EcsObject::new(world, entity)
    }

    #[test]
    fn known_type_pairs_bind_through_a_converter() {
        let world = World::new();
        let ecs = lamp_entity(&world, 1.0);
        let lamp = Lamp::new(
            [
                PropertyDecl::new("Tint", Color::WHITE),
                PropertyDecl::new("Flicker", 0_u32),
            ],
            Some(ecs.clone()),
        );

        assert_eq!(
            lamp.get_value::<Color>("Tint"),
            Ok(Color::new(1.0, 0.5, 0.0, 1.0))
        );
        assert!(lamp.dynamic.is_resolved("Tint"));
        lamp.set_value("Tint", Color::new(0.0, 0.0, 1.0, 0.5)).unwrap();
        let tint = ecs.property_at("LampComponent.tint").unwrap();
        assert_eq!(tint.get_value::<Vec4>(), Ok(Vec4::new(0.0, 0.0, 1.0, 0.5)));

        // The engine side notifies through the converter.
        let seen = Rc::new(std::cell::Cell::new(0));
        let s = seen.clone();
        lamp.property("Tint")
            .unwrap()
            .on_changed()
            .add_handler(move |_| s.set(s.get() + 1));
        tint.set_value(Vec4::ONE).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(lamp.get_value::<Color>("Tint"), Ok(Color::WHITE));

        assert_eq!(lamp.get_value::<u32>("Flicker"), Ok(3));
        lamp.set_value("Flicker", 8_u32).unwrap();
        let flicker = ecs.property_at("LampComponent.flicker").unwrap();
        assert_eq!(flicker.get_value::<u64>(), Ok(8));
    }

    #[test]
    fn values_set_before_binding_reach_the_field() {
        let lamp = Lamp::new([PropertyDecl::new("Intensity", 1.0_f32)], None);
        lamp.set_value("Intensity", 4.0_f32).unwrap();
        assert!(!lamp.dynamic.is_resolved("Intensity"));

        let world = World::new();
        let ecs = lamp_entity(&world, 2.0);
        *lamp.ecs.borrow_mut() = Some(ecs.clone());
        assert!(init_dynamic_property(&lamp, "Intensity"));
        let field = ecs.property_at("LampComponent.intensity").unwrap();
        assert_eq!(field.get_value::<f32>(), Ok(4.0));
        let intensity = lamp.property("Intensity").unwrap();
        assert!(intensity.stored_value().is_none());
        assert_eq!(intensity.get_value::<f32>(), Ok(4.0));
    }

    #[test]
    fn rebinding_follows_the_new_entity() {
        let world = World::new();
        let first = lamp_entity(&world, 2.0);
        let second = lamp_entity(&world, 6.0);
        let lamp = Lamp::new(
            [
                PropertyDecl::new("Intensity", 1.0_f32),
                PropertyDecl::new("Tint", Color::WHITE),
            ],
            Some(first.clone()),
        );
        lamp.set_value("Intensity", 3.0_f32).unwrap();
        let intensity = lamp.property("Intensity").unwrap();

        *lamp.ecs.borrow_mut() = Some(second.clone());
        assert_eq!(rebind_dynamic_properties(&lamp), 1);
        assert_eq!(intensity.stack_depth(), 2);
        assert_eq!(intensity.get_value::<f32>(), Ok(6.0));
        intensity.set_value(7.0_f32).unwrap();

        let on_first = first.property_at("LampComponent.intensity").unwrap();
        let on_second = second.property_at("LampComponent.intensity").unwrap();
        assert_eq!(on_first.get_value::<f32>(), Ok(3.0));
        assert_eq!(on_second.get_value::<f32>(), Ok(7.0));
        assert_eq!(on_first.on_changed().handler_count(), 0);
    }
}
