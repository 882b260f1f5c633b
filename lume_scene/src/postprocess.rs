// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The post-process composite.
//!
//! A [`PostProcess`] owns one child per [`EffectKind`]. Each child is built
//! from the class registry and handed the two things its properties resolve
//! against: the post-process `EnableFlags` property (for `Enabled`) and the
//! entity carrying the [`post_process_component`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lume_meta::{
    Any, ClassId, InterfaceId, Metadata, Object, ObjectPtr, ObjectRef, Property, PropertyBuilder,
    WeakObjectPtr,
};

use crate::dynamic::{
    DynamicProperties, EngineObject, PropertyDecl, rebind_dynamic_properties, resolve_property,
};
use crate::ecs::{Component, EcsObject};
use crate::effects::{
    EFFECT_KINDS, EffectClasses, EffectKind, EffectObject, POST_PROCESS_COMPONENT,
};

/// Post-process interface.
pub const IPOST_PROCESS: InterfaceId = InterfaceId::new("IPostProcess");

/// Post-process class.
pub const POST_PROCESS_CLASS: ClassId = ClassId::new("PostProcess");

/// Name of the shared enable-flags property.
pub const ENABLE_FLAGS: &str = "EnableFlags";

/// Builds the engine component backing a post-process object.
///
/// Holds `enableFlags` plus one `<block>.<field>` entry per effect property,
/// initialized to the declared defaults.
#[must_use]
pub fn post_process_component() -> Component {
    let mut component =
        Component::new(POST_PROCESS_COMPONENT).with_field(Property::new("enableFlags", 0_u32));
    for kind in EFFECT_KINDS {
        for decl in (kind.properties)() {
            let name = format!("{}.{}", kind.block, decl.field_name());
            let field = Property::from_any(name, decl.default_value().clone());
            component = component.with_field(field);
        }
    }
    component
}

fn declarations() -> Vec<PropertyDecl> {
    let mut decls = vec![PropertyDecl::new(ENABLE_FLAGS, 0_u32)];
    decls.extend(EFFECT_KINDS.iter().map(|kind| {
        PropertyDecl::local(kind.name, ObjectRef::null()).interface(kind.interface)
    }));
    decls
}

/// Post-processing settings of a camera.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use lume_meta::ObjectExt;
/// use lume_scene::{
///     EcsObject, PostProcess, TONEMAP, VIGNETTE, World, effect_classes, post_process_component,
/// };
///
/// let world = World::new();
/// let entity = world.create_entity();
/// world.add_component(entity, post_process_component()).unwrap();
///
/// let classes = Rc::new(effect_classes().unwrap());
/// let post = PostProcess::new(classes, Some(EcsObject::new(&world, entity)));
///
/// let tonemap = post.effect(&TONEMAP).unwrap();
/// let vignette = post.effect(&VIGNETTE).unwrap();
/// tonemap.set_value("Enabled", true).unwrap();
/// vignette.set_value("Enabled", true).unwrap();
///
/// let flags = world.property_at(entity, "PostProcessComponent.enableFlags").unwrap();
/// assert_eq!(flags.get_value::<u32>(), Ok(0x3));
/// ```
pub struct PostProcess {
    this: Weak<Self>,
    dynamic: DynamicProperties,
    ecs: RefCell<Option<EcsObject>>,
    classes: Rc<EffectClasses>,
}

impl PostProcess {
    /// Creates a post-process object and all of its effects.
    #[must_use]
    pub fn new(classes: Rc<EffectClasses>, ecs: Option<EcsObject>) -> Rc<Self> {
        let post = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            dynamic: DynamicProperties::new(declarations()),
            ecs: RefCell::new(ecs),
            classes,
        });
        for kind in EFFECT_KINDS {
            if let Some(slot) = post.dynamic.declared(kind.name) {
                post.create_effect(&slot, kind.class_id, kind.interface);
            }
        }
        post
    }

    /// Creates an effect of `class_id` and stores it in `property`.
    ///
    /// Returns `None` without constructing anything if `property` does not
    /// hold `interface` objects or the class does not implement it.
    pub fn create_effect(
        &self,
        property: &Property,
        class_id: ClassId,
        interface: InterfaceId,
    ) -> Option<Rc<EffectObject>> {
        if !property.is_compatible_interface(interface) {
            log::warn!(
                "'{}' cannot hold {} objects",
                property.name(),
                interface.name()
            );
            return None;
        }
        if !self.classes.implements(class_id, interface) {
            log::warn!(
                "class '{}' does not implement {}",
                class_id.name(),
                interface.name()
            );
            return None;
        }
        let flags = self.property(ENABLE_FLAGS)?;
        let effect = self.classes.create(class_id)?;
        let parent: WeakObjectPtr = self.this.clone();
        effect.set_parent(parent);
        effect.init(flags, self.ecs_object());

        let object: ObjectPtr = effect.clone();
        if let Err(err) = property.set_value(ObjectRef::new(object)) {
            log::warn!("storing '{}': {err}", property.name());
            return None;
        }
        log::debug!("created {} into '{}'", class_id.name(), property.name());
        Some(effect)
    }

    /// Returns the effect of `kind`.
    #[must_use]
    pub fn effect(&self, kind: &EffectKind) -> Option<ObjectPtr> {
        self.dynamic
            .declared(kind.name)?
            .get_value::<ObjectRef>()
            .ok()?
            .into_inner()
    }

    /// Returns every effect, in creation order.
    #[must_use]
    pub fn effects(&self) -> Vec<ObjectPtr> {
        EFFECT_KINDS
            .iter()
            .filter_map(|kind| self.effect(kind))
            .collect()
    }

    /// Binds this object and its effects to another entity.
    ///
    /// Properties bound to the previous entity are bound again and read what
    /// the new entity holds. Values set while no entity was attached, such as
    /// effects enabled before attaching, are written to the new entity.
    pub fn attach(&self, ecs: EcsObject) {
        *self.ecs.borrow_mut() = Some(ecs.clone());
        rebind_dynamic_properties(self);
        let Some(flags) = self.property(ENABLE_FLAGS) else {
            return;
        };
        for effect in self.effects() {
            if let Some(effect) = effect.as_any().downcast_ref::<EffectObject>() {
                effect.init(flags.clone(), Some(ecs.clone()));
            }
        }
        log::debug!("post-process attached to entity {}", ecs.entity().index());
    }
}

impl Object for PostProcess {
    fn class_id(&self) -> ClassId {
        POST_PROCESS_CLASS
    }

    fn interfaces(&self) -> &'static [InterfaceId] {
        &[IPOST_PROCESS]
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

impl EngineObject for PostProcess {
    fn dynamic_properties(&self) -> &DynamicProperties {
        &self.dynamic
    }

    fn ecs_object(&self) -> Option<EcsObject> {
        self.ecs.borrow().clone()
    }

    fn component_path(&self) -> String {
        format!("{POST_PROCESS_COMPONENT}.")
    }
}

impl fmt::Debug for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcess")
            .field("ecs", &self.ecs.borrow())
            .field("properties", &self.dynamic)
            .finish_non_exhaustive()
    }
}

/// Returns an empty effect slot declared for `interface`.
#[must_use]
pub fn effect_slot(name: &str, interface: InterfaceId) -> Property {
    PropertyBuilder::new(name, Any::new(ObjectRef::null()))
        .interface(interface)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;
    use crate::effects::{BLOOM, IBLOOM, ITONEMAP, TONEMAP, effect_classes};
    use lume_meta::ObjectExt;

    fn post_process() -> (Rc<World>, Rc<PostProcess>) {
        let world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, post_process_component()).unwrap();
        let classes = Rc::new(effect_classes().unwrap());
        let post = PostProcess::new(classes, Some(EcsObject::new(&world, entity)));
        (world, post)
    }

    #[test]
    fn every_effect_is_created_and_parented() {
        let (_world, post) = post_process();
        assert_eq!(post.effects().len(), EFFECT_KINDS.len());
        for kind in EFFECT_KINDS {
            let effect = post.effect(kind).unwrap();
            assert_eq!(effect.class_id(), kind.class_id);
            let parent = effect.parent().unwrap();
            assert_eq!(parent.class_id(), POST_PROCESS_CLASS);
        }
    }

    #[test]
    fn mismatched_slot_constructs_nothing() {
        let (_world, post) = post_process();
        let slot = effect_slot("Bloom", IBLOOM);
        assert!(post.create_effect(&slot, TONEMAP.class_id, ITONEMAP).is_none());
        assert!(post.create_effect(&slot, TONEMAP.class_id, IBLOOM).is_none());
        assert!(slot.get_value::<ObjectRef>().unwrap().is_null());

        let plain = Property::new("Bloom", 0_u32);
        assert!(post.create_effect(&plain, BLOOM.class_id, IBLOOM).is_none());

        let bloom = post.create_effect(&slot, BLOOM.class_id, IBLOOM).unwrap();
        assert!(bloom.is_initialized());
        assert!(!slot.get_value::<ObjectRef>().unwrap().is_null());
    }

    #[test]
    fn effect_fields_resolve_against_the_shared_component() {
        let (world, post) = post_process();
        let bloom = post.effect(&BLOOM).unwrap();
        assert_eq!(bloom.get_value::<f32>("AmountCoefficient"), Ok(0.25));
        bloom.set_value("ThresholdHard", 0.5_f32).unwrap();
        let entity = post.ecs_object().unwrap().entity();
        let field = world
            .property_at(entity, "PostProcessComponent.bloomConfiguration.thresholdHard")
            .unwrap();
        assert_eq!(field.get_value::<f32>(), Ok(0.5));
    }

    #[test]
    fn enable_bits_land_in_the_component() {
        let (world, post) = post_process();
        let bloom = post.effect(&BLOOM).unwrap();
        bloom.set_value("Enabled", true).unwrap();
        let entity = post.ecs_object().unwrap().entity();
        let flags = world
            .property_at(entity, "PostProcessComponent.enableFlags")
            .unwrap();
        assert_eq!(flags.get_value::<u32>(), Ok(BLOOM.flag.bits()));
        assert_eq!(post.get_value::<u32>(ENABLE_FLAGS), Ok(0x200));
    }

    #[test]
    fn attach_rebinds_unresolved_effects() {
        let classes = Rc::new(effect_classes().unwrap());
        let post = PostProcess::new(classes, None);
        let tonemap = post.effect(&TONEMAP).unwrap();
        assert_eq!(tonemap.get_value::<f32>("Exposure"), Ok(0.7));

        let world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, post_process_component()).unwrap();
        post.attach(EcsObject::new(&world, entity));
        tonemap.set_value("Exposure", 1.5_f32).unwrap();
        let field = world
            .property_at(entity, "PostProcessComponent.tonemapConfiguration.exposure")
            .unwrap();
        assert_eq!(field.get_value::<f32>(), Ok(1.5));
    }

    fn entity_with_component(world: &Rc<World>) -> EcsObject {
        let entity = world.create_entity();
        world.add_component(entity, post_process_component()).unwrap();
        EcsObject::new(world, entity)
    }

    #[test]
    fn effects_enabled_before_attach_reach_the_component() {
        let classes = Rc::new(effect_classes().unwrap());
        let post = PostProcess::new(classes, None);
        let tonemap = post.effect(&TONEMAP).unwrap();
        tonemap.set_value("Enabled", true).unwrap();
        assert_eq!(post.get_value::<u32>(ENABLE_FLAGS), Ok(0x1));

        let world = World::new();
        let ecs = entity_with_component(&world);
        post.attach(ecs.clone());
        let flags = ecs.property_at("PostProcessComponent.enableFlags").unwrap();
        assert_eq!(flags.get_value::<u32>(), Ok(0x1));
        assert_eq!(post.get_value::<u32>(ENABLE_FLAGS), Ok(0x1));
        assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(true));

        // Engine writes now show through the effect.
        flags.set_value(0_u32).unwrap();
        assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(false));
    }

    #[test]
    fn attaching_elsewhere_moves_every_binding() {
        let world = World::new();
        let first = entity_with_component(&world);
        let second = entity_with_component(&world);
        let classes = Rc::new(effect_classes().unwrap());
        let post = PostProcess::new(classes, Some(first.clone()));
        let tonemap = post.effect(&TONEMAP).unwrap();
        tonemap.set_value("Exposure", 2.0_f32).unwrap();
        tonemap.set_value("Enabled", true).unwrap();

        post.attach(second.clone());
        assert_eq!(tonemap.get_value::<f32>("Exposure"), Ok(0.7));
        assert_eq!(tonemap.get_value::<bool>("Enabled"), Ok(false));
        tonemap.set_value("Exposure", 1.5_f32).unwrap();
        tonemap.set_value("Enabled", true).unwrap();

        let exposure = "PostProcessComponent.tonemapConfiguration.exposure";
        let flags = "PostProcessComponent.enableFlags";
        let value_at = |ecs: &EcsObject, path| ecs.property_at(path).unwrap().get_value_any();
        assert_eq!(value_at(&first, exposure).get_value::<f32>(), Ok(2.0));
        assert_eq!(value_at(&second, exposure).get_value::<f32>(), Ok(1.5));
        assert_eq!(value_at(&first, flags).get_value::<u32>(), Ok(0x1));
        assert_eq!(value_at(&second, flags).get_value::<u32>(), Ok(0x1));
        assert_eq!(
            first
                .property_at(exposure)
                .unwrap()
                .on_changed()
                .handler_count(),
            0
        );
    }
}
