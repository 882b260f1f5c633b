// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene nodes and cameras.
//!
//! Nodes bind their properties to fields spread over several components, so
//! their component path is empty and every declaration names its full
//! `"Component.field"` path.

use std::fmt;
use std::rc::Rc;

use lume_meta::{
    Any, ClassId, InterfaceId, Metadata, Object, ObjectRef, Property, Quat, RenderSort, Vec3,
};

use crate::dynamic::{DynamicProperties, EngineObject, PropertyDecl, resolve_property};
use crate::ecs::{Component, EcsObject};
use crate::postprocess::IPOST_PROCESS;

/// Node interface.
pub const INODE: InterfaceId = InterfaceId::new("INode");
/// Camera interface.
pub const ICAMERA: InterfaceId = InterfaceId::new("ICamera");

/// Plain node class.
pub const NODE_CLASS: ClassId = ClassId::new("Node");
/// Camera node class.
pub const CAMERA_CLASS: ClassId = ClassId::new("Camera");

/// Default vertical field of view, in radians.
pub const DEFAULT_FOV: f32 = core::f32::consts::FRAC_PI_3;

fn node_declarations() -> Vec<PropertyDecl> {
    vec![
        PropertyDecl::new("Name", String::new()).field("NameComponent.name"),
        PropertyDecl::new("Position", Vec3::ZERO).field("TransformComponent.position"),
        PropertyDecl::new("Rotation", Quat::IDENTITY).field("TransformComponent.rotation"),
        PropertyDecl::new("Scale", Vec3::ONE).field("TransformComponent.scale"),
        PropertyDecl::new("RenderSort", RenderSort::default())
            .field("RenderSortComponent.renderSort"),
    ]
}

fn camera_declarations() -> Vec<PropertyDecl> {
    let mut decls = node_declarations();
    decls.extend([
        PropertyDecl::new("FoV", DEFAULT_FOV).field("CameraComponent.yFov"),
        PropertyDecl::new("NearPlane", 0.3_f32).field("CameraComponent.zNear"),
        PropertyDecl::new("FarPlane", 1000.0_f32).field("CameraComponent.zFar"),
        PropertyDecl::local("PostProcess", ObjectRef::null()).interface(IPOST_PROCESS),
        PropertyDecl::local("Effects", Any::new_array::<ObjectRef>(Vec::new())),
    ]);
    decls
}

/// Builds the components every node entity carries.
#[must_use]
pub fn node_components(name: &str) -> [Component; 3] {
    [
        Component::new("NameComponent").with_field(Property::new("name", String::from(name))),
        Component::new("TransformComponent")
            .with_field(Property::new("position", Vec3::ZERO))
            .with_field(Property::new("rotation", Quat::IDENTITY))
            .with_field(Property::new("scale", Vec3::ONE)),
        Component::new("RenderSortComponent")
            .with_field(Property::new("renderSort", RenderSort::default())),
    ]
}

/// Builds the camera component.
#[must_use]
pub fn camera_component() -> Component {
    Component::new("CameraComponent")
        .with_field(Property::new("yFov", DEFAULT_FOV))
        .with_field(Property::new("zNear", 0.3_f32))
        .with_field(Property::new("zFar", 1000.0_f32))
}

/// A node or camera bound to one entity.
pub struct Node {
    class_id: ClassId,
    interfaces: &'static [InterfaceId],
    dynamic: DynamicProperties,
    ecs: EcsObject,
}

impl Node {
    /// Creates a plain node over `ecs`.
    #[must_use]
    pub fn new(ecs: EcsObject) -> Rc<Self> {
        Rc::new(Self {
            class_id: NODE_CLASS,
            interfaces: &[INODE],
            dynamic: DynamicProperties::new(node_declarations()),
            ecs,
        })
    }

    /// Creates a camera node over `ecs`.
    #[must_use]
    pub fn camera(ecs: EcsObject) -> Rc<Self> {
        Rc::new(Self {
            class_id: CAMERA_CLASS,
            interfaces: &[ICAMERA, INODE],
            dynamic: DynamicProperties::new(camera_declarations()),
            ecs,
        })
    }

    /// Returns the entity handle.
    #[must_use]
    pub fn ecs(&self) -> &EcsObject {
        &self.ecs
    }

    /// Returns `true` for camera nodes.
    #[must_use]
    pub fn is_camera(&self) -> bool {
        self.class_id == CAMERA_CLASS
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn dynamic(&self) -> &DynamicProperties {
        &self.dynamic
    }
}

impl Object for Node {
    fn class_id(&self) -> ClassId {
        self.class_id
    }

    fn interfaces(&self) -> &'static [InterfaceId] {
        self.interfaces
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

impl EngineObject for Node {
    fn dynamic_properties(&self) -> &DynamicProperties {
        &self.dynamic
    }

    fn ecs_object(&self) -> Option<EcsObject> {
        Some(self.ecs.clone())
    }

    fn component_path(&self) -> String {
        String::new()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("class", &self.class_id.name())
            .field("ecs", &self.ecs)
            .field("properties", &self.dynamic)
            .finish_non_exhaustive()
    }
}
