// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lume Scene: scene objects over an entity/component store.
//!
//! Scene objects expose the [`lume_meta`] property model while the values
//! live in engine components. This crate provides the bridge between the two
//! and the objects built on it.
//!
//! ## Core Concepts
//!
//! ### Components
//!
//! A [`World`] holds entities, each with named [`Component`]s whose fields
//! are ordinary properties addressed as `"Component.field"`.
//!
//! ### Dynamic properties
//!
//! Scene objects declare their properties up front with [`PropertyDecl`].
//! The first lookup of a declared property binds it to the matching field
//! of the object's entity. Objects may claim names before the generic path
//! applies; effects bind `Enabled` to one bit of a shared flags word this way.
//!
//! ### Post-processing
//!
//! A [`PostProcess`] object creates one child per [`EffectKind`] and hands
//! each the shared `EnableFlags` property and the entity to bind against.
//!
//! ### Threading
//!
//! Everything here belongs to the thread owning the [`Scene`]. Other threads
//! post work through a [`TaskSender`].
//!
//! ## Quick Start
//!
//! ```rust
//! use lume_meta::{ObjectExt, ObjectRef, RenderSort};
//! use lume_scene::{EffectsContainer, PostProcess, Scene, TONEMAP};
//!
//! let scene = Scene::new().unwrap();
//! let camera = scene.create_camera("main").unwrap();
//! camera.set_value("RenderSort", RenderSort::new(2, 5)).unwrap();
//!
//! let post = camera.get_value::<ObjectRef>("PostProcess").unwrap();
//! let post = post.get().unwrap().as_any().downcast_ref::<PostProcess>().unwrap();
//! let tonemap = post.effect(&TONEMAP).unwrap();
//! tonemap.set_value("Enabled", true).unwrap();
//!
//! let effects = EffectsContainer::from_object(&*camera, "Effects").unwrap();
//! effects.append_child(tonemap);
//! assert_eq!(effects.child_count(), 1);
//! ```

mod dynamic;
mod ecs;
mod effects;
mod kit;
mod node;
mod postprocess;
mod scene;

pub use dynamic::{
    DynamicProperties, EngineObject, PropertyDecl, Resolution, attach_engine_property,
    engine_converter, init_dynamic_property, lower_camel, rebind_dynamic_properties,
    resolve_property,
};
pub use ecs::{Component, EcsObject, Entity, World};
pub use effects::{
    BLOOM, BLUR, COLOR_CONVERSION, COLOR_FRINGE, DEPTH_OF_FIELD, EFFECT_KINDS, ENABLED,
    EffectClasses, EffectFlags, EffectKind, EffectObject, FXAA, IBLOOM, IBLUR, ICOLOR_CONVERSION,
    ICOLOR_FRINGE, IDEPTH_OF_FIELD, IEFFECT, IFXAA, IMOTION_BLUR, ITAA, ITONEMAP, IVIGNETTE,
    MOTION_BLUR, POST_PROCESS_COMPONENT, TAA, TONEMAP, VIGNETTE, effect_classes,
};
pub use kit::{EffectsContainer, ObjectKit};
pub use node::{
    CAMERA_CLASS, DEFAULT_FOV, ICAMERA, INODE, NODE_CLASS, Node, camera_component,
    node_components,
};
pub use postprocess::{
    ENABLE_FLAGS, IPOST_PROCESS, POST_PROCESS_CLASS, PostProcess, effect_slot,
    post_process_component,
};
pub use scene::{Scene, Task, TaskSender};
