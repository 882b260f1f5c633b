// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-process effects.
//!
//! Every effect is an [`EffectObject`] described by a static [`EffectKind`]:
//! its class, its interface, its bit in the shared enable-flags word and the
//! configuration block its properties bind to. An effect's `Enabled`
//! property is one bit of its parent's flags word; everything else binds to
//! `PostProcessComponent.<block>.<field>`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lume_meta::{
    BitFlagConverter, ClassId, ClassRegistry, ConvertingValue, InterfaceId, MetaError, Metadata,
    Object, ObjectPtr, Property, ValueProvider, WeakObjectPtr,
};

use crate::dynamic::{
    DynamicProperties, EngineObject, PropertyDecl, rebind_dynamic_properties, resolve_property,
};
use crate::ecs::EcsObject;

bitflags::bitflags! {
    /// Bits of the post-process `enableFlags` word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EffectFlags: u32 {
        /// Tonemapping.
        const TONEMAP = 0x1;
        /// Vignette.
        const VIGNETTE = 0x2;
        /// Dithering.
        const DITHER = 0x4;
        /// Color conversion.
        const COLOR_CONVERSION = 0x8;
        /// Chromatic aberration.
        const COLOR_FRINGE = 0x10;
        /// Blur.
        const BLUR = 0x100;
        /// Bloom.
        const BLOOM = 0x200;
        /// Fast approximate anti-aliasing.
        const FXAA = 0x400;
        /// Temporal anti-aliasing.
        const TAA = 0x800;
        /// Depth of field.
        const DOF = 0x1000;
        /// Motion blur.
        const MOTION_BLUR = 0x2000;
    }
}

/// Name of the ECS component backing post-processing.
pub const POST_PROCESS_COMPONENT: &str = "PostProcessComponent";

/// Name of the property holding whether an effect is enabled.
pub const ENABLED: &str = "Enabled";

/// Static description of one effect class.
pub struct EffectKind {
    /// Name of the post-process property holding the effect.
    pub name: &'static str,
    /// Class of the effect object.
    pub class_id: ClassId,
    /// Interface identifying this effect.
    pub interface: InterfaceId,
    /// Every interface the effect object implements.
    pub interfaces: &'static [InterfaceId],
    /// Enable bit in the shared flags word.
    pub flag: EffectFlags,
    /// Configuration block inside the post-process component.
    pub block: &'static str,
    /// Engine-backed properties other than `Enabled`.
    pub properties: fn() -> Vec<PropertyDecl>,
}

impl EffectKind {
    /// Returns the engine path prefix of this effect's fields.
    #[must_use]
    pub fn component_path(&self) -> String {
        format!("{POST_PROCESS_COMPONENT}.{}.", self.block)
    }

    /// Returns every declared property, `Enabled` first.
    #[must_use]
    pub fn declarations(&self) -> Vec<PropertyDecl> {
        let mut decls = vec![PropertyDecl::new(ENABLED, false)];
        decls.extend((self.properties)());
        decls
    }
}

impl fmt::Debug for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectKind")
            .field("name", &self.name)
            .field("flag", &self.flag)
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

/// Interface shared by every effect.
pub const IEFFECT: InterfaceId = InterfaceId::new("IEffect");
/// Tonemap interface.
pub const ITONEMAP: InterfaceId = InterfaceId::new("ITonemap");
/// Bloom interface.
pub const IBLOOM: InterfaceId = InterfaceId::new("IBloom");
/// Blur interface.
pub const IBLUR: InterfaceId = InterfaceId::new("IBlur");
/// Motion blur interface.
pub const IMOTION_BLUR: InterfaceId = InterfaceId::new("IMotionBlur");
/// Color conversion interface.
pub const ICOLOR_CONVERSION: InterfaceId = InterfaceId::new("IColorConversion");
/// Vignette interface.
pub const IVIGNETTE: InterfaceId = InterfaceId::new("IVignette");
/// Color fringe interface.
pub const ICOLOR_FRINGE: InterfaceId = InterfaceId::new("IColorFringe");
/// Depth of field interface.
pub const IDEPTH_OF_FIELD: InterfaceId = InterfaceId::new("IDepthOfField");
/// FXAA interface.
pub const IFXAA: InterfaceId = InterfaceId::new("IFxaa");
/// TAA interface.
pub const ITAA: InterfaceId = InterfaceId::new("ITaa");

fn type_and_quality(type_field: &'static str, quality_field: &'static str) -> [PropertyDecl; 2] {
    [
        PropertyDecl::new("Type", 0_u32).field(type_field),
        PropertyDecl::new("Quality", 1_u32).field(quality_field),
    ]
}

/// Tonemapping.
pub static TONEMAP: EffectKind = EffectKind {
    name: "Tonemap",
    class_id: ClassId::new("Tonemap"),
    interface: ITONEMAP,
    interfaces: &[ITONEMAP, IEFFECT],
    flag: EffectFlags::TONEMAP,
    block: "tonemapConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Type", 0_u32).field("tonemapType"),
            PropertyDecl::new("Exposure", 0.7_f32),
        ]
    },
};

/// Bloom.
pub static BLOOM: EffectKind = EffectKind {
    name: "Bloom",
    class_id: ClassId::new("Bloom"),
    interface: IBLOOM,
    interfaces: &[IBLOOM, IEFFECT],
    flag: EffectFlags::BLOOM,
    block: "bloomConfiguration",
    properties: || {
        let mut decls = type_and_quality("bloomType", "bloomQualityType").to_vec();
        decls.extend([
            PropertyDecl::new("ThresholdHard", 1.0_f32),
            PropertyDecl::new("ThresholdSoft", 2.0_f32),
            PropertyDecl::new("AmountCoefficient", 0.25_f32),
            PropertyDecl::new("DirtMaskCoefficient", 0.0_f32),
            PropertyDecl::new("Scatter", 1.0_f32),
            PropertyDecl::new("ScaleFactor", 1.0_f32),
            PropertyDecl::new("UseCompute", false),
        ]);
        decls
    },
};

/// Blur.
pub static BLUR: EffectKind = EffectKind {
    name: "Blur",
    class_id: ClassId::new("Blur"),
    interface: IBLUR,
    interfaces: &[IBLUR, IEFFECT],
    flag: EffectFlags::BLUR,
    block: "blurConfiguration",
    properties: || {
        let mut decls = type_and_quality("blurType", "blurQualityType").to_vec();
        decls.extend([
            PropertyDecl::new("FilterSize", 1.0_f32),
            PropertyDecl::new("MaxMipmapLevel", 0_u32).field("maxMipLevel"),
        ]);
        decls
    },
};

/// Motion blur.
pub static MOTION_BLUR: EffectKind = EffectKind {
    name: "MotionBlur",
    class_id: ClassId::new("MotionBlur"),
    interface: IMOTION_BLUR,
    interfaces: &[IMOTION_BLUR, IEFFECT],
    flag: EffectFlags::MOTION_BLUR,
    block: "motionBlurConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Alpha", 1.0_f32),
            PropertyDecl::new("VelocityCoefficient", 1.0_f32),
            PropertyDecl::new("Quality", 1_u32),
            PropertyDecl::new("Sharpness", 1_u32),
        ]
    },
};

/// Color conversion.
pub static COLOR_CONVERSION: EffectKind = EffectKind {
    name: "ColorConversion",
    class_id: ClassId::new("ColorConversion"),
    interface: ICOLOR_CONVERSION,
    interfaces: &[ICOLOR_CONVERSION, IEFFECT],
    flag: EffectFlags::COLOR_CONVERSION,
    block: "colorConversionConfiguration",
    properties: || {
        vec![PropertyDecl::new("Function", 0_u32).field("conversionFunctionType")]
    },
};

/// Vignette.
pub static VIGNETTE: EffectKind = EffectKind {
    name: "Vignette",
    class_id: ClassId::new("Vignette"),
    interface: IVIGNETTE,
    interfaces: &[IVIGNETTE, IEFFECT],
    flag: EffectFlags::VIGNETTE,
    block: "vignetteConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Coefficient", 0.5_f32),
            PropertyDecl::new("Power", 0.4_f32),
        ]
    },
};

/// Color fringe.
pub static COLOR_FRINGE: EffectKind = EffectKind {
    name: "ColorFringe",
    class_id: ClassId::new("ColorFringe"),
    interface: ICOLOR_FRINGE,
    interfaces: &[ICOLOR_FRINGE, IEFFECT],
    flag: EffectFlags::COLOR_FRINGE,
    block: "colorFringeConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Coefficient", 1.0_f32),
            PropertyDecl::new("DistanceCoefficient", 2.0_f32),
        ]
    },
};

/// Depth of field.
pub static DEPTH_OF_FIELD: EffectKind = EffectKind {
    name: "DepthOfField",
    class_id: ClassId::new("DepthOfField"),
    interface: IDEPTH_OF_FIELD,
    interfaces: &[IDEPTH_OF_FIELD, IEFFECT],
    flag: EffectFlags::DOF,
    block: "dofConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("FocusPoint", 3.0_f32),
            PropertyDecl::new("FocusRange", 1.0_f32),
            PropertyDecl::new("NearTransitionRange", 1.0_f32),
            PropertyDecl::new("FarTransitionRange", 1.0_f32),
            PropertyDecl::new("NearBlur", 2.0_f32),
            PropertyDecl::new("FarBlur", 2.0_f32),
            PropertyDecl::new("NearPlane", 0.1_f32),
            PropertyDecl::new("FarPlane", 1000.0_f32),
        ]
    },
};

/// FXAA.
pub static FXAA: EffectKind = EffectKind {
    name: "Fxaa",
    class_id: ClassId::new("Fxaa"),
    interface: IFXAA,
    interfaces: &[IFXAA, IEFFECT],
    flag: EffectFlags::FXAA,
    block: "fxaaConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Sharpness", 1_u32),
            PropertyDecl::new("Quality", 1_u32),
        ]
    },
};

/// TAA.
pub static TAA: EffectKind = EffectKind {
    name: "Taa",
    class_id: ClassId::new("Taa"),
    interface: ITAA,
    interfaces: &[ITAA, IEFFECT],
    flag: EffectFlags::TAA,
    block: "taaConfiguration",
    properties: || {
        vec![
            PropertyDecl::new("Sharpness", 1_u32),
            PropertyDecl::new("Quality", 1_u32),
        ]
    },
};

/// Every effect, in the order a post-process object creates them.
pub static EFFECT_KINDS: [&EffectKind; 10] = [
    &TONEMAP,
    &BLOOM,
    &BLUR,
    &MOTION_BLUR,
    &COLOR_CONVERSION,
    &VIGNETTE,
    &COLOR_FRINGE,
    &DEPTH_OF_FIELD,
    &FXAA,
    &TAA,
];

/// Registry of effect classes.
pub type EffectClasses = ClassRegistry<EffectObject>;

macro_rules! register_effects {
    ($registry:ident, $($kind:ident),* $(,)?) => {
        $(
            $registry.register($kind.class_id, $kind.interfaces, || {
                Rc::new(EffectObject::new(&$kind))
            })?;
        )*
    };
}

/// Builds the registry of every effect class.
pub fn effect_classes() -> Result<EffectClasses, MetaError> {
    let mut registry = ClassRegistry::new();
    register_effects!(
        registry,
        TONEMAP,
        BLOOM,
        BLUR,
        MOTION_BLUR,
        COLOR_CONVERSION,
        VIGNETTE,
        COLOR_FRINGE,
        DEPTH_OF_FIELD,
        FXAA,
        TAA,
    );
    Ok(registry)
}

/// A post-process effect.
///
/// Created through [`effect_classes`] by a post-process object, which then
/// injects its flags property and entity with [`init`](Self::init).
pub struct EffectObject {
    kind: &'static EffectKind,
    dynamic: DynamicProperties,
    parent: RefCell<Option<WeakObjectPtr>>,
    flags: RefCell<Option<Property>>,
    ecs: RefCell<Option<EcsObject>>,
}

impl EffectObject {
    /// Creates an uninitialized effect of `kind`.
    #[must_use]
    pub fn new(kind: &'static EffectKind) -> Self {
        Self {
            kind,
            dynamic: DynamicProperties::new(kind.declarations()),
            parent: RefCell::new(None),
            flags: RefCell::new(None),
            ecs: RefCell::new(None),
        }
    }

    /// Returns the description of this effect.
    #[must_use]
    pub fn kind(&self) -> &'static EffectKind {
        self.kind
    }

    /// Injects the shared flags word and the entity to bind against.
    ///
    /// Properties bound earlier are bound again against the new inputs.
    pub fn init(&self, flags: Property, ecs: Option<EcsObject>) {
        *self.flags.borrow_mut() = Some(flags);
        *self.ecs.borrow_mut() = ecs;
        rebind_dynamic_properties(self);
    }

    /// Returns `true` once a flags word has been injected.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.flags.borrow().is_some()
    }

    /// Attaches the effect to its owner.
    pub fn set_parent(&self, parent: WeakObjectPtr) {
        *self.parent.borrow_mut() = Some(parent);
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn dynamic(&self) -> &DynamicProperties {
        &self.dynamic
    }
}

impl Object for EffectObject {
    fn class_id(&self) -> ClassId {
        self.kind.class_id
    }

    fn interfaces(&self) -> &'static [InterfaceId] {
        self.kind.interfaces
    }

    fn metadata(&self) -> &Metadata {
        self.dynamic.metadata()
    }

    fn property(&self, name: &str) -> Option<Property> {
        resolve_property(self, name)
    }

    fn parent(&self) -> Option<ObjectPtr> {
        self.parent.borrow().as_ref()?.upgrade()
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }
}

impl EngineObject for EffectObject {
    fn dynamic_properties(&self) -> &DynamicProperties {
        &self.dynamic
    }

    fn ecs_object(&self) -> Option<EcsObject> {
        self.ecs.borrow().clone()
    }

    fn component_path(&self) -> String {
        self.kind.component_path()
    }

    fn init_special_property(&self, property: &Property) -> Option<Rc<dyn ValueProvider>> {
        if property.name() != ENABLED {
            return None;
        }
        let flags = self.flags.borrow().clone()?;
        Some(ConvertingValue::new(
            flags,
            BitFlagConverter::new(self.kind.flag.bits()),
        ))
    }
}

impl fmt::Debug for EffectObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectObject")
            .field("kind", &self.kind.name)
            .field("initialized", &self.is_initialized())
            .field("properties", &self.dynamic)
            .finish_non_exhaustive()
    }
}
