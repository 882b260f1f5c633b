// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine value types that flow through properties alongside the scalars.

use glam::Vec4;

/// A linear RGBA colour.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a colour from its components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the colour as a `Vec4` in `rgba` order.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Creates a colour from a `Vec4` in `rgba` order.
    #[must_use]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

/// Sorting key of a renderable: a layer and an order within that layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderSort {
    /// Render layer.
    pub layer: u32,
    /// Order inside the layer.
    pub layer_order: u32,
}

impl RenderSort {
    /// Creates a sort key.
    #[must_use]
    pub const fn new(layer: u32, layer_order: u32) -> Self {
        Self { layer, layer_order }
    }
}
