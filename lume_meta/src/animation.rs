// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property animation.
//!
//! A [`PropertyAnimation`] drives a property from a start value to a target
//! value over time. While it runs, a provider sits on top of the property's
//! stack and overrides everything below; stopping removes it again, finishing
//! commits the final value below it.

use alloc::rc::Rc;
use alloc::vec::Vec;

use glam::{Vec2, Vec3, Vec4};

use crate::any::Any;
use crate::error::MetaError;
use crate::property::{Property, WeakProperty};
use crate::stack::{StaticValue, ValueProvider};
use crate::types::Color;
use crate::value::Value;

/// Easing curve applied to the linear progress of an animation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// No easing.
    #[default]
    Linear,
    /// Quadratic acceleration.
    InQuad,
    /// Quadratic deceleration.
    OutQuad,
    /// Quadratic acceleration, then deceleration.
    InOutQuad,
}

impl Easing {
    /// Maps linear progress `t` in `0..=1` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => t * (2.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_f64(a: f64, b: f64, t: f32) -> f64 {
    a + (b - a) * f64::from(t)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "interpolated integers are truncated towards zero"
)]
fn lerp_i64(a: i64, b: i64, t: f32) -> i64 {
    lerp_f64(a as f64, b as f64, t) as i64
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "interpolated integers are truncated towards zero"
)]
fn lerp_u64(a: u64, b: u64, t: f32) -> u64 {
    lerp_f64(a as f64, b as f64, t) as u64
}

fn interpolate_value(from: &Value, to: &Value, t: f32) -> Value {
    match (from, to) {
        (Value::F32(a), Value::F32(b)) => Value::F32(lerp_f32(*a, *b, t)),
        (Value::F64(a), Value::F64(b)) => Value::F64(lerp_f64(*a, *b, t)),
        #[expect(clippy::cast_possible_truncation, reason = "result lies between a and b")]
        (Value::I32(a), Value::I32(b)) => {
            Value::I32(lerp_i64(i64::from(*a), i64::from(*b), t) as i32)
        }
        #[expect(clippy::cast_possible_truncation, reason = "result lies between a and b")]
        (Value::U32(a), Value::U32(b)) => {
            Value::U32(lerp_i64(i64::from(*a), i64::from(*b), t) as u32)
        }
        (Value::U64(a), Value::U64(b)) => Value::U64(lerp_u64(*a, *b, t)),
        (Value::I64(a), Value::I64(b)) => Value::I64(lerp_i64(*a, *b, t)),
        (Value::Vec2(a), Value::Vec2(b)) => Value::Vec2(Vec2::lerp(*a, *b, t)),
        (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(Vec3::lerp(*a, *b, t)),
        (Value::Vec4(a), Value::Vec4(b)) => Value::Vec4(Vec4::lerp(*a, *b, t)),
        (Value::Quat(a), Value::Quat(b)) => Value::Quat(a.slerp(*b, t)),
        (Value::Color(a), Value::Color(b)) => {
            Value::Color(Color::from_vec4(a.to_vec4().lerp(b.to_vec4(), t)))
        }
        // Step for everything that has no meaningful midpoint.
        _ => {
            if t < 1.0 {
                from.clone()
            } else {
                to.clone()
            }
        }
    }
}

/// Interpolates between two values of the same type.
///
/// Numbers, vectors and colours are interpolated linearly, quaternions
/// spherically; integers are truncated towards zero. Other types, and arrays
/// of different lengths, step from `from` to `to` when `t` reaches `1`.
///
/// ```rust
/// use lume_meta::{Any, interpolate};
///
/// let mid = interpolate(&Any::new(0.0_f32), &Any::new(10.0_f32), 0.25).unwrap();
/// assert_eq!(mid.get_value::<f32>(), Ok(2.5));
///
/// let (a, b) = (Any::new(String::from("a")), Any::new(String::from("b")));
/// let name = interpolate(&a, &b, 0.5).unwrap();
/// assert_eq!(name.get_value::<String>(), Ok(String::from("a")));
/// ```
pub fn interpolate(from: &Any, to: &Any, t: f32) -> Result<Any, MetaError> {
    if from.type_id() != to.type_id() {
        return Err(MetaError::mismatch(from.type_id(), to.type_id()));
    }
    if let (Some(a), Some(b)) = (from.value(), to.value()) {
        return Ok(Any::from_value(interpolate_value(a, b, t)));
    }
    let (Some(a), Some(b)) = (from.values(), to.values()) else {
        return Err(MetaError::NotAnArray(from.type_id()));
    };
    if a.len() != b.len() {
        return Ok(if t < 1.0 { from.clone() } else { to.clone() });
    }
    let values: Vec<Value> = a
        .iter()
        .zip(b)
        .map(|(a, b)| interpolate_value(a, b, t))
        .collect();
    let mut result = from.clone();
    result.replace_values(values)?;
    Ok(result)
}

/// Playback state of a [`PropertyAnimation`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
    /// Not started, or stopped.
    #[default]
    Stopped,
    /// Advancing with [`PropertyAnimation::step`].
    Running,
    /// Holding the current value.
    Paused,
    /// Reached the end; the final value has been committed.
    Finished,
}

/// Animates one property towards a target value.
///
/// # Example
///
/// ```rust
/// use lume_meta::{Any, AnimationState, Property, PropertyAnimation};
///
/// let opacity = Property::new("Opacity", 0.0_f32);
/// let mut fade = PropertyAnimation::new(&opacity, Any::new(1.0_f32), 2.0).unwrap();
///
/// fade.start().unwrap();
/// fade.step(1.0);
/// assert_eq!(opacity.get_value::<f32>(), Ok(0.5));
///
/// assert_eq!(fade.step(1.0), AnimationState::Finished);
/// assert_eq!(opacity.get_value::<f32>(), Ok(1.0));
/// assert_eq!(opacity.stack_depth(), 1);
/// ```
#[derive(Debug)]
pub struct PropertyAnimation {
    property: WeakProperty,
    from: Option<Any>,
    to: Any,
    start_value: Option<Any>,
    duration: f32,
    elapsed: f32,
    easing: Easing,
    state: AnimationState,
    provider: Option<Rc<StaticValue>>,
}

impl PropertyAnimation {
    /// Creates an animation of `property` towards `to` over `duration`
    /// seconds, starting from the property's value at [`start`](Self::start).
    pub fn new(property: &Property, to: Any, duration: f32) -> Result<Self, MetaError> {
        if to.type_id() != property.type_id() {
            return Err(MetaError::mismatch(property.type_id(), to.type_id()));
        }
        Ok(Self {
            property: property.downgrade(),
            from: None,
            to,
            start_value: None,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::Linear,
            state: AnimationState::Stopped,
            provider: None,
        })
    }

    /// Starts from `from` instead of the property's current value.
    pub fn with_from(mut self, from: Any) -> Result<Self, MetaError> {
        if from.type_id() != self.to.type_id() {
            return Err(MetaError::mismatch(self.to.type_id(), from.type_id()));
        }
        self.from = Some(from);
        Ok(self)
    }

    /// Sets the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Returns the playback state.
    #[must_use]
    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Returns the linear progress in `0..=1`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Returns the duration in seconds.
    #[must_use]
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Starts, or restarts, the animation from the beginning.
    pub fn start(&mut self) -> Result<(), MetaError> {
        let property = self.property.upgrade().ok_or(MetaError::InvalidHandle)?;
        self.detach(&property);
        let start = self.from.clone().unwrap_or_else(|| property.get_value_any());
        let provider = Rc::new(StaticValue::new(start.clone()));
        property.push_value(provider.clone())?;
        self.provider = Some(provider);
        self.start_value = Some(start);
        self.elapsed = 0.0;
        self.state = AnimationState::Running;
        log::debug!("animation of '{}' started", property.name());
        Ok(())
    }

    /// Pauses a running animation. Returns `true` if it was running.
    pub fn pause(&mut self) -> bool {
        if self.state != AnimationState::Running {
            return false;
        }
        self.state = AnimationState::Paused;
        true
    }

    /// Resumes a paused animation. Returns `true` if it was paused.
    pub fn resume(&mut self) -> bool {
        if self.state != AnimationState::Paused {
            return false;
        }
        self.state = AnimationState::Running;
        true
    }

    /// Stops the animation and removes its override; the property reverts to
    /// the value below it.
    pub fn stop(&mut self) {
        if let Some(property) = self.property.upgrade() {
            self.detach(&property);
        }
        self.provider = None;
        self.elapsed = 0.0;
        self.state = AnimationState::Stopped;
    }

    /// Jumps to `progress` in `0..=1`.
    ///
    /// Running animations that reach the end finish.
    pub fn seek(&mut self, progress: f32) {
        self.elapsed = progress.clamp(0.0, 1.0) * self.duration;
        self.apply();
    }

    /// Advances a running animation by `dt` seconds and returns the new state.
    pub fn step(&mut self, dt: f32) -> AnimationState {
        if self.state == AnimationState::Running {
            self.elapsed += dt.max(0.0);
            self.apply();
        }
        self.state
    }

    fn apply(&mut self) {
        if self.provider.is_none() {
            return;
        }
        let Some(property) = self.property.upgrade() else {
            log::warn!("animated property is gone");
            self.provider = None;
            self.state = AnimationState::Stopped;
            return;
        };
        let t = self.easing.apply(self.progress());
        if let (Some(provider), Some(start)) = (&self.provider, &self.start_value) {
            match interpolate(start, &self.to, t) {
                Ok(value) => {
                    if let Err(err) = provider.set_value(&value) {
                        log::warn!("animation of '{}': {err}", property.name());
                    }
                    property.notify_if_changed();
                }
                Err(err) => log::warn!("animation of '{}': {err}", property.name()),
            }
        }
        if self.state == AnimationState::Running && self.elapsed >= self.duration {
            self.finish(&property);
        }
    }

    fn finish(&mut self, property: &Property) {
        if let Some(provider) = self.provider.take() {
            let provider: Rc<dyn ValueProvider> = provider;
            if let Err(err) = property.remove_value_and_set(&provider, &self.to) {
                log::warn!("committing animation of '{}': {err}", property.name());
            }
        }
        self.state = AnimationState::Finished;
        log::debug!("animation of '{}' finished", property.name());
    }

    fn detach(&self, property: &Property) {
        if let Some(provider) = &self.provider {
            let provider: Rc<dyn ValueProvider> = provider.clone();
            property.remove_value(&provider);
        }
    }
}

impl Drop for PropertyAnimation {
    fn drop(&mut self) {
        if matches!(
            self.state,
            AnimationState::Running | AnimationState::Paused
        ) {
            self.stop();
        }
    }
}
