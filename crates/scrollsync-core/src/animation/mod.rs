#![forbid(unsafe_code)]

//! Time-driven animation primitives.
//!
//! Animations are advanced explicitly with [`Animation::tick`]; the host
//! supplies frame deltas, so playback is deterministic under test.
//!
//! - [`Keyframes`]: multi-stop interpolation with per-segment easing.
//! - [`AnimationSlot`]: an owned handle that holds at most one live
//!   animation and cancels it before accepting another.

mod keyframes;
mod slot;

pub use keyframes::{Keyframe, Keyframes};
pub use slot::{AnimationSlot, SlotTick};

use std::time::Duration;

/// A time-driven animation.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether playback has reached the end.
    fn is_complete(&self) -> bool;

    /// Rewind to the start.
    fn reset(&mut self);
}

/// Maps linear progress `t ∈ [0, 1]` to eased progress.
pub type EasingFn = fn(f64) -> f64;

/// Values that can be interpolated.
pub trait Lerp {
    /// `self` at `t = 0`, `other` at `t = 1`.
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Cubic ease-in.
pub fn ease_in(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Cubic ease-out.
pub fn ease_out(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Cubic ease-in-out.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Fast start, slow middle, fast finish: ease-out into the midpoint, then
/// ease-in out of it.
pub fn ease_out_in(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        ease_out(t * 2.0) / 2.0
    } else {
        0.5 + ease_in(t * 2.0 - 1.0) / 2.0
    }
}
