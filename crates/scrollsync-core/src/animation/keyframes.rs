#![forbid(unsafe_code)]

//! Keyframe interpolation.
//!
//! # Invariants
//!
//! 1. Offsets are clamped to `[0, 1]` and kept sorted.
//! 2. The easing stored on a keyframe shapes the segment that *starts* at
//!    that keyframe; the last keyframe's easing is unused.
//! 3. Before the first offset the first value is held; after the last
//!    offset the last value is held.
//! 4. A zero duration is clamped to 1ns.

use std::time::Duration;

use super::{Animation, EasingFn, Lerp, linear};

/// One stop.
#[derive(Debug, Clone, Copy)]
pub struct Keyframe<T> {
    /// Fraction of the total duration.
    pub offset: f64,
    pub value: T,
    /// Easing for the segment leaving this stop.
    pub easing: EasingFn,
}

/// Multi-stop animation over a fixed duration.
#[derive(Debug, Clone)]
pub struct Keyframes<T> {
    frames: Vec<Keyframe<T>>,
    duration: Duration,
    elapsed: Duration,
}

impl<T: Lerp + Clone> Keyframes<T> {
    /// Start with a single stop at offset 0.
    #[must_use]
    pub fn new(start: T, duration: Duration) -> Self {
        Self {
            frames: vec![Keyframe {
                offset: 0.0,
                value: start,
                easing: linear,
            }],
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            elapsed: Duration::ZERO,
        }
    }

    /// Set the easing of the most recently added stop.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        if let Some(last) = self.frames.last_mut() {
            last.easing = easing;
        }
        self
    }

    /// Add a stop at `offset`.
    #[must_use]
    pub fn then(mut self, offset: f64, value: T) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let at = self.frames.partition_point(|f| f.offset <= offset);
        self.frames.insert(
            at,
            Keyframe {
                offset,
                value,
                easing: linear,
            },
        );
        self
    }

    /// Stops in offset order.
    pub fn frames(&self) -> &[Keyframe<T>] {
        &self.frames
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }

    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Value at the current time.
    pub fn sample(&self) -> T {
        self.sample_at(self.progress())
    }

    /// Value at linear progress `p`.
    pub fn sample_at(&self, p: f64) -> T {
        let p = p.clamp(0.0, 1.0);
        let first = &self.frames[0];
        if p <= first.offset {
            return first.value.clone();
        }
        for pair in self.frames.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if p <= to.offset {
                let span = to.offset - from.offset;
                let local = if span <= f64::EPSILON {
                    1.0
                } else {
                    (p - from.offset) / span
                };
                return from.value.lerp(&to.value, (from.easing)(local));
            }
        }
        self.frames[self.frames.len() - 1].value.clone()
    }
}

impl<T: Lerp + Clone> Animation for Keyframes<T> {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
