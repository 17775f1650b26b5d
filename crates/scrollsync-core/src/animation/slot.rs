#![forbid(unsafe_code)]

//! Single-occupancy animation handle.
//!
//! [`AnimationSlot`] owns the one live animation of a component. Starting a
//! new animation always cancels the current one first, so two animations
//! can never drive the same property at once.

use std::time::Duration;

use super::Animation;

/// Result of advancing a slot by one frame.
#[derive(Debug)]
pub enum SlotTick<A> {
    /// Nothing was live.
    Idle,
    /// Still playing.
    Running,
    /// Completed on this tick; the slot is empty again.
    Finished(A),
}

/// Owned, replaceable handle to at most one live animation.
#[derive(Debug)]
pub struct AnimationSlot<A> {
    live: Option<A>,
    cancellations: u64,
}

impl<A> Default for AnimationSlot<A> {
    fn default() -> Self {
        Self {
            live: None,
            cancellations: 0,
        }
    }
}

impl<A: Animation> AnimationSlot<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is live, then install `animation`.
    ///
    /// Returns `true` if a live animation was cancelled.
    pub fn start(&mut self, animation: A) -> bool {
        let cancelled = self.cancel().is_some();
        self.live = Some(animation);
        cancelled
    }

    /// Stop the live animation where it stands and hand it back.
    pub fn cancel(&mut self) -> Option<A> {
        let taken = self.live.take();
        if taken.is_some() {
            self.cancellations += 1;
        }
        taken
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn get(&self) -> Option<&A> {
        self.live.as_ref()
    }

    /// Total number of animations cancelled over the slot's lifetime.
    pub const fn cancellations(&self) -> u64 {
        self.cancellations
    }

    /// Advance the live animation; completed animations leave the slot.
    pub fn tick(&mut self, dt: Duration) -> SlotTick<A> {
        let Some(anim) = self.live.as_mut() else {
            return SlotTick::Idle;
        };
        anim.tick(dt);
        if !anim.is_complete() {
            return SlotTick::Running;
        }
        match self.live.take() {
            Some(done) => SlotTick::Finished(done),
            None => SlotTick::Idle,
        }
    }
}
