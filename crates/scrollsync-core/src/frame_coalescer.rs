#![forbid(unsafe_code)]

//! Frame coalescing for high-frequency scroll and resize events.
//!
//! Browsers can fire dozens of scroll events between two repaints. Running
//! a full layout read and style write for each one wastes work and causes
//! layout thrashing. [`FrameCoalescer`] collapses a burst into one update:
//!
//! - The first event of a frame asks the host for a frame callback.
//! - Further events in the same frame only bump a counter.
//! - The frame callback calls [`FrameCoalescer::begin_frame`], which clears
//!   the pending flag *before* the update runs, so events fired during the
//!   update schedule the next frame.
//!
//! # Usage
//!
//! ```
//! use scrollsync_core::frame_coalescer::{FrameCoalescer, FrameRequest};
//!
//! let mut frames = FrameCoalescer::new();
//! assert_eq!(frames.schedule(), FrameRequest::Request);
//! for _ in 0..49 {
//!     assert_eq!(frames.schedule(), FrameRequest::AlreadyScheduled);
//! }
//!
//! let frame = frames.begin_frame().expect("one frame pending");
//! assert_eq!(frame.events, 50);
//! assert!(frames.begin_frame().is_none());
//! ```
//!
//! A queued frame cannot be cancelled; it runs once the host calls back.

/// What the caller must do after [`FrameCoalescer::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// No frame was pending: ask the host for one.
    Request,
    /// A frame is already queued; nothing to do.
    AlreadyScheduled,
}

impl FrameRequest {
    /// Whether the host must be asked for a frame.
    #[must_use]
    pub const fn needs_frame(self) -> bool {
        matches!(self, Self::Request)
    }
}

/// Summary of the burst collapsed into one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescedFrame {
    /// Events that arrived since the previous frame.
    pub events: u32,
}

/// Pending-flag scheduler: at most one update per rendered frame.
///
/// Not thread-safe; owned by one component on the UI thread.
#[derive(Debug, Clone, Default)]
pub struct FrameCoalescer {
    scheduled: bool,
    pending_events: u32,
    frames_run: u64,
    events_coalesced: u64,
}

impl FrameCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn schedule(&mut self) -> FrameRequest {
        self.pending_events = self.pending_events.saturating_add(1);
        if self.scheduled {
            self.events_coalesced += 1;
            FrameRequest::AlreadyScheduled
        } else {
            self.scheduled = true;
            FrameRequest::Request
        }
    }

    /// Start a frame. Returns the burst if an update was scheduled.
    pub fn begin_frame(&mut self) -> Option<CoalescedFrame> {
        if !self.scheduled {
            return None;
        }
        self.scheduled = false;
        self.frames_run += 1;
        let events = std::mem::take(&mut self.pending_events);
        Some(CoalescedFrame { events })
    }

    /// Whether an update is queued.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Updates executed so far.
    #[must_use]
    pub const fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// Events absorbed into an already-queued frame so far.
    #[must_use]
    pub const fn events_coalesced(&self) -> u64 {
        self.events_coalesced
    }
}
