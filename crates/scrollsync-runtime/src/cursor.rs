#![forbid(unsafe_code)]

//! Custom cursor: a dot pinned to the pointer and a ring that eases after it.

use scrollsync_core::animation::Lerp;
use scrollsync_core::{DomRead, NodeId, Selector, WriteBatch};

use crate::config::CursorConfig;

pub const CURSOR_DOT: Selector<'static> = Selector::Class("cursor");
pub const CURSOR_RING: Selector<'static> = Selector::Class("cursor-follower");
/// Hovering anything inside one of these grows the cursor.
pub const INTERACTIVE: Selector<'static> = Selector::Any(&[
    Selector::Tag("a"),
    Selector::Tag("button"),
    Selector::Attr("data-overlay-open"),
    Selector::Attr("data-overlay-close"),
    Selector::Tag("input"),
    Selector::Tag("textarea"),
]);
pub const DOT_ACTIVE_CLASS: &str = "cursor--active";
pub const RING_ACTIVE_CLASS: &str = "cursor-follower--active";

/// Below this distance in px the ring snaps onto the pointer and stops.
const SETTLE_EPSILON: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct CursorFollower {
    dot: NodeId,
    ring: NodeId,
    follow: f64,
    pointer: (f64, f64),
    ring_at: (f64, f64),
    settled: bool,
}

impl CursorFollower {
    /// `None` unless both the dot and the ring exist.
    pub fn mount(dom: &impl DomRead, cfg: &CursorConfig) -> Option<Self> {
        Some(Self {
            dot: dom.first(&CURSOR_DOT)?,
            ring: dom.first(&CURSOR_RING)?,
            follow: cfg.follow,
            pointer: (0.0, 0.0),
            ring_at: (0.0, 0.0),
            settled: true,
        })
    }

    pub const fn ring_position(&self) -> (f64, f64) {
        self.ring_at
    }

    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// The dot follows the pointer at once.
    pub fn pointer_move(&mut self, x: f64, y: f64, batch: &mut WriteBatch) {
        self.pointer = (x, y);
        self.settled = false;
        batch.set_style(self.dot, "left", format!("{x}px"));
        batch.set_style(self.dot, "top", format!("{y}px"));
    }

    /// One frame of ring easing. Returns `true` while still moving.
    pub fn tick(&mut self, batch: &mut WriteBatch) -> bool {
        if self.settled {
            return false;
        }
        let (px, py) = self.pointer;
        let (rx, ry) = self.ring_at;
        let next = (rx.lerp(&px, self.follow), ry.lerp(&py, self.follow));
        if (px - next.0).abs() < SETTLE_EPSILON && (py - next.1).abs() < SETTLE_EPSILON {
            self.ring_at = self.pointer;
            self.settled = true;
        } else {
            self.ring_at = next;
        }
        batch.set_style(self.ring, "left", format!("{}px", self.ring_at.0));
        batch.set_style(self.ring, "top", format!("{}px", self.ring_at.1));
        !self.settled
    }

    /// Pointer entered `target`.
    pub fn pointer_over(&self, dom: &impl DomRead, target: NodeId, batch: &mut WriteBatch) {
        if dom.closest(target, &INTERACTIVE).is_some() {
            batch.add_class(self.dot, DOT_ACTIVE_CLASS);
            batch.add_class(self.ring, RING_ACTIVE_CLASS);
        }
    }

    /// Pointer left `target`.
    pub fn pointer_out(&self, dom: &impl DomRead, target: NodeId, batch: &mut WriteBatch) {
        if dom.closest(target, &INTERACTIVE).is_some() {
            batch.remove_class(self.dot, DOT_ACTIVE_CLASS);
            batch.remove_class(self.ring, RING_ACTIVE_CLASS);
        }
    }
}
