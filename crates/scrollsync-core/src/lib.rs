#![forbid(unsafe_code)]

//! Core: geometry, the DOM seam, section location, animation, and frame
//! coalescing.
//!
//! # Role in scrollsync
//! `scrollsync-core` is the host-independent foundation. Everything that
//! touches a document goes through [`dom::DomRead`] (read phase) and
//! [`dom::WriteBatch`] / [`dom::DomWrite`] (write phase), so the runtime can
//! be driven by a browser, by JSON snapshots, or by the in-memory
//! [`page::Page`] used in tests.
//!
//! # Primary responsibilities
//! - **Geometry**: [`geometry::Rect`], [`geometry::Viewport`], [`geometry::Insets`].
//! - **DOM seam**: node ids, selectors, read trait, mutation batches.
//! - **Section location**: the trigger-line rule for the active section.
//! - **Animation**: keyframes with per-segment easing and a cancelable slot.
//! - **Coalescing**: at most one update per rendered frame.

pub mod animation;
pub mod dom;
pub mod frame_coalescer;
pub mod geometry;
pub mod page;
pub mod section;
pub mod selection;

pub use dom::{DomError, DomMutation, DomRead, DomWrite, NodeId, Selector, WriteBatch};
pub use geometry::{Insets, Rect, Viewport};
