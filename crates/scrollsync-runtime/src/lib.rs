#![forbid(unsafe_code)]

//! Runtime: the scroll-driven components and their orchestrator.
//!
//! # Role in scrollsync
//! `scrollsync-runtime` turns layout reads into style writes. Each component
//! owns its state and a frame coalescer; [`ScrollSync`] wires them together
//! and is what a host drives.
//!
//! # Components
//! - [`theme_sync::ThemeSync`]: page background, tint variables, nav state,
//!   parallax.
//! - [`nav_indicator::NavIndicator`]: the elastic indicator under the active
//!   link.
//! - [`horizontal::HorizontalScrollDriver`]: the pinned horizontal section.
//! - [`reveal::RevealLatch`]: one-way reveal on first sight.
//! - [`cursor::CursorFollower`]: custom cursor dot and ring.
//!
//! # Example
//!
//! ```
//! use scrollsync_core::page::{ElementSpec, Page};
//! use scrollsync_core::{DomRead, DomWrite, Rect, Viewport};
//! use scrollsync_runtime::{HostEvent, ScrollSync, SyncConfig};
//! use std::time::Duration;
//!
//! let mut page = Page::new(Viewport::new(1280.0, 1000.0));
//! for (i, bg) in ["rgb(255, 255, 255)", "rgb(0, 0, 0)"].into_iter().enumerate() {
//!     page.append_to_body(
//!         ElementSpec::new("section")
//!             .background(bg)
//!             .rect(Rect::new(0.0, i as f64 * 1000.0, 1280.0, 1000.0)),
//!     );
//! }
//!
//! let (mut sync, first_paint) = ScrollSync::init(&page, &SyncConfig::default());
//! page.commit(first_paint).unwrap();
//!
//! page.scroll_to(800.0);
//! if sync.handle(&page, HostEvent::WindowScroll).request_frame {
//!     let writes = sync.frame(&page, Duration::from_millis(16));
//!     page.commit(writes).unwrap();
//! }
//! assert_eq!(page.style(page.root(), "--comp-a"), Some("0.26"));
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod horizontal;
pub mod nav_indicator;
pub mod reveal;
pub mod sync;
pub mod theme_sync;

pub use config::SyncConfig;
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use error::SyncError;
pub use sync::{EventOutcome, HostEvent, ScrollSync};
