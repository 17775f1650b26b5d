#![forbid(unsafe_code)]

//! Top-level orchestrator.
//!
//! [`ScrollSync`] owns every component, turns host events into pending work
//! or immediate writes, and runs one frame on request. The host commits each
//! returned [`WriteBatch`] before the next read.
//!
//! # Frame order
//!
//! 1. Advance running animations (indicator, cursor ring).
//! 2. Theme update, if scheduled.
//! 3. Horizontal update, if scheduled. A changed section color schedules
//!    the theme for the following frame, once the new override is
//!    committed.

use std::time::Duration;

use scrollsync_core::dom::IntersectionEntry;
use scrollsync_core::{DomRead, NodeId, WriteBatch};

use crate::config::SyncConfig;
use crate::cursor::CursorFollower;
use crate::error::SyncError;
use crate::horizontal::HorizontalScrollDriver;
use crate::reveal::{RevealLatch, reveal_all};
use crate::theme_sync::ThemeSync;

/// Input pushed by the host.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum HostEvent {
    /// The window scrolled vertically.
    WindowScroll,
    /// The horizontal-scroll container scrolled natively.
    ContainerScroll,
    /// The viewport changed size.
    Resize,
    /// A navigation link was clicked.
    LinkClick { node: NodeId },
    /// Pointer position in client coordinates.
    PointerMove { x: f64, y: f64 },
    PointerOver { node: NodeId },
    PointerOut { node: NodeId },
    /// Visibility-observer callback.
    Intersections { entries: Vec<IntersectionEntry> },
}

/// What handling one event produced.
#[derive(Debug, Default)]
pub struct EventOutcome {
    /// Writes to commit right away.
    pub batch: WriteBatch,
    /// Work is pending for the next frame.
    pub request_frame: bool,
}

/// Every scroll-driven component of one page.
#[derive(Debug)]
pub struct ScrollSync {
    theme: Option<ThemeSync>,
    horizontal: Option<HorizontalScrollDriver>,
    reveal: Option<RevealLatch>,
    cursor: Option<CursorFollower>,
    failed_open: bool,
}

impl ScrollSync {
    /// Mount and run the first paint, propagating setup errors.
    pub fn boot(dom: &impl DomRead, cfg: &SyncConfig) -> Result<(Self, WriteBatch), SyncError> {
        let problems = cfg.validate();
        if !problems.is_empty() {
            return Err(SyncError::InvalidConfig(problems.join("; ")));
        }
        let _span = tracing::debug_span!(target: "scrollsync", "scrollsync.init").entered();

        let mut theme = ThemeSync::mount(dom, cfg);
        let mut batch = theme.init(dom);
        let reveal = RevealLatch::mount(dom, &cfg.reveal);

        let horizontal = match HorizontalScrollDriver::mount(dom, &cfg.horizontal) {
            Ok(mut driver) => {
                let frame = driver.init(dom);
                if frame.color_changed {
                    theme.request_update();
                }
                batch.append(frame.batch);
                Some(driver)
            }
            Err(err) => {
                tracing::debug!(target: "scrollsync.hscroll", %err, "horizontal section disabled");
                None
            }
        };

        let cursor = CursorFollower::mount(dom, &cfg.cursor);
        if cursor.is_none() {
            tracing::debug!(target: "scrollsync", "custom cursor disabled");
        }

        Ok((
            Self {
                theme: Some(theme),
                horizontal,
                reveal,
                cursor,
                failed_open: false,
            },
            batch,
        ))
    }

    /// [`Self::boot`], failing open: if setup fails, every reveal target is
    /// made visible and the returned instance does nothing.
    pub fn init(dom: &impl DomRead, cfg: &SyncConfig) -> (Self, WriteBatch) {
        match Self::boot(dom, cfg) {
            Ok(booted) => booted,
            Err(err) => Self::fail_open(dom, &err),
        }
    }

    /// An inert instance plus the batch that reveals every target, for
    /// setup that failed with `err` before or during [`Self::boot`].
    pub fn fail_open(dom: &impl DomRead, err: &SyncError) -> (Self, WriteBatch) {
        tracing::error!(target: "scrollsync", %err, "setup failed, revealing all content");
        let inert = Self {
            theme: None,
            horizontal: None,
            reveal: None,
            cursor: None,
            failed_open: true,
        };
        (inert, reveal_all(dom))
    }

    /// Route one host event.
    pub fn handle(&mut self, dom: &impl DomRead, event: HostEvent) -> EventOutcome {
        let mut batch = WriteBatch::new();
        match event {
            HostEvent::WindowScroll => {
                if let Some(theme) = self.theme.as_mut() {
                    theme.on_scroll();
                }
                if let Some(driver) = self.horizontal.as_mut() {
                    driver.on_window_scroll();
                }
            }
            HostEvent::ContainerScroll => {
                if let Some(driver) = self.horizontal.as_mut() {
                    driver.on_container_scroll();
                }
            }
            HostEvent::Resize => {
                if let Some(theme) = self.theme.as_mut() {
                    batch = theme.on_resize(dom);
                }
            }
            HostEvent::LinkClick { node } => {
                if let Some(theme) = self.theme.as_mut() {
                    batch = theme.on_link_click(dom, node);
                }
            }
            HostEvent::PointerMove { x, y } => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.pointer_move(x, y, &mut batch);
                }
            }
            HostEvent::PointerOver { node } => {
                if let Some(cursor) = self.cursor.as_ref() {
                    cursor.pointer_over(dom, node, &mut batch);
                }
            }
            HostEvent::PointerOut { node } => {
                if let Some(cursor) = self.cursor.as_ref() {
                    cursor.pointer_out(dom, node, &mut batch);
                }
            }
            HostEvent::Intersections { entries } => {
                if let Some(reveal) = self.reveal.as_mut() {
                    reveal.observe(&entries, &mut batch);
                }
            }
        }
        EventOutcome {
            batch,
            request_frame: self.wants_frame(),
        }
    }

    /// Run one frame. `dt` is the time since the previous frame.
    pub fn frame(&mut self, dom: &impl DomRead, dt: Duration) -> WriteBatch {
        let _span = tracing::debug_span!(target: "scrollsync", "scrollsync.frame", dt_ms = dt.as_millis() as u64).entered();
        let mut batch = WriteBatch::new();

        if let Some(theme) = self.theme.as_mut() {
            theme.tick_indicator(dt, &mut batch);
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.tick(&mut batch);
        }

        if let Some(theme) = self.theme.as_mut()
            && let Some(update) = theme.run_frame(dom)
        {
            batch.append(update);
        }

        if let Some(driver) = self.horizontal.as_mut()
            && let Some(frame) = driver.run_frame(dom)
        {
            batch.append(frame.batch);
            if frame.color_changed
                && let Some(theme) = self.theme.as_mut()
            {
                theme.request_update();
            }
        }
        batch
    }

    /// Whether the host should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        self.theme.as_ref().is_some_and(ThemeSync::wants_frame)
            || self
                .horizontal
                .as_ref()
                .is_some_and(HorizontalScrollDriver::wants_frame)
            || self.cursor.as_ref().is_some_and(|c| !c.is_settled())
    }

    /// Setup failed and content was revealed unconditionally.
    pub const fn failed_open(&self) -> bool {
        self.failed_open
    }

    pub fn theme(&self) -> Option<&ThemeSync> {
        self.theme.as_ref()
    }

    pub fn horizontal(&self) -> Option<&HorizontalScrollDriver> {
        self.horizontal.as_ref()
    }

    /// Reveal targets for the host's visibility observer.
    pub fn reveal(&self) -> Option<&RevealLatch> {
        self.reveal.as_ref()
    }

    pub fn cursor(&self) -> Option<&CursorFollower> {
        self.cursor.as_ref()
    }
}
