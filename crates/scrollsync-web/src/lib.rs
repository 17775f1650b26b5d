#![forbid(unsafe_code)]

//! `scrollsync-web` drives the scroll-sync runtime from a browser host.
//!
//! Design goals:
//! - **Host-driven I/O**: JavaScript pushes events and layout; it schedules
//!   `requestAnimationFrame` only when [`WebHost`] asks for one.
//! - **Deterministic time**: the host passes frame timestamps explicitly.
//! - **Mirror document**: the runtime reads from an in-memory [`Page`] that
//!   the host keeps in step with the real layout, and every committed batch
//!   is queued for the host to replay against the live DOM.
//!
//! With the `input-parser` feature, [`snapshot`] converts between JSON and
//! the runtime's page, event, and mutation types. On `wasm32` the same
//! feature exposes `ScrollSyncRunner` through `wasm-bindgen`.

#[cfg(feature = "input-parser")]
pub mod snapshot;

#[cfg(all(target_arch = "wasm32", feature = "input-parser"))]
mod wasm;

#[cfg(all(target_arch = "wasm32", feature = "input-parser"))]
pub use wasm::ScrollSyncRunner;

use core::time::Duration;

use scrollsync_core::page::Page;
use scrollsync_core::{DomError, DomWrite, WriteBatch};
use scrollsync_runtime::{HostEvent, ScrollSync, SyncConfig, SyncError};

/// Web host error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebHostError {
    /// The mirror page rejected a batch.
    #[error("commit failed: {0}")]
    Dom(#[from] DomError),
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Earlier timestamps are ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

/// Captured outputs for host consumption and test inspection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WebOutputs {
    /// Last non-empty batch committed to the mirror page.
    pub last_batch: WriteBatch,
    /// Everything committed since the host last called [`WebHost::take_writes`].
    pub pending_writes: WriteBatch,
    /// Mutations applied over the host's lifetime.
    pub mutations_committed: u64,
    /// Non-empty batches committed over the host's lifetime.
    pub commits: u64,
    /// Frames run.
    pub frames: u64,
    /// Events pushed.
    pub events: u64,
}

/// Runs [`ScrollSync`] against a mirror [`Page`].
#[derive(Debug)]
pub struct WebHost {
    page: Page,
    sync: ScrollSync,
    clock: DeterministicClock,
    last_frame: Option<Duration>,
    frame_requested: bool,
    outputs: WebOutputs,
}

impl WebHost {
    /// Mount every component on `page` and commit the first paint.
    ///
    /// Setup faults do not fail construction: the runtime fails open and
    /// the host still receives the reveal-all batch.
    pub fn new(page: Page, cfg: &SyncConfig) -> Result<Self, WebHostError> {
        let (sync, first) = ScrollSync::init(&page, cfg);
        let mut host = Self::with_sync(page, sync);
        if let Err(WebHostError::Dom(err)) = host.commit(first) {
            let (inert, reveal) = ScrollSync::fail_open(&host.page, &SyncError::Dom(err));
            host.sync = inert;
            host.commit(reveal)?;
        }
        host.observe_reveals()?;
        host.frame_requested = host.sync.wants_frame();
        Ok(host)
    }

    /// Boot inert after a setup failure the runtime never saw, such as a
    /// configuration the host could not decode. Only the reveal-all batch
    /// is committed.
    pub fn fail_open(page: Page, err: &SyncError) -> Result<Self, WebHostError> {
        let (inert, reveal) = ScrollSync::fail_open(&page, err);
        let mut host = Self::with_sync(page, inert);
        host.commit(reveal)?;
        Ok(host)
    }

    /// Boot from host JSON. A page that does not decode is an error; a
    /// configuration that does not decode fails open.
    #[cfg(feature = "input-parser")]
    pub fn from_json(
        page_json: &str,
        config_json: Option<&str>,
    ) -> Result<Self, snapshot::SnapshotError> {
        let page = snapshot::PageSnapshot::from_json(page_json)?.into_page()?;
        let cfg = match config_json.map(str::trim) {
            Some(json) if !json.is_empty() => SyncConfig::from_json_str(json)
                .map_err(|err| SyncError::InvalidConfig(err.to_string())),
            _ => Ok(SyncConfig::default()),
        };
        let host = match cfg {
            Ok(cfg) => Self::new(page, &cfg)?,
            Err(err) => Self::fail_open(page, &err)?,
        };
        Ok(host)
    }

    fn with_sync(page: Page, sync: ScrollSync) -> Self {
        Self {
            page,
            sync,
            clock: DeterministicClock::new(),
            last_frame: None,
            frame_requested: false,
            outputs: WebOutputs::default(),
        }
    }

    /// Handle one event. Immediate writes are committed before returning.
    ///
    /// Returns `true` when the host must schedule a frame: work is pending
    /// and no frame was already requested.
    pub fn push_event(&mut self, event: HostEvent) -> Result<bool, WebHostError> {
        self.outputs.events += 1;
        let outcome = self.sync.handle(&self.page, event);
        self.commit(outcome.batch)?;
        let schedule = outcome.request_frame && !self.frame_requested;
        self.frame_requested |= outcome.request_frame;
        Ok(schedule)
    }

    /// Run one frame at host time `now`.
    ///
    /// Returns whether another frame is wanted. The first frame after an
    /// idle period runs with a zero delta so animations start from their
    /// first keyframe.
    pub fn frame(&mut self, now: Duration) -> Result<bool, WebHostError> {
        self.clock.set(now);
        let now = self.clock.now();
        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |prev| now.saturating_sub(prev));
        self.last_frame = Some(now);
        self.frame_requested = false;
        self.outputs.frames += 1;

        let batch = self.sync.frame(&self.page, dt);
        self.commit(batch)?;
        self.observe_reveals()?;

        self.frame_requested = self.sync.wants_frame();
        if !self.frame_requested {
            self.last_frame = None;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "scrollsync.web",
            dt_ms = dt.as_millis() as u64,
            again = self.frame_requested,
            "frame"
        );
        Ok(self.frame_requested)
    }

    /// Whether a frame is outstanding.
    #[must_use]
    pub const fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Evaluate the visibility observer against the mirror layout and feed
    /// the entries back in.
    fn observe_reveals(&mut self) -> Result<(), WebHostError> {
        let entries = match self.sync.reveal() {
            Some(reveal) if reveal.pending() > 0 => self
                .page
                .intersections(reveal.targets(), reveal.root_margin()),
            _ => return Ok(()),
        };
        let outcome = self
            .sync
            .handle(&self.page, HostEvent::Intersections { entries });
        self.commit(outcome.batch)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), WebHostError> {
        if batch.is_empty() {
            return Ok(());
        }
        let applied = self.page.commit(batch.clone())?;
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "scrollsync.web", applied, "batch committed");
        self.outputs.mutations_committed += applied as u64;
        self.outputs.commits += 1;
        self.outputs.pending_writes.append(batch.clone());
        self.outputs.last_batch = batch;
        Ok(())
    }

    /// Drain the writes committed since the last call, for the host to
    /// replay against the live document.
    pub fn take_writes(&mut self) -> WriteBatch {
        std::mem::take(&mut self.outputs.pending_writes)
    }

    /// The mirror document.
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable mirror document, for feeding re-measured layout.
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    #[must_use]
    pub const fn sync(&self) -> &ScrollSync {
        &self.sync
    }

    #[must_use]
    pub const fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    #[must_use]
    pub const fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scrollsync_core::page::ElementSpec;
    use scrollsync_core::{DomRead, NodeId, Rect, Viewport};

    const FRAME_MS: u64 = 16;

    struct Fixture {
        page: Page,
        dark: NodeId,
        card: NodeId,
        links: [NodeId; 2],
    }

    fn fixture() -> Fixture {
        let mut page = Page::new(Viewport::new(1000.0, 800.0));
        page.set_body_background("rgb(255, 255, 255)");
        let nav = page.append_to_body(ElementSpec::new("nav").fixed());
        let list = page
            .append(
                nav,
                ElementSpec::new("ul")
                    .class("nav-links")
                    .rect(Rect::new(500.0, 20.0, 300.0, 40.0)),
            )
            .unwrap();
        let first = page
            .append(
                list,
                ElementSpec::new("a")
                    .attr("href", "#light")
                    .rect(Rect::new(500.0, 20.0, 100.0, 40.0)),
            )
            .unwrap();
        let second = page
            .append(
                list,
                ElementSpec::new("a")
                    .attr("href", "#dark")
                    .rect(Rect::new(650.0, 20.0, 100.0, 40.0)),
            )
            .unwrap();
        page.append(list, ElementSpec::new("span").class("nav-indicator"))
            .unwrap();
        page.append_to_body(
            ElementSpec::new("section")
                .id("light")
                .background("rgb(255, 255, 255)")
                .rect(Rect::new(0.0, 0.0, 1000.0, 800.0)),
        );
        let dark = page.append_to_body(
            ElementSpec::new("section")
                .id("dark")
                .background("rgb(0, 0, 0)")
                .rect(Rect::new(0.0, 800.0, 1000.0, 800.0)),
        );
        let card = page.append(
            dark,
            ElementSpec::new("div")
                .class("feature-card")
                .rect(Rect::new(100.0, 1000.0, 300.0, 200.0)),
        );
        Fixture {
            page,
            dark,
            card: card.unwrap(),
            links: [first, second],
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut clock = DeterministicClock::new();
        clock.set(ms(100));
        clock.set(ms(40));
        assert_eq!(clock.now(), ms(100));
        clock.advance(ms(16));
        assert_eq!(clock.now(), ms(116));
    }

    #[test]
    fn first_paint_is_committed_and_queued() {
        let Fixture { page, links, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        assert!(host.page().has_class(links[0], "active"));
        assert!(host.outputs().commits >= 1);
        let writes = host.take_writes();
        assert!(!writes.is_empty());
        assert!(host.take_writes().is_empty());
    }

    #[test]
    fn scroll_burst_requests_one_frame() {
        let Fixture { page, dark, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        host.page_mut().scroll_to(700.0);

        let requests: Vec<bool> = (0..5)
            .map(|_| host.push_event(HostEvent::WindowScroll).unwrap())
            .collect();
        assert_eq!(requests, vec![true, false, false, false, false]);
        assert!(host.frame_requested());

        let updates_before = host.sync().theme().unwrap().updates();
        host.frame(ms(FRAME_MS)).unwrap();
        assert_eq!(host.sync().theme().unwrap().updates(), updates_before + 1);
        assert_eq!(
            host.page().computed_background(host.page().body()),
            Some("rgb(0, 0, 0)".to_owned())
        );
        assert_eq!(
            host.sync().theme().unwrap().read(host.page()).active_section,
            Some(dark)
        );
        assert_eq!(host.outputs().events, 5);
    }

    #[test]
    fn reveal_targets_latch_when_scrolled_into_view() {
        let Fixture { page, card, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        assert!(!host.page().has_class(card, "visible"));

        host.page_mut().scroll_to(600.0);
        host.push_event(HostEvent::WindowScroll).unwrap();
        host.frame(ms(FRAME_MS)).unwrap();
        assert!(host.page().has_class(card, "visible"));

        host.page_mut().scroll_to(0.0);
        host.push_event(HostEvent::WindowScroll).unwrap();
        host.frame(ms(2 * FRAME_MS)).unwrap();
        assert!(host.page().has_class(card, "visible"));
    }

    #[test]
    fn link_click_animates_until_idle() {
        let Fixture { page, links, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        assert!(host.push_event(HostEvent::LinkClick { node: links[1] }).unwrap());
        assert!(host.page().has_class(links[1], "active"));
        assert!(!host.page().has_class(links[0], "active"));

        let mut now = 0;
        let mut frames = 0;
        while host.frame_requested() {
            now += FRAME_MS;
            host.frame(ms(now)).unwrap();
            frames += 1;
            assert!(frames < 100, "indicator never settled");
        }
        assert!(frames > 1);
        let indicator = host.sync().theme().unwrap().indicator().unwrap();
        assert!(!indicator.is_animating());
        assert_eq!(indicator.active_link(), Some(links[1]));
    }

    #[test]
    fn idle_gap_restarts_frame_delta() {
        let Fixture { page, links, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        host.push_event(HostEvent::WindowScroll).unwrap();
        host.frame(ms(16)).unwrap();
        assert!(!host.frame_requested());

        // Long after the page went idle, a click starts an animation; its
        // first frame must not consume the idle gap.
        host.push_event(HostEvent::LinkClick { node: links[1] })
            .unwrap();
        host.frame(ms(60_000)).unwrap();
        let indicator = host.sync().theme().unwrap().indicator().unwrap();
        assert!(indicator.is_animating());
    }

    #[test]
    fn fail_open_host_reveals_and_stays_idle() {
        let Fixture { page, card, .. } = fixture();
        let cause = SyncError::InvalidConfig("theme: invalid type".to_owned());
        let mut host = WebHost::fail_open(page, &cause).unwrap();
        assert!(host.sync().failed_open());
        assert!(host.page().has_class(card, "visible"));
        assert_eq!(host.take_writes().len(), 1);

        host.page_mut().scroll_to(600.0);
        assert!(!host.push_event(HostEvent::WindowScroll).unwrap());
        assert!(!host.frame(ms(FRAME_MS)).unwrap());
        assert!(host.take_writes().is_empty());
    }

    #[test]
    fn commit_errors_surface() {
        let Fixture { page, .. } = fixture();
        let mut host = WebHost::new(page, &SyncConfig::default()).unwrap();
        let mut bad = WriteBatch::new();
        bad.add_class(NodeId::new(999), "ghost");
        assert_eq!(
            host.commit(bad),
            Err(WebHostError::Dom(DomError::UnknownNode(NodeId::new(999))))
        );
    }
}
