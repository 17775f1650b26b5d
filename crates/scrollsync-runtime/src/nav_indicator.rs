#![forbid(unsafe_code)]

//! Floating indicator under the active navigation link.
//!
//! # State machine
//!
//! ```text
//!            set_active(immediate | first)
//!   ┌──────────────────────────────────────────┐
//!   ▼                                          │
//! Idle(at) ── set_active(link) ──▶ Animating(from, to)
//!   ▲                                   │  │
//!   └──────── animation completes ──────┘  └─ set_active: cancel, pin at
//!                                              live geometry, restart
//! ```
//!
//! # Invariants
//!
//! 1. At most one elastic transition is live; every `set_active` cancels
//!    the current one before doing anything else.
//! 2. A retarget mid-flight starts from the indicator's live geometry, not
//!    from the previous target.
//! 3. The first activation ever always snaps.

use scrollsync_core::animation::{
    Animation, AnimationSlot, Keyframes, Lerp, SlotTick, ease_out_in, linear,
};
use scrollsync_core::{DomRead, NodeId, Rect, Selector, WriteBatch};
use std::time::Duration;

use crate::config::IndicatorConfig;
use crate::error::SyncError;

/// Navigation links.
pub const NAV_LINKS: Selector<'static> = Selector::ClassDescendantTag("nav-links", "a");
/// Container the indicator is positioned in.
pub const NAV_LINK_CONTAINER: Selector<'static> = Selector::Class("nav-links");
/// The indicator element.
pub const NAV_INDICATOR: Selector<'static> = Selector::Class("nav-indicator");
/// Class carried by the active link.
pub const ACTIVE_LINK_CLASS: &str = "active";

/// Horizontal placement of the indicator inside the link container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorGeometry {
    /// Left edge relative to the container.
    pub x: f64,
    pub width: f64,
}

impl IndicatorGeometry {
    #[must_use]
    pub const fn new(x: f64, width: f64) -> Self {
        Self { x, width }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

impl Lerp for IndicatorGeometry {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: self.x.lerp(&other.x, t),
            width: self.width.lerp(&other.width, t),
        }
    }
}

/// Indicator geometry centered under `link`, `width_ratio` of its width.
#[must_use]
pub fn target_geometry(link: Rect, container: Rect, width_ratio: f64) -> IndicatorGeometry {
    let width = link.width * width_ratio;
    let x = link.left() - container.left() + (link.width - width) / 2.0;
    IndicatorGeometry { x, width }
}

/// Rubber-band move between two geometries.
///
/// Three keyframes: `from` at 0, a stretched frame at the overshoot offset,
/// `to` at 1. At the stretched frame the leading edge has already landed on
/// the target and the trailing edge is pulled back by the overshoot, so the
/// bar looks elongated along its direction of travel before it settles.
#[derive(Debug, Clone)]
pub struct ElasticTransition {
    keyframes: Keyframes<IndicatorGeometry>,
    from: IndicatorGeometry,
    to: IndicatorGeometry,
}

impl ElasticTransition {
    #[must_use]
    pub fn new(from: IndicatorGeometry, to: IndicatorGeometry, cfg: &IndicatorConfig) -> Self {
        let keyframes = Keyframes::new(from, cfg.duration())
            .easing(ease_out_in)
            .then(cfg.overshoot_offset, Self::stretched(from, to, cfg))
            .easing(linear)
            .then(1.0, to);
        Self {
            keyframes,
            from,
            to,
        }
    }

    /// The overshoot keyframe.
    #[must_use]
    pub fn stretched(
        from: IndicatorGeometry,
        to: IndicatorGeometry,
        cfg: &IndicatorConfig,
    ) -> IndicatorGeometry {
        let stretch = cfg.overshoot(to.x - from.x);
        if to.x >= from.x {
            // Moving right: the left edge trails.
            IndicatorGeometry::new(to.x - stretch, to.width + stretch)
        } else {
            // Moving left: the right edge trails.
            IndicatorGeometry::new(to.x, to.width + stretch)
        }
    }

    pub const fn origin(&self) -> IndicatorGeometry {
        self.from
    }

    pub const fn target(&self) -> IndicatorGeometry {
        self.to
    }

    /// Geometry at the current time.
    pub fn sample(&self) -> IndicatorGeometry {
        self.keyframes.sample()
    }

    pub fn keyframes(&self) -> &Keyframes<IndicatorGeometry> {
        &self.keyframes
    }
}

impl Animation for ElasticTransition {
    fn tick(&mut self, dt: Duration) {
        self.keyframes.tick(dt);
    }

    fn is_complete(&self) -> bool {
        self.keyframes.is_complete()
    }

    fn reset(&mut self) {
        self.keyframes.reset();
    }
}

/// Observable indicator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorPhase {
    Idle {
        at: IndicatorGeometry,
    },
    Animating {
        from: IndicatorGeometry,
        to: IndicatorGeometry,
    },
}

/// Owns the indicator element and its one live transition.
#[derive(Debug)]
pub struct NavIndicator {
    cfg: IndicatorConfig,
    container: NodeId,
    indicator: Option<NodeId>,
    links: Vec<NodeId>,
    active: Option<NodeId>,
    resting: Option<IndicatorGeometry>,
    slot: AnimationSlot<ElasticTransition>,
}

impl NavIndicator {
    /// Locate links, their container, and (optionally) the indicator.
    ///
    /// Without an indicator element the active-link class is still managed.
    pub fn mount(dom: &impl DomRead, cfg: &IndicatorConfig) -> Result<Self, SyncError> {
        let container = dom
            .first(&NAV_LINK_CONTAINER)
            .ok_or(SyncError::MissingElement(".nav-links"))?;
        let links = dom.query(&NAV_LINKS);
        if links.is_empty() {
            return Err(SyncError::MissingElement(".nav-links a"));
        }
        Ok(Self {
            cfg: cfg.clone(),
            container,
            indicator: dom.first(&NAV_INDICATOR),
            links,
            active: None,
            resting: None,
            slot: AnimationSlot::new(),
        })
    }

    pub fn links(&self) -> &[NodeId] {
        &self.links
    }

    pub const fn active_link(&self) -> Option<NodeId> {
        self.active
    }

    /// Read phase: where the indicator belongs under `link`.
    pub fn measure(&self, dom: &impl DomRead, link: NodeId) -> Option<IndicatorGeometry> {
        let link_rect = dom.rect(link)?;
        let container_rect = dom.rect(self.container)?;
        Some(target_geometry(
            link_rect,
            container_rect,
            self.cfg.width_ratio,
        ))
    }

    /// Live geometry: mid-flight sample while animating.
    pub fn geometry(&self) -> Option<IndicatorGeometry> {
        self.slot.get().map(ElasticTransition::sample).or(self.resting)
    }

    /// `None` before the first activation.
    pub fn phase(&self) -> Option<IndicatorPhase> {
        match self.slot.get() {
            Some(anim) => Some(IndicatorPhase::Animating {
                from: anim.origin(),
                to: anim.target(),
            }),
            None => self.resting.map(|at| IndicatorPhase::Idle { at }),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.slot.is_live()
    }

    /// Transitions cancelled so far.
    pub fn cancellations(&self) -> u64 {
        self.slot.cancellations()
    }

    /// Write phase: move to `link` whose geometry was measured as `target`.
    pub fn set_active(
        &mut self,
        link: NodeId,
        target: IndicatorGeometry,
        immediate: bool,
        batch: &mut WriteBatch,
    ) {
        let first = self.resting.is_none() && !self.slot.is_live();
        let live = self.geometry();
        let cancelled = self.slot.cancel().is_some();

        if self.active != Some(link) {
            if let Some(previous) = self.active {
                batch.remove_class(previous, ACTIVE_LINK_CLASS);
            }
            batch.add_class(link, ACTIVE_LINK_CLASS);
            self.active = Some(link);
        }

        match live {
            Some(from) if !first && !immediate => {
                tracing::debug!(
                    target: "scrollsync.nav",
                    link = %link,
                    from_x = from.x,
                    to_x = target.x,
                    cancelled,
                    "indicator elastic transition"
                );
                // Pin where it stands so the restart has no visual jump.
                self.resting = Some(from);
                self.write_geometry(from, batch);
                self.slot
                    .start(ElasticTransition::new(from, target, &self.cfg));
            }
            _ => {
                tracing::debug!(
                    target: "scrollsync.nav",
                    link = %link,
                    x = target.x,
                    width = target.width,
                    cancelled,
                    "indicator snapped"
                );
                self.resting = Some(target);
                self.write_geometry(target, batch);
            }
        }
    }

    /// Measure and activate in one call, for clicks, load, and resize.
    pub fn activate(
        &mut self,
        dom: &impl DomRead,
        link: NodeId,
        immediate: bool,
    ) -> WriteBatch {
        let mut batch = WriteBatch::new();
        if let Some(target) = self.measure(dom, link) {
            self.set_active(link, target, immediate, &mut batch);
        }
        batch
    }

    /// Advance the live transition. Returns `true` while still animating.
    pub fn tick(&mut self, dt: Duration, batch: &mut WriteBatch) -> bool {
        match self.slot.tick(dt) {
            SlotTick::Idle => false,
            SlotTick::Running => {
                if let Some(now) = self.slot.get().map(ElasticTransition::sample) {
                    self.write_geometry(now, batch);
                }
                true
            }
            SlotTick::Finished(done) => {
                let at = done.target();
                self.resting = Some(at);
                self.write_geometry(at, batch);
                false
            }
        }
    }

    fn write_geometry(&self, geometry: IndicatorGeometry, batch: &mut WriteBatch) {
        let Some(indicator) = self.indicator else {
            return;
        };
        batch.set_style(indicator, "transform", format!("translateX({}px)", geometry.x));
        batch.set_style(indicator, "width", format!("{}px", geometry.width));
    }
}
