#![forbid(unsafe_code)]

//! Pinned horizontal-scroll section.
//!
//! Desktop: page scroll through the pinned section drives a translation of
//! the panel track. Touch: the container scrolls natively and only progress,
//! visibility, and color are derived. The mode is fixed when the driver is
//! mounted.
//!
//! The panel nearest the viewport center publishes its `data-bg-color` onto
//! the section, where the theme picks it up as the section's background
//! override.

use std::collections::HashSet;

use scrollsync_core::frame_coalescer::{FrameCoalescer, FrameRequest};
use scrollsync_core::section::DATA_BG_COLOR;
use scrollsync_core::{DomRead, NodeId, Selector, Viewport, WriteBatch};

use crate::config::HorizontalConfig;
use crate::error::SyncError;

pub const HS_SECTION: Selector<'static> = Selector::Class("hs-section");
pub const HS_STICKY: Selector<'static> = Selector::Class("hs-sticky");
pub const HS_TRACK: Selector<'static> = Selector::Class("hs-track");
pub const HS_PROGRESS_BAR: Selector<'static> = Selector::Class("hs-progress-bar");
pub const HS_PANEL: Selector<'static> = Selector::Class("hs-panel");
/// Class a panel gains once it enters the visibility window.
pub const PANEL_VISIBLE_CLASS: &str = "is-visible";

/// Which scroll source drives the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Window scroll, translated track.
    Desktop,
    /// Native horizontal scroll of the sticky container.
    Mobile,
}

impl ScrollMode {
    #[must_use]
    pub fn detect(viewport: Viewport, cfg: &HorizontalConfig) -> Self {
        if viewport.matches_max_width(cfg.mobile_max_width) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

/// Progress through the pinned section, `None` when it is no taller than
/// the viewport.
#[must_use]
pub fn desktop_progress(
    scroll_y: f64,
    section_top: f64,
    section_height: f64,
    viewport_height: f64,
) -> Option<f64> {
    let distance = section_height - viewport_height;
    (distance > 0.0).then(|| ((scroll_y - section_top) / distance).clamp(0.0, 1.0))
}

/// Progress of native container scroll, `None` when nothing overflows.
#[must_use]
pub fn mobile_progress(scroll_left: f64, scroll_width: f64, client_width: f64) -> Option<f64> {
    let max_scroll = scroll_width - client_width;
    (max_scroll > 0.0).then(|| (scroll_left / max_scroll).clamp(0.0, 1.0))
}

/// Measured state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalReading {
    pub progress: f64,
    /// Track translation; desktop only.
    pub translate: Option<f64>,
    /// Panels entering the visibility window for the first time.
    pub newly_visible: Vec<NodeId>,
    /// Panel whose center is nearest the viewport center.
    pub closest: Option<NodeId>,
    pub closest_color: Option<String>,
}

/// Output of one driver frame.
#[derive(Debug, Clone, Default)]
pub struct HorizontalFrame {
    pub batch: WriteBatch,
    /// The section's background override was rewritten.
    pub color_changed: bool,
}

/// Maps scroll into track translation, progress, panel visibility, and the
/// section color override.
#[derive(Debug)]
pub struct HorizontalScrollDriver {
    cfg: HorizontalConfig,
    mode: ScrollMode,
    section: NodeId,
    sticky: NodeId,
    track: NodeId,
    progress_bar: Option<NodeId>,
    panels: Vec<NodeId>,
    coalescer: FrameCoalescer,
    visible: HashSet<NodeId>,
    current_color: Option<String>,
    /// Translation most recently written; panel rects reflect it.
    last_translate: f64,
    progress: f64,
}

impl HorizontalScrollDriver {
    pub fn mount(dom: &impl DomRead, cfg: &HorizontalConfig) -> Result<Self, SyncError> {
        let section = dom
            .first(&HS_SECTION)
            .ok_or(SyncError::MissingElement(".hs-section"))?;
        let sticky = dom
            .first_in(section, &HS_STICKY)
            .ok_or(SyncError::MissingElement(".hs-sticky"))?;
        let track = dom
            .first_in(section, &HS_TRACK)
            .ok_or(SyncError::MissingElement(".hs-track"))?;
        let panels = dom.query_in(section, &HS_PANEL);
        if panels.is_empty() {
            return Err(SyncError::MissingElement(".hs-panel"));
        }
        let mode = ScrollMode::detect(dom.viewport(), cfg);
        tracing::debug!(target: "scrollsync.hscroll", ?mode, panels = panels.len(), "horizontal section mounted");
        Ok(Self {
            cfg: cfg.clone(),
            mode,
            section,
            sticky,
            track,
            progress_bar: dom.first_in(section, &HS_PROGRESS_BAR),
            panels,
            coalescer: FrameCoalescer::new(),
            visible: HashSet::new(),
            current_color: None,
            last_translate: 0.0,
            progress: 0.0,
        })
    }

    pub const fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub const fn section(&self) -> NodeId {
        self.section
    }

    pub const fn sticky(&self) -> NodeId {
        self.sticky
    }

    pub fn panels(&self) -> &[NodeId] {
        &self.panels
    }

    /// Last computed progress in `[0, 1]`.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Color most recently published on the section.
    pub fn current_color(&self) -> Option<&str> {
        self.current_color.as_deref()
    }

    /// First frame. Touch mode shows every panel up front.
    pub fn init(&mut self, dom: &impl DomRead) -> HorizontalFrame {
        let mut batch = WriteBatch::new();
        if self.mode == ScrollMode::Mobile {
            for &panel in &self.panels {
                if self.visible.insert(panel) {
                    batch.add_class(panel, PANEL_VISIBLE_CLASS);
                }
            }
        }
        let mut frame = self.update(dom);
        batch.append(frame.batch);
        frame.batch = batch;
        frame
    }

    /// Window scroll. Ignored in touch mode.
    pub fn on_window_scroll(&mut self) -> Option<FrameRequest> {
        (self.mode == ScrollMode::Desktop).then(|| self.coalescer.schedule())
    }

    /// Container scroll. Ignored in desktop mode.
    pub fn on_container_scroll(&mut self) -> Option<FrameRequest> {
        (self.mode == ScrollMode::Mobile).then(|| self.coalescer.schedule())
    }

    pub fn wants_frame(&self) -> bool {
        self.coalescer.is_scheduled()
    }

    /// Run the pending update, if any.
    pub fn run_frame(&mut self, dom: &impl DomRead) -> Option<HorizontalFrame> {
        self.coalescer.begin_frame()?;
        Some(self.update(dom))
    }

    /// Read then write.
    pub fn update(&mut self, dom: &impl DomRead) -> HorizontalFrame {
        let mut frame = HorizontalFrame::default();
        if let Some(reading) = self.read(dom) {
            frame.color_changed = self.write(&reading, &mut frame.batch);
        }
        frame
    }

    /// Read phase. `None` when there is nothing to scroll.
    pub fn read(&self, dom: &impl DomRead) -> Option<HorizontalReading> {
        let viewport = dom.viewport();
        let (progress, translate) = match self.mode {
            ScrollMode::Desktop => {
                let section = dom.scroll_metrics(self.section)?;
                let progress = desktop_progress(
                    viewport.scroll_y,
                    section.offset_top,
                    section.offset_height,
                    viewport.height,
                )?;
                let track_width = dom.scroll_metrics(self.track)?.scroll_width;
                let translate = normalize_zero(-progress * (track_width - viewport.width));
                (progress, Some(translate))
            }
            ScrollMode::Mobile => {
                let sticky = dom.scroll_metrics(self.sticky)?;
                let progress =
                    mobile_progress(sticky.scroll_left, sticky.scroll_width, sticky.client_width)?;
                (progress, None)
            }
        };

        // Rects still carry the previous translation.
        let shift = translate.map_or(0.0, |t| t - self.last_translate);
        let window_min = self.cfg.visible_min;
        let window_max = viewport.width + self.cfg.visible_extra;
        let midpoint = viewport.width / 2.0;

        let mut newly_visible = Vec::new();
        let mut closest: Option<(NodeId, f64)> = None;
        for &panel in &self.panels {
            let Some(rect) = dom.rect(panel) else {
                continue;
            };
            let center = rect.center_x() + shift;
            if in_window(center, window_min, window_max) && !self.visible.contains(&panel) {
                newly_visible.push(panel);
            }
            let distance = (center - midpoint).abs();
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((panel, distance));
            }
        }
        let closest = closest.map(|(panel, _)| panel);

        Some(HorizontalReading {
            progress,
            translate,
            newly_visible,
            closest,
            closest_color: closest
                .and_then(|panel| dom.attribute(panel, DATA_BG_COLOR))
                .filter(|c| !c.is_empty()),
        })
    }

    /// Write phase. Returns `true` when the section color changed.
    pub fn write(&mut self, reading: &HorizontalReading, batch: &mut WriteBatch) -> bool {
        self.progress = reading.progress;
        if let Some(translate) = reading.translate {
            batch.set_style(
                self.track,
                "transform",
                format!("translate3d({translate}px, 0, 0)"),
            );
            self.last_translate = translate;
        }
        if let Some(bar) = self.progress_bar {
            let percent = reading.progress * 100.0;
            batch.set_style(bar, "width", format!("{percent}%"));
        }
        for &panel in &reading.newly_visible {
            if self.visible.insert(panel) {
                batch.add_class(panel, PANEL_VISIBLE_CLASS);
            }
        }

        let Some(color) = reading.closest_color.as_deref() else {
            return false;
        };
        if self.current_color.as_deref() == Some(color) {
            return false;
        }
        tracing::debug!(
            target: "scrollsync.hscroll",
            panel = ?reading.closest,
            color,
            "section color changed"
        );
        self.current_color = Some(color.to_owned());
        batch.set_attribute(self.section, DATA_BG_COLOR, color.to_owned());
        true
    }
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Open interval: a center sitting exactly on either edge is still outside.
fn in_window(center: f64, min: f64, max: f64) -> bool {
    center > min && center < max
}
