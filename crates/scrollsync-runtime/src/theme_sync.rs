#![forbid(unsafe_code)]

//! Page theme driven by the active section.
//!
//! One update is a read phase ([`ThemeSync::read`]) that only measures,
//! followed by a write phase ([`ThemeSync::write`]) that only appends to a
//! [`WriteBatch`]. Scroll bursts are folded into one update per frame by
//! the component's [`FrameCoalescer`].

use scrollsync_core::frame_coalescer::{FrameCoalescer, FrameRequest};
use scrollsync_core::section::SectionLocator;
use scrollsync_core::selection::{TriggerLine, last_qualifying};
use scrollsync_core::{DomRead, NodeId, Selector, Viewport, WriteBatch};
use scrollsync_style::ComplementTint;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::nav_indicator::{IndicatorGeometry, NavIndicator};

/// Navigation bar.
pub const NAV: Selector<'static> = Selector::Tag("nav");
/// Class the nav bar carries once the page is scrolled.
pub const NAV_SCROLLED_CLASS: &str = "nav--scrolled";
/// Parallax layer.
pub const HERO_BACKGROUND: Selector<'static> = Selector::Class("hero-background");
/// Elements whose inline colors are cleared so stylesheet blending applies.
pub const NAV_INLINE_RESET: Selector<'static> = Selector::Any(&[
    Selector::Class("logo"),
    Selector::ClassDescendantTag("nav-links", "a"),
    Selector::Class("nav-cta"),
]);
/// Inline properties cleared on [`NAV_INLINE_RESET`].
pub const NAV_INLINE_PROPERTIES: [&str; 3] = ["color", "border-color", "background-color"];
/// Grid cards that expose their image to the stylesheet.
pub const GRID_ITEM: Selector<'static> = Selector::Class("grid-item");
/// Image inside a grid card.
pub const GRID_ITEM_IMAGE: Selector<'static> = Selector::TagClass("img", "grid-item-image");
/// Custom property carrying a grid card's image.
pub const IMG_URL_VAR: &str = "--img-url";

/// Everything the write phase needs, measured in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeReading {
    pub viewport: Viewport,
    pub active_section: Option<NodeId>,
    /// Effective background of the active section.
    pub background: String,
    /// Past the scrolled threshold.
    pub scrolled: bool,
    /// Link whose target has most recently crossed the link trigger line.
    pub active_link: Option<NodeId>,
    /// Indicator target under `active_link`; only measured when it will be
    /// used.
    pub link_geometry: Option<IndicatorGeometry>,
}

/// Orchestrates background, tint variables, nav state, and parallax.
#[derive(Debug)]
pub struct ThemeSync {
    cfg: SyncConfig,
    locator: SectionLocator,
    link_trigger: TriggerLine,
    root: NodeId,
    body: NodeId,
    nav: Option<NodeId>,
    hero_background: Option<NodeId>,
    inline_reset: Vec<NodeId>,
    /// Navigation links paired with the in-page element they target.
    link_targets: Vec<(NodeId, NodeId)>,
    indicator: Option<NavIndicator>,
    coalescer: FrameCoalescer,
    current_background: Option<String>,
    scrolled: bool,
    resnap_pending: bool,
    updates: u64,
}

impl ThemeSync {
    /// Resolve every element the theme touches. Missing pieces degrade to
    /// no-ops.
    pub fn mount(dom: &impl DomRead, cfg: &SyncConfig) -> Self {
        let nav = dom.first(&NAV);
        let indicator = match NavIndicator::mount(dom, &cfg.indicator) {
            Ok(indicator) => Some(indicator),
            Err(err) => {
                tracing::warn!(target: "scrollsync.nav", %err, "nav indicator disabled");
                None
            }
        };
        let link_targets = indicator
            .as_ref()
            .map(|ind| link_targets(dom, ind.links()))
            .unwrap_or_default();
        Self {
            locator: SectionLocator::new(cfg.theme.section_trigger),
            link_trigger: TriggerLine::new(cfg.theme.link_trigger),
            root: dom.root(),
            body: dom.body(),
            scrolled: nav.is_some_and(|n| dom.has_class(n, NAV_SCROLLED_CLASS)),
            nav,
            hero_background: dom.first(&HERO_BACKGROUND),
            inline_reset: dom.query(&NAV_INLINE_RESET),
            link_targets,
            indicator,
            coalescer: FrameCoalescer::new(),
            current_background: None,
            resnap_pending: false,
            updates: 0,
            cfg: cfg.clone(),
        }
    }

    /// First paint: clear nav inline colors, set grid image variables,
    /// activate the first link without animation, then run one update.
    pub fn init(&mut self, dom: &impl DomRead) -> WriteBatch {
        let mut batch = grid_image_vars(dom);
        self.reset_nav_inline_styles(&mut batch);
        if let Some(indicator) = self.indicator.as_mut()
            && let Some(&first) = indicator.links().first()
        {
            batch.append(indicator.activate(dom, first, true));
        }
        batch.append(self.update(dom));
        batch
    }

    /// Read phase.
    pub fn read(&self, dom: &impl DomRead) -> ThemeReading {
        let viewport = dom.viewport();
        let candidates = SectionLocator::candidates(dom);
        let active_section = self
            .locator
            .active_section(dom, &candidates, viewport.height);
        let background = SectionLocator::effective_background(dom, active_section);
        let active_link = self.active_link(dom, viewport.height).or_else(|| {
            self.indicator
                .as_ref()
                .and_then(NavIndicator::active_link)
        });

        let link_geometry = match (&self.indicator, active_link) {
            (Some(indicator), Some(link))
                if self.resnap_pending || indicator.active_link() != Some(link) =>
            {
                indicator.measure(dom, link)
            }
            _ => None,
        };

        ThemeReading {
            viewport,
            active_section,
            background,
            scrolled: viewport.scroll_y > self.cfg.theme.scrolled_threshold,
            active_link,
            link_geometry,
        }
    }

    /// Last mapped link whose target top is at or above the link trigger
    /// line; the first mapped link when none is, `None` without a map.
    fn active_link(&self, dom: &impl DomRead, viewport_height: f64) -> Option<NodeId> {
        last_qualifying(self.link_targets.iter(), |(_, target)| {
            dom.rect(*target)
                .is_some_and(|r| self.link_trigger.is_crossed_by(r.top(), viewport_height))
        })
        .or_else(|| self.link_targets.first().map(|pair| (0, pair)))
        .map(|(_, (link, _))| *link)
    }

    /// Write phase.
    pub fn write(&mut self, reading: &ThemeReading, batch: &mut WriteBatch) {
        self.apply_background(&reading.background, batch);

        // `link_geometry` was measured for this resnap, not for one a toggle
        // below requests.
        let resnap = self.resnap_pending;
        let mut toggled = false;
        if let Some(nav) = self.nav
            && reading.scrolled != self.scrolled
        {
            self.scrolled = reading.scrolled;
            if reading.scrolled {
                batch.add_class(nav, NAV_SCROLLED_CLASS);
            } else {
                batch.remove_class(nav, NAV_SCROLLED_CLASS);
            }
            tracing::debug!(target: "scrollsync.nav", scrolled = reading.scrolled, "nav state toggled");
            // The bar changes shape; snap the indicator once the new layout
            // can be measured.
            self.resnap_pending = true;
            toggled = true;
            self.coalescer.schedule();
        }

        if let (Some(indicator), Some(link), Some(target)) = (
            self.indicator.as_mut(),
            reading.active_link,
            reading.link_geometry,
        ) {
            let immediate = resnap;
            if immediate || indicator.active_link() != Some(link) {
                tracing::debug!(target: "scrollsync.nav", link = %link, immediate, "active link changed");
                indicator.set_active(link, target, immediate, batch);
                self.resnap_pending = toggled;
            }
        }

        if let Some(hero) = self.hero_background {
            let offset = reading.viewport.scroll_y * self.cfg.theme.parallax_factor;
            batch.set_style(hero, "transform", format!("translateY({offset}px)"));
        }
    }

    fn apply_background(&mut self, background: &str, batch: &mut WriteBatch) {
        if background.is_empty() || self.current_background.as_deref() == Some(background) {
            return;
        }
        tracing::debug!(
            target: "scrollsync.theme",
            from = self.current_background.as_deref().unwrap_or("none"),
            to = background,
            "background changed"
        );
        self.current_background = Some(background.to_owned());
        batch.set_style(self.body, "background-color", background.to_owned());
        if let Some(tint) = ComplementTint::from_background(background) {
            for (property, value) in tint.css_vars() {
                batch.set_style(self.root, property, value);
            }
        }
        self.reset_nav_inline_styles(batch);
    }

    /// Clear inline colors from the nav elements.
    pub fn reset_nav_inline_styles(&self, batch: &mut WriteBatch) {
        for &node in &self.inline_reset {
            for property in NAV_INLINE_PROPERTIES {
                batch.remove_style(node, property);
            }
        }
    }

    /// One full read-then-write cycle.
    pub fn update(&mut self, dom: &impl DomRead) -> WriteBatch {
        let _span = tracing::debug_span!(target: "scrollsync.theme", "scrollsync.update").entered();
        let reading = self.read(dom);
        let mut batch = WriteBatch::new();
        self.write(&reading, &mut batch);
        self.updates += 1;
        batch
    }

    /// Window scroll: request a frame unless one is already pending.
    pub fn on_scroll(&mut self) -> FrameRequest {
        self.coalescer.schedule()
    }

    /// Schedule an update without a scroll event, for instance after another
    /// component rewrote a section's background override.
    pub fn request_update(&mut self) -> FrameRequest {
        self.coalescer.schedule()
    }

    /// Run the pending update, if any. The scheduled flag is cleared before
    /// the update so writes that schedule again land in the next frame.
    pub fn run_frame(&mut self, dom: &impl DomRead) -> Option<WriteBatch> {
        let frame = self.coalescer.begin_frame()?;
        tracing::trace!(target: "scrollsync.theme", events = frame.events, "coalesced frame");
        Some(self.update(dom))
    }

    /// Resize: refresh grid variables, run an update, and snap the indicator.
    pub fn on_resize(&mut self, dom: &impl DomRead) -> WriteBatch {
        let mut batch = grid_image_vars(dom);
        self.resnap_pending = true;
        batch.append(self.update(dom));
        batch
    }

    /// A navigation link was clicked.
    pub fn on_link_click(&mut self, dom: &impl DomRead, link: NodeId) -> WriteBatch {
        match self.indicator.as_mut() {
            Some(indicator) if indicator.links().contains(&link) => {
                indicator.activate(dom, link, false)
            }
            _ => WriteBatch::new(),
        }
    }

    /// Advance the indicator transition. Returns `true` while animating.
    pub fn tick_indicator(&mut self, dt: Duration, batch: &mut WriteBatch) -> bool {
        self.indicator
            .as_mut()
            .is_some_and(|indicator| indicator.tick(dt, batch))
    }

    /// Whether the host should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        self.coalescer.is_scheduled() || self.indicator.as_ref().is_some_and(NavIndicator::is_animating)
    }

    pub fn indicator(&self) -> Option<&NavIndicator> {
        self.indicator.as_ref()
    }

    /// Background most recently written to `<body>`.
    pub fn current_background(&self) -> Option<&str> {
        self.current_background.as_deref()
    }

    pub const fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Mapped `(link, target)` pairs in link order.
    pub fn link_targets(&self) -> &[(NodeId, NodeId)] {
        &self.link_targets
    }

    /// Updates executed so far.
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    pub const fn coalescer(&self) -> &FrameCoalescer {
        &self.coalescer
    }
}

/// Pair each link whose `href` is `#id` with the element carrying that id.
fn link_targets(dom: &impl DomRead, links: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    links
        .iter()
        .filter_map(|&link| {
            let href = dom.attribute(link, "href")?;
            let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
            let target = dom.first(&Selector::Id(id))?;
            Some((link, target))
        })
        .collect()
}

/// `--img-url: url("<src>")` on each grid card with an image source.
pub fn grid_image_vars(dom: &impl DomRead) -> WriteBatch {
    let sources: Vec<(NodeId, String)> = dom
        .query(&GRID_ITEM)
        .into_iter()
        .filter_map(|item| {
            let img = dom.first_in(item, &GRID_ITEM_IMAGE)?;
            let src = dom.attribute(img, "src").filter(|s| !s.is_empty())?;
            Some((item, src))
        })
        .collect();

    let mut batch = WriteBatch::new();
    for (item, src) in sources {
        batch.set_style(item, IMG_URL_VAR, format!("url(\"{src}\")"));
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollsync_core::DomWrite;
    use scrollsync_core::Rect;
    use scrollsync_core::page::{ElementSpec, Page};

    struct Fixture {
        page: Page,
        links: Vec<NodeId>,
        sections: Vec<NodeId>,
        nav: NodeId,
        hero_bg: NodeId,
    }

    /// 1000px-tall viewport, three 1000px sections (white, black, white)
    /// and a fixed nav linking to the second and third.
    fn fixture() -> Fixture {
        let mut page = Page::new(Viewport::new(1280.0, 1000.0));
        page.set_body_background("rgb(250, 250, 250)");
        let nav = page.append_to_body(ElementSpec::new("nav").fixed());
        page.append(nav, ElementSpec::new("a").class("logo")).unwrap();
        let list = page
            .append(
                nav,
                ElementSpec::new("ul")
                    .class("nav-links")
                    .rect(Rect::new(100.0, 10.0, 400.0, 40.0)),
            )
            .unwrap();
        let links = [("#about", 100.0), ("#work", 200.0), ("https://elsewhere", 300.0)]
            .into_iter()
            .map(|(href, x)| {
                page.append(
                    list,
                    ElementSpec::new("a")
                        .attr("href", href)
                        .rect(Rect::new(x, 10.0, 100.0, 40.0)),
                )
                .unwrap()
            })
            .collect();
        page.append(list, ElementSpec::new("span").class("nav-indicator"))
            .unwrap();

        let palette = [
            ("hero", "rgb(255, 255, 255)"),
            ("about", "rgb(0, 0, 0)"),
            ("work", "rgb(255, 255, 255)"),
        ];
        let sections: Vec<NodeId> = palette
            .into_iter()
            .enumerate()
            .map(|(i, (id, bg))| {
                page.append_to_body(
                    ElementSpec::new("section")
                        .id(id)
                        .background(bg)
                        .rect(Rect::new(0.0, i as f64 * 1000.0, 1280.0, 1000.0)),
                )
            })
            .collect();
        let hero_bg = page
            .append(sections[0], ElementSpec::new("div").class("hero-background"))
            .unwrap();
        Fixture {
            page,
            links,
            sections,
            nav,
            hero_bg,
        }
    }

    fn mounted(fx: &mut Fixture) -> ThemeSync {
        let mut theme = ThemeSync::mount(&fx.page, &SyncConfig::default());
        let batch = theme.init(&fx.page);
        fx.page.commit(batch).unwrap();
        theme
    }

    #[test]
    fn maps_only_in_page_links() {
        let fx = fixture();
        let theme = ThemeSync::mount(&fx.page, &SyncConfig::default());
        assert_eq!(
            theme.link_targets(),
            &[(fx.links[0], fx.sections[1]), (fx.links[1], fx.sections[2])]
        );
    }

    #[test]
    fn init_applies_first_section_and_first_link() {
        let mut fx = fixture();
        let theme = mounted(&mut fx);
        let root = fx.page.root();
        let body = fx.page.body();

        assert_eq!(theme.current_background(), Some("rgb(255, 255, 255)"));
        assert_eq!(fx.page.style(body, "background-color"), Some("rgb(255, 255, 255)"));
        assert_eq!(fx.page.style(root, "--comp-rgb"), Some("0, 0, 0"));
        assert_eq!(fx.page.style(root, "--comp-a"), Some("0.18"));
        assert_eq!(fx.page.style(root, "--comp-a-strong"), Some("0.26"));
        assert!(fx.page.has_class(fx.links[0], "active"));
        assert!(!theme.indicator().unwrap().is_animating());
    }

    #[test]
    fn dark_section_past_trigger_switches_to_dark_tier() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        let root = fx.page.root();

        // Section 2 top at 20% of the viewport.
        fx.page.scroll_to(800.0);
        let reading = theme.read(&fx.page);
        assert_eq!(reading.active_section, Some(fx.sections[1]));

        let batch = theme.update(&fx.page);
        fx.page.commit(batch).unwrap();
        assert_eq!(theme.current_background(), Some("rgb(0, 0, 0)"));
        assert_eq!(fx.page.style(root, "--comp-rgb"), Some("255, 255, 255"));
        assert_eq!(fx.page.style(root, "--comp-a"), Some("0.26"));
        assert_eq!(fx.page.style(root, "--comp-a-strong"), Some("0.34"));
    }

    #[test]
    fn unchanged_background_is_not_rewritten() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        let body = fx.page.body();

        fx.page.scroll_to(10.0);
        let batch = theme.update(&fx.page);
        assert_eq!(batch.style_value(body, "background-color"), None);
    }

    #[test]
    fn override_attribute_drives_background() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        let mut forced = WriteBatch::new();
        forced.set_attribute(fx.sections[0], "data-bg-color", "#102030");
        fx.page.commit(forced).unwrap();

        let batch = theme.update(&fx.page);
        assert_eq!(
            batch.style_value(fx.page.body(), "background-color"),
            Some("#102030")
        );
    }

    #[test]
    fn scrolled_class_toggles_once_then_indicator_resnaps() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);

        fx.page.scroll_to(100.0);
        let batch = theme.update(&fx.page);
        let toggles = batch.iter().filter(|m| m.node() == fx.nav).count();
        assert_eq!(toggles, 1);
        fx.page.commit(batch).unwrap();
        assert!(fx.page.has_class(fx.nav, NAV_SCROLLED_CLASS));
        assert!(theme.is_scrolled());
        assert!(theme.wants_frame());

        fx.page.scroll_to(120.0);
        let resnap = theme.run_frame(&fx.page).expect("resnap frame scheduled");
        assert!(resnap.iter().all(|m| m.node() != fx.nav));
        assert!(!theme.indicator().unwrap().is_animating());
        assert!(!theme.wants_frame());

        fx.page.scroll_to(0.0);
        let batch = theme.update(&fx.page);
        fx.page.commit(batch).unwrap();
        assert!(!fx.page.has_class(fx.nav, NAV_SCROLLED_CLASS));
    }

    #[test]
    fn crossing_into_next_target_animates_indicator() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);

        fx.page.scroll_to(1800.0);
        let batch = theme.update(&fx.page);
        fx.page.commit(batch).unwrap();
        assert!(fx.page.has_class(fx.links[1], "active"));
        assert!(!fx.page.has_class(fx.links[0], "active"));
        assert!(theme.indicator().unwrap().is_animating());
        assert!(theme.wants_frame());

        let mut ticks = WriteBatch::new();
        while theme.tick_indicator(Duration::from_millis(16), &mut ticks) {}
        // The nav toggled on the way down; its resnap frame is still owed.
        assert!(theme.wants_frame());
        assert!(theme.run_frame(&fx.page).is_some());
        assert!(!theme.wants_frame());
    }

    #[test]
    fn link_change_with_nav_toggle_resnaps_on_new_layout() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);

        fx.page.scroll_to(1800.0);
        let batch = theme.update(&fx.page);
        fx.page.commit(batch).unwrap();
        assert!(fx.page.has_class(fx.nav, NAV_SCROLLED_CLASS));
        assert_eq!(theme.indicator().unwrap().active_link(), Some(fx.links[1]));

        // The scrolled bar lays its links out differently.
        fx.page
            .set_rect(fx.links[1], Rect::new(250.0, 10.0, 100.0, 40.0))
            .unwrap();
        let batch = theme.run_frame(&fx.page).expect("resnap frame scheduled");
        fx.page.commit(batch).unwrap();

        let indicator = theme.indicator().unwrap();
        assert!(!indicator.is_animating());
        assert_eq!(
            indicator.geometry(),
            indicator.measure(&fx.page, fx.links[1])
        );
        assert!(!theme.wants_frame());
    }

    #[test]
    fn hero_parallax_tracks_half_scroll() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        fx.page.scroll_to(400.0);
        let batch = theme.update(&fx.page);
        assert_eq!(
            batch.style_value(fx.hero_bg, "transform"),
            Some("translateY(200px)")
        );
    }

    #[test]
    fn fifty_scroll_events_run_one_update() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        let before = theme.updates();

        let requests = (0..50)
            .map(|_| theme.on_scroll())
            .filter(|r| r.needs_frame())
            .count();
        assert_eq!(requests, 1);
        assert!(theme.run_frame(&fx.page).is_some());
        assert!(theme.run_frame(&fx.page).is_none());
        assert_eq!(theme.updates(), before + 1);
    }

    #[test]
    fn clicking_a_link_activates_it() {
        let mut fx = fixture();
        let mut theme = mounted(&mut fx);
        let batch = theme.on_link_click(&fx.page, fx.links[2]);
        fx.page.commit(batch).unwrap();
        assert!(fx.page.has_class(fx.links[2], "active"));
        assert!(theme.indicator().unwrap().is_animating());

        let other = fx.sections[0];
        assert!(theme.on_link_click(&fx.page, other).is_empty());
    }

    #[test]
    fn background_change_clears_nav_inline_colors() {
        let mut fx = fixture();
        let mut inline = WriteBatch::new();
        inline.set_style(fx.links[0], "color", "red");
        fx.page.commit(inline).unwrap();

        let _theme = mounted(&mut fx);
        assert_eq!(fx.page.style(fx.links[0], "color"), None);
    }

    #[test]
    fn grid_items_expose_image_source() {
        let mut page = Page::new(Viewport::new(800.0, 600.0));
        let with_img = page.append_to_body(ElementSpec::new("div").class("grid-item"));
        page.append(
            with_img,
            ElementSpec::new("img")
                .class("grid-item-image")
                .attr("src", "/img/a.jpg"),
        )
        .unwrap();
        let bare = page.append_to_body(ElementSpec::new("div").class("grid-item"));

        let batch = grid_image_vars(&page);
        assert_eq!(
            batch.style_value(with_img, IMG_URL_VAR),
            Some("url(\"/img/a.jpg\")")
        );
        assert_eq!(batch.style_value(bare, IMG_URL_VAR), None);
    }

    #[test]
    fn page_without_nav_still_themes() {
        let mut page = Page::new(Viewport::new(800.0, 600.0));
        page.append_to_body(
            ElementSpec::new("section")
                .background("rgb(0, 0, 0)")
                .rect(Rect::new(0.0, 0.0, 800.0, 600.0)),
        );
        let mut theme = ThemeSync::mount(&page, &SyncConfig::default());
        assert!(theme.indicator().is_none());
        let batch = theme.init(&page);
        assert_eq!(
            batch.style_value(page.body(), "background-color"),
            Some("rgb(0, 0, 0)")
        );
    }
}
