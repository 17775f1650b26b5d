#![forbid(unsafe_code)]

//! Whole-page scenarios driven through `ScrollSync` against an in-memory
//! page, committing every batch the way a host would.

use std::time::Duration;

use scrollsync_core::page::{ElementSpec, Page};
use scrollsync_core::{DomRead, DomWrite, NodeId, Rect, Viewport};
use scrollsync_runtime::nav_indicator::IndicatorPhase;
use scrollsync_runtime::{HostEvent, ScrollSync, SyncConfig};

const FRAME: Duration = Duration::from_millis(16);

struct Site {
    page: Page,
    sections: Vec<NodeId>,
    links: Vec<NodeId>,
    indicator: NodeId,
}

/// Three 1000px sections (white, black, white) under a fixed nav whose
/// links target each of them.
fn site() -> Site {
    let mut page = Page::new(Viewport::new(1280.0, 1000.0));
    page.set_body_background("rgb(255, 255, 255)");
    let nav = page.append_to_body(ElementSpec::new("nav").fixed());
    let list = page
        .append(
            nav,
            ElementSpec::new("ul")
                .class("nav-links")
                .rect(Rect::new(600.0, 20.0, 360.0, 40.0)),
        )
        .unwrap();
    let links = ["#one", "#two", "#three"]
        .into_iter()
        .enumerate()
        .map(|(i, href)| {
            page.append(
                list,
                ElementSpec::new("a")
                    .attr("href", href)
                    .rect(Rect::new(600.0 + i as f64 * 120.0, 20.0, 100.0, 40.0)),
            )
            .unwrap()
        })
        .collect();
    let indicator = page
        .append(list, ElementSpec::new("span").class("nav-indicator"))
        .unwrap();

    let sections = [
        ("one", "rgb(255, 255, 255)"),
        ("two", "rgb(0, 0, 0)"),
        ("three", "rgb(255, 255, 255)"),
    ]
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

    Site {
        page,
        sections,
        links,
        indicator,
    }
}

fn boot(site: &mut Site) -> ScrollSync {
    let (sync, first) = ScrollSync::init(&site.page, &SyncConfig::default());
    site.page.commit(first).unwrap();
    sync
}

/// Push a window scroll and run frames until the runtime is idle.
fn scroll_and_settle(site: &mut Site, sync: &mut ScrollSync, y: f64) -> usize {
    site.page.scroll_to(y);
    let mut frames = 0;
    if sync.handle(&site.page, HostEvent::WindowScroll).request_frame {
        while sync.wants_frame() {
            let batch = sync.frame(&site.page, FRAME);
            site.page.commit(batch).unwrap();
            frames += 1;
            assert!(frames < 200, "runtime never went idle");
        }
    }
    frames
}

#[test]
fn dark_middle_section_switches_tint_tier() {
    let mut site = site();
    let mut sync = boot(&mut site);
    let root = site.page.root();
    assert_eq!(site.page.style(root, "--comp-a"), Some("0.18"));

    // Section two's top at 20% of the viewport, above the 25% line.
    scroll_and_settle(&mut site, &mut sync, 800.0);

    let theme = sync.theme().unwrap();
    assert_eq!(theme.read(&site.page).active_section, Some(site.sections[1]));
    assert_eq!(
        site.page.style(site.page.body(), "background-color"),
        Some("rgb(0, 0, 0)")
    );
    assert_eq!(site.page.style(root, "--comp-rgb"), Some("255, 255, 255"));
    assert_eq!(site.page.style(root, "--comp-a"), Some("0.26"));
    assert_eq!(site.page.style(root, "--comp-a-strong"), Some("0.34"));
}

#[test]
fn just_below_trigger_keeps_previous_section() {
    let mut site = site();
    let mut sync = boot(&mut site);
    // Section two's top at 260px, below the 250px line.
    scroll_and_settle(&mut site, &mut sync, 740.0);
    assert_eq!(
        site.page.style(site.page.body(), "background-color"),
        Some("rgb(255, 255, 255)")
    );
}

#[test]
fn burst_of_scroll_events_runs_one_update() {
    let mut site = site();
    let mut sync = boot(&mut site);
    let before = sync.theme().unwrap().updates();

    site.page.scroll_to(30.0);
    let requests = (0..50)
        .map(|_| sync.handle(&site.page, HostEvent::WindowScroll))
        .filter(|outcome| outcome.request_frame)
        .count();
    assert_eq!(requests, 50, "every outcome reports the pending frame");

    let batch = sync.frame(&site.page, FRAME);
    site.page.commit(batch).unwrap();
    assert_eq!(sync.theme().unwrap().updates(), before + 1);
    assert!(!sync.wants_frame());
}

#[test]
fn scrolling_through_targets_walks_the_indicator() {
    let mut site = site();
    let mut sync = boot(&mut site);
    assert!(site.page.has_class(site.links[0], "active"));

    // Past the scrolled threshold: one resnap frame, no animation.
    scroll_and_settle(&mut site, &mut sync, 100.0);
    assert!(matches!(
        sync.theme().unwrap().indicator().unwrap().phase(),
        Some(IndicatorPhase::Idle { .. })
    ));

    // Section three's top at 200px crosses the 28% line.
    let frames = scroll_and_settle(&mut site, &mut sync, 1800.0);
    assert!(frames > 1, "indicator should animate over several frames");
    assert!(site.page.has_class(site.links[2], "active"));
    assert!(!site.page.has_class(site.links[0], "active"));

    // Link three: 600 + 240 - 600 + (100 - 60) / 2 = 260.
    assert_eq!(
        site.page.style(site.indicator, "transform"),
        Some("translateX(260px)")
    );
    assert_eq!(site.page.style(site.indicator, "width"), Some("60px"));
}

#[test]
fn link_click_then_resize_snaps() {
    let mut site = site();
    let mut sync = boot(&mut site);

    let outcome = sync.handle(&site.page, HostEvent::LinkClick { node: site.links[1] });
    assert!(outcome.request_frame);
    site.page.commit(outcome.batch).unwrap();

    site.page.resize(1280.0, 900.0);
    let outcome = sync.handle(&site.page, HostEvent::Resize);
    site.page.commit(outcome.batch).unwrap();
    let indicator = sync.theme().unwrap().indicator().unwrap();
    assert!(!indicator.is_animating());
    assert_eq!(indicator.cancellations(), 1);
}

#[test]
fn page_without_anything_optional_still_boots() {
    let mut page = Page::new(Viewport::new(800.0, 600.0));
    let (mut sync, first) = ScrollSync::init(&page, &SyncConfig::default());
    assert!(!sync.failed_open());
    assert!(sync.horizontal().is_none());
    assert!(sync.reveal().is_none());
    assert!(sync.cursor().is_none());
    page.commit(first).unwrap();

    page.scroll_to(500.0);
    sync.handle(&page, HostEvent::WindowScroll);
    let batch = sync.frame(&page, FRAME);
    page.commit(batch).unwrap();
}
