#![forbid(unsafe_code)]

//! Span and event shape of a scroll-driven frame.
//!
//! Run:
//!   cargo test -p scrollsync-runtime --test tracing_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrollsync_core::page::{ElementSpec, Page};
use scrollsync_core::{DomWrite, Rect, Viewport};
use scrollsync_runtime::{HostEvent, ScrollSync, SyncConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Default, Clone)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span_ref| span_ref.name().to_string());
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: fields.get("message").cloned().unwrap_or_default(),
            fields,
            parent_span_name,
        });
    }
}

fn with_capture<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn two_tone_page() -> Page {
    let mut page = Page::new(Viewport::new(1280.0, 1000.0));
    for (i, bg) in ["rgb(255, 255, 255)", "rgb(0, 0, 0)"].into_iter().enumerate() {
        page.append_to_body(
            ElementSpec::new("section")
                .background(bg)
                .rect(Rect::new(0.0, i as f64 * 1000.0, 1280.0, 1000.0)),
        );
    }
    page
}

#[test]
fn update_span_nests_under_frame() {
    let capture = with_capture(|| {
        let mut page = two_tone_page();
        let (mut sync, first) = ScrollSync::init(&page, &SyncConfig::default());
        page.commit(first).unwrap();
        page.scroll_to(800.0);
        sync.handle(&page, HostEvent::WindowScroll);
        sync.frame(&page, Duration::from_millis(16));
    });

    let spans = capture.spans.lock().unwrap().clone();
    let frame_updates: Vec<_> = spans
        .iter()
        .filter(|s| s.name == "scrollsync.update")
        .filter(|s| s.parent_name.as_deref() == Some("scrollsync.frame"))
        .collect();
    assert_eq!(frame_updates.len(), 1);
    assert!(
        spans
            .iter()
            .any(|s| s.name == "scrollsync.update"
                && s.parent_name.as_deref() == Some("scrollsync.init"))
    );
}

#[test]
fn background_change_is_logged_inside_update() {
    let capture = with_capture(|| {
        let mut page = two_tone_page();
        let (mut sync, first) = ScrollSync::init(&page, &SyncConfig::default());
        page.commit(first).unwrap();
        page.scroll_to(800.0);
        sync.handle(&page, HostEvent::WindowScroll);
        sync.frame(&page, Duration::from_millis(16));
    });

    let events = capture.events.lock().unwrap().clone();
    let change = events
        .iter()
        .filter(|e| e.target == "scrollsync.theme" && e.message == "background changed")
        .last()
        .expect("background change event");
    assert_eq!(change.level, tracing::Level::DEBUG);
    assert_eq!(change.parent_span_name.as_deref(), Some("scrollsync.update"));
    assert_eq!(change.fields.get("to").map(String::as_str), Some("rgb(0, 0, 0)"));
    assert_eq!(
        change.fields.get("from").map(String::as_str),
        Some("rgb(255, 255, 255)")
    );
}

#[test]
fn missing_nav_is_a_warning() {
    let capture = with_capture(|| {
        let page = two_tone_page();
        let _ = ScrollSync::init(&page, &SyncConfig::default());
    });
    let events = capture.events.lock().unwrap().clone();
    assert!(events.iter().any(|e| e.level == tracing::Level::WARN
        && e.target == "scrollsync.nav"
        && e.message == "nav indicator disabled"));
}

#[test]
fn fail_open_logs_the_cause_at_error() {
    let capture = with_capture(|| {
        let page = two_tone_page();
        let mut cfg = SyncConfig::default();
        cfg.theme.section_trigger = 2.0;
        let (sync, _) = ScrollSync::init(&page, &cfg);
        assert!(sync.failed_open());
    });
    let events = capture.events.lock().unwrap().clone();
    let failure = events
        .iter()
        .find(|e| e.message == "setup failed, revealing all content")
        .expect("fail-open event");
    assert_eq!(failure.level, tracing::Level::ERROR);
    assert_eq!(failure.target, "scrollsync");
    assert!(
        failure
            .fields
            .get("err")
            .is_some_and(|err| err.contains("theme.section_trigger"))
    );
}
