#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`WebHost`].
//!
//! Only compiled on `wasm32` with the `input-parser` feature. Every payload
//! crosses the boundary as JSON; see [`crate::snapshot`] for the shapes.

use core::time::Duration;
use std::io;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::WebHost;
use crate::snapshot::{LayoutUpdate, encode_batch, parse_host_event};

fn console_call(method: &str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(func) = Reflect::get(&console, &method.into()) else {
        return;
    };
    let Ok(func) = func.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = func.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_call("error", &msg);
        }));
    });
}

/// Buffers one formatted event and hands it to `console.log` on drop.
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf);
            console_call("log", line.trim_end());
        }
    }
}

fn install_tracing() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        // No clock on wasm32-unknown-unknown; the console stamps lines itself.
        let _ = tracing_subscriber::fmt()
            .with_writer(ConsoleWriter::default)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .try_init();
    });
}

fn to_js(err: impl core::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// `performance.now()` milliseconds to a duration; garbage becomes zero.
fn duration_from_ms(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        Duration::from_secs_f64(now_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Browser entry point.
///
/// ```js
/// const runner = new ScrollSyncRunner(JSON.stringify(snapshot));
/// apply(runner.takeWrites());
/// window.addEventListener("scroll", () => {
///   if (runner.pushEvent('{"type":"window_scroll"}')) requestAnimationFrame(tick);
/// });
/// function tick(now) {
///   apply(runner.frame(now, JSON.stringify(measureLayout())));
///   if (runner.wantsFrame()) requestAnimationFrame(tick);
/// }
/// ```
#[wasm_bindgen]
pub struct ScrollSyncRunner {
    host: WebHost,
}

#[wasm_bindgen]
impl ScrollSyncRunner {
    /// Build the mirror page from a snapshot and mount every component.
    /// `config_json` overrides `SyncConfig` defaults key by key; if it does
    /// not decode, the runner fails open and only reveals content.
    #[wasm_bindgen(constructor)]
    pub fn new(page_json: &str, config_json: Option<String>) -> Result<ScrollSyncRunner, JsValue> {
        install_panic_hook();
        install_tracing();
        let host = WebHost::from_json(page_json, config_json.as_deref()).map_err(to_js)?;
        Ok(Self { host })
    }

    /// Handle one event. Returns `true` when a frame must be requested.
    #[wasm_bindgen(js_name = pushEvent)]
    pub fn push_event(&mut self, event_json: &str) -> Result<bool, JsValue> {
        let event = parse_host_event(event_json).map_err(to_js)?;
        self.host.push_event(event).map_err(to_js)
    }

    /// Feed re-measured layout outside a frame, before events that read it
    /// immediately (resize, link click).
    #[wasm_bindgen(js_name = applyLayout)]
    pub fn apply_layout(&mut self, layout_json: &str) -> Result<(), JsValue> {
        let layout = LayoutUpdate::from_json(layout_json).map_err(to_js)?;
        layout.apply(self.host.page_mut()).map_err(to_js)
    }

    /// Apply `layout_json`, run one frame at `now_ms`, and return every
    /// write committed since the last drain.
    pub fn frame(&mut self, now_ms: f64, layout_json: &str) -> Result<String, JsValue> {
        self.apply_layout(layout_json)?;
        self.host.frame(duration_from_ms(now_ms)).map_err(to_js)?;
        self.take_writes()
    }

    /// Drain committed writes as a JSON mutation array.
    #[wasm_bindgen(js_name = takeWrites)]
    pub fn take_writes(&mut self) -> Result<String, JsValue> {
        encode_batch(&self.host.take_writes()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = wantsFrame)]
    pub fn wants_frame(&self) -> bool {
        self.host.frame_requested()
    }

    /// Setup failed and all content was revealed.
    #[wasm_bindgen(js_name = failedOpen)]
    pub fn failed_open(&self) -> bool {
        self.host.sync().failed_open()
    }
}
