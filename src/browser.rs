use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

/// Resolve once the window fires a setTimeout of `millis`
/// - callback -> oneshot channel bridge, the future just awaits the receiver
/// - the one shot closure frees itself after firing, nothing is leaked per call
pub async fn set_timeout(millis: u32) -> Result<()> {
    let (tx, rx) = channel::<()>();
    let callback = Closure::once_into_js(move || {
        let _ = tx.send(());
    });

    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            // setTimeout takes an i32, clamp rather than wrap
            millis.min(i32::MAX as u32) as i32,
        )
        .map_err(|err| anyhow!("Could not schedule timeout : {:#?}", err))?;

    rx.await
        .map_err(|_| anyhow!("[browser.rs::set_timeout] timeout callback dropped"))
}

/// Convert an anyhow error into something JS can throw
pub fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

/// Forwards `log` records to the devtools console
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger, a second call is a no-op
pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
