// ==================== Imports ====================
use wasm_bindgen::prelude::*;

mod browser;
pub mod animator;
pub mod config;
pub mod engine;
pub mod motion;
pub mod playback;
pub mod sprite;
pub mod store;
#[cfg(test)]
mod testutils;

pub use animator::Animator;
pub use config::{MaxLengthPolicy, PlaybackConfig};
pub use engine::{collides, BrowserTimer, Point, Size, Timer};
pub use motion::MotionDriver;
pub use playback::{PlaybackGuard, PlaybackLock, PlaybackReport, Sequencer, StopSignal};
pub use sprite::{apply_command, Bubble, BubbleKind, Command, Sprite, SpriteId, SpriteKind, SpritePatch};
pub use store::{QueueStore, SpriteStore};

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - better panic messages
/// - log records go to the devtools console
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    browser::init_logging(log::LevelFilter::Info);
    log::info!("sprite animator loaded");
    Ok(())
}
