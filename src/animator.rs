use crate::browser;
use crate::config::PlaybackConfig;
use crate::engine::{BrowserTimer, Point, Timer};
use crate::motion::MotionDriver;
use crate::playback::{PlaybackLock, Sequencer, StopSignal};
use crate::sprite::{Command, SpriteId, SpriteKind};
use crate::store::{shared, QueueStore, Shared, SpriteStore};
use anyhow::{anyhow, bail, Context, Result};
use js_sys::{Array, Promise};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

/// ┌──────────────────────── Who Talks To Whom ─────────────────────────┐
/// │                                                                    │
/// │   block drawer ──append/set/clear──► QueueStore                    │
/// │   preview      ◄──── sprites() ───── SpriteStore ◄── Sequencer     │
/// │   play button  ────── play() ──────► Sequencer (Promise)           │
/// │   palette      ──── run()/repeat() ► MotionDriver (Promise)        │
/// │                                                                    │
/// └────────────────────────────────────────────────────────────────────┘
#[wasm_bindgen]
pub struct Animator {
    sprites: Shared<SpriteStore>,
    queues: Shared<QueueStore>,
    timer: Rc<dyn Timer>,
    config: PlaybackConfig,
    stop: StopSignal,
    playing: PlaybackLock,
}

#[wasm_bindgen]
impl Animator {
    /// `config` may be undefined, any missing field takes its default
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Animator, JsValue> {
        let config = decode_config(config).map_err(browser::to_js_error)?;
        log::info!("animator ready : {:?}", config);
        Ok(Animator {
            sprites: shared(SpriteStore::new()),
            queues: shared(QueueStore::new()),
            timer: Rc::new(BrowserTimer),
            config,
            stop: StopSignal::default(),
            playing: PlaybackLock::default(),
        })
    }

    #[wasm_bindgen(js_name = addSprite)]
    pub fn add_sprite(&self, kind: &str) -> Result<u32, JsValue> {
        let kind = parse_kind(kind).map_err(browser::to_js_error)?;
        Ok(self.sprites.borrow_mut().add(kind).0)
    }

    /// Snapshot of every sprite in creation order, for drawing
    pub fn sprites(&self) -> Result<JsValue, JsValue> {
        let sprites = self.sprites.borrow();
        let all: Vec<_> = sprites.all().collect();
        to_js(&all).map_err(browser::to_js_error)
    }

    #[wasm_bindgen(js_name = appendCommand)]
    pub fn append_command(&self, id: u32, command: JsValue) -> Result<(), JsValue> {
        let command = decode_command(command).map_err(browser::to_js_error)?;
        self.queues.borrow_mut().append(SpriteId(id), command);
        Ok(())
    }

    #[wasm_bindgen(js_name = setCommands)]
    pub fn set_commands(&self, id: u32, commands: JsValue) -> Result<(), JsValue> {
        let commands = decode_commands(commands).map_err(browser::to_js_error)?;
        self.queues.borrow_mut().replace(SpriteId(id), commands);
        Ok(())
    }

    #[wasm_bindgen(js_name = clearCommands)]
    pub fn clear_commands(&self, id: u32) {
        self.queues.borrow_mut().clear(SpriteId(id));
    }

    pub fn commands(&self, id: u32) -> Result<JsValue, JsValue> {
        to_js(self.queues.borrow().get(SpriteId(id))).map_err(browser::to_js_error)
    }

    /// One readable line per queued command
    #[wasm_bindgen(js_name = describeCommands)]
    pub fn describe_commands(&self, id: u32) -> Array {
        self.queues
            .borrow()
            .get(SpriteId(id))
            .iter()
            .map(|command| JsValue::from_str(&command.to_string()))
            .collect()
    }

    /// Drag repositioning from the preview area
    #[wasm_bindgen(js_name = moveSprite)]
    pub fn move_sprite(&self, id: u32, x: f64, y: f64) -> Result<(), JsValue> {
        self.with_sprite(id, |sprites, id| sprites.set_position(id, Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = resetSprite)]
    pub fn reset_sprite(&self, id: u32) -> Result<(), JsValue> {
        self.with_sprite(id, |sprites, id| sprites.reset_position(id))
    }

    /// Drop every say/think bubble, pending clears become no-ops
    #[wasm_bindgen(js_name = resetBubbles)]
    pub fn reset_bubbles(&self) {
        self.sprites.borrow_mut().reset_bubbles();
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.playing.is_running()
    }

    /// Play every queue, resolves with the playback report
    /// - rejects while an earlier play() is still running
    pub fn play(&self) -> Promise {
        let sequencer = Sequencer::new(
            self.sprites.clone(),
            self.queues.clone(),
            self.timer.clone(),
            self.config.clone(),
        )
        .with_stop_signal(self.stop.clone());
        let playing = self.playing.clone();
        future_to_promise(async move {
            let report = sequencer
                .play_exclusive(&playing)
                .await
                .map_err(browser::to_js_error)?;
            to_js(&report).map_err(browser::to_js_error)
        })
    }

    /// Takes effect at the next step boundary of the running playback
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Run one command on one sprite right away, bubbles clear themselves
    pub fn run(&self, id: u32, command: JsValue) -> Promise {
        let driver = self.driver(id);
        future_to_promise(async move {
            let command = decode_command(command).map_err(browser::to_js_error)?;
            let context = driver.run(&command).await.map_err(browser::to_js_error)?;
            to_js(&context).map_err(browser::to_js_error)
        })
    }

    /// Apply a move or turn `count` times on one sprite
    pub fn repeat(&self, id: u32, command: JsValue, count: u32) -> Promise {
        let driver = self.driver(id);
        future_to_promise(async move {
            let command = decode_command(command)
                .and_then(|command| {
                    if !command.is_motion() {
                        bail!("only move and turn can be repeated, got {}", command.tag());
                    }
                    Ok(command)
                })
                .map_err(browser::to_js_error)?;
            let context = driver
                .repeat(count, &command)
                .await
                .map_err(browser::to_js_error)?;
            to_js(&context).map_err(browser::to_js_error)
        })
    }
}

impl Animator {
    fn driver(&self, id: u32) -> MotionDriver {
        MotionDriver::new(
            self.sprites.clone(),
            SpriteId(id),
            self.timer.clone(),
            self.config.clone(),
        )
    }

    fn with_sprite(
        &self,
        id: u32,
        edit: impl FnOnce(&mut SpriteStore, SpriteId) -> bool,
    ) -> Result<(), JsValue> {
        if edit(&mut self.sprites.borrow_mut(), SpriteId(id)) {
            Ok(())
        } else {
            Err(browser::to_js_error(anyhow!("No sprite with id {}", id)))
        }
    }
}

pub fn parse_kind(kind: &str) -> Result<SpriteKind> {
    match kind {
        "" | "cat" => Ok(SpriteKind::Cat),
        "ball" => Ok(SpriteKind::Ball),
        other => bail!("Unknown sprite kind '{}'", other),
    }
}

fn decode_config(value: JsValue) -> Result<PlaybackConfig> {
    if value.is_undefined() || value.is_null() {
        return Ok(PlaybackConfig::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| anyhow!("error converting config : {}", err))
}

fn decode_command(value: JsValue) -> Result<Command> {
    let command: Command = serde_wasm_bindgen::from_value(value)
        .map_err(|err| anyhow!("error converting command : {}", err))?;
    command
        .validate()
        .with_context(|| format!("Rejected command [{}]", command))?;
    Ok(command)
}

fn decode_commands(value: JsValue) -> Result<Vec<Command>> {
    let commands: Vec<Command> = serde_wasm_bindgen::from_value(value)
        .map_err(|err| anyhow!("error converting command list : {}", err))?;
    for (index, command) in commands.iter().enumerate() {
        command
            .validate()
            .with_context(|| format!("Rejected command #{} [{}]", index, command))?;
    }
    Ok(commands)
}

/// Plain JS objects rather than Maps, so flattened structs read naturally
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| anyhow!("error converting to JsValue : {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_kinds() {
        assert_eq!(parse_kind("cat").unwrap(), SpriteKind::Cat);
        assert_eq!(parse_kind("ball").unwrap(), SpriteKind::Ball);
        assert_eq!(parse_kind("").unwrap(), SpriteKind::Cat);
        assert!(parse_kind("dog").is_err());
    }
}
