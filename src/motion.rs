use crate::config::PlaybackConfig;
use crate::engine::{Bounds, Point, Timer};
use crate::playback::hold_bubble;
use crate::sprite::{apply_command, Bubble, Command, SpriteContext, SpriteId};
use crate::store::{Shared, SpriteStore};
use anyhow::{anyhow, Result};
use std::rc::Rc;

/// Drives ONE sprite directly from the blocks palette
/// - no queue, no collisions
/// - optional stage bounds clamp every resulting position
pub struct MotionDriver {
    sprites: Shared<SpriteStore>,
    id: SpriteId,
    timer: Rc<dyn Timer>,
    delay_ms: u32,
    bounds: Option<Bounds>,
    config: PlaybackConfig,
}

impl MotionDriver {
    pub fn new(
        sprites: Shared<SpriteStore>,
        id: SpriteId,
        timer: Rc<dyn Timer>,
        config: PlaybackConfig,
    ) -> Self {
        MotionDriver {
            sprites,
            id,
            timer,
            delay_ms: config.driver_delay_ms,
            bounds: config.bounds(),
            config,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn context(&self) -> Result<SpriteContext> {
        self.sprites
            .borrow()
            .get(self.id)
            .map(|sprite| sprite.context.clone())
            .ok_or_else(|| anyhow!("No sprite with id {}", self.id))
    }

    /// Apply one command right now
    /// - say/think only set the bubble here, see `run` for the timed version
    pub fn apply(&self, command: &Command) -> Result<SpriteContext> {
        let context = self.context()?;
        let mut patch = apply_command(&context, command);
        if let (Some(bounds), Some(position)) = (self.bounds, patch.position) {
            patch.position = Some(bounds.clamp(position));
        }
        self.sprites
            .borrow_mut()
            .update(self.id, &patch)
            .cloned()
            .ok_or_else(|| anyhow!("No sprite with id {}", self.id))
    }

    pub fn move_by(&self, steps: f64) -> Result<SpriteContext> {
        self.apply(&Command::move_by(steps))
    }

    pub fn turn_right(&self, degrees: f64) -> Result<SpriteContext> {
        self.apply(&Command::turn(degrees))
    }

    pub fn turn_left(&self, degrees: f64) -> Result<SpriteContext> {
        self.apply(&Command::turn(-degrees))
    }

    pub fn go_to(&self, x: f64, y: f64) -> Result<SpriteContext> {
        self.apply(&Command::go_to(x, y))
    }

    /// Like `apply`, bubbles are shown for their duration then cleared
    pub async fn run(&self, command: &Command) -> Result<SpriteContext> {
        match command {
            Command::Say { value, duration } => {
                self.say(Bubble::say(value.clone()), *duration).await?;
                self.context()
            }
            Command::Think { value, duration } => {
                self.say(Bubble::think(value.clone()), *duration).await?;
                self.context()
            }
            _ => self.apply(command),
        }
    }

    /// Apply `command` `count` times, one after the other, pausing after each
    /// - every application starts from the previous result
    pub async fn repeat(&self, count: u32, command: &Command) -> Result<SpriteContext> {
        log::debug!("{} repeating [{}] x{}", self.id, command, count);
        let mut context = self.context()?;
        for _ in 0..count {
            context = self.apply(command)?;
            self.timer.sleep(self.delay_ms).await;
        }
        Ok(context)
    }

    /// Show a bubble, clear it after `seconds` unless replaced meanwhile
    pub async fn say(&self, bubble: Bubble, seconds: f64) -> Result<bool> {
        // fail early instead of silently holding nothing
        self.context()?;
        let millis = self.config.bubble_millis(seconds);
        Ok(hold_bubble(&self.sprites, self.timer.as_ref(), self.id, bubble, millis).await)
    }

    pub fn position(&self) -> Result<Point> {
        Ok(self.context()?.position)
    }
}
