/// The transition function lives here and ONLY here :
/// - pure    : same (context, command) -> same patch, no I/O, no timers
/// - partial : a patch names the fields a command touched, nothing else
///
/// Scheduling side effects (bubble clearing, step delays) belong to the
/// callers in playback.rs and motion.rs.
use crate::engine::Point;
use crate::sprite::{Bubble, Command, SpriteContext};

#[derive(Debug, Default, Clone, PartialEq)]
/// Optional field per attribute
/// - `bubble: Some(None)` clears the bubble, `bubble: None` leaves it alone
pub struct SpritePatch {
    pub position: Option<Point>,
    pub rotation: Option<f64>,
    pub bubble: Option<Option<Bubble>>,
}

impl SpritePatch {
    pub fn position(position: Point) -> Self {
        SpritePatch {
            position: Some(position),
            ..SpritePatch::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        SpritePatch {
            rotation: Some(rotation),
            ..SpritePatch::default()
        }
    }

    pub fn bubble(bubble: Bubble) -> Self {
        SpritePatch {
            bubble: Some(Some(bubble)),
            ..SpritePatch::default()
        }
    }

    pub fn clear_bubble() -> Self {
        SpritePatch {
            bubble: Some(None),
            ..SpritePatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.rotation.is_none() && self.bubble.is_none()
    }

    /// Later patch wins field by field
    pub fn merge(mut self, later: SpritePatch) -> Self {
        if later.position.is_some() {
            self.position = later.position;
        }
        if later.rotation.is_some() {
            self.rotation = later.rotation;
        }
        if later.bubble.is_some() {
            self.bubble = later.bubble;
        }
        self
    }
}

/// Compute what `command` does to a sprite currently in `context`
pub fn apply_command(context: &SpriteContext, command: &Command) -> SpritePatch {
    match command {
        Command::Move { value } => {
            let radians = context.rotation.to_radians();
            SpritePatch::position(Point {
                x: context.position.x + radians.cos() * value,
                y: context.position.y + radians.sin() * value,
            })
        }
        // no modulo, left turns are just negative
        Command::Turn { value } => SpritePatch::rotation(context.rotation + value),
        Command::GoTo { x, y } => SpritePatch::position(Point::new(*x, *y)),
        Command::Say { value, .. } => SpritePatch::bubble(Bubble::say(value.clone())),
        Command::Think { value, .. } => SpritePatch::bubble(Bubble::think(value.clone())),
        Command::Repeat { count, action } => {
            // feed every application forward into the next one
            let mut current = context.clone();
            let mut accumulated = SpritePatch::default();
            for _ in 0..*count {
                let step = apply_command(&current, action);
                current = current.apply(&step);
                accumulated = accumulated.merge(step);
            }
            accumulated
        }
        Command::Unknown => SpritePatch::default(),
    }
}
