// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Sprite Module Layout                                │
// ├────────────────┬─────────────────────────────────────────────────────────┤
// │ mod.rs         │ identity, kind, bubble, pose (SpriteContext), Sprite    │
// │ command.rs     │ the closed set of queueable commands                    │
// │ state.rs       │ SpritePatch + apply_command (pure transition function)  │
// └────────────────┴─────────────────────────────────────────────────────────┘
pub mod command;
pub mod state;

use crate::engine::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use command::Command;
pub use state::{apply_command, SpritePatch};

/// Stable sprite identity, handed out once and never reused
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteId(pub u32);

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sprite#{}", self.0)
    }
}

/// Purely cosmetic, never affects motion
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpriteKind {
    #[default]
    Cat,
    Ball,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BubbleKind {
    Say,
    Think,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    #[serde(rename = "type")]
    pub kind: BubbleKind,
    pub text: String,
}

impl Bubble {
    pub fn say(text: impl Into<String>) -> Self {
        Bubble {
            kind: BubbleKind::Say,
            text: text.into(),
        }
    }

    pub fn think(text: impl Into<String>) -> Self {
        Bubble {
            kind: BubbleKind::Think,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
/// Everything a command can change :
/// - pose    : position + heading in degrees (unbounded, never normalized)
/// - display : optional say/think bubble
pub struct SpriteContext {
    #[serde(flatten)]
    pub position: Point,
    pub rotation: f64,
    pub bubble: Option<Bubble>,
}

impl SpriteContext {
    pub fn at(position: Point) -> Self {
        SpriteContext {
            position,
            ..SpriteContext::default()
        }
    }

    /// Present fields of the patch overwrite, absent fields are kept
    pub fn apply(mut self, patch: &SpritePatch) -> Self {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(bubble) = &patch.bubble {
            self.bubble = bubble.clone();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: SpriteId,
    pub name: String,
    pub kind: SpriteKind,
    #[serde(flatten)]
    pub context: SpriteContext,
}

impl Sprite {
    pub fn position(&self) -> Point {
        self.context.position
    }

    pub fn rotation(&self) -> f64 {
        self.context.rotation
    }

    pub fn bubble(&self) -> Option<&Bubble> {
        self.context.bubble.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overwrites_only_present_fields() {
        let context = SpriteContext {
            position: Point::new(1.0, 2.0),
            rotation: 45.0,
            bubble: Some(Bubble::say("hi")),
        };
        let patched = context.clone().apply(&SpritePatch {
            rotation: Some(90.0),
            ..SpritePatch::default()
        });
        assert_eq!(patched.position, context.position);
        assert_eq!(patched.rotation, 90.0);
        assert_eq!(patched.bubble, context.bubble);
    }

    #[test]
    fn explicit_empty_bubble_clears() {
        let context = SpriteContext {
            bubble: Some(Bubble::think("hmm")),
            ..SpriteContext::default()
        };
        let cleared = context.apply(&SpritePatch::clear_bubble());
        assert_eq!(cleared.bubble, None);
    }
}
