use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ┌──────────────── Queueable Commands ─────────────────────┐
/// │  Tag      →  Payload          →  Effect                 │
/// ├─────────────────────────────────────────────────────────┤
/// │  move     →  distance         →  translate on heading   │
/// │  turn     →  degrees          →  add to heading         │
/// │  goTo     →  x, y             →  set position           │
/// │  say      →  text, seconds    →  speech bubble          │
/// │  think    →  text, seconds    →  thought bubble         │
/// │  repeat   →  count, command   →  re-apply count times   │
/// └─────────────────────────────────────────────────────────┘
///
/// Wire shape matches the block drawer's JSON, e.g.
/// `{"type":"repeat","count":3,"action":{"type":"move","value":10}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Move {
        value: f64,
    },
    Turn {
        value: f64,
    },
    GoTo {
        x: f64,
        y: f64,
    },
    Say {
        value: String,
        duration: f64,
    },
    Think {
        value: String,
        duration: f64,
    },
    Repeat {
        count: u32,
        action: Box<Command>,
    },
    /// Tag written by a newer authoring UI, executes as a no-op
    #[serde(other)]
    Unknown,
}

impl Command {
    pub fn move_by(value: f64) -> Self {
        Command::Move { value }
    }

    pub fn turn(value: f64) -> Self {
        Command::Turn { value }
    }

    pub fn go_to(x: f64, y: f64) -> Self {
        Command::GoTo { x, y }
    }

    pub fn say(text: impl Into<String>, duration: f64) -> Self {
        Command::Say {
            value: text.into(),
            duration,
        }
    }

    pub fn think(text: impl Into<String>, duration: f64) -> Self {
        Command::Think {
            value: text.into(),
            duration,
        }
    }

    /// Blocks only offer move and turn inside a repeat
    pub fn repeat(count: u32, action: Command) -> Result<Self> {
        if !action.is_motion() {
            bail!("repeat can only wrap move or turn, got {}", action.tag());
        }
        Ok(Command::Repeat {
            count,
            action: Box::new(action),
        })
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, Command::Move { .. } | Command::Turn { .. })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::Turn { .. } => "turn",
            Command::GoTo { .. } => "goTo",
            Command::Say { .. } => "say",
            Command::Think { .. } => "think",
            Command::Repeat { .. } => "repeat",
            Command::Unknown => "unknown",
        }
    }

    /// Check a command coming from outside before it is queued
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::Repeat { action, .. } if !action.is_motion() => {
                bail!("repeat can only wrap move or turn, got {}", action.tag())
            }
            Command::Say { duration, .. } | Command::Think { duration, .. }
                if !duration.is_finite() || *duration < 0.0 =>
            {
                bail!("bubble duration must be a non-negative number of seconds")
            }
            _ => Ok(()),
        }
    }
}

/// Action stack listing, one line per queued command
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { value } => write!(f, "Move {} steps", value),
            Command::Turn { value } => write!(f, "Turn {}°", value),
            Command::GoTo { x, y } => write!(f, "Go to ({}, {})", x, y),
            Command::Say { value, .. } => write!(f, "Say \"{}\"", value),
            Command::Think { value, .. } => write!(f, "Think \"{}\"", value),
            Command::Repeat { count, action } => {
                write!(f, "Repeat {} × [{}]", count, action.tag())
            }
            Command::Unknown => write!(f, "Unknown block"),
        }
    }
}
