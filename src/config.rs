use crate::engine::{Bounds, Size};
use serde::{Deserialize, Serialize};

/// Loop bound after a collision swap restarts playback
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaxLengthPolicy {
    /// Longest current queue over every sprite
    #[default]
    AllSprites,
    /// Longest of the two swapped queues only, other sprites may be cut short
    SwappedPair,
}

/// Timing and geometry knobs, every field optional when read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    /// Pause after every queue index step
    pub step_delay_ms: u32,
    /// Pause after each inner application of a queued repeat
    pub repeat_delay_ms: u32,
    /// Pause between applications of the single sprite driver
    pub driver_delay_ms: u32,
    /// Bubble durations are authored in seconds
    pub millis_per_second: f64,
    /// Collision box centered on every sprite
    pub footprint: Size,
    pub max_length: MaxLengthPolicy,
    /// Visible stage, when set the single sprite driver clamps to it
    pub stage: Option<Size>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            step_delay_ms: 300,
            repeat_delay_ms: 300,
            driver_delay_ms: 150,
            millis_per_second: 1000.0,
            footprint: Size::new(100.0, 100.0),
            max_length: MaxLengthPolicy::AllSprites,
            stage: None,
        }
    }
}

impl PlaybackConfig {
    /// Scaled bubble hold, negative or NaN durations hold for 0ms
    pub fn bubble_millis(&self, seconds: f64) -> u32 {
        let millis = seconds * self.millis_per_second;
        if millis.is_finite() && millis > 0.0 {
            millis.min(u32::MAX as f64).round() as u32
        } else {
            0
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.stage
            .map(|stage| Bounds::for_stage(stage, self.footprint))
    }
}
