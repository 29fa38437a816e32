//! Core configuration for rails-animation-core.

use serde::{Deserialize, Serialize};

use crate::bezier::SolverSettings;
use crate::error::Result;
use crate::time::FrameRate;

/// Playback and evaluation settings shared by the sequencer and preview.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Frames per second used to map key frames to seconds.
    pub frame_rate: FrameRate,
    /// Root-finder tuning for curve eases.
    pub solver: SolverSettings,
    /// Wrap preview playback at the end of the clip.
    pub loop_preview: bool,
    /// Largest wall-clock delta (seconds) applied in one preview tick.
    pub max_preview_step: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::DEFAULT,
            solver: SolverSettings::default(),
            loop_preview: false,
            max_preview_step: 0.25,
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
