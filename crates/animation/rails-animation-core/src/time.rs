/**
 * Frame-based clip time.
 * Keys live on integer frames; seconds only appear when handing
 * segments to a sequencer or ticking a preview.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RailsError;

/// Frames per second used to map frames to seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct FrameRate(f32);

impl FrameRate {
    pub const DEFAULT: FrameRate = FrameRate(60.0);

    pub fn new(fps: f32) -> Result<Self, RailsError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RailsError::InvalidFrameRate { fps });
        }
        Ok(Self(fps))
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.0
    }

    /// Whole frames per second, as used for timecode display.
    #[inline]
    pub fn whole_fps(&self) -> u32 {
        (self.0.round() as u32).max(1)
    }

    #[inline]
    pub fn frame_duration(&self) -> f32 {
        1.0 / self.0
    }

    #[inline]
    pub fn frames_to_seconds(&self, frames: f32) -> f32 {
        frames / self.0
    }

    #[inline]
    pub fn seconds_to_frames(&self, seconds: f32) -> f32 {
        seconds * self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f32> for FrameRate {
    type Error = RailsError;

    fn try_from(fps: f32) -> Result<Self, Self::Error> {
        Self::new(fps)
    }
}

impl From<FrameRate> for f32 {
    fn from(rate: FrameRate) -> Self {
        rate.0
    }
}

/// A moment in a clip, in whole frames.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AnimationTime(u32);

impl AnimationTime {
    #[inline]
    pub fn from_frames(frames: u32) -> Self {
        Self(frames)
    }

    #[inline]
    pub fn zero() -> Self {
        Self(0)
    }

    #[inline]
    pub fn frames(&self) -> u32 {
        self.0
    }

    /// Nearest frame for `seconds`.
    pub fn from_seconds(seconds: f64, rate: FrameRate) -> Result<Self, RailsError> {
        if seconds < 0.0 || !seconds.is_finite() {
            return Err(RailsError::InvalidTime { time: seconds });
        }
        let frames = (seconds * rate.fps() as f64).round();
        if frames > u32::MAX as f64 {
            return Err(RailsError::InvalidTime { time: seconds });
        }
        Ok(Self(frames as u32))
    }

    #[inline]
    pub fn as_seconds(&self, rate: FrameRate) -> f64 {
        self.0 as f64 / rate.fps() as f64
    }

    /// `MM:SS:FF` using whole frames per second.
    pub fn to_timecode(&self, rate: FrameRate) -> String {
        let fps = rate.whole_fps();
        let frames = self.0 % fps;
        let total_seconds = self.0 / fps;
        format!(
            "{:02}:{:02}:{:02}",
            total_seconds / 60,
            total_seconds % 60,
            frames
        )
    }

    /// Parse timecode text typed into a time field.
    ///
    /// Accepted shapes, each with an optional trailing `f`:
    /// `MM:SS:FF`, `SS:FF`, `FF`. Seconds must be below 60 and frames below
    /// the frame rate when a larger unit is present. Anything else is `None`.
    pub fn try_parse(text: &str, rate: FrameRate) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_suffix('f')
            .or_else(|| text.strip_suffix('F'))
            .unwrap_or(text);
        if text.is_empty() {
            return None;
        }

        let parts: Vec<u32> = text
            .split(':')
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u32>().ok()
                }
            })
            .collect::<Option<_>>()?;

        let fps = rate.whole_fps();
        let (minutes, seconds, frames) = match parts.as_slice() {
            [frames] => return Some(Self(*frames)),
            [seconds, frames] => (0, *seconds, *frames),
            [minutes, seconds, frames] => {
                if *seconds >= 60 {
                    return None;
                }
                (*minutes, *seconds, *frames)
            }
            _ => return None,
        };
        if frames >= fps {
            return None;
        }
        minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .and_then(|s| s.checked_mul(fps))
            .and_then(|f| f.checked_add(frames))
            .map(Self)
    }

    /// Clamp time to a range
    #[inline]
    pub fn clamp(&self, min: AnimationTime, max: AnimationTime) -> Self {
        Self(self.0.clamp(min.0, max.0.max(min.0)))
    }
}

impl std::ops::Add for AnimationTime {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::ops::Sub for AnimationTime {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u32> for AnimationTime {
    fn from(frames: u32) -> Self {
        Self(frames)
    }
}

impl From<AnimationTime> for u32 {
    fn from(time: AnimationTime) -> Self {
        time.0
    }
}

impl fmt::Display for AnimationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}f", self.0)
    }
}

/// Plain frame counts: `"42"` or `"42f"`.
impl FromStr for AnimationTime {
    type Err = RailsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('f').unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| RailsError::InvalidTime { time: f64::NAN })
    }
}
