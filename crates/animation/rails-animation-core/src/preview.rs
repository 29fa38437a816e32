//! Editor-style preview playback.
//!
//! Builds a [`Timeline`] from a clip once, then advances it by wall-clock
//! deltas. Stopping is a flag checked at the top of every tick.

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::config::Config;
use crate::sequence::{SequenceBuilder, Timeline};
use crate::time::FrameRate;
use crate::value::Value;

/// What one tick produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewFrame {
    /// Seconds into the clip after the tick.
    pub time: f32,
    pub frame: u32,
    pub values: Vec<(String, Value)>,
    /// Events passed during the tick, in time order.
    pub events: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Preview {
    timeline: Timeline,
    rate: FrameRate,
    duration: f32,
    time: f32,
    looping: bool,
    max_step: f32,
    playing: bool,
    started: bool,
}

impl Preview {
    pub fn new(clip: &Clip, config: &Config) -> Self {
        let mut timeline = Timeline::new(config.solver);
        SequenceBuilder::new(config.frame_rate).build_clip(clip, &mut timeline);
        let clip_len = clip.length_seconds(config.frame_rate);
        let duration = if clip_len > 0.0 {
            clip_len
        } else {
            timeline.duration()
        };
        Self {
            timeline,
            rate: config.frame_rate,
            duration,
            time: 0.0,
            looping: config.loop_preview,
            max_step: config.max_preview_step.max(0.0),
            playing: false,
            started: false,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Jump to `seconds`; events at the new position fire on the next tick.
    pub fn seek(&mut self, seconds: f32) {
        self.time = if seconds.is_finite() {
            seconds.clamp(0.0, self.duration)
        } else {
            0.0
        };
        self.started = false;
    }

    /// Values at the current position without advancing.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.timeline.sample(self.time)
    }

    /// Advance by `dt` seconds. `None` while stopped.
    pub fn tick(&mut self, dt: f32) -> Option<PreviewFrame> {
        if !self.playing {
            return None;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.max_step)
        } else {
            0.0
        };

        let include_start = !self.started;
        self.started = true;
        let from = self.time;
        let mut to = from + dt;
        let mut events: Vec<String> = Vec::new();
        let collect = |a: f32, b: f32, inclusive: bool, out: &mut Vec<String>| {
            out.extend(
                self.timeline
                    .events_between(a, b, inclusive)
                    .into_iter()
                    .map(str::to_string),
            );
        };

        if self.duration <= 0.0 {
            collect(0.0, 0.0, include_start, &mut events);
            to = 0.0;
            self.playing = false;
        } else if to >= self.duration {
            collect(from, self.duration, include_start, &mut events);
            if self.looping {
                to = (to - self.duration) % self.duration;
                collect(0.0, to, true, &mut events);
                log::debug!("preview wrapped to {to:.3}s");
            } else {
                to = self.duration;
                self.playing = false;
                log::debug!("preview reached end at {to:.3}s");
            }
        } else {
            collect(from, to, include_start, &mut events);
        }

        self.time = to;
        Some(PreviewFrame {
            time: to,
            frame: self.rate.seconds_to_frames(to).floor() as u32,
            values: self.timeline.sample(to),
            events,
        })
    }
}
