//! Segment building and sequencing.
//!
//! A track's sorted keys become a list of segments:
//! - a `Hold` sets a value instantly at a frame (key ease is `None`, or a
//!   lone key),
//! - a `Tween` interpolates from one key to the next with the left key's ease.
//!
//! [`SequenceBuilder`] converts a whole clip (tracks and events) into
//! instructions for a [`Sequencer`], the tween engine that actually runs
//! them. [`Timeline`] is the in-crate sequencer used for previews and tests.

use serde::{Deserialize, Serialize};

use crate::bezier::SolverSettings;
use crate::clip::Clip;
use crate::ease::Ease;
use crate::keyframe::Keyframe;
use crate::time::FrameRate;
use crate::track::Track;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Hold {
        frame: u32,
        value: Value,
    },
    Tween {
        start: u32,
        end: u32,
        from: Value,
        to: Value,
        ease: Ease,
    },
}

impl Segment {
    #[inline]
    pub fn start_frame(&self) -> u32 {
        match self {
            Segment::Hold { frame, .. } => *frame,
            Segment::Tween { start, .. } => *start,
        }
    }

    /// `None` for holds.
    #[inline]
    pub fn end_frame(&self) -> Option<u32> {
        match self {
            Segment::Hold { .. } => None,
            Segment::Tween { end, .. } => Some(*end),
        }
    }

    #[inline]
    pub fn ease(&self) -> Option<&Ease> {
        match self {
            Segment::Hold { .. } => None,
            Segment::Tween { ease, .. } => Some(ease),
        }
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        matches!(self, Segment::Hold { .. })
    }
}

fn hold(key: &Keyframe) -> Segment {
    Segment::Hold {
        frame: key.frame,
        value: key.value,
    }
}

/// Walk keys in frame order and emit holds/tweens.
///
/// When the second-to-last key holds, the pair loop never reaches the final
/// key on its own, so it gets an explicit hold of its own.
pub fn build_segments(keys: &[Keyframe]) -> Vec<Segment> {
    let mut sorted: Vec<&Keyframe> = keys.iter().collect();
    sorted.sort_by_key(|k| k.frame);

    match sorted.as_slice() {
        [] => Vec::new(),
        [only] => vec![hold(only)],
        _ => {
            let mut out = Vec::with_capacity(sorted.len());
            for pair in sorted.windows(2) {
                let (left, right) = (pair[0], pair[1]);
                if left.ease.is_hold() {
                    out.push(hold(left));
                } else {
                    out.push(Segment::Tween {
                        start: left.frame,
                        end: right.frame,
                        from: left.value,
                        to: right.value,
                        ease: left.ease.clone(),
                    });
                }
            }
            let n = sorted.len();
            if sorted[n - 2].ease.is_hold() {
                out.push(hold(sorted[n - 1]));
            }
            out
        }
    }
}

/// Instant action scheduled on a sequencer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Callback {
    /// Snap a target to a value.
    SetValue { target: String, value: Value },
    /// Fire a named clip event.
    Event { name: String },
}

/// Interpolation scheduled on a sequencer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    pub target: String,
    pub from: Value,
    pub to: Value,
    pub ease: Ease,
}

/// Tween engine receiving built instructions. Times are in seconds.
pub trait Sequencer {
    fn insert_callback(&mut self, at: f32, callback: Callback);
    fn insert_tween(&mut self, start: f32, end: f32, tween: TweenSpec);
}

/// Converts clips into sequencer instructions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceBuilder {
    rate: FrameRate,
}

impl SequenceBuilder {
    pub fn new(rate: FrameRate) -> Self {
        Self { rate }
    }

    #[inline]
    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Emit one track's segments. Returns the instruction count.
    pub fn build_track<S: Sequencer + ?Sized>(&self, track: &Track, sequencer: &mut S) -> usize {
        let segments = track.segments();
        for segment in &segments {
            match segment {
                Segment::Hold { frame, value } => sequencer.insert_callback(
                    self.rate.frames_to_seconds(*frame as f32),
                    Callback::SetValue {
                        target: track.target.clone(),
                        value: *value,
                    },
                ),
                Segment::Tween {
                    start,
                    end,
                    from,
                    to,
                    ease,
                } => sequencer.insert_tween(
                    self.rate.frames_to_seconds(*start as f32),
                    self.rate.frames_to_seconds(*end as f32),
                    TweenSpec {
                        target: track.target.clone(),
                        from: *from,
                        to: *to,
                        ease: ease.clone(),
                    },
                ),
            }
        }
        segments.len()
    }

    /// Emit every track plus the event track. Returns the instruction count.
    pub fn build_clip<S: Sequencer + ?Sized>(&self, clip: &Clip, sequencer: &mut S) -> usize {
        let mut count = 0;
        for track in clip.tracks() {
            count += self.build_track(track, sequencer);
        }
        for event in clip.events().iter() {
            sequencer.insert_callback(
                self.rate.frames_to_seconds(event.frame as f32),
                Callback::Event {
                    name: event.name.clone(),
                },
            );
            count += 1;
        }
        log::debug!(
            "built clip '{}' into {} instructions at {} fps",
            clip.name,
            count,
            self.rate.fps()
        );
        count
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledCallback {
    pub at: f32,
    pub callback: Callback,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTween {
    pub start: f32,
    pub end: f32,
    pub tween: TweenSpec,
}

impl ScheduledTween {
    fn value_at(&self, time: f32, settings: &SolverSettings) -> Value {
        let span = self.end - self.start;
        let t = if span > 0.0 {
            ((time - self.start) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.tween
            .ease
            .evaluate_with(&self.tween.from, &self.tween.to, t, settings)
    }
}

/// Recording sequencer that can be sampled at arbitrary times.
///
/// For each target the instruction with the latest start at or before the
/// sampled time wins; finished tweens keep their end value.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    callbacks: Vec<ScheduledCallback>,
    tweens: Vec<ScheduledTween>,
    solver: SolverSettings,
}

impl Timeline {
    pub fn new(solver: SolverSettings) -> Self {
        Self {
            callbacks: Vec::new(),
            tweens: Vec::new(),
            solver,
        }
    }

    pub fn callbacks(&self) -> &[ScheduledCallback] {
        &self.callbacks
    }

    pub fn tweens(&self) -> &[ScheduledTween] {
        &self.tweens
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty() && self.tweens.is_empty()
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
        self.tweens.clear();
    }

    /// End of the last instruction, in seconds.
    pub fn duration(&self) -> f32 {
        let cb = self.callbacks.iter().map(|c| c.at);
        let tw = self.tweens.iter().map(|t| t.end);
        cb.chain(tw).fold(0.0, f32::max)
    }

    /// Targets touched by any instruction, in first-seen order.
    pub fn targets(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let set_targets = self.callbacks.iter().filter_map(|c| match &c.callback {
            Callback::SetValue { target, .. } => Some(target.as_str()),
            Callback::Event { .. } => None,
        });
        let tween_targets = self.tweens.iter().map(|t| t.tween.target.as_str());
        for target in set_targets.chain(tween_targets) {
            if !out.contains(&target) {
                out.push(target);
            }
        }
        out
    }

    /// Value of `target` at `time` seconds, if anything has started by then.
    pub fn sample_target(&self, target: &str, time: f32) -> Option<Value> {
        let mut best: Option<(f32, Value)> = None;
        for cb in &self.callbacks {
            if let Callback::SetValue { target: t, value } = &cb.callback {
                if t == target && cb.at <= time && best.map_or(true, |(at, _)| cb.at >= at) {
                    best = Some((cb.at, *value));
                }
            }
        }
        for tw in &self.tweens {
            if tw.tween.target == target
                && tw.start <= time
                && best.map_or(true, |(at, _)| tw.start >= at)
            {
                best = Some((tw.start, tw.value_at(time, &self.solver)));
            }
        }
        best.map(|(_, v)| v)
    }

    /// All targets sampled at `time`.
    pub fn sample(&self, time: f32) -> Vec<(String, Value)> {
        self.targets()
            .into_iter()
            .filter_map(|t| self.sample_target(t, time).map(|v| (t.to_string(), v)))
            .collect()
    }

    /// Event names scheduled in `(from, to]`, or `[from, to]` when
    /// `include_start` is set.
    pub fn events_between(&self, from: f32, to: f32, include_start: bool) -> Vec<&str> {
        let mut fired: Vec<(f32, &str)> = self
            .callbacks
            .iter()
            .filter_map(|cb| match &cb.callback {
                Callback::Event { name } => {
                    let after_start = if include_start {
                        cb.at >= from
                    } else {
                        cb.at > from
                    };
                    (after_start && cb.at <= to).then_some((cb.at, name.as_str()))
                }
                Callback::SetValue { .. } => None,
            })
            .collect();
        fired.sort_by(|a, b| a.0.total_cmp(&b.0));
        fired.into_iter().map(|(_, n)| n).collect()
    }
}

impl Sequencer for Timeline {
    fn insert_callback(&mut self, at: f32, callback: Callback) {
        self.callbacks.push(ScheduledCallback { at, callback });
    }

    fn insert_tween(&mut self, start: f32, end: f32, tween: TweenSpec) {
        self.tweens.push(ScheduledTween { start, end, tween });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(frame: u32, v: f32, ease: Ease) -> Keyframe {
        Keyframe::new(frame, v).with_ease(ease)
    }

    #[test]
    fn empty_and_single() {
        assert!(build_segments(&[]).is_empty());
        let segs = build_segments(&[key(4, 1.0, Ease::linear())]);
        assert_eq!(
            segs,
            vec![Segment::Hold {
                frame: 4,
                value: Value::Scalar(1.0)
            }]
        );
    }

    #[test]
    fn unsorted_input_is_walked_in_frame_order() {
        let segs = build_segments(&[key(10, 1.0, Ease::linear()), key(0, 0.0, Ease::linear())]);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start_frame(), 0);
        assert_eq!(segs[0].end_frame(), Some(10));
    }

    #[test]
    fn zero_length_tween_resolves_to_end_value() {
        let tw = ScheduledTween {
            start: 1.0,
            end: 1.0,
            tween: TweenSpec {
                target: "x".into(),
                from: Value::Scalar(0.0),
                to: Value::Scalar(2.0),
                ease: Ease::linear(),
            },
        };
        assert_eq!(
            tw.value_at(1.0, &SolverSettings::default()),
            Value::Scalar(2.0)
        );
    }
}
