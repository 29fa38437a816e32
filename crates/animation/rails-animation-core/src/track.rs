//! Keyframe tracks.
//!
//! Invariant: keys are sorted by frame and no two keys share a frame. Every
//! edit below preserves it; edits that land a key on an occupied frame
//! replace (or delete) the key that was there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ease::Ease;
use crate::error::{RailsError, Result};
use crate::keyframe::Keyframe;
use crate::sequence::{build_segments, Segment};
use crate::value::{Value, ValueKind};

/// A track animating one target property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackRepr")]
pub struct Track {
    pub name: String,
    /// Property path on the animated object (e.g. "rect.anchoredPosition").
    pub target: String,
    value_kind: ValueKind,
    keys: Vec<Keyframe>,
}

/// Outcome of a (multi-)move.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveReport {
    /// Keys deleted because a moved key landed on their frame.
    pub removed: Vec<Keyframe>,
    /// Original index of each surviving moved key -> its index after re-sorting.
    pub new_indices: BTreeMap<usize, usize>,
}

/// Keys bracketing a sample time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveSegment {
    /// Last key at or before the time.
    pub from: usize,
    /// First key after it; `None` past the last key.
    pub to: Option<usize>,
    /// Normalized position between `from` and `to` (0 without `to`).
    pub t: f32,
}

impl Track {
    pub fn new(name: impl Into<String>, target: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            value_kind,
            keys: Vec::new(),
        }
    }

    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline]
    pub fn key(&self, index: usize) -> Option<&Keyframe> {
        self.keys.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First and last key frame.
    pub fn frame_range(&self) -> Option<(u32, u32)> {
        Some((self.keys.first()?.frame, self.keys.last()?.frame))
    }

    #[inline]
    pub fn key_index_at(&self, frame: u32) -> Option<usize> {
        self.keys.binary_search_by_key(&frame, |k| k.frame).ok()
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        if value.kind() != self.value_kind {
            return Err(RailsError::ValueKindMismatch {
                track: self.name.clone(),
                expected: self.value_kind,
                actual: value.kind(),
            });
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.keys.len() {
            return Err(RailsError::KeyIndexOutOfRange {
                track: self.name.clone(),
                index,
                len: self.keys.len(),
            });
        }
        Ok(())
    }

    /// Insert in frame order; a key already on that frame is replaced.
    /// Returns the key's index.
    pub fn insert_key(&mut self, key: Keyframe) -> Result<usize> {
        self.check_kind(&key.value)?;
        match self.keys.binary_search_by_key(&key.frame, |k| k.frame) {
            Ok(idx) => {
                log::debug!("track '{}': replacing key at frame {}", self.name, key.frame);
                self.keys[idx] = key;
                Ok(idx)
            }
            Err(idx) => {
                self.keys.insert(idx, key);
                Ok(idx)
            }
        }
    }

    pub fn remove_key(&mut self, index: usize) -> Result<Keyframe> {
        self.check_index(index)?;
        Ok(self.keys.remove(index))
    }

    pub fn remove_key_at_frame(&mut self, frame: u32) -> Option<Keyframe> {
        let idx = self.key_index_at(frame)?;
        Some(self.keys.remove(idx))
    }

    pub fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.check_index(index)?;
        self.check_kind(&value)?;
        self.keys[index].value = value;
        Ok(())
    }

    /// Mutable access to a key's ease. Frames are only changed through moves.
    pub fn ease_mut(&mut self, index: usize) -> Option<&mut Ease> {
        self.keys.get_mut(index).map(|k| &mut k.ease)
    }

    /// Move one key. Returns its new index.
    pub fn move_key(&mut self, index: usize, frame: u32) -> Result<usize> {
        let report = self.move_multiple_keys(&BTreeMap::from([(index, frame)]))?;
        Ok(report.new_indices[&index])
    }

    /// Reposition several keys at once (original index -> new frame).
    ///
    /// After all moves are applied, any key that was not moved and now shares
    /// a frame with a moved key is deleted. Between moved keys landing on the
    /// same frame, the one with the highest original index survives.
    /// Destructive: colliding keys are gone, and reported in `removed`.
    pub fn move_multiple_keys(&mut self, moves: &BTreeMap<usize, u32>) -> Result<MoveReport> {
        for &index in moves.keys() {
            self.check_index(index)?;
        }

        // Winner per target frame: BTreeMap iterates ascending, so later
        // indices overwrite earlier ones.
        let mut claimed: BTreeMap<u32, usize> = BTreeMap::new();
        for (&index, &frame) in moves {
            claimed.insert(frame, index);
        }

        let mut report = MoveReport::default();
        let mut survivors: Vec<(Keyframe, Option<usize>)> = Vec::with_capacity(self.keys.len());
        for (index, mut key) in std::mem::take(&mut self.keys).into_iter().enumerate() {
            match moves.get(&index) {
                Some(&frame) => {
                    if claimed.get(&frame) == Some(&index) {
                        key.frame = frame;
                        survivors.push((key, Some(index)));
                    } else {
                        key.frame = frame;
                        report.removed.push(key);
                    }
                }
                None => {
                    if claimed.contains_key(&key.frame) {
                        report.removed.push(key);
                    } else {
                        survivors.push((key, None));
                    }
                }
            }
        }

        survivors.sort_by_key(|(k, _)| k.frame);
        for (new_index, (key, original)) in survivors.into_iter().enumerate() {
            if let Some(original) = original {
                report.new_indices.insert(original, new_index);
            }
            self.keys.push(key);
        }

        if !report.removed.is_empty() {
            log::debug!(
                "track '{}': move deleted {} colliding key(s)",
                self.name,
                report.removed.len()
            );
        }
        Ok(report)
    }

    /// Shift keys by `delta` frames, saturating at 0 and `u32::MAX`.
    pub fn shift_keys(&mut self, indices: &[usize], delta: i64) -> Result<MoveReport> {
        let mut moves = BTreeMap::new();
        for &index in indices {
            self.check_index(index)?;
            let frame = (self.keys[index].frame as i64 + delta).clamp(0, u32::MAX as i64);
            moves.insert(index, frame as u32);
        }
        self.move_multiple_keys(&moves)
    }

    /// Add a key at `frame` whose value continues the existing animation:
    /// - nothing before: default value,
    /// - nothing after: previous key's value,
    /// - otherwise: previous key's ease evaluated at `frame`.
    ///
    /// The new key takes the previous key's ease. Returns its index.
    pub fn insert_new_key_at(&mut self, frame: u32) -> usize {
        let prev_idx = self.keys.partition_point(|k| k.frame <= frame).checked_sub(1);
        let next_idx = self.keys.iter().position(|k| k.frame > frame);

        let (value, ease) = match (prev_idx, next_idx) {
            (None, _) => (Value::zero(self.value_kind), Ease::default()),
            (Some(p), None) => (self.keys[p].value, self.keys[p].ease.clone()),
            (Some(p), Some(n)) => {
                let prev = &self.keys[p];
                let next = &self.keys[n];
                let span = (next.frame - prev.frame) as f32;
                let t = (frame - prev.frame) as f32 / span;
                (
                    prev.ease.evaluate(&prev.value, &next.value, t),
                    prev.ease.clone(),
                )
            }
        };

        let key = Keyframe { frame, value, ease };
        match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(idx) => {
                self.keys[idx] = key;
                idx
            }
            Err(idx) => {
                self.keys.insert(idx, key);
                idx
            }
        }
    }

    /// Which key pair drives the track at `frame` (fractional frames allowed).
    ///
    /// Before the first key the first key is active with `t = 0`.
    pub fn active_segment(&self, frame: f32) -> Option<ActiveSegment> {
        if self.keys.is_empty() {
            return None;
        }
        let from = self
            .keys
            .partition_point(|k| k.frame as f32 <= frame)
            .saturating_sub(1);
        let to = (from + 1 < self.keys.len()).then_some(from + 1);
        let t = match to {
            Some(to) if frame > self.keys[from].frame as f32 => {
                let a = self.keys[from].frame as f32;
                let b = self.keys[to].frame as f32;
                ((frame - a) / (b - a)).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };
        Some(ActiveSegment { from, to, t })
    }

    /// Value at `frame`; flat before the first and after the last key.
    pub fn sample(&self, frame: f32) -> Option<Value> {
        let seg = self.active_segment(frame)?;
        let from = &self.keys[seg.from];
        match seg.to {
            Some(to) => Some(from.ease.evaluate(&from.value, &self.keys[to].value, seg.t)),
            None => Some(from.value),
        }
    }

    /// Hold/tween segments for sequencing.
    pub fn segments(&self) -> Vec<Segment> {
        build_segments(&self.keys)
    }
}

#[derive(Deserialize)]
struct TrackRepr {
    name: String,
    target: String,
    #[serde(default)]
    value_kind: Option<ValueKind>,
    #[serde(default)]
    keys: Vec<Keyframe>,
}

impl TryFrom<TrackRepr> for Track {
    type Error = RailsError;

    fn try_from(repr: TrackRepr) -> Result<Self> {
        let kind = repr
            .value_kind
            .or_else(|| repr.keys.first().map(|k| k.value.kind()))
            .unwrap_or(ValueKind::Scalar);
        let mut track = Track::new(repr.name, repr.target, kind);
        for key in repr.keys {
            track.insert_key(key)?;
        }
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_track(keys: &[(u32, f32)]) -> Track {
        let mut track = Track::new("t", "x", ValueKind::Scalar);
        for &(f, v) in keys {
            track.insert_key(Keyframe::new(f, v)).unwrap();
        }
        track
    }

    fn frames(track: &Track) -> Vec<u32> {
        track.keys().iter().map(|k| k.frame).collect()
    }

    #[test]
    fn insert_keeps_order() {
        let track = scalar_track(&[(10, 1.0), (0, 0.0), (5, 0.5)]);
        assert_eq!(frames(&track), vec![0, 5, 10]);
    }

    #[test]
    fn insert_rejects_wrong_kind() {
        let mut track = scalar_track(&[]);
        let err = track
            .insert_key(Keyframe::new(0, [1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, RailsError::ValueKindMismatch { .. }));
    }

    #[test]
    fn remove_out_of_range() {
        let mut track = scalar_track(&[(0, 0.0)]);
        assert!(matches!(
            track.remove_key(3),
            Err(RailsError::KeyIndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(track.remove_key_at_frame(7).is_none());
        assert_eq!(track.remove_key_at_frame(0).unwrap().frame, 0);
        assert!(track.is_empty());
    }

    #[test]
    fn shift_saturates_at_zero() {
        let mut track = scalar_track(&[(2, 0.0), (10, 1.0)]);
        track.shift_keys(&[0], -5).unwrap();
        assert_eq!(frames(&track), vec![0, 10]);
    }

    #[test]
    fn moved_keys_on_same_frame_keep_highest_index() {
        let mut track = scalar_track(&[(0, 0.0), (5, 5.0), (10, 10.0)]);
        let report = track
            .move_multiple_keys(&BTreeMap::from([(0, 20), (1, 20)]))
            .unwrap();
        assert_eq!(frames(&track), vec![10, 20]);
        assert_eq!(track.keys()[1].value, Value::Scalar(5.0));
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.new_indices.get(&1), Some(&1));
        assert!(!report.new_indices.contains_key(&0));
    }

    #[test]
    fn swapping_frames_is_not_a_collision() {
        let mut track = scalar_track(&[(0, 0.0), (10, 10.0)]);
        let report = track
            .move_multiple_keys(&BTreeMap::from([(0, 10), (1, 0)]))
            .unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(track.keys()[0].value, Value::Scalar(10.0));
        assert_eq!(track.keys()[1].value, Value::Scalar(0.0));
    }

    #[test]
    fn active_segment_boundaries() {
        let track = scalar_track(&[(10, 0.0), (20, 1.0)]);
        let before = track.active_segment(0.0).unwrap();
        assert_eq!((before.from, before.to, before.t), (0, Some(1), 0.0));
        let mid = track.active_segment(15.0).unwrap();
        assert_eq!((mid.from, mid.to), (0, Some(1)));
        assert!((mid.t - 0.5).abs() < 1e-6);
        let after = track.active_segment(30.0).unwrap();
        assert_eq!((after.from, after.to, after.t), (1, None, 0.0));
        assert!(scalar_track(&[]).active_segment(0.0).is_none());
    }

    #[test]
    fn deserialize_sorts_and_dedups() {
        let json = r#"{
            "name": "t", "target": "x",
            "keys": [
                {"frame": 10, "value": {"type": "Scalar", "data": 1.0}},
                {"frame": 0, "value": {"type": "Scalar", "data": 0.0}},
                {"frame": 10, "value": {"type": "Scalar", "data": 2.0}}
            ]
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(frames(&track), vec![0, 10]);
        assert_eq!(track.keys()[1].value, Value::Scalar(2.0));
        assert_eq!(track.value_kind(), ValueKind::Scalar);
    }
}
