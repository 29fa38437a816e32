//! Clips: named tracks plus an event track over a frame duration.

use serde::{Deserialize, Serialize};

use crate::error::{RailsError, Result};
use crate::time::FrameRate;
use crate::track::Track;
use crate::value::Value;

/// Discrete trigger on the event track (no value interpolation).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClipEvent {
    pub frame: u32,
    pub name: String,
}

impl ClipEvent {
    pub fn new(frame: u32, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

/// Events ordered by (frame, name); an identical pair is stored once.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ClipEvent>", into = "Vec<ClipEvent>")]
pub struct EventTrack {
    events: Vec<ClipEvent>,
}

impl EventTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the event already existed.
    pub fn add_event(&mut self, event: ClipEvent) -> bool {
        match self.events.binary_search(&event) {
            Ok(_) => false,
            Err(idx) => {
                self.events.insert(idx, event);
                true
            }
        }
    }

    pub fn remove_event(&mut self, frame: u32, name: &str) -> Option<ClipEvent> {
        let idx = self
            .events
            .iter()
            .position(|e| e.frame == frame && e.name == name)?;
        Some(self.events.remove(idx))
    }

    /// Events in `(from, to]`.
    pub fn events_between(&self, from: u32, to: u32) -> impl Iterator<Item = &ClipEvent> {
        self.events
            .iter()
            .filter(move |e| e.frame > from && e.frame <= to)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<ClipEvent>> for EventTrack {
    fn from(events: Vec<ClipEvent>) -> Self {
        let mut track = EventTrack::new();
        for event in events {
            track.add_event(event);
        }
        track
    }
}

impl From<EventTrack> for Vec<ClipEvent> {
    fn from(track: EventTrack) -> Self {
        track.events
    }
}

/// Something in a clip that will not play as authored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipIssue {
    KeyPastDuration { track: String, frame: u32 },
    EventPastDuration { name: String, frame: u32 },
    EmptyTrack { track: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClipRepr")]
pub struct Clip {
    pub name: String,
    /// Length in frames.
    pub duration: u32,
    tracks: Vec<Track>,
    #[serde(default)]
    events: EventTrack,
}

impl Clip {
    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks: Vec::new(),
            events: EventTrack::new(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn events(&self) -> &EventTrack {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventTrack {
        &mut self.events
    }

    pub fn add_track(&mut self, track: Track) -> Result<()> {
        if self.track(&track.name).is_some() {
            return Err(RailsError::DuplicateTrack { name: track.name });
        }
        self.tracks.push(track);
        Ok(())
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    pub fn track_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.name == name)
    }

    pub fn remove_track(&mut self, name: &str) -> Result<Track> {
        let idx = self
            .tracks
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| RailsError::TrackNotFound {
                name: name.to_string(),
            })?;
        Ok(self.tracks.remove(idx))
    }

    #[inline]
    pub fn length_seconds(&self, rate: FrameRate) -> f32 {
        rate.frames_to_seconds(self.duration as f32)
    }

    /// Last frame used by any key or event.
    pub fn last_used_frame(&self) -> Option<u32> {
        let keys = self
            .tracks
            .iter()
            .filter_map(|t| t.frame_range().map(|(_, last)| last));
        let events = self.events.iter().map(|e| e.frame);
        keys.chain(events).max()
    }

    /// Grow `duration` so every key and event falls inside it.
    pub fn fit_duration(&mut self) {
        if let Some(last) = self.last_used_frame() {
            self.duration = self.duration.max(last);
        }
    }

    /// Every track's value at `frame`, keyed by target.
    pub fn sample(&self, frame: f32) -> Vec<(String, Value)> {
        self.tracks
            .iter()
            .filter_map(|t| t.sample(frame).map(|v| (t.target.clone(), v)))
            .collect()
    }

    /// Report content that falls outside the clip or cannot animate.
    pub fn validate(&self) -> Vec<ClipIssue> {
        let mut issues = Vec::new();
        for track in &self.tracks {
            if track.is_empty() {
                issues.push(ClipIssue::EmptyTrack {
                    track: track.name.clone(),
                });
            }
            for key in track.keys().iter().filter(|k| k.frame > self.duration) {
                issues.push(ClipIssue::KeyPastDuration {
                    track: track.name.clone(),
                    frame: key.frame,
                });
            }
        }
        for event in self.events.iter().filter(|e| e.frame > self.duration) {
            issues.push(ClipIssue::EventPastDuration {
                name: event.name.clone(),
                frame: event.frame,
            });
        }
        for issue in &issues {
            log::warn!("clip '{}': {:?}", self.name, issue);
        }
        issues
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Deserialize)]
struct ClipRepr {
    name: String,
    duration: u32,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    events: EventTrack,
}

impl TryFrom<ClipRepr> for Clip {
    type Error = RailsError;

    fn try_from(repr: ClipRepr) -> Result<Self> {
        let mut clip = Clip::new(repr.name, repr.duration);
        for track in repr.tracks {
            clip.add_track(track)?;
        }
        clip.events = repr.events;
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;
    use crate::value::ValueKind;

    #[test]
    fn event_track_orders_and_dedups() {
        let mut events = EventTrack::new();
        assert!(events.add_event(ClipEvent::new(10, "b")));
        assert!(events.add_event(ClipEvent::new(2, "a")));
        assert!(!events.add_event(ClipEvent::new(10, "b")));
        assert!(events.add_event(ClipEvent::new(10, "a")));
        let order: Vec<_> = events.iter().map(|e| (e.frame, e.name.as_str())).collect();
        assert_eq!(order, vec![(2, "a"), (10, "a"), (10, "b")]);

        let window: Vec<_> = events.events_between(2, 10).map(|e| e.name.as_str()).collect();
        assert_eq!(window, vec!["a", "b"]);
        assert!(events.remove_event(2, "a").is_some());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn duplicate_track_names_rejected() {
        let mut clip = Clip::new("c", 10);
        clip.add_track(Track::new("alpha", "a", ValueKind::Scalar))
            .unwrap();
        let err = clip
            .add_track(Track::new("alpha", "b", ValueKind::Scalar))
            .unwrap_err();
        assert_eq!(err, RailsError::DuplicateTrack { name: "alpha".into() });
        assert!(matches!(
            clip.remove_track("beta"),
            Err(RailsError::TrackNotFound { .. })
        ));
    }

    #[test]
    fn validate_and_fit_duration() {
        let mut clip = Clip::new("c", 10);
        let mut track = Track::new("alpha", "a", ValueKind::Scalar);
        track.insert_key(Keyframe::new(0, 0.0)).unwrap();
        track.insert_key(Keyframe::new(15, 1.0)).unwrap();
        clip.add_track(track).unwrap();
        clip.add_track(Track::new("empty", "e", ValueKind::Vec2))
            .unwrap();
        clip.events_mut().add_event(ClipEvent::new(12, "ping"));

        let issues = clip.validate();
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&ClipIssue::KeyPastDuration {
            track: "alpha".into(),
            frame: 15
        }));

        clip.fit_duration();
        assert_eq!(clip.duration, 15);
        assert_eq!(clip.validate().len(), 1);
    }
}
