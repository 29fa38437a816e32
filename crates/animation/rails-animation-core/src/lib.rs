//! Rails Animation Core (engine-agnostic)
//!
//! Keyframe tracks for UI animation clips, the easing they use, and the
//! conversion of a clip into tween-engine instructions. The crate defines:
//! - a cubic-bezier solver and a library of named easing functions,
//! - per-key ease descriptors,
//! - frame-stamped tracks with insert/move/remove edits,
//! - clips with an event track,
//! - segment building, a `Sequencer` seam and a sampleable `Timeline`,
//! - an editor-style preview loop.

pub mod bezier;
pub mod clip;
pub mod config;
pub mod ease;
pub mod easing;
pub mod error;
pub mod keyframe;
pub mod preview;
pub mod sequence;
pub mod time;
pub mod track;
pub mod value;

// Re-exports for consumers (adapters)
pub use bezier::{BezierPolynomial, SolverSettings};
pub use clip::{Clip, ClipEvent, ClipIssue, EventTrack};
pub use config::Config;
pub use ease::{CurveControls, Ease, EaseKind};
pub use easing::EaseFunction;
pub use error::{RailsError, Result};
pub use keyframe::Keyframe;
pub use preview::{Preview, PreviewFrame};
pub use sequence::{
    build_segments, Callback, SequenceBuilder, Segment, Sequencer, Timeline, TweenSpec,
};
pub use time::{AnimationTime, FrameRate};
pub use track::{ActiveSegment, MoveReport, Track};
pub use value::{Value, ValueKind};
