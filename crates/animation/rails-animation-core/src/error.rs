//! Error types for clip and track editing.

use crate::value::ValueKind;

/// Errors surfaced by fallible editing operations.
///
/// Evaluation paths (easing, sampling, sequencing) are total and never
/// produce these; only structural edits and parsing do.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RailsError {
    /// Key value does not match the track's value kind
    #[error("Value kind mismatch on track '{track}': expected {expected:?}, got {actual:?}")]
    ValueKindMismatch {
        track: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Key index past the end of the track
    #[error("Key index {index} out of range for track '{track}' ({len} keys)")]
    KeyIndexOutOfRange {
        track: String,
        index: usize,
        len: usize,
    },

    /// No track with this name in the clip
    #[error("Track not found: {name}")]
    TrackNotFound { name: String },

    /// A track with this name already exists in the clip
    #[error("Duplicate track: {name}")]
    DuplicateTrack { name: String },

    /// Negative or non-finite time value
    #[error("Invalid time value: {time}")]
    InvalidTime { time: f64 },

    /// Frame rate must be finite and positive
    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: f32 },

    /// Named ease not in the easing library
    #[error("Unknown ease function: {name}")]
    UnknownEase { name: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl RailsError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ValueKindMismatch { .. } | Self::KeyIndexOutOfRange { .. } => "track",
            Self::TrackNotFound { .. } | Self::DuplicateTrack { .. } => "clip",
            Self::InvalidTime { .. } | Self::InvalidFrameRate { .. } => "time",
            Self::UnknownEase { .. } => "ease",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for RailsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result alias for editing operations.
pub type Result<T> = std::result::Result<T, RailsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = RailsError::TrackNotFound {
            name: "alpha".into(),
        };
        assert_eq!(err.category(), "clip");
        assert_eq!(err.to_string(), "Track not found: alpha");

        let err = RailsError::InvalidFrameRate { fps: 0.0 };
        assert_eq!(err.category(), "time");
    }

    #[test]
    fn from_serde_json() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: RailsError = parse.unwrap_err().into();
        assert!(matches!(err, RailsError::Serialization { .. }));
    }
}
