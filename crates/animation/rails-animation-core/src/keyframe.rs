use serde::{Deserialize, Serialize};

use crate::ease::Ease;
use crate::value::Value;

/// A value pinned to a frame. `ease` shapes the segment that starts here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub value: Value,
    #[serde(default)]
    pub ease: Ease,
}

impl Keyframe {
    #[inline]
    pub fn new(frame: u32, value: impl Into<Value>) -> Self {
        Self {
            frame,
            value: value.into(),
            ease: Ease::default(),
        }
    }

    #[inline]
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}
