//! Named easing functions (closed-form).
//!
//! The usual Penner families in In/Out/InOut flavours. Every function maps
//! 0 -> 0 and 1 -> 1 exactly; Elastic and Back overshoot in between.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RailsError;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EaseFunction {
    #[default]
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

impl EaseFunction {
    pub const ALL: [EaseFunction; 31] = [
        Self::Linear,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InQuint,
        Self::OutQuint,
        Self::InOutQuint,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
        Self::InCirc,
        Self::OutCirc,
        Self::InOutCirc,
        Self::InElastic,
        Self::OutElastic,
        Self::InOutElastic,
        Self::InBack,
        Self::OutBack,
        Self::InOutBack,
        Self::InBounce,
        Self::OutBounce,
        Self::InOutBounce,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::InSine => "InSine",
            Self::OutSine => "OutSine",
            Self::InOutSine => "InOutSine",
            Self::InQuad => "InQuad",
            Self::OutQuad => "OutQuad",
            Self::InOutQuad => "InOutQuad",
            Self::InCubic => "InCubic",
            Self::OutCubic => "OutCubic",
            Self::InOutCubic => "InOutCubic",
            Self::InQuart => "InQuart",
            Self::OutQuart => "OutQuart",
            Self::InOutQuart => "InOutQuart",
            Self::InQuint => "InQuint",
            Self::OutQuint => "OutQuint",
            Self::InOutQuint => "InOutQuint",
            Self::InExpo => "InExpo",
            Self::OutExpo => "OutExpo",
            Self::InOutExpo => "InOutExpo",
            Self::InCirc => "InCirc",
            Self::OutCirc => "OutCirc",
            Self::InOutCirc => "InOutCirc",
            Self::InElastic => "InElastic",
            Self::OutElastic => "OutElastic",
            Self::InOutElastic => "InOutElastic",
            Self::InBack => "InBack",
            Self::OutBack => "OutBack",
            Self::InOutBack => "InOutBack",
            Self::InBounce => "InBounce",
            Self::OutBounce => "OutBounce",
            Self::InOutBounce => "InOutBounce",
        }
    }

    /// Eased fraction for `t`, clamped to [0,1] first.
    pub fn evaluate(&self, t: f32) -> f32 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,

            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,

            Self::InQuad => ease_in_pow(t, 2),
            Self::OutQuad => ease_out_pow(t, 2),
            Self::InOutQuad => ease_in_out_pow(t, 2),
            Self::InCubic => ease_in_pow(t, 3),
            Self::OutCubic => ease_out_pow(t, 3),
            Self::InOutCubic => ease_in_out_pow(t, 3),
            Self::InQuart => ease_in_pow(t, 4),
            Self::OutQuart => ease_out_pow(t, 4),
            Self::InOutQuart => ease_in_out_pow(t, 4),
            Self::InQuint => ease_in_pow(t, 5),
            Self::OutQuint => ease_out_pow(t, 5),
            Self::InOutQuint => ease_in_out_pow(t, 5),

            Self::InExpo => 2f32.powf(10.0 * t - 10.0),
            Self::OutExpo => 1.0 - 2f32.powf(-10.0 * t),
            Self::InOutExpo => {
                if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }

            Self::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::OutCirc => (1.0 - (t - 1.0) * (t - 1.0)).max(0.0).sqrt(),
            Self::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }

            Self::InElastic => -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin(),
            Self::OutElastic => 2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0,
            Self::InOutElastic => {
                let s = ((20.0 * t - 11.125) * ELASTIC_C5).sin();
                if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * s) / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * s) / 2.0 + 1.0
                }
            }

            Self::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::OutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
            Self::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }

            Self::InBounce => 1.0 - bounce_out(1.0 - t),
            Self::OutBounce => bounce_out(t),
            Self::InOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

#[inline]
fn ease_in_pow(t: f32, n: i32) -> f32 {
    t.powi(n)
}

#[inline]
fn ease_out_pow(t: f32, n: i32) -> f32 {
    1.0 - (1.0 - t).powi(n)
}

#[inline]
fn ease_in_out_pow(t: f32, n: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn normalize_name(s: &str) -> String {
    let lowered: String = s
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    lowered
        .strip_prefix("ease")
        .map(str::to_string)
        .unwrap_or(lowered)
}

impl FromStr for EaseFunction {
    type Err = RailsError;

    /// Accepts `InOutSine`, `in_out_sine`, `easeInOutSine` and similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().to_lowercase() == wanted)
            .ok_or_else(|| RailsError::UnknownEase { name: s.to_string() })
    }
}

impl fmt::Display for EaseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
