//! Per-key ease descriptor.
//!
//! A keyframe's ease shapes the segment that starts at that key:
//! - `None` holds the key's value until the next key (step),
//! - `Curve` runs time through a user-authored cubic bezier,
//! - `Named` uses one of the closed-form functions in [`crate::easing`].

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::bezier::{BezierPolynomial, SolverSettings};
use crate::easing::EaseFunction;
use crate::value::Value;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EaseKind {
    None,
    #[default]
    Curve,
    Named,
}

/// Bezier handle positions in the unit square.
///
/// Stored on disk as a 4-float array ordered `(x1, x2, y1, y2)`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct CurveControls {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CurveControls {
    pub const LINEAR: CurveControls = CurveControls {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    /// x handles are clamped into [0,1]; y handles are free.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: clamp_unit(x1),
            y1,
            x2: clamp_unit(x2),
            y2,
        }
    }

    #[inline]
    pub fn x1(&self) -> f32 {
        self.x1
    }

    #[inline]
    pub fn y1(&self) -> f32 {
        self.y1
    }

    #[inline]
    pub fn x2(&self) -> f32 {
        self.x2
    }

    #[inline]
    pub fn y2(&self) -> f32 {
        self.y2
    }

    /// `(x1, y1, x2, y2)`
    #[inline]
    pub fn as_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn polynomial(&self) -> BezierPolynomial {
        BezierPolynomial::from_controls(self.x1, self.y1, self.x2, self.y2)
    }
}

#[inline]
fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl Default for CurveControls {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl From<[f32; 4]> for CurveControls {
    fn from(packed: [f32; 4]) -> Self {
        let [x1, x2, y1, y2] = packed;
        Self::new(x1, y1, x2, y2)
    }
}

impl From<CurveControls> for [f32; 4] {
    fn from(c: CurveControls) -> Self {
        [c.x1, c.x2, c.y1, c.y2]
    }
}

/// Ease attached to a keyframe.
///
/// The bezier polynomial is built on first use and dropped whenever the
/// kind or controls change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ease {
    kind: EaseKind,
    #[serde(default)]
    controls: CurveControls,
    #[serde(default)]
    function: EaseFunction,
    #[serde(skip)]
    polynomial: OnceCell<BezierPolynomial>,
}

impl Ease {
    fn with(kind: EaseKind, controls: CurveControls, function: EaseFunction) -> Self {
        Self {
            kind,
            controls,
            function,
            polynomial: OnceCell::new(),
        }
    }

    /// Step ease: hold the key's value.
    pub fn none() -> Self {
        Self::with(EaseKind::None, CurveControls::LINEAR, EaseFunction::Linear)
    }

    /// Curve ease with handles (0,0)-(1,1).
    pub fn linear() -> Self {
        Self::with(EaseKind::Curve, CurveControls::LINEAR, EaseFunction::Linear)
    }

    pub fn curve(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::with(
            EaseKind::Curve,
            CurveControls::new(x1, y1, x2, y2),
            EaseFunction::Linear,
        )
    }

    pub fn named(function: EaseFunction) -> Self {
        Self::with(EaseKind::Named, CurveControls::LINEAR, function)
    }

    #[inline]
    pub fn kind(&self) -> EaseKind {
        self.kind
    }

    #[inline]
    pub fn controls(&self) -> CurveControls {
        self.controls
    }

    #[inline]
    pub fn function(&self) -> EaseFunction {
        self.function
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        self.kind == EaseKind::None
    }

    pub fn set_kind(&mut self, kind: EaseKind) {
        if self.kind != kind {
            self.kind = kind;
            self.polynomial.take();
        }
    }

    pub fn set_controls(&mut self, controls: CurveControls) {
        if self.controls != controls {
            self.controls = controls;
            self.polynomial.take();
        }
    }

    pub fn set_function(&mut self, function: EaseFunction) {
        if self.function != function {
            self.function = function;
            self.polynomial.take();
        }
    }

    /// True once the bezier polynomial has been computed and not invalidated.
    pub fn is_polynomial_cached(&self) -> bool {
        self.polynomial.get().is_some()
    }

    /// Eased fraction for normalized time `t` with default solver settings.
    pub fn ease_fraction(&self, t: f32) -> f32 {
        self.ease_fraction_with(t, &SolverSettings::default())
    }

    pub fn ease_fraction_with(&self, t: f32, settings: &SolverSettings) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self.kind {
            EaseKind::None => 0.0,
            EaseKind::Curve => self
                .polynomial
                .get_or_init(|| self.controls.polynomial())
                .solve(t, settings),
            EaseKind::Named => self.function.evaluate(t),
        }
    }

    /// Interpolated value between `from` and `to` at normalized time `t`.
    pub fn evaluate(&self, from: &Value, to: &Value, t: f32) -> Value {
        self.evaluate_with(from, to, t, &SolverSettings::default())
    }

    pub fn evaluate_with(
        &self,
        from: &Value,
        to: &Value,
        t: f32,
        settings: &SolverSettings,
    ) -> Value {
        if self.kind == EaseKind::None {
            return *from;
        }
        Value::lerp(from, to, self.ease_fraction_with(t, settings))
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::linear()
    }
}

impl PartialEq for Ease {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.controls == other.controls
            && self.function == other.function
    }
}
