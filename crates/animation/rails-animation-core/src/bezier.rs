//! Cubic-bezier timing curves.
//!
//! The curve runs from (0,0) to (1,1) with two user handles (x1,y1) and
//! (x2,y2). Evaluating an ease at `x` means finding the curve parameter `t`
//! with `x(t) == x` and returning `y(t)`:
//! - Newton-Raphson from `t = x` for a few iterations,
//! - bisection on [0,1] when the slope flattens out or Newton stalls.
//!
//! x1/x2 are expected in [0,1] which keeps `x(t)` monotonic; y is free, so
//! results may overshoot [0,1].

use serde::{Deserialize, Serialize};

/// Tuning for the root finder.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverSettings {
    /// Newton-Raphson iterations before falling back to bisection.
    pub newton_iterations: u32,
    /// Residual |x(t) - x| accepted as converged.
    pub epsilon: f32,
    /// Upper bound on bisection steps.
    pub bisection_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            newton_iterations: 8,
            epsilon: 1e-6,
            bisection_iterations: 64,
        }
    }
}

/// Slope below which a Newton step is not attempted.
const MIN_SLOPE: f32 = 1e-6;

/// Power-basis form of a unit cubic bezier:
/// `x(t) = ((ax*t + bx)*t + cx)*t`, same for y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierPolynomial {
    ax: f32,
    bx: f32,
    cx: f32,
    ay: f32,
    by: f32,
    cy: f32,
}

impl BezierPolynomial {
    pub fn from_controls(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    #[inline]
    pub fn sample_x(&self, t: f32) -> f32 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    #[inline]
    pub fn sample_y(&self, t: f32) -> f32 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    #[inline]
    pub fn sample_x_derivative(&self, t: f32) -> f32 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Curve parameter for horizontal position `x`.
    pub fn solve_t(&self, x: f32, settings: &SolverSettings) -> f32 {
        if x.is_nan() || x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        let mut t = x;
        for _ in 0..settings.newton_iterations {
            let residual = self.sample_x(t) - x;
            if residual.abs() < settings.epsilon {
                return t;
            }
            let slope = self.sample_x_derivative(t);
            if slope.abs() < MIN_SLOPE {
                break;
            }
            t -= residual / slope;
            if !(0.0..=1.0).contains(&t) {
                // Left the curve's domain; bisection restarts from x.
                break;
            }
        }

        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        t = x;
        for _ in 0..settings.bisection_iterations {
            let sampled = self.sample_x(t);
            if (sampled - x).abs() < settings.epsilon {
                break;
            }
            if sampled < x {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
        t
    }

    /// Eased output for horizontal position `x`. Exact 0 and 1 at the ends.
    #[inline]
    pub fn solve(&self, x: f32, settings: &SolverSettings) -> f32 {
        if x.is_nan() || x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.sample_y(self.solve_t(x, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn endpoints_clamp_without_iterating() {
        let poly = BezierPolynomial::from_controls(0.42, 0.0, 0.58, 1.0);
        let s = SolverSettings::default();
        assert_eq!(poly.solve_t(-0.5, &s), 0.0);
        assert_eq!(poly.solve_t(0.0, &s), 0.0);
        assert_eq!(poly.solve_t(1.0, &s), 1.0);
        assert_eq!(poly.solve_t(3.0, &s), 1.0);
        assert_eq!(poly.solve_t(f32::NAN, &s), 0.0);
    }

    #[test]
    fn linear_handles_are_identity() {
        let poly = BezierPolynomial::from_controls(0.0, 0.0, 1.0, 1.0);
        let s = SolverSettings::default();
        for i in 0..=20 {
            let x = i as f32 / 20.0;
            approx(poly.solve(x, &s), x, 1e-5);
        }
    }

    #[test]
    fn residual_is_small_for_ease_in_out() {
        let poly = BezierPolynomial::from_controls(0.42, 0.0, 0.58, 1.0);
        let s = SolverSettings::default();
        for i in 1..100 {
            let x = i as f32 / 100.0;
            let t = poly.solve_t(x, &s);
            approx(poly.sample_x(t), x, 1e-5);
        }
    }

    #[test]
    fn flat_slope_falls_back_to_bisection() {
        // x1 = 1, x2 = 0 gives x'(0.5) == 0.
        let poly = BezierPolynomial::from_controls(1.0, 0.0, 0.0, 1.0);
        let s = SolverSettings::default();
        let t = poly.solve_t(0.5, &s);
        approx(poly.sample_x(t), 0.5, 1e-5);

        // No Newton at all still converges.
        let bisect_only = SolverSettings {
            newton_iterations: 0,
            ..SolverSettings::default()
        };
        let poly = BezierPolynomial::from_controls(0.25, 0.1, 0.25, 1.0);
        let t = poly.solve_t(0.3, &bisect_only);
        approx(poly.sample_x(t), 0.3, 1e-5);
    }

    #[test]
    fn overshooting_handles_leave_unit_range() {
        // Back-style curve dips below zero early.
        let poly = BezierPolynomial::from_controls(0.6, -0.28, 0.735, 0.045);
        let s = SolverSettings::default();
        assert!(poly.solve(0.2, &s) < 0.0);
    }
}
