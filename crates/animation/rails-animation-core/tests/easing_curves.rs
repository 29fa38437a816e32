use rails_animation_core::{
    bezier::{BezierPolynomial, SolverSettings},
    ease::{CurveControls, Ease, EaseKind},
    easing::EaseFunction,
    value::Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

const HANDLE_GRID: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// it should solve t monotonically in x for every handle layout with x handles in [0,1]
#[test]
fn solve_t_is_monotonic_for_unit_x_handles() {
    let settings = SolverSettings::default();
    for &x1 in &HANDLE_GRID {
        for &x2 in &HANDLE_GRID {
            // Mirrored and swapped handle layouts are covered by the grid.
            let poly = BezierPolynomial::from_controls(x1, 0.3, x2, 0.7);
            let mut last = 0.0f32;
            for i in 0..=200 {
                let x = i as f32 / 200.0;
                let t = poly.solve_t(x, &settings);
                assert!(
                    t + 1e-4 >= last,
                    "solve_t decreased for x1={x1} x2={x2} at x={x}: {t} < {last}"
                );
                last = t;
            }
        }
    }
}

/// it should produce a non-decreasing eased output when y handles also stay in [0,1]
#[test]
fn eased_output_monotonic_for_unit_handles() {
    for &(x1, y1, x2, y2) in &[
        (0.42, 0.0, 0.58, 1.0),
        (0.0, 0.0, 0.58, 1.0),
        (0.42, 0.0, 1.0, 1.0),
        (0.58, 1.0, 0.42, 0.0),
        (1.0, 0.0, 0.0, 1.0),
    ] {
        let ease = Ease::curve(x1, y1, x2, y2);
        let mut last = ease.ease_fraction(0.0);
        for i in 1..=100 {
            let y = ease.ease_fraction(i as f32 / 100.0);
            assert!(y + 1e-4 >= last, "({x1},{y1},{x2},{y2}) dipped at {i}");
            last = y;
        }
    }
}

/// it should hit from at t=0 and to at t=1 for canonical linear handles
#[test]
fn canonical_curve_endpoints() {
    let ease = Ease::curve(0.0, 0.0, 1.0, 1.0);
    let from = Value::Vec3([1.0, -2.0, 3.0]);
    let to = Value::Vec3([4.0, 8.0, -6.0]);
    assert!(ease.evaluate(&from, &to, 0.0).approx_eq(&from, 1e-6));
    assert!(ease.evaluate(&from, &to, 1.0).approx_eq(&to, 1e-6));
    let mid = ease.evaluate(&from, &to, 0.5);
    assert!(mid.approx_eq(&Value::Vec3([2.5, 3.0, -1.5]), 1e-4), "{mid:?}");
}

/// it should clamp t outside [0,1] rather than extrapolate
#[test]
fn out_of_range_t_is_clamped() {
    let ease = Ease::curve(0.25, 0.1, 0.25, 1.0);
    let from = Value::Scalar(0.0);
    let to = Value::Scalar(10.0);
    assert!(ease.evaluate(&from, &to, -3.0).approx_eq(&from, 1e-6));
    assert!(ease.evaluate(&from, &to, 7.0).approx_eq(&to, 1e-6));

    let named = Ease::named(EaseFunction::InOutQuad);
    assert!(named.evaluate(&from, &to, 2.0).approx_eq(&to, 1e-6));
}

/// it should always return from for a None ease regardless of t
#[test]
fn none_kind_holds_from() {
    let ease = Ease::none();
    let from = Value::Vec2([1.0, 1.0]);
    let to = Value::Vec2([5.0, 5.0]);
    for t in [-1.0, 0.0, 0.25, 0.5, 0.99, 1.0, 10.0, f32::NAN] {
        assert_eq!(ease.evaluate(&from, &to, t), from);
    }
    assert_eq!(ease.ease_fraction(0.7), 0.0);
}

/// it should let curve handles overshoot the value range
#[test]
fn curve_overshoot_extends_past_target() {
    // Out-back style handles.
    let ease = Ease::curve(0.175, 0.885, 0.32, 1.275);
    let peak = (0..=100)
        .map(|i| ease.ease_fraction(i as f32 / 100.0))
        .fold(f32::MIN, f32::max);
    assert!(peak > 1.0, "expected overshoot, peak={peak}");

    let v = ease.evaluate(&Value::Scalar(0.0), &Value::Scalar(100.0), 0.7);
    if let Value::Scalar(v) = v {
        assert!(v > 100.0, "value should overshoot, got {v}");
    } else {
        panic!("expected scalar");
    }
}

/// it should pick the named formula over the stored controls when kind is Named
#[test]
fn switching_kind_changes_evaluation() {
    let mut ease = Ease::curve(0.9, 0.0, 1.0, 0.1);
    let curve_mid = ease.ease_fraction(0.5);

    ease.set_kind(EaseKind::Named);
    ease.set_function(EaseFunction::Linear);
    approx(ease.ease_fraction(0.5), 0.5, 1e-6);

    ease.set_kind(EaseKind::Curve);
    approx(ease.ease_fraction(0.5), curve_mid, 1e-6);

    ease.set_controls(CurveControls::LINEAR);
    approx(ease.ease_fraction(0.5), 0.5, 1e-5);
}

/// it should honour solver settings passed explicitly
#[test]
fn explicit_solver_settings() {
    let ease = Ease::curve(0.42, 0.0, 0.58, 1.0);
    let bisect_only = SolverSettings {
        newton_iterations: 0,
        ..SolverSettings::default()
    };
    for i in 0..=10 {
        let t = i as f32 / 10.0;
        approx(
            ease.ease_fraction_with(t, &bisect_only),
            ease.ease_fraction(t),
            1e-4,
        );
    }
}
