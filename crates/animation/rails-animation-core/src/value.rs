//! Animated value kinds: scalar, 2D and 3D vectors.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [lerp_f32(a[0], b[0], t), lerp_f32(a[1], b[1], t)]
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
        }
    }

    /// Default value for a freshly created key of this kind.
    #[inline]
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Scalar => Value::Scalar(0.0),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
        }
    }

    /// Component-wise lerp. `t` is not clamped so eased fractions outside
    /// [0,1] overshoot. Mismatched kinds keep the left value.
    pub fn lerp(a: &Value, b: &Value, t: f32) -> Value {
        match (a, b) {
            (Value::Scalar(va), Value::Scalar(vb)) => Value::Scalar(lerp_f32(*va, *vb, t)),
            (Value::Vec2(va), Value::Vec2(vb)) => Value::Vec2(lerp_vec2(*va, *vb, t)),
            (Value::Vec3(va), Value::Vec3(vb)) => Value::Vec3(lerp_vec3(*va, *vb, t)),
            _ => {
                log::warn!(
                    "lerp between {:?} and {:?}; holding left value",
                    a.kind(),
                    b.kind()
                );
                *a
            }
        }
    }

    pub fn components(&self) -> &[f32] {
        match self {
            Value::Scalar(v) => std::slice::from_ref(v),
            Value::Vec2(v) => v,
            Value::Vec3(v) => v,
        }
    }

    /// True when both values share a kind and every component is within `eps`.
    pub fn approx_eq(&self, other: &Value, eps: f32) -> bool {
        self.kind() == other.kind()
            && self
                .components()
                .iter()
                .zip(other.components())
                .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}
