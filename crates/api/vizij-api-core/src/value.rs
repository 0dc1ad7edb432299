//! Value: runtime instances of every animatable property kind.
//! All numeric types use f32 except the integer kinds.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`]. Plugin descriptors declare the kind they read
/// and write; authored payloads are checked (and coerced) against it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Int,
    UInt,
    Text,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    ColorRgba,
    Rect,
}

impl ValueKind {
    /// Number of float components carried by the kind (0 for text).
    #[inline]
    pub fn component_count(self) -> usize {
        match self {
            ValueKind::Float | ValueKind::Int | ValueKind::UInt => 1,
            ValueKind::Text => 0,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Vec4 | ValueKind::Quat | ValueKind::ColorRgba | ValueKind::Rect => 4,
        }
    }

    /// Kinds that accept an axis constraint mask.
    #[inline]
    pub fn supports_axis_constraint(self) -> bool {
        matches!(self, ValueKind::Vec2 | ValueKind::Vec3 | ValueKind::Vec4)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Signed integer; interpolated in float space and rounded
    Int(i32),

    /// Unsigned integer; interpolated in float space, rounded and clamped at 0
    UInt(u32),

    /// Text; interpolated by revealing the target characters
    Text(String),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// RGBA color (linear by convention)
    ColorRgba([f32; 4]),

    /// Rectangle (x, y, width, height)
    Rect([f32; 4]),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Text(_) => ValueKind::Text,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Rect(_) => ValueKind::Rect,
        }
    }

    /// Neutral value for a kind. Quaternions default to identity and colors to
    /// opaque white, matching what a freshly authored slot shows.
    pub fn default_for(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Int => Value::Int(0),
            ValueKind::UInt => Value::UInt(0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::Quat => Value::Quat([0.0, 0.0, 0.0, 1.0]),
            ValueKind::ColorRgba => Value::ColorRgba([1.0; 4]),
            ValueKind::Rect => Value::Rect([0.0; 4]),
        }
    }

    /// Float components packed into a fixed array plus the used length.
    /// Integers are widened to f32; text has no components.
    #[inline]
    pub fn components(&self) -> ([f32; 4], usize) {
        match self {
            Value::Float(v) => ([*v, 0.0, 0.0, 0.0], 1),
            Value::Int(v) => ([*v as f32, 0.0, 0.0, 0.0], 1),
            Value::UInt(v) => ([*v as f32, 0.0, 0.0, 0.0], 1),
            Value::Text(_) => ([0.0; 4], 0),
            Value::Vec2(a) => ([a[0], a[1], 0.0, 0.0], 2),
            Value::Vec3(a) => ([a[0], a[1], a[2], 0.0], 3),
            Value::Vec4(a) | Value::Quat(a) | Value::ColorRgba(a) | Value::Rect(a) => (*a, 4),
        }
    }

    /// Rebuild a value of `kind` from float components. Returns `None` for text.
    pub fn from_components(kind: ValueKind, c: [f32; 4]) -> Option<Value> {
        let v = match kind {
            ValueKind::Float => Value::Float(c[0]),
            ValueKind::Int => Value::Int(c[0].round() as i32),
            ValueKind::UInt => Value::UInt(c[0].round().max(0.0) as u32),
            ValueKind::Text => return None,
            ValueKind::Vec2 => Value::Vec2([c[0], c[1]]),
            ValueKind::Vec3 => Value::Vec3([c[0], c[1], c[2]]),
            ValueKind::Vec4 => Value::Vec4(c),
            ValueKind::Quat => Value::Quat(c),
            ValueKind::ColorRgba => Value::ColorRgba(c),
            ValueKind::Rect => Value::Rect(c),
        };
        Some(v)
    }

    /// Apply `self` as a relative offset on top of `base`.
    ///
    /// Numeric kinds add component-wise, quaternions compose (`base * self`)
    /// and text appends. Mismatched kinds return `self` unchanged.
    pub fn offset_from(&self, base: &Value) -> Value {
        match (base, self) {
            (Value::Text(b), Value::Text(o)) => Value::Text(format!("{b}{o}")),
            (Value::Quat(b), Value::Quat(o)) => Value::Quat(quat_mul(*b, *o)),
            (Value::Int(b), Value::Int(o)) => Value::Int(b.wrapping_add(*o)),
            (Value::UInt(b), Value::UInt(o)) => Value::UInt(b.saturating_add(*o)),
            _ if base.kind() == self.kind() => {
                let (b, n) = base.components();
                let (o, _) = self.components();
                let mut out = [0.0f32; 4];
                for i in 0..n {
                    out[i] = b[i] + o[i];
                }
                Value::from_components(self.kind(), out).unwrap_or_else(|| self.clone())
            }
            _ => self.clone(),
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Value::Vec2([x, y])
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

/// Hamilton product of two (x, y, z, w) quaternions.
#[inline]
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}
