//! Interpolation helpers:
//! - lerp_f32 / lerp_vecN (component-wise)
//! - nlerp_quat (quaternion NLERP with shortest-arc sign correction)
//! - reveal_text (character reveal for text tweens)
//! - lerp_value (dispatch across Value kinds)

use crate::value::Value;

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

#[inline]
pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        for c in q.iter_mut() {
            *c *= inv_len;
        }
    }
    q
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        for c in b.iter_mut() {
            *c = -*c;
        }
    }
    normalize4(lerp_vec4(a, b, t))
}

/// Reveal `to` over `from`: the first `round(t * len)` characters come from
/// `to`, the remainder from `from`.
pub fn reveal_text(from: &str, to: &str, t: f32) -> String {
    if t <= 0.0 {
        return from.to_string();
    }
    if t >= 1.0 {
        return to.to_string();
    }
    let to_chars: Vec<char> = to.chars().collect();
    let from_chars: Vec<char> = from.chars().collect();
    let total = to_chars.len().max(from_chars.len());
    let shown = ((total as f32) * t).round() as usize;
    let mut out: String = to_chars.iter().take(shown).collect();
    if shown < from_chars.len() {
        out.extend(&from_chars[shown..]);
    }
    out
}

/// Interpolate between two values of the same kind. `t` may leave [0,1]
/// (overshooting eases). Integer kinds round; mismatched kinds keep `a`.
pub fn lerp_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Float(va), Value::Float(vb)) => Value::Float(lerp_f32(*va, *vb, t)),
        (Value::Int(va), Value::Int(vb)) => {
            Value::Int(lerp_f32(*va as f32, *vb as f32, t).round() as i32)
        }
        (Value::UInt(va), Value::UInt(vb)) => {
            Value::UInt(lerp_f32(*va as f32, *vb as f32, t).round().max(0.0) as u32)
        }
        (Value::Text(va), Value::Text(vb)) => Value::Text(reveal_text(va, vb, t)),
        (Value::Vec2(va), Value::Vec2(vb)) => Value::Vec2(lerp_vec2(*va, *vb, t)),
        (Value::Vec3(va), Value::Vec3(vb)) => Value::Vec3(lerp_vec3(*va, *vb, t)),
        (Value::Vec4(va), Value::Vec4(vb)) => Value::Vec4(lerp_vec4(*va, *vb, t)),
        (Value::Quat(qa), Value::Quat(qb)) => Value::Quat(nlerp_quat(*qa, *qb, t)),
        (Value::ColorRgba(ca), Value::ColorRgba(cb)) => Value::ColorRgba(lerp_vec4(*ca, *cb, t)),
        (Value::Rect(ra), Value::Rect(rb)) => Value::Rect(lerp_vec4(*ra, *rb, t)),
        // Fail-soft on mismatched kinds.
        _ => a.clone(),
    }
}
