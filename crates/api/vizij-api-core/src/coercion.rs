//! Coercion helpers between Value kinds.
//!
//! Authored payloads are stored as tagged values; when a plugin descriptor is
//! later changed to a different kind the payload is coerced instead of being
//! thrown away. Rules:
//! - Float/Int/UInt convert into each other (UInt clamps at 0)
//! - Vec2/Vec3/Vec4 pad with zeros or truncate
//! - the four-component kinds (Vec4, Quat, ColorRgba, Rect) reinterpret
//! - Text only coerces from Text

use thiserror::Error;

use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {from:?} into {to:?}")]
pub struct CoercionError {
    pub from: ValueKind,
    pub to: ValueKind,
}

fn is_scalar(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::Float | ValueKind::Int | ValueKind::UInt)
}

fn is_vector(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::Vec2 | ValueKind::Vec3 | ValueKind::Vec4)
}

fn is_quad(kind: ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::Vec4 | ValueKind::Quat | ValueKind::ColorRgba | ValueKind::Rect
    )
}

/// Coerce `value` into `kind` following the module rules.
pub fn coerce(value: &Value, kind: ValueKind) -> Result<Value, CoercionError> {
    let from = value.kind();
    if from == kind {
        return Ok(value.clone());
    }
    let compatible = (is_scalar(from) && is_scalar(kind))
        || (is_vector(from) && is_vector(kind))
        || (is_quad(from) && is_quad(kind));
    if !compatible {
        return Err(CoercionError { from, to: kind });
    }
    let (c, _) = value.components();
    Value::from_components(kind, c).ok_or(CoercionError { from, to: kind })
}

/// Attempt to coerce a Value into a scalar f32.
/// - numeric kinds -> first component
/// - Text -> parsed number or 0.0
pub fn to_float(v: &Value) -> f32 {
    match v {
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        other => other.components().0[0],
    }
}

/// Convert a Value into a Vec<f32> of its components (empty for text).
pub fn to_vector(v: &Value) -> Vec<f32> {
    let (c, n) = v.components();
    c[..n].to_vec()
}
