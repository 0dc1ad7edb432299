//! Axis constraint masks for vector tweens.
//!
//! A constrained tween writes only the selected components. Snapshots taken for
//! a constrained tween zero-fill the free axes; the executing primitive merges
//! its result back over the live value so the free axes are left untouched.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

use crate::value::{Value, ValueKind};

/// Bit mask over the X/Y/Z/W components. The empty mask means "no constraint":
/// every component is written.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisConstraint(u8);

impl AxisConstraint {
    pub const NONE: AxisConstraint = AxisConstraint(0);
    pub const X: AxisConstraint = AxisConstraint(1);
    pub const Y: AxisConstraint = AxisConstraint(1 << 1);
    pub const Z: AxisConstraint = AxisConstraint(1 << 2);
    pub const W: AxisConstraint = AxisConstraint(1 << 3);

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        AxisConstraint(bits & 0b1111)
    }

    #[inline]
    pub fn is_unconstrained(self) -> bool {
        self.0 == 0
    }

    /// True if component `index` (0 = x) is written under this mask.
    #[inline]
    pub fn includes(self, index: usize) -> bool {
        self.is_unconstrained() || (index < 4 && self.0 & (1 << index) != 0)
    }

    /// Whether the mask has any effect on values of `kind`.
    #[inline]
    pub fn applies_to(self, kind: ValueKind) -> bool {
        !self.is_unconstrained() && kind.supports_axis_constraint()
    }

    /// Zero-fill the components outside the mask. Kinds that do not support
    /// axis constraints are returned unchanged.
    pub fn mask(self, value: &Value) -> Value {
        if !self.applies_to(value.kind()) {
            return value.clone();
        }
        let (mut c, n) = value.components();
        for (i, slot) in c.iter_mut().enumerate().take(n) {
            if !self.includes(i) {
                *slot = 0.0;
            }
        }
        Value::from_components(value.kind(), c).unwrap_or_else(|| value.clone())
    }

    /// Take the constrained components from `computed` and the rest from `live`.
    pub fn merge(self, live: &Value, computed: &Value) -> Value {
        if !self.applies_to(computed.kind()) || live.kind() != computed.kind() {
            return computed.clone();
        }
        let (l, n) = live.components();
        let (mut c, _) = computed.components();
        for (i, slot) in c.iter_mut().enumerate().take(n) {
            if !self.includes(i) {
                *slot = l[i];
            }
        }
        Value::from_components(computed.kind(), c).unwrap_or_else(|| computed.clone())
    }
}

impl BitOr for AxisConstraint {
    type Output = AxisConstraint;

    fn bitor(self, rhs: Self) -> Self::Output {
        AxisConstraint(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_zero_fills_free_axes() {
        let m = AxisConstraint::X | AxisConstraint::Z;
        assert_eq!(m.mask(&Value::vec3(1.0, 2.0, 3.0)), Value::vec3(1.0, 0.0, 3.0));
        // Scalars ignore the mask.
        assert_eq!(m.mask(&Value::Float(4.0)), Value::Float(4.0));
    }

    #[test]
    fn merge_preserves_live_free_axes() {
        let m = AxisConstraint::Y;
        let merged = m.merge(&Value::vec2(9.0, 9.0), &Value::vec2(0.0, 5.0));
        assert_eq!(merged, Value::vec2(9.0, 5.0));
    }

    #[test]
    fn unconstrained_writes_everything() {
        let m = AxisConstraint::NONE;
        assert!(m.includes(3));
        assert_eq!(
            m.merge(&Value::vec2(1.0, 1.0), &Value::vec2(2.0, 2.0)),
            Value::vec2(2.0, 2.0)
        );
    }
}
