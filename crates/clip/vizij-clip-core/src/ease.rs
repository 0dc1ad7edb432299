//! Easing curves.
//!
//! A tween element carries a named curve plus two shape parameters
//! (`overshoot_or_amplitude`, `period`) or a custom curve. Evaluation maps
//! normalized time in [0,1] to eased progress; Back/Elastic may leave [0,1].

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Default overshoot for the Back family.
pub const DEFAULT_OVERSHOOT: f32 = 1.70158;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    #[default]
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
    Flash,
    InFlash,
    OutFlash,
    InOutFlash,
    /// Use [`EaseSettings::curve`].
    Custom,
}

/// Author-defined easing curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EaseCurve {
    /// Cubic-bezier timing with control points (x1, y1, x2, y2).
    Bezier([f32; 4]),
    /// Piecewise-linear (time, value) keys.
    Keys(EaseKeys),
}

/// (time, value) keys kept sorted by time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<[f32; 2]>")]
pub struct EaseKeys(Vec<[f32; 2]>);

impl From<Vec<[f32; 2]>> for EaseKeys {
    fn from(mut keys: Vec<[f32; 2]>) -> Self {
        keys.sort_by(|a, b| a[0].total_cmp(&b[0]));
        Self(keys)
    }
}

impl EaseKeys {
    pub fn as_slice(&self) -> &[[f32; 2]] {
        &self.0
    }
}

impl EaseCurve {
    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            EaseCurve::Bezier(c) => bezier_ease_t(t, c[0], c[1], c[2], c[3]),
            EaseCurve::Keys(keys) => sample_keys(keys.as_slice(), t),
        }
    }
}

/// Ease selection stored on tween elements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EaseSettings {
    #[serde(default)]
    pub ease: Ease,
    /// Overshoot for Back, amplitude for Elastic, flash count for Flash.
    #[serde(default = "default_overshoot")]
    pub overshoot_or_amplitude: f32,
    /// Period for Elastic (fraction of the tween; 0 picks 0.3), in-flash
    /// weighting for Flash.
    #[serde(default)]
    pub period: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<EaseCurve>,
}

fn default_overshoot() -> f32 {
    DEFAULT_OVERSHOOT
}

impl Default for EaseSettings {
    fn default() -> Self {
        Self::named(Ease::default())
    }
}

impl EaseSettings {
    pub fn named(ease: Ease) -> Self {
        Self {
            ease,
            overshoot_or_amplitude: DEFAULT_OVERSHOOT,
            period: 0.0,
            curve: None,
        }
    }

    pub fn custom(curve: EaseCurve) -> Self {
        Self {
            curve: Some(curve),
            ..Self::named(Ease::Custom)
        }
    }

    /// Eased progress for normalized time `t`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match (self.ease, &self.curve) {
            (Ease::Custom, Some(curve)) => curve.evaluate(t),
            // Custom without a curve degrades to linear.
            (Ease::Custom, None) => t,
            (ease, _) => evaluate_named(ease, t, self.overshoot_or_amplitude, self.period),
        }
    }
}

fn evaluate_named(ease: Ease, t: f32, overshoot: f32, period: f32) -> f32 {
    match ease {
        Ease::Linear | Ease::Custom => t,
        Ease::InSine => 1.0 - (t * FRAC_PI_2).cos(),
        Ease::OutSine => (t * FRAC_PI_2).sin(),
        Ease::InOutSine => -0.5 * ((PI * t).cos() - 1.0),
        Ease::InQuad => t * t,
        Ease::OutQuad => -t * (t - 2.0),
        Ease::InOutQuad => in_out(t, |x| x * x),
        Ease::InCubic => t.powi(3),
        Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
        Ease::InOutCubic => in_out(t, |x| x.powi(3)),
        Ease::InQuart => t.powi(4),
        Ease::OutQuart => 1.0 - (1.0 - t).powi(4),
        Ease::InOutQuart => in_out(t, |x| x.powi(4)),
        Ease::InQuint => t.powi(5),
        Ease::OutQuint => 1.0 - (1.0 - t).powi(5),
        Ease::InOutQuint => in_out(t, |x| x.powi(5)),
        Ease::InExpo => in_expo(t),
        Ease::OutExpo => 1.0 - in_expo(1.0 - t),
        Ease::InOutExpo => in_out(t, in_expo),
        Ease::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        Ease::OutCirc => (1.0 - (t - 1.0) * (t - 1.0)).max(0.0).sqrt(),
        Ease::InOutCirc => in_out(t, |x| 1.0 - (1.0 - x * x).max(0.0).sqrt()),
        Ease::InElastic => in_elastic(t, overshoot, period),
        Ease::OutElastic => 1.0 - in_elastic(1.0 - t, overshoot, period),
        Ease::InOutElastic => in_out(t, |x| in_elastic(x, overshoot, period)),
        Ease::InBack => in_back(t, overshoot),
        Ease::OutBack => 1.0 - in_back(1.0 - t, overshoot),
        Ease::InOutBack => in_out(t, |x| in_back(x, overshoot * 1.525)),
        Ease::InBounce => 1.0 - out_bounce(1.0 - t),
        Ease::OutBounce => out_bounce(t),
        Ease::InOutBounce => in_out(t, |x| 1.0 - out_bounce(1.0 - x)),
        Ease::Flash => flash_wave(t, overshoot),
        Ease::InFlash => flash_wave(t, overshoot) * weight(t, period),
        Ease::OutFlash => flash_wave(t, overshoot) * weight(1.0 - t, period),
        Ease::InOutFlash => {
            let w = if t < 0.5 { t * 2.0 } else { (1.0 - t) * 2.0 };
            flash_wave(t, overshoot) * weight(w, period)
        }
    }
}

/// Mirror an "in" curve into an in-out curve.
#[inline]
fn in_out(t: f32, f: impl Fn(f32) -> f32) -> f32 {
    if t < 0.5 {
        0.5 * f(t * 2.0)
    } else {
        1.0 - 0.5 * f((1.0 - t) * 2.0)
    }
}

#[inline]
fn in_expo(t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else {
        2f32.powf(10.0 * (t - 1.0))
    }
}

#[inline]
fn in_back(t: f32, s: f32) -> f32 {
    t * t * ((s + 1.0) * t - s)
}

fn in_elastic(t: f32, amplitude: f32, period: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let p = if period > 0.0 { period } else { 0.3 };
    let (a, s) = if amplitude < 1.0 {
        (1.0, p / 4.0)
    } else {
        (amplitude, p / (2.0 * PI) * (1.0 / amplitude).asin())
    };
    let t1 = t - 1.0;
    -(a * 2f32.powf(10.0 * t1) * ((t1 - s) * (2.0 * PI) / p).sin())
}

fn out_bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

/// Triangle wave with `count` half-oscillations; ends at 1 for odd counts
/// and 0 for even counts.
fn flash_wave(t: f32, count: f32) -> f32 {
    let n = count.round().max(1.0);
    let step = t * n;
    let idx = step.floor();
    let frac = step - idx;
    if t >= 1.0 {
        return if (n as i32) % 2 == 1 { 1.0 } else { 0.0 };
    }
    if (idx as i32) % 2 == 0 {
        frac
    } else {
        1.0 - frac
    }
}

/// Flash weighting; `period` in [-1, 1] biases towards the start or the end.
#[inline]
fn weight(t: f32, period: f32) -> f32 {
    let exp = 1.0 + period.clamp(-1.0, 1.0).abs() * 2.0;
    if period < 0.0 {
        t.powf(1.0 / exp)
    } else {
        t.powf(exp)
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

/// `keys` must be sorted by time.
fn sample_keys(keys: &[[f32; 2]], t: f32) -> f32 {
    match keys.len() {
        0 => t,
        1 => keys[0][1],
        _ => {
            let first = keys[0];
            let last = keys[keys.len() - 1];
            if t <= first[0] {
                return first[1];
            }
            if t >= last[0] {
                return last[1];
            }
            for pair in keys.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if t >= a[0] && t <= b[0] {
                    let span = (b[0] - a[0]).max(f32::EPSILON);
                    return a[1] + (b[1] - a[1]) * ((t - a[0]) / span);
                }
            }
            last[1]
        }
    }
}
