//! Execution engine contract.
//!
//! The compiler only *builds* animations. Anything that advances time, applies
//! easing and calls getters/setters lives behind [`AnimationEngine`] and
//! [`Composite`]. [`crate::timeline`] provides an in-process implementation;
//! hosts with their own tween runtime implement these traits instead.
//!
//! Composite handles are shared (`Rc`) and use interior mutability, so every
//! control method takes `&self`. Implementations must not hold internal borrows
//! while invoking user callbacks: a callback may kill or pause the composite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use vizij_api_core::{AxisConstraint, Value};

use crate::ease::EaseSettings;

/// Reads the live property value. `None` once the target is gone.
pub type Getter = Rc<dyn Fn() -> Option<Value>>;

/// Writes a property value. Writing to a destroyed target is a no-op.
pub type Setter = Rc<dyn Fn(&Value)>;

/// A scheduled callback.
pub type Callback = Rc<dyn Fn()>;

/// Multicast callback list. Runtime-only: never serialized.
#[derive(Clone, Default)]
pub struct Callbacks(Vec<Callback>);

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: impl Fn() + 'static) -> &mut Self {
        self.0.push(Rc::new(callback));
        self
    }

    pub fn push_rc(&mut self, callback: Callback) -> &mut Self {
        self.0.push(callback);
        self
    }

    /// Invoke every listener in registration order.
    pub fn invoke_all(&self) {
        for cb in &self.0 {
            cb();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callbacks({})", self.0.len())
    }
}

/// Loop policy for tweens and composites.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    /// Jump back to the start at each loop.
    #[default]
    Restart,
    /// Play forward, then backward.
    Yoyo,
}

/// How a tween primitive moves its value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweenShape {
    /// Interpolate from a start value to an end value.
    #[default]
    Standard,
    /// Oscillate around the start value with decaying strength `to`.
    Punch,
    /// Pseudo-random offsets around the start value with strength `to`.
    Shake,
    /// Rotate a Vec2 around the centre `to` by `degrees`.
    Circle,
}

impl TweenShape {
    /// Shape tweens always read the start value live and take `to` literally,
    /// so they never expose a `Dynamic` slot.
    #[inline]
    pub fn supports_dynamic(self) -> bool {
        matches!(self, TweenShape::Standard)
    }
}

/// Parameters for shape tweens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeOptions {
    /// Oscillations over the tween (punch, shake).
    #[serde(default = "default_vibrato")]
    pub vibrato: u32,
    /// Backwards overshoot for punch, 0..1.
    #[serde(default = "default_elasticity")]
    pub elasticity: f32,
    /// Shake direction randomness in degrees, 0..180.
    #[serde(default = "default_randomness")]
    pub randomness: f32,
    /// Whether shake strength fades out.
    #[serde(default = "default_true")]
    pub fade_out: bool,
    /// Arc covered by circle tweens.
    #[serde(default = "default_degrees")]
    pub degrees: f32,
}

fn default_vibrato() -> u32 {
    10
}
fn default_elasticity() -> f32 {
    1.0
}
fn default_randomness() -> f32 {
    90.0
}
fn default_true() -> bool {
    true
}
fn default_degrees() -> f32 {
    360.0
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            vibrato: default_vibrato(),
            elasticity: default_elasticity(),
            randomness: default_randomness(),
            fade_out: true,
            degrees: default_degrees(),
        }
    }
}

/// Which end of a tween the literal value describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TweenDirection {
    /// Literal is the end value; the start is the explicit start value or the
    /// live value sampled when the tween starts.
    #[default]
    To,
    /// Literal is the start value; the end is the live value sampled when the
    /// tween starts.
    From,
}

/// Everything needed to create one tween primitive.
#[derive(Clone)]
pub struct TweenSpec {
    pub getter: Getter,
    pub setter: Setter,
    /// Literal value; its meaning depends on `direction`.
    pub to: Value,
    pub duration: f32,
    /// Explicit start value (only meaningful with `TweenDirection::To`).
    pub start_value: Option<Value>,
    pub direction: TweenDirection,
    /// Literals are offsets on top of the live value sampled at start.
    pub relative: bool,
    pub ease: EaseSettings,
    /// Loop count, at least 1.
    pub loops: u32,
    pub loop_type: LoopType,
    pub axis: AxisConstraint,
    pub shape: TweenShape,
    pub shape_options: ShapeOptions,
}

impl TweenSpec {
    pub fn new(getter: Getter, setter: Setter, to: Value, duration: f32) -> Self {
        Self {
            getter,
            setter,
            to,
            duration: duration.max(0.0),
            start_value: None,
            direction: TweenDirection::To,
            relative: false,
            ease: EaseSettings::default(),
            loops: 1,
            loop_type: LoopType::Restart,
            axis: AxisConstraint::NONE,
            shape: TweenShape::Standard,
            shape_options: ShapeOptions::default(),
        }
    }

    pub fn start_value(mut self, value: Value) -> Self {
        self.start_value = Some(value);
        self
    }

    /// Treat the literal as the start value and tween towards the live value.
    pub fn from_literal(mut self) -> Self {
        self.direction = TweenDirection::From;
        self
    }

    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    pub fn ease(mut self, ease: EaseSettings) -> Self {
        self.ease = ease;
        self
    }

    pub fn loops(mut self, loops: u32, loop_type: LoopType) -> Self {
        self.loops = loops.max(1);
        self.loop_type = loop_type;
        self
    }

    pub fn axis(mut self, axis: AxisConstraint) -> Self {
        self.axis = axis;
        self
    }

    pub fn shape(mut self, shape: TweenShape, options: ShapeOptions) -> Self {
        self.shape = shape;
        self.shape_options = options;
        self
    }

    /// Total span of the primitive including loops.
    #[inline]
    pub fn full_duration(&self) -> f32 {
        self.duration * self.loops as f32
    }
}

impl fmt::Debug for TweenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenSpec")
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("start_value", &self.start_value)
            .field("direction", &self.direction)
            .field("relative", &self.relative)
            .field("loops", &self.loops)
            .field("loop_type", &self.loop_type)
            .field("axis", &self.axis)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Composite-level callback slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Start,
    Update,
    StepComplete,
    Complete,
    Rewind,
}

/// A running, time-ordered composite animation.
pub trait Composite: fmt::Debug {
    /// Insert a tween primitive at an absolute offset.
    fn insert_tween(&self, at: f32, tween: TweenSpec);
    /// Insert a callback at an absolute offset.
    fn insert_callback(&self, at: f32, callback: Callback);
    /// Extend the composite with an empty gap.
    fn append_interval(&self, interval: f32);
    /// Length of one loop, before time scaling.
    fn duration(&self) -> f32;

    fn set_delay(&self, delay: f32);
    fn set_auto_kill(&self, auto_kill: bool);
    /// `loops` of -1 loops forever.
    fn set_loops(&self, loops: i32, loop_type: LoopType);
    fn set_id(&self, id: &str);
    fn id(&self) -> Option<String>;
    /// Play the whole composite reversed.
    fn set_inverted(&self, inverted: bool);
    /// Advance with unscaled time, ignoring the engine's global time scale.
    fn set_ignore_time_scale(&self, ignore: bool);
    fn set_time_scale(&self, scale: f32);
    fn time_scale(&self) -> f32;
    fn set_callbacks(&self, kind: CallbackKind, callbacks: Callbacks);

    fn play(&self);
    fn pause(&self);
    /// Go back to the start (delay included) and pause.
    fn rewind(&self);
    /// Rewind and play.
    fn restart(&self);
    /// Jump to the end state.
    fn complete(&self, with_callbacks: bool);
    /// Evaluate start values at time 0 without advancing.
    fn force_init(&self);
    /// Destroy the composite, optionally completing it first.
    fn kill(&self, complete: bool);

    /// False once killed.
    fn is_active(&self) -> bool;
    fn is_playing(&self) -> bool;
    fn is_complete(&self) -> bool;
    /// Elapsed time across loops, excluding delay.
    fn elapsed(&self) -> f32;
}

/// Shared handle to a composite.
pub type CompositeHandle = Rc<dyn Composite>;

/// Factory for composites.
pub trait AnimationEngine {
    fn create_composite(&self) -> CompositeHandle;
}
