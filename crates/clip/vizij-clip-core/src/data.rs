//! Clip data model: clips, layers, elements and their settings.
//!
//! Everything here serializes except callback lists and the cached composite
//! handle, which are runtime-only.

use serde::{Deserialize, Serialize};

use vizij_api_core::{AxisConstraint, Value, ValueKind};

use crate::ease::EaseSettings;
use crate::engine::{Callbacks, CallbackKind, LoopType, ShapeOptions};
use crate::facade::HandleCache;
use crate::ids::{ClipId, ElementId, LayerId};
use crate::registry::SubAddress;
use crate::startup::StartupBehavior;
use crate::target::TargetRef;

fn default_true() -> bool {
    true
}
fn default_loops() -> i32 {
    1
}
fn default_pin() -> i32 {
    -1
}

/// How the clip's overall duration is controlled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Play at `time_scale`.
    #[default]
    FixedScale,
    /// Stretch or compress the clip to last `duration_overload` seconds.
    DurationOverload,
}

/// Playback configuration for a clip (or a variant overriding it).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    pub startup_behavior: StartupBehavior,
    /// Seconds before the composite starts playing.
    pub startup_delay: f32,
    pub autoplay: bool,
    /// Destroy the composite on completion.
    pub autokill: bool,
    pub ignore_time_scale: bool,
    pub time_mode: TimeMode,
    /// Used by `TimeMode::FixedScale`.
    pub time_scale: f32,
    /// Target duration in seconds, used by `TimeMode::DurationOverload`.
    pub duration_overload: f32,
    /// Composite loop count; -1 loops forever.
    pub loops: i32,
    pub loop_type: LoopType,
    /// Play the whole clip reversed.
    pub inverted: bool,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            startup_behavior: StartupBehavior::default(),
            startup_delay: 0.0,
            autoplay: true,
            autokill: true,
            ignore_time_scale: false,
            time_mode: TimeMode::default(),
            time_scale: 1.0,
            duration_overload: 1.0,
            loops: 1,
            loop_type: LoopType::default(),
            inverted: false,
        }
    }
}

impl ClipSettings {
    /// Copy with a per-call startup behavior and autoplay override.
    pub fn with_overrides(
        &self,
        behavior: Option<StartupBehavior>,
        autoplay: Option<bool>,
    ) -> ClipSettings {
        let mut out = self.clone();
        if let Some(b) = behavior {
            out.startup_behavior = b;
        }
        if let Some(p) = autoplay {
            out.autoplay = p;
        }
        out
    }
}

/// Whether a value slot holds a literal or samples the live value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    #[default]
    Direct,
    Dynamic,
}

/// One end of a tween: a literal, or "whatever the property holds at start".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueSlot {
    #[serde(default)]
    pub mode: ResolutionMode,
    /// Literal payload; kept even when `Dynamic` so switching back is lossless.
    pub value: Value,
}

impl ValueSlot {
    pub fn direct(value: Value) -> Self {
        Self {
            mode: ResolutionMode::Direct,
            value,
        }
    }

    pub fn dynamic(kind: ValueKind) -> Self {
        Self {
            mode: ResolutionMode::Dynamic,
            value: Value::default_for(kind),
        }
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.mode == ResolutionMode::Dynamic
    }
}

/// Reference to a descriptor inside a plugin: stable id first, legacy
/// positional index as fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub index: i32,
}

impl DescriptorRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            index: -1,
        }
    }

    pub fn index(index: i32) -> Self {
        Self { id: None, index }
    }
}

/// Payload shared by targeted and global tweens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenBody {
    pub duration: f32,
    /// Object to animate. Optional for global tweens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
    /// Global plugin id; unused by targeted tweens (plugin comes from the
    /// target's type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(default)]
    pub descriptor: DescriptorRef,
    #[serde(default)]
    pub sub_address: SubAddress,
    #[serde(default)]
    pub ease: EaseSettings,
    /// Loop count; -1 loops forever.
    #[serde(default = "default_loops")]
    pub loops: i32,
    #[serde(default)]
    pub loop_type: LoopType,
    #[serde(default)]
    pub is_relative: bool,
    #[serde(default)]
    pub axis: AxisConstraint,
    pub from: ValueSlot,
    pub to: ValueSlot,
    #[serde(default)]
    pub shape: ShapeOptions,
}

impl TweenBody {
    /// Targeted tween towards `to`, starting from the live value.
    pub fn new(
        target: impl Into<TargetRef>,
        descriptor: DescriptorRef,
        duration: f32,
        to: Value,
    ) -> Self {
        let kind = to.kind();
        Self {
            duration,
            target: Some(target.into()),
            plugin_id: None,
            descriptor,
            sub_address: SubAddress::default(),
            ease: EaseSettings::default(),
            loops: 1,
            loop_type: LoopType::Restart,
            is_relative: false,
            axis: AxisConstraint::NONE,
            from: ValueSlot::dynamic(kind),
            to: ValueSlot::direct(to),
            shape: ShapeOptions::default(),
        }
    }

    /// Global (targetless) tween on `plugin_id`.
    pub fn global(
        plugin_id: impl Into<String>,
        descriptor: DescriptorRef,
        duration: f32,
        to: Value,
    ) -> Self {
        let mut body = Self::new("", descriptor, duration, to);
        body.target = None;
        body.plugin_id = Some(plugin_id.into());
        body
    }

    pub fn with_from(mut self, from: Value) -> Self {
        self.from = ValueSlot::direct(from);
        self
    }

    pub fn with_dynamic_to(mut self) -> Self {
        self.to.mode = ResolutionMode::Dynamic;
        self
    }

    pub fn with_ease(mut self, ease: EaseSettings) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_loops(mut self, loops: i32, loop_type: LoopType) -> Self {
        self.loops = loops;
        self.loop_type = loop_type;
        self
    }

    pub fn relative(mut self) -> Self {
        self.is_relative = true;
        self
    }

    pub fn with_axis(mut self, axis: AxisConstraint) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_sub_address(mut self, sub_address: SubAddress) -> Self {
        self.sub_address = sub_address;
        self
    }

    /// Span including finite loops; infinite loops count once.
    pub fn effective_duration(&self) -> f32 {
        let loops = if self.loops > 1 { self.loops as f32 } else { 1.0 };
        self.duration.max(0.0) * loops
    }
}

/// Arguments passed to an action. Which fields matter is declared by the
/// action descriptor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPayload {
    pub flag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub float0: f32,
    pub float1: f32,
    pub int: i32,
    /// Secondary object reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<TargetRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionBody {
    pub plugin_id: String,
    #[serde(default)]
    pub descriptor: DescriptorRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
    #[serde(default)]
    pub payload: ActionPayload,
    /// Also schedule the action in editor preview.
    #[serde(default)]
    pub execute_in_preview: bool,
}

/// Event marker; listeners are attached at runtime.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventBody {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip)]
    pub listeners: Callbacks,
}

impl PartialEq for EventBody {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalBody {
    pub duration: f32,
}

/// What an element does when it is reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementBody {
    Tween(TweenBody),
    GlobalTween(TweenBody),
    Action(ActionBody),
    Event(EventBody),
    Interval(IntervalBody),
}

/// Discriminant of [`ElementBody`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Tween,
    GlobalTween,
    Action,
    Event,
    Interval,
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Tween(_) => ElementKind::Tween,
            ElementBody::GlobalTween(_) => ElementKind::GlobalTween,
            ElementBody::Action(_) => ElementKind::Action,
            ElementBody::Event(_) => ElementKind::Event,
            ElementBody::Interval(_) => ElementKind::Interval,
        }
    }

    /// Span occupied on the timeline.
    pub fn effective_duration(&self) -> f32 {
        match self {
            ElementBody::Tween(t) | ElementBody::GlobalTween(t) => t.effective_duration(),
            ElementBody::Interval(i) => i.duration.max(0.0),
            ElementBody::Action(_) | ElementBody::Event(_) => 0.0,
        }
    }

    pub fn tween(&self) -> Option<&TweenBody> {
        match self {
            ElementBody::Tween(t) | ElementBody::GlobalTween(t) => Some(t),
            _ => None,
        }
    }

    pub fn tween_mut(&mut self) -> Option<&mut TweenBody> {
        match self {
            ElementBody::Tween(t) | ElementBody::GlobalTween(t) => Some(t),
            _ => None,
        }
    }
}

/// One item on a clip's timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipElement {
    #[serde(default)]
    pub id: ElementId,
    /// Seconds from the clip start.
    #[serde(default)]
    pub start_time: f32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Editor row inside the layer, -1 when unpinned.
    #[serde(default = "default_pin")]
    pub pin: i32,
    pub body: ElementBody,
}

impl ClipElement {
    pub fn new(start_time: f32, body: ElementBody) -> Self {
        Self {
            id: ElementId::generate(),
            start_time,
            is_active: true,
            pin: -1,
            body,
        }
    }

    pub fn tween(start_time: f32, body: TweenBody) -> Self {
        Self::new(start_time, ElementBody::Tween(body))
    }

    pub fn global_tween(start_time: f32, body: TweenBody) -> Self {
        Self::new(start_time, ElementBody::GlobalTween(body))
    }

    pub fn action(start_time: f32, body: ActionBody) -> Self {
        Self::new(start_time, ElementBody::Action(body))
    }

    pub fn event(start_time: f32, listeners: Callbacks) -> Self {
        Self::new(
            start_time,
            ElementBody::Event(EventBody {
                label: String::new(),
                listeners,
            }),
        )
    }

    pub fn interval(start_time: f32, duration: f32) -> Self {
        Self::new(start_time, ElementBody::Interval(IntervalBody { duration }))
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    /// `start_time + effective_duration`.
    #[inline]
    pub fn end_time(&self) -> f32 {
        self.start_time + self.body.effective_duration()
    }
}

/// Editor grouping of elements. Membership is by element id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipLayer {
    #[serde(default)]
    pub id: LayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub element_ids: Vec<ElementId>,
}

impl ClipLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LayerId::generate(),
            name: name.into(),
            is_active: true,
            is_locked: false,
            element_ids: Vec::new(),
        }
    }

    #[inline]
    pub fn contains(&self, element: ElementId) -> bool {
        self.element_ids.contains(&element)
    }
}

/// Composite-level callbacks, forwarded to every composite a clip builds.
#[derive(Clone, Debug, Default)]
pub struct ClipCallbacks {
    pub on_start: Callbacks,
    pub on_update: Callbacks,
    pub on_step_complete: Callbacks,
    pub on_complete: Callbacks,
    pub on_rewind: Callbacks,
}

impl ClipCallbacks {
    /// Non-empty slots with their engine callback kind.
    pub fn slots(&self) -> impl Iterator<Item = (CallbackKind, &Callbacks)> {
        [
            (CallbackKind::Start, &self.on_start),
            (CallbackKind::Update, &self.on_update),
            (CallbackKind::StepComplete, &self.on_step_complete),
            (CallbackKind::Complete, &self.on_complete),
            (CallbackKind::Rewind, &self.on_rewind),
        ]
        .into_iter()
        .filter(|(_, cbs)| !cbs.is_empty())
    }
}

/// An authored animation clip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default)]
    pub id: ClipId,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elements: Vec<ClipElement>,
    #[serde(default)]
    pub layers: Vec<ClipLayer>,
    #[serde(default)]
    pub settings: ClipSettings,
    #[serde(skip)]
    pub callbacks: ClipCallbacks,
    #[serde(skip)]
    pub(crate) cache: HandleCache,
}

impl Default for Clip {
    fn default() -> Self {
        Self::new("")
    }
}

impl Clip {
    /// Empty active clip with a fresh id and one default layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClipId::generate(),
            is_active: true,
            name: name.into(),
            elements: Vec::new(),
            layers: vec![ClipLayer::new("Layer 1")],
            settings: ClipSettings::default(),
            callbacks: ClipCallbacks::default(),
            cache: HandleCache::default(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&ClipElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ClipElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&ClipLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut ClipLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// First layer listing `element`.
    pub fn layer_of(&self, element: ElementId) -> Option<&ClipLayer> {
        self.layers.iter().find(|l| l.contains(element))
    }

    /// Max over all elements of `start_time + effective_duration`.
    pub fn authored_duration(&self) -> f32 {
        self.elements
            .iter()
            .map(ClipElement::end_time)
            .fold(0.0, f32::max)
    }
}
