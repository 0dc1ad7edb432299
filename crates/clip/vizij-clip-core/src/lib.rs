//! Vizij Clip Core (engine-agnostic)
//!
//! Authored animation clips (tweens, actions, events and intervals on layered
//! timelines) compiled into composites on a pluggable animation engine. Plugins
//! register property descriptors per target type; clips reference them by
//! stable id. `timeline` ships a reference engine driven by `update(dt)`.

pub mod collection;
pub mod compiler;
pub mod config;
pub mod data;
pub mod ease;
pub mod edit;
pub mod engine;
pub mod error;
pub mod facade;
pub mod ids;
pub mod registry;
pub mod startup;
pub mod stored_clip;
pub mod target;
pub mod timeline;
pub mod validate;

// Re-exports for hosts
pub use collection::ClipSet;
pub use compiler::{compile, resolve_values, time_transform, CompileContext, TimeTransform};
pub use config::Config;
pub use data::{
    ActionBody, ActionPayload, Clip, ClipCallbacks, ClipElement, ClipLayer, ClipSettings,
    DescriptorRef, ElementBody, ElementKind, EventBody, IntervalBody, ResolutionMode, TimeMode,
    TweenBody, ValueSlot,
};
pub use ease::{Ease, EaseCurve, EaseKeys, EaseSettings};
pub use engine::{
    AnimationEngine, Callback, CallbackKind, Callbacks, Composite, CompositeHandle, Getter,
    LoopType, Setter, ShapeOptions, TweenDirection, TweenShape, TweenSpec,
};
pub use error::ClipError;
pub use facade::{ClipVariant, HandleCache};
pub use ids::{ClipId, ElementId, LayerId};
pub use registry::{
    ActionDescriptor, ActionOptions, FnAccess, GlobalAccess, PluginDescriptorSet, PluginRegistry,
    PropertyAccess, SubAddress, TweenDescriptor,
};
pub use startup::StartupBehavior;
pub use stored_clip::{clip_to_json, parse_clip_json, parse_clip_set_json};
pub use target::{
    type_key, SceneTargets, TargetObject, TargetRef, TargetResolver, TargetSubstitutions,
};
pub use timeline::Timeline;
pub use validate::{validate, ValidationReport};
pub use vizij_api_core::{AxisConstraint, Value, ValueKind};
