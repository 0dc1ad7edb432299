//! Clip compiler: turns a [`Clip`] into one composite on an [`AnimationEngine`].
//!
//! Elements are visited in array order. Each one either inserts something into
//! the composite or is skipped with a debug log; a missing plugin, descriptor
//! or target never aborts the whole clip. When nothing was inserted the empty
//! composite is killed and no handle is returned.
//!
//! Live compilation (`is_live`) produces a playing composite and runs the
//! startup policy. Preview compilation builds the same timeline for an editor:
//! events and global tweens are left out, actions only run if they opt in, and
//! the composite is left paused.

use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{debug, warn};

use vizij_api_core::{coerce, Value, ValueKind};

use crate::data::{
    ActionBody, Clip, ClipElement, ClipSettings, ElementBody, EventBody, IntervalBody,
    ResolutionMode, TimeMode, TweenBody, ValueSlot,
};
use crate::engine::{AnimationEngine, CompositeHandle, TweenDirection, TweenShape, TweenSpec};
use crate::ids::ElementId;
use crate::registry::{PluginRegistry, TweenDescriptor};
use crate::startup::{self, StartupBehavior};
use crate::target::{TargetObject, TargetRef, TargetResolver, TargetSubstitutions};

/// What a compilation runs against.
#[derive(Copy, Clone)]
pub struct CompileContext<'a> {
    pub registry: &'a PluginRegistry,
    pub targets: &'a dyn TargetResolver,
    pub engine: &'a dyn AnimationEngine,
    /// Live playback (true) or editor preview (false).
    pub is_live: bool,
}

impl<'a> CompileContext<'a> {
    pub fn live(
        registry: &'a PluginRegistry,
        targets: &'a dyn TargetResolver,
        engine: &'a dyn AnimationEngine,
    ) -> Self {
        Self {
            registry,
            targets,
            engine,
            is_live: true,
        }
    }

    pub fn preview(
        registry: &'a PluginRegistry,
        targets: &'a dyn TargetResolver,
        engine: &'a dyn AnimationEngine,
    ) -> Self {
        Self {
            is_live: false,
            ..Self::live(registry, targets, engine)
        }
    }
}

/// Scaling applied to a compilation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeTransform {
    /// Factor on element start times and durations.
    pub multiplier: f32,
    /// Final time scale of the composite.
    pub time_scale: f32,
}

impl TimeTransform {
    pub const IDENTITY: TimeTransform = TimeTransform {
        multiplier: 1.0,
        time_scale: 1.0,
    };
}

/// Resolve the time mode. Duration overload rescales the timeline itself in
/// live mode and only the playback speed in preview, so editor timelines keep
/// their authored positions.
pub fn time_transform(clip: &Clip, settings: &ClipSettings, is_live: bool) -> TimeTransform {
    match settings.time_mode {
        TimeMode::FixedScale => TimeTransform {
            multiplier: 1.0,
            time_scale: settings.time_scale,
        },
        TimeMode::DurationOverload => {
            let authored = clip.authored_duration();
            let target = settings.duration_overload;
            if authored <= 0.0 || target <= 0.0 {
                return TimeTransform::IDENTITY;
            }
            if is_live {
                TimeTransform {
                    multiplier: target / authored,
                    time_scale: 1.0,
                }
            } else {
                TimeTransform {
                    multiplier: 1.0,
                    time_scale: authored / target,
                }
            }
        }
    }
}

/// Literal handed to the tween primitive plus how to read it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedValues {
    pub literal: Value,
    /// Explicit start value; `None` samples the live value at tween start.
    pub start: Option<Value>,
    pub direction: TweenDirection,
}

fn slot_value(slot: &ValueSlot, kind: ValueKind, body: &TweenBody) -> Option<Value> {
    match coerce(&slot.value, kind) {
        Ok(v) => Some(body.axis.mask(&v)),
        Err(err) => {
            debug!("tween value skipped: {err}");
            None
        }
    }
}

/// Decide which end of the tween is literal. Exactly one of "explicit start"
/// and "from direction" is used; both-dynamic elements are skipped.
pub fn resolve_values(
    body: &TweenBody,
    kind: ValueKind,
    shape: TweenShape,
) -> Option<ResolvedValues> {
    if !shape.supports_dynamic() {
        return Some(ResolvedValues {
            literal: slot_value(&body.to, kind, body)?,
            start: None,
            direction: TweenDirection::To,
        });
    }
    match (body.to.mode, body.from.mode) {
        (ResolutionMode::Direct, ResolutionMode::Direct) => Some(ResolvedValues {
            literal: slot_value(&body.to, kind, body)?,
            start: Some(slot_value(&body.from, kind, body)?),
            direction: TweenDirection::To,
        }),
        (ResolutionMode::Direct, ResolutionMode::Dynamic) => Some(ResolvedValues {
            literal: slot_value(&body.to, kind, body)?,
            start: None,
            direction: TweenDirection::To,
        }),
        (ResolutionMode::Dynamic, ResolutionMode::Direct) => Some(ResolvedValues {
            literal: slot_value(&body.from, kind, body)?,
            start: None,
            direction: TweenDirection::From,
        }),
        (ResolutionMode::Dynamic, ResolutionMode::Dynamic) => {
            warn!("tween has dynamic from and to; run validation to repair it");
            None
        }
    }
}

struct Pass<'c, 'a> {
    ctx: &'c CompileContext<'a>,
    subs: TargetSubstitutions,
    composite: CompositeHandle,
    multiplier: f32,
}

impl Pass<'_, '_> {
    fn resolve_target(&self, target: &TargetRef) -> Option<TargetObject> {
        let target = self.subs.apply(target);
        let obj = self.ctx.targets.resolve(target);
        if obj.is_none() {
            debug!("target '{target}' not found; element skipped");
        }
        obj
    }

    fn element(&self, element: &ClipElement) -> bool {
        let at = element.start_time.max(0.0) * self.multiplier;
        match &element.body {
            ElementBody::Event(body) if self.ctx.is_live => self.event(at, body),
            ElementBody::Action(body) => self.action(at, body),
            ElementBody::Interval(body) => self.interval(at, body),
            ElementBody::Tween(body) => self.tween(at, body, false),
            ElementBody::GlobalTween(body) if self.ctx.is_live => self.tween(at, body, true),
            ElementBody::Event(_) | ElementBody::GlobalTween(_) => false,
        }
    }

    fn event(&self, at: f32, body: &EventBody) -> bool {
        let listeners = body.listeners.clone();
        self.composite
            .insert_callback(at, Rc::new(move || listeners.invoke_all()));
        true
    }

    fn action(&self, at: f32, body: &ActionBody) -> bool {
        if !self.ctx.is_live && !body.execute_in_preview {
            return false;
        }
        let Some(plugin) = self.ctx.registry.action_plugin(&body.plugin_id) else {
            debug!("action plugin '{}' not registered; element skipped", body.plugin_id);
            return false;
        };
        let Some(desc) = plugin.resolve(body.descriptor.id.as_deref(), body.descriptor.index) else {
            debug!(
                "action '{:?}' not found in plugin '{}'; element skipped",
                body.descriptor, body.plugin_id
            );
            return false;
        };
        let target = match &body.target {
            Some(t) => self.resolve_target(t),
            None => None,
        };
        if desc.requires_target && target.is_none() {
            debug!("action '{}' needs a target; element skipped", desc.label);
            return false;
        }
        let mut payload = desc.options.filter(&body.payload);
        payload.object = payload.object.map(|o| self.subs.apply(&o).clone());
        if let Some(hook) = &desc.on_create {
            hook(target.as_ref(), &payload);
        }
        let run = desc.run.clone();
        let requires_target = desc.requires_target;
        let weak = target.as_ref().map(TargetObject::downgrade);
        self.composite.insert_callback(
            at,
            Rc::new(move || {
                let target = weak.as_ref().and_then(|w| w.upgrade());
                if requires_target && target.is_none() {
                    return;
                }
                run(target.as_ref(), &payload);
            }),
        );
        true
    }

    fn interval(&self, at: f32, body: &IntervalBody) -> bool {
        let end = at + body.duration.max(0.0) * self.multiplier;
        let current = self.composite.duration();
        if end > current {
            self.composite.append_interval(end - current);
            true
        } else {
            false
        }
    }

    fn descriptor<'r>(
        &'r self,
        body: &TweenBody,
        target: Option<&TargetObject>,
        global: bool,
    ) -> Option<&'r TweenDescriptor> {
        let registry = self.ctx.registry;
        let plugin = if global {
            let Some(id) = body.plugin_id.as_deref() else {
                debug!("global tween without plugin id; element skipped");
                return None;
            };
            registry.global_tween_plugin(id)
        } else {
            registry.tween_plugin(target?.type_key())
        };
        let Some(plugin) = plugin else {
            debug!("no tween plugin for element; element skipped");
            return None;
        };
        let desc = plugin.resolve(body.descriptor.id.as_deref(), body.descriptor.index);
        if desc.is_none() {
            debug!(
                "descriptor {:?} not found in plugin '{}'; element skipped",
                body.descriptor,
                plugin.plugin()
            );
        }
        desc
    }

    fn tween(&self, at: f32, body: &TweenBody, global: bool) -> bool {
        let target = match &body.target {
            Some(t) => match self.resolve_target(t) {
                Some(obj) => Some(obj),
                None => return false,
            },
            None if global => None,
            None => {
                debug!("tween without target; element skipped");
                return false;
            }
        };
        let Some(desc) = self.descriptor(body, target.as_ref(), global) else {
            return false;
        };
        let Some(values) = resolve_values(body, desc.kind, desc.shape) else {
            return false;
        };
        let access = &desc.access;
        let (Some(getter), Some(setter)) = (
            access.make_getter(target.as_ref(), &body.sub_address),
            access.make_setter(target.as_ref(), &body.sub_address),
        ) else {
            debug!("descriptor '{}' cannot access its target; element skipped", desc.label);
            return false;
        };
        let loops = if body.loops < 0 {
            debug!("infinite tween loops play once inside a clip");
            1
        } else {
            body.loops.max(1) as u32
        };
        let duration = body.duration * self.multiplier;
        let mut spec = TweenSpec::new(getter, setter, values.literal, duration)
            .relative(body.is_relative)
            .ease(body.ease.clone())
            .loops(loops, body.loop_type)
            .axis(body.axis)
            .shape(desc.shape, body.shape.clone());
        if let Some(start) = values.start {
            spec = spec.start_value(start);
        }
        if values.direction == TweenDirection::From {
            spec = spec.from_literal();
        }
        self.composite.insert_tween(at, spec);
        true
    }
}

/// Elements of inactive layers.
fn muted_elements(clip: &Clip) -> HashSet<ElementId> {
    clip.layers
        .iter()
        .filter(|l| !l.is_active)
        .flat_map(|l| l.element_ids.iter().copied())
        .collect()
}

fn substitutions(list: Option<&[TargetRef]>, targets: &dyn TargetResolver) -> TargetSubstitutions {
    match list.map(TargetSubstitutions::from_flat) {
        None => TargetSubstitutions::default(),
        Some(Ok(subs)) => subs.retain_matching_types(targets),
        Some(Err(err)) => {
            warn!("{err}; target substitutions ignored");
            TargetSubstitutions::default()
        }
    }
}

/// Build one composite for `clip` with `settings`.
///
/// `substitutions` is a flat `[old0, new0, old1, new1, ...]` list applied to
/// every target reference for this compilation only.
pub fn compile(
    clip: &Clip,
    ctx: &CompileContext<'_>,
    settings: &ClipSettings,
    substitutions_list: Option<&[TargetRef]>,
) -> Option<CompositeHandle> {
    if ctx.is_live && settings.startup_behavior == StartupBehavior::DoNothing {
        debug!("clip '{}' starts with DoNothing; not compiled", clip.name);
        return None;
    }

    let transform = time_transform(clip, settings, ctx.is_live);
    let pass = Pass {
        ctx,
        subs: substitutions(substitutions_list, ctx.targets),
        composite: ctx.engine.create_composite(),
        multiplier: transform.multiplier,
    };

    let muted = muted_elements(clip);
    let mut inserted = 0usize;
    for element in &clip.elements {
        if !element.is_active || muted.contains(&element.id) {
            continue;
        }
        if pass.element(element) {
            inserted += 1;
        }
    }

    let composite = pass.composite;
    if inserted == 0 {
        debug!("clip '{}' produced no insertions", clip.name);
        composite.kill(false);
        return None;
    }
    debug!(
        "clip '{}' compiled: {inserted} of {} elements inserted",
        clip.name,
        clip.elements.len()
    );

    composite.set_time_scale(transform.time_scale);
    if !ctx.is_live {
        composite.set_auto_kill(false);
        composite.pause();
        return Some(composite);
    }

    let id = if clip.name.is_empty() {
        clip.id.to_string()
    } else {
        clip.name.clone()
    };
    composite.set_id(&id);
    composite.set_delay(settings.startup_delay);
    composite.set_auto_kill(settings.autokill);
    composite.set_ignore_time_scale(settings.ignore_time_scale);
    composite.set_loops(settings.loops, settings.loop_type);
    composite.set_inverted(settings.inverted);
    for (kind, callbacks) in clip.callbacks.slots() {
        composite.set_callbacks(kind, callbacks.clone());
    }
    startup::apply(composite, settings)
}
