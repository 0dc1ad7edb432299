//! Plugin registry.
//!
//! Plugins expose *descriptors*: a tween descriptor knows how to build a
//! getter/setter pair for one property of one target type, an action
//! descriptor wraps a side effect. Descriptors are looked up at compile time by
//! stable id, falling back to the legacy positional index only for elements
//! authored before stable ids existed.
//!
//! The registry is an owned value passed by reference to the compiler.
//! Registration happens before compilation and is never interleaved with it.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

use vizij_api_core::{Value, ValueKind};

use crate::data::{ActionPayload, ClipElement, ElementBody};
use crate::engine::{Getter, Setter, TweenShape};
use crate::error::ClipError;
use crate::target::{type_key, TargetObject, TargetResolver};

/// Optional qualifier for a property: a named child, a material slot, etc.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub index: i32,
}

impl SubAddress {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            index: 0,
        }
    }

    pub fn indexed(index: i32) -> Self {
        Self { name: None, index }
    }
}

/// Builds accessors for one property. `target` is `None` for global tweens
/// authored without a target.
pub trait PropertyAccess {
    fn make_getter(&self, target: Option<&TargetObject>, address: &SubAddress) -> Option<Getter>;
    fn make_setter(&self, target: Option<&TargetObject>, address: &SubAddress) -> Option<Setter>;
}

type GetFn<T> = Rc<dyn Fn(&T, &SubAddress) -> Value>;
type SetFn<T> = Rc<dyn Fn(&T, &SubAddress, &Value)>;

/// Closure-backed accessor for targets of type `T`.
///
/// Accessors hold only a weak reference, so a destroyed target makes the
/// getter return `None` and the setter do nothing.
pub struct FnAccess<T> {
    get: GetFn<T>,
    set: SetFn<T>,
}

impl<T: Any> FnAccess<T> {
    pub fn new(
        get: impl Fn(&T, &SubAddress) -> Value + 'static,
        set: impl Fn(&T, &SubAddress, &Value) + 'static,
    ) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }
}

impl<T: Any> PropertyAccess for FnAccess<T> {
    fn make_getter(&self, target: Option<&TargetObject>, address: &SubAddress) -> Option<Getter> {
        let weak = Rc::downgrade(&target?.downcast::<T>()?);
        let get = self.get.clone();
        let address = address.clone();
        Some(Rc::new(move || weak.upgrade().map(|t| get(&t, &address))))
    }

    fn make_setter(&self, target: Option<&TargetObject>, address: &SubAddress) -> Option<Setter> {
        let weak = Rc::downgrade(&target?.downcast::<T>()?);
        let set = self.set.clone();
        let address = address.clone();
        Some(Rc::new(move |v: &Value| {
            if let Some(t) = weak.upgrade() {
                set(&t, &address, v);
            }
        }))
    }
}

/// Accessor for global (targetless) properties.
pub struct GlobalAccess {
    get: Rc<dyn Fn(&SubAddress) -> Value>,
    set: Rc<dyn Fn(&SubAddress, &Value)>,
}

impl GlobalAccess {
    pub fn new(
        get: impl Fn(&SubAddress) -> Value + 'static,
        set: impl Fn(&SubAddress, &Value) + 'static,
    ) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }
}

impl PropertyAccess for GlobalAccess {
    fn make_getter(&self, _target: Option<&TargetObject>, address: &SubAddress) -> Option<Getter> {
        let get = self.get.clone();
        let address = address.clone();
        Some(Rc::new(move || Some(get(&address))))
    }

    fn make_setter(&self, _target: Option<&TargetObject>, address: &SubAddress) -> Option<Setter> {
        let set = self.set.clone();
        let address = address.clone();
        Some(Rc::new(move |v: &Value| set(&address, v)))
    }
}

/// Common surface of tween and action descriptors.
pub trait Descriptor {
    fn stable_id(&self) -> Option<&str>;
    fn label(&self) -> &str;
}

/// One animatable property exposed by a plugin.
#[derive(Clone)]
pub struct TweenDescriptor {
    pub stable_id: Option<String>,
    pub label: String,
    pub kind: ValueKind,
    pub shape: TweenShape,
    pub access: Rc<dyn PropertyAccess>,
}

impl TweenDescriptor {
    pub fn new(
        stable_id: impl Into<String>,
        label: impl Into<String>,
        kind: ValueKind,
        access: impl PropertyAccess + 'static,
    ) -> Self {
        Self {
            stable_id: Some(stable_id.into()),
            label: label.into(),
            kind,
            shape: TweenShape::Standard,
            access: Rc::new(access),
        }
    }

    /// Descriptor without a stable id, reachable only by position.
    pub fn positional(
        label: impl Into<String>,
        kind: ValueKind,
        access: impl PropertyAccess + 'static,
    ) -> Self {
        Self {
            stable_id: None,
            ..Self::new("", label, kind, access)
        }
    }

    pub fn with_shape(mut self, shape: TweenShape) -> Self {
        self.shape = shape;
        self
    }
}

impl Descriptor for TweenDescriptor {
    fn stable_id(&self) -> Option<&str> {
        self.stable_id.as_deref()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for TweenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenDescriptor")
            .field("stable_id", &self.stable_id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Payload fields an action reads. Undeclared fields reach the action as
/// their defaults.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionOptions {
    pub flag: bool,
    pub text: bool,
    pub float0: bool,
    pub float1: bool,
    pub int: bool,
    pub object: bool,
}

impl ActionOptions {
    pub fn all() -> Self {
        Self {
            flag: true,
            text: true,
            float0: true,
            float1: true,
            int: true,
            object: true,
        }
    }

    /// Copy of `payload` with undeclared fields reset.
    pub fn filter(&self, payload: &ActionPayload) -> ActionPayload {
        let d = ActionPayload::default();
        ActionPayload {
            flag: if self.flag { payload.flag } else { d.flag },
            text: if self.text { payload.text.clone() } else { d.text },
            float0: if self.float0 { payload.float0 } else { d.float0 },
            float1: if self.float1 { payload.float1 } else { d.float1 },
            int: if self.int { payload.int } else { d.int },
            object: if self.object { payload.object.clone() } else { d.object },
        }
    }
}

/// Side effect run by an action element.
pub type ActionFn = Rc<dyn Fn(Option<&TargetObject>, &ActionPayload)>;

/// One action exposed by a plugin.
#[derive(Clone)]
pub struct ActionDescriptor {
    pub stable_id: Option<String>,
    pub label: String,
    pub requires_target: bool,
    pub options: ActionOptions,
    pub run: ActionFn,
    /// Runs once when the element is compiled, before playback.
    pub on_create: Option<ActionFn>,
}

impl ActionDescriptor {
    pub fn new(
        stable_id: impl Into<String>,
        label: impl Into<String>,
        run: impl Fn(Option<&TargetObject>, &ActionPayload) + 'static,
    ) -> Self {
        Self {
            stable_id: Some(stable_id.into()),
            label: label.into(),
            requires_target: false,
            options: ActionOptions::default(),
            run: Rc::new(run),
            on_create: None,
        }
    }

    pub fn requires_target(mut self) -> Self {
        self.requires_target = true;
        self
    }

    pub fn with_options(mut self, options: ActionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_create(
        mut self,
        hook: impl Fn(Option<&TargetObject>, &ActionPayload) + 'static,
    ) -> Self {
        self.on_create = Some(Rc::new(hook));
        self
    }
}

impl Descriptor for ActionDescriptor {
    fn stable_id(&self) -> Option<&str> {
        self.stable_id.as_deref()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("stable_id", &self.stable_id)
            .field("label", &self.label)
            .field("requires_target", &self.requires_target)
            .field("options", &self.options)
            .field("on_create", &self.on_create.is_some())
            .finish_non_exhaustive()
    }
}

/// Ordered descriptors of one plugin plus a stable-id index.
#[derive(Clone, Debug)]
pub struct PluginDescriptorSet<D> {
    plugin: String,
    descriptors: Vec<D>,
    by_id: HashMap<String, usize>,
}

impl<D: Descriptor> PluginDescriptorSet<D> {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            descriptors: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Append a descriptor. Positional indices follow push order.
    pub fn push(&mut self, descriptor: D) -> Result<(), ClipError> {
        if let Some(id) = descriptor.stable_id().filter(|id| !id.is_empty()) {
            if self.by_id.contains_key(id) {
                warn!(
                    "plugin '{}' already has a descriptor with id '{}'; ignoring '{}'",
                    self.plugin,
                    id,
                    descriptor.label()
                );
                return Err(ClipError::DuplicateDescriptor {
                    plugin: self.plugin.clone(),
                    descriptor_id: id.to_string(),
                });
            }
            self.by_id.insert(id.to_string(), self.descriptors.len());
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Stable id wins; the positional index is consulted only when the
    /// element carries no id. An unknown id never falls back.
    pub fn resolve(&self, descriptor_id: Option<&str>, index: i32) -> Option<&D> {
        match descriptor_id.filter(|id| !id.is_empty()) {
            Some(id) => self.by_id.get(id).map(|&i| &self.descriptors[i]),
            None => usize::try_from(index)
                .ok()
                .and_then(|i| self.descriptors.get(i)),
        }
    }

    pub fn descriptors(&self) -> &[D] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// All registered plugins, keyed by what the compiler looks them up by.
#[derive(Clone, Debug, Default)]
pub struct PluginRegistry {
    /// Targeted tween plugins by target type key.
    tweens: HashMap<String, PluginDescriptorSet<TweenDescriptor>>,
    /// Global tween plugins by plugin id.
    global_tweens: HashMap<String, PluginDescriptorSet<TweenDescriptor>>,
    /// Action plugins by plugin id.
    actions: HashMap<String, PluginDescriptorSet<ActionDescriptor>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tween descriptor for targets with the given type key.
    pub fn register_tween(
        &mut self,
        target_type: impl Into<String>,
        descriptor: TweenDescriptor,
    ) -> Result<(), ClipError> {
        let key = target_type.into();
        self.tweens
            .entry(key.clone())
            .or_insert_with(|| PluginDescriptorSet::new(key))
            .push(descriptor)
    }

    /// Register a tween descriptor for targets of Rust type `T`.
    pub fn register_tween_for<T: Any>(
        &mut self,
        descriptor: TweenDescriptor,
    ) -> Result<(), ClipError> {
        self.register_tween(type_key::<T>(), descriptor)
    }

    pub fn register_global_tween(
        &mut self,
        plugin_id: impl Into<String>,
        descriptor: TweenDescriptor,
    ) -> Result<(), ClipError> {
        let key = plugin_id.into();
        self.global_tweens
            .entry(key.clone())
            .or_insert_with(|| PluginDescriptorSet::new(key))
            .push(descriptor)
    }

    pub fn register_action(
        &mut self,
        plugin_id: impl Into<String>,
        descriptor: ActionDescriptor,
    ) -> Result<(), ClipError> {
        let key = plugin_id.into();
        self.actions
            .entry(key.clone())
            .or_insert_with(|| PluginDescriptorSet::new(key))
            .push(descriptor)
    }

    pub fn tween_plugin(&self, target_type: &str) -> Option<&PluginDescriptorSet<TweenDescriptor>> {
        self.tweens.get(target_type)
    }

    pub fn global_tween_plugin(
        &self,
        plugin_id: &str,
    ) -> Option<&PluginDescriptorSet<TweenDescriptor>> {
        self.global_tweens.get(plugin_id)
    }

    pub fn action_plugin(&self, plugin_id: &str) -> Option<&PluginDescriptorSet<ActionDescriptor>> {
        self.actions.get(plugin_id)
    }

    /// Whether the element's plugin and descriptor can be resolved right now.
    /// Events and intervals need no plugin. Targeted tweens need a live target
    /// to know their plugin.
    pub fn has_descriptor(&self, element: &ClipElement, targets: &dyn TargetResolver) -> bool {
        match &element.body {
            ElementBody::Tween(t) => t
                .target
                .as_ref()
                .and_then(|r| targets.resolve(r))
                .and_then(|obj| self.tween_plugin(obj.type_key()))
                .and_then(|set| set.resolve(t.descriptor.id.as_deref(), t.descriptor.index))
                .is_some(),
            ElementBody::GlobalTween(t) => t
                .plugin_id
                .as_deref()
                .and_then(|p| self.global_tween_plugin(p))
                .and_then(|set| set.resolve(t.descriptor.id.as_deref(), t.descriptor.index))
                .is_some(),
            ElementBody::Action(a) => self
                .action_plugin(&a.plugin_id)
                .and_then(|set| set.resolve(a.descriptor.id.as_deref(), a.descriptor.index))
                .is_some(),
            ElementBody::Event(_) | ElementBody::Interval(_) => true,
        }
    }
}
