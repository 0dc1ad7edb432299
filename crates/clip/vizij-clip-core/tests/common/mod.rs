#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vizij_clip_core::{
    ActionDescriptor, ActionOptions, AnimationEngine, Callback, CallbackKind, Callbacks,
    CompileContext, Composite, CompositeHandle, FnAccess, GlobalAccess, LoopType, PluginRegistry,
    SceneTargets, SubAddress, Timeline, TweenDescriptor, TweenShape, TweenSpec, Value, ValueKind,
};

pub fn init_tracing() {
    let default_filter = "vizij_clip_core=debug";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

/// Blend-shape names, in slot order.
pub const WEIGHT_NAMES: [&str; 3] = ["smile", "blink", "frown"];

pub struct Sprite {
    pub alpha: Cell<f32>,
    pub position: Cell<[f32; 3]>,
    pub weights: [Cell<f32>; 3],
}

impl Sprite {
    pub fn new(alpha: f32) -> Rc<Self> {
        Rc::new(Self {
            alpha: Cell::new(alpha),
            position: Cell::new([0.0; 3]),
            weights: Default::default(),
        })
    }

    /// Weight slot named by `address`, or its index when unnamed.
    pub fn weight(&self, address: &SubAddress) -> Option<&Cell<f32>> {
        let slot = match &address.name {
            Some(name) => WEIGHT_NAMES.iter().position(|n| n == name)?,
            None => usize::try_from(address.index).ok()?,
        };
        self.weights.get(slot)
    }
}

pub struct Label {
    pub text: RefCell<String>,
}

/// Registry, scene and reference engine wired together.
pub struct Harness {
    pub registry: PluginRegistry,
    pub targets: SceneTargets,
    pub timeline: Timeline,
    pub sprite: Rc<Sprite>,
    pub other_sprite: Rc<Sprite>,
    pub label: Rc<Label>,
    pub volume: Rc<Cell<f32>>,
    pub log: Rc<RefCell<Vec<String>>>,
}

fn push(log: &Rc<RefCell<Vec<String>>>, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

pub fn sprite_registry(registry: &mut PluginRegistry) {
    registry
        .register_tween_for::<Sprite>(TweenDescriptor::new(
            "alpha",
            "Alpha",
            ValueKind::Float,
            FnAccess::new(
                |s: &Sprite, _| Value::Float(s.alpha.get()),
                |s: &Sprite, _, v| {
                    if let Value::Float(a) = v {
                        s.alpha.set(*a);
                    }
                },
            ),
        ))
        .unwrap();
    let position = || {
        FnAccess::new(
            |s: &Sprite, _| Value::Vec3(s.position.get()),
            |s: &Sprite, _, v| {
                if let Value::Vec3(p) = v {
                    s.position.set(*p);
                }
            },
        )
    };
    registry
        .register_tween_for::<Sprite>(TweenDescriptor::new(
            "position",
            "Position",
            ValueKind::Vec3,
            position(),
        ))
        .unwrap();
    registry
        .register_tween_for::<Sprite>(
            TweenDescriptor::new("punch-position", "Punch Position", ValueKind::Vec3, position())
                .with_shape(TweenShape::Punch),
        )
        .unwrap();
    registry
        .register_tween_for::<Sprite>(TweenDescriptor::new(
            "weight",
            "Blend Weight",
            ValueKind::Float,
            FnAccess::new(
                |s: &Sprite, address| {
                    Value::Float(s.weight(address).map(Cell::get).unwrap_or_default())
                },
                |s: &Sprite, address, v| {
                    if let (Some(slot), Value::Float(w)) = (s.weight(address), v) {
                        slot.set(*w);
                    }
                },
            ),
        ))
        .unwrap();
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let sprite = Sprite::new(2.0);
        let other_sprite = Sprite::new(0.0);
        let label = Rc::new(Label {
            text: RefCell::new(String::new()),
        });
        let volume = Rc::new(Cell::new(0.0));
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut registry = PluginRegistry::new();
        sprite_registry(&mut registry);
        registry
            .register_tween_for::<Label>(TweenDescriptor::new(
                "text",
                "Text",
                ValueKind::Text,
                FnAccess::new(
                    |l: &Label, _| Value::Text(l.text.borrow().clone()),
                    |l: &Label, _, v| {
                        if let Value::Text(t) = v {
                            *l.text.borrow_mut() = t.clone();
                        }
                    },
                ),
            ))
            .unwrap();

        let (vg, vs) = (volume.clone(), volume.clone());
        registry
            .register_global_tween(
                "audio",
                TweenDescriptor::new(
                    "volume",
                    "Master Volume",
                    ValueKind::Float,
                    GlobalAccess::new(
                        move |_| Value::Float(vg.get()),
                        move |_, v| {
                            if let Value::Float(x) = v {
                                vs.set(*x);
                            }
                        },
                    ),
                ),
            )
            .unwrap();

        let say_log = log.clone();
        registry
            .register_action(
                "debug",
                ActionDescriptor::new("say", "Say", move |_, payload| {
                    push(&say_log, payload.text.clone().unwrap_or_default());
                })
                .with_options(ActionOptions {
                    text: true,
                    ..ActionOptions::default()
                }),
            )
            .unwrap();
        let hide_log = log.clone();
        let created_log = log.clone();
        registry
            .register_action(
                "debug",
                ActionDescriptor::new("hide", "Hide", move |target, _| {
                    if let Some(sprite) = target.and_then(|t| t.downcast::<Sprite>()) {
                        sprite.alpha.set(0.0);
                        push(&hide_log, "hide");
                    }
                })
                .requires_target()
                .on_create(move |_, _| push(&created_log, "created")),
            )
            .unwrap();

        let mut targets = SceneTargets::new();
        targets
            .insert("sprite", sprite.clone())
            .insert("other", other_sprite.clone())
            .insert("label", label.clone());

        Self {
            registry,
            targets,
            timeline: Timeline::default(),
            sprite,
            other_sprite,
            label,
            volume,
            log,
        }
    }

    pub fn live(&self) -> CompileContext<'_> {
        CompileContext::live(&self.registry, &self.targets, &self.timeline)
    }

    pub fn preview(&self) -> CompileContext<'_> {
        CompileContext::preview(&self.registry, &self.targets, &self.timeline)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

/// What a recording composite was asked to hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Inserted {
    Tween { at: f32, duration: f32 },
    Callback { at: f32 },
    Interval(f32),
}

/// Composite that only records what the compiler did to it.
#[derive(Debug, Default)]
pub struct Recording {
    pub inserted: RefCell<Vec<Inserted>>,
    pub duration: Cell<f32>,
    pub time_scale: Cell<f32>,
    pub delay: Cell<f32>,
    pub active: Cell<bool>,
    pub playing: Cell<bool>,
    pub complete: Cell<bool>,
    pub forced: Cell<bool>,
    pub id: RefCell<Option<String>>,
}

impl Composite for Recording {
    fn insert_tween(&self, at: f32, tween: TweenSpec) {
        self.duration
            .set(self.duration.get().max(at + tween.full_duration()));
        self.inserted.borrow_mut().push(Inserted::Tween {
            at,
            duration: tween.duration,
        });
    }

    fn insert_callback(&self, at: f32, _callback: Callback) {
        self.duration.set(self.duration.get().max(at));
        self.inserted.borrow_mut().push(Inserted::Callback { at });
    }

    fn append_interval(&self, interval: f32) {
        self.duration.set(self.duration.get() + interval);
        self.inserted.borrow_mut().push(Inserted::Interval(interval));
    }

    fn duration(&self) -> f32 {
        self.duration.get()
    }

    fn set_delay(&self, delay: f32) {
        self.delay.set(delay);
    }

    fn set_auto_kill(&self, _auto_kill: bool) {}

    fn set_loops(&self, _loops: i32, _loop_type: LoopType) {}

    fn set_id(&self, id: &str) {
        *self.id.borrow_mut() = Some(id.to_string());
    }

    fn id(&self) -> Option<String> {
        self.id.borrow().clone()
    }

    fn set_inverted(&self, _inverted: bool) {}

    fn set_ignore_time_scale(&self, _ignore: bool) {}

    fn set_time_scale(&self, scale: f32) {
        self.time_scale.set(scale);
    }

    fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    fn set_callbacks(&self, _kind: CallbackKind, _callbacks: Callbacks) {}

    fn play(&self) {
        self.playing.set(true);
    }

    fn pause(&self) {
        self.playing.set(false);
    }

    fn rewind(&self) {}

    fn restart(&self) {
        self.playing.set(true);
    }

    fn complete(&self, _with_callbacks: bool) {
        self.complete.set(true);
    }

    fn force_init(&self) {
        self.forced.set(true);
    }

    fn kill(&self, _complete: bool) {
        self.active.set(false);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn is_playing(&self) -> bool {
        self.playing.get()
    }

    fn is_complete(&self) -> bool {
        self.complete.get()
    }

    fn elapsed(&self) -> f32 {
        0.0
    }
}

/// Engine handing out [`Recording`] composites and keeping them for inspection.
#[derive(Default)]
pub struct RecordingEngine {
    pub created: RefCell<Vec<Rc<Recording>>>,
}

impl RecordingEngine {
    pub fn last(&self) -> Rc<Recording> {
        self.created
            .borrow()
            .last()
            .cloned()
            .expect("no composite created")
    }
}

impl AnimationEngine for RecordingEngine {
    fn create_composite(&self) -> CompositeHandle {
        let rec = Rc::new(Recording {
            active: Cell::new(true),
            playing: Cell::new(true),
            time_scale: Cell::new(1.0),
            ..Recording::default()
        });
        self.created.borrow_mut().push(rec.clone());
        rec
    }
}
