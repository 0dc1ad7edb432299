//! In-process reference implementation of the engine contract.
//!
//! A [`Timeline`] owns every composite it creates and advances them when the
//! host calls [`Timeline::update`]. Composites ([`Sequence`]) hold their items
//! sorted by insertion offset; items inserted at the same offset keep their
//! insertion order.
//!
//! Each state change is computed in two phases: the sequence state is borrowed
//! to work out which renders and callbacks are due, the borrow is released, and
//! only then are setters and user callbacks run. A callback may therefore kill,
//! pause or restart any composite, including its own.

use std::cell::RefCell;
use std::f32::consts::{PI, TAU};
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use tracing::debug;

use vizij_api_core::{lerp_value, Value};

use crate::config::Config;
use crate::engine::{
    AnimationEngine, Callback, CallbackKind, Callbacks, Composite, CompositeHandle, Getter,
    LoopType, Setter, TweenDirection, TweenShape, TweenSpec,
};

/// Owner and driver of composites.
pub struct Timeline {
    config: Config,
    sequences: RefCell<Vec<Rc<Sequence>>>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("config", &self.config)
            .field("sequences", &self.sequences.borrow().len())
            .finish()
    }
}

impl Timeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sequences: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale;
    }

    /// Tween spec seeded with the configured default ease.
    pub fn tween_spec(
        &self,
        getter: Getter,
        setter: Setter,
        to: Value,
        duration: f32,
    ) -> TweenSpec {
        TweenSpec::new(getter, setter, to, duration).ease(self.config.default_ease.clone())
    }

    /// Advance every playing composite by `dt` seconds and drop killed ones.
    pub fn update(&self, dt: f32) {
        let sequences: Vec<Rc<Sequence>> = self.sequences.borrow().clone();
        for seq in &sequences {
            seq.tick(dt, self.config.time_scale);
        }
        self.sequences.borrow_mut().retain(|s| s.is_active());
    }

    /// Composites not yet killed.
    pub fn active_count(&self) -> usize {
        self.sequences
            .borrow()
            .iter()
            .filter(|s| s.is_active())
            .count()
    }

    pub fn kill_all(&self, complete: bool) {
        for seq in self.snapshot() {
            seq.kill(complete);
        }
    }

    pub fn kill_by_id(&self, id: &str, complete: bool) -> usize {
        self.for_id(id, |s| s.kill(complete))
    }

    pub fn pause_by_id(&self, id: &str) -> usize {
        self.for_id(id, |s| s.pause())
    }

    pub fn play_by_id(&self, id: &str) -> usize {
        self.for_id(id, |s| s.play())
    }

    pub fn restart_by_id(&self, id: &str) -> usize {
        self.for_id(id, |s| s.restart())
    }

    pub fn complete_by_id(&self, id: &str, with_callbacks: bool) -> usize {
        self.for_id(id, |s| s.complete(with_callbacks))
    }

    fn snapshot(&self) -> Vec<Rc<Sequence>> {
        self.sequences.borrow().clone()
    }

    fn for_id(&self, id: &str, f: impl Fn(&Sequence)) -> usize {
        let matching: Vec<Rc<Sequence>> = self
            .snapshot()
            .into_iter()
            .filter(|s| s.is_active() && s.id().as_deref() == Some(id))
            .collect();
        for seq in &matching {
            f(seq);
        }
        matching.len()
    }
}

impl AnimationEngine for Timeline {
    fn create_composite(&self) -> CompositeHandle {
        let seq = Rc::new(Sequence::new(
            self.config.default_auto_kill,
            self.config.shake_seed,
        ));
        self.sequences.borrow_mut().push(seq.clone());
        seq
    }
}

// ---------- tween primitive ----------

#[derive(Default)]
struct RunState {
    started: bool,
    /// Getter returned `None` at start: the target is gone.
    dead: bool,
    start: Option<Value>,
    end: Option<Value>,
}

struct TweenRun {
    spec: TweenSpec,
    seed: u32,
    state: RefCell<RunState>,
}

impl TweenRun {
    fn new(spec: TweenSpec, seed: u32) -> Self {
        Self {
            spec,
            seed,
            state: RefCell::new(RunState::default()),
        }
    }

    fn full_duration(&self) -> f32 {
        self.spec.full_duration()
    }

    fn has_explicit_start(&self) -> bool {
        self.spec.shape == TweenShape::Standard
            && (self.spec.start_value.is_some() || self.spec.direction == TweenDirection::From)
    }

    fn is_started(&self) -> bool {
        self.state.borrow().started
    }

    /// Sample the live value and fix start/end. Returns false for dead targets.
    fn ensure_started(&self) -> bool {
        let mut st = self.state.borrow_mut();
        if st.started {
            return !st.dead;
        }
        st.started = true;
        let Some(live) = (self.spec.getter)() else {
            debug!("tween target is gone; tween skipped");
            st.dead = true;
            return false;
        };
        let spec = &self.spec;
        let base = spec.axis.mask(&live);
        let offset = |v: &Value| {
            if spec.relative {
                v.offset_from(&base)
            } else {
                v.clone()
            }
        };
        let (start, end) = match (spec.shape, spec.direction) {
            (TweenShape::Punch | TweenShape::Shake, _) => (base.clone(), spec.to.clone()),
            (TweenShape::Circle, _) => (base.clone(), offset(&spec.to)),
            (TweenShape::Standard, TweenDirection::To) => {
                let start = spec.start_value.as_ref().map(&offset).unwrap_or_else(|| base.clone());
                (start, offset(&spec.to))
            }
            (TweenShape::Standard, TweenDirection::From) => (offset(&spec.to), base.clone()),
        };
        st.start = Some(start);
        st.end = Some(end);
        true
    }

    /// Un-eased progress at `local` seconds into the primitive, loops included.
    fn progress_at(&self, local: f32) -> f32 {
        let spec = &self.spec;
        let loops = spec.loops.max(1);
        let yoyo = spec.loop_type == LoopType::Yoyo;
        if spec.duration <= 0.0 {
            return if yoyo && loops % 2 == 0 { 0.0 } else { 1.0 };
        }
        let local = local.max(0.0);
        let (index, within) = if local >= self.full_duration() {
            (loops - 1, spec.duration)
        } else {
            let index = (local / spec.duration).floor() as u32;
            (index, local - index as f32 * spec.duration)
        };
        let p = within / spec.duration;
        if yoyo && index % 2 == 1 {
            1.0 - p
        } else {
            p
        }
    }

    fn render(&self, local: f32) {
        if !self.ensure_started() {
            return;
        }
        let progress = self.progress_at(local);
        let eased = self.spec.ease.evaluate(progress);
        let computed = {
            let st = self.state.borrow();
            let (Some(start), Some(end)) = (st.start.as_ref(), st.end.as_ref()) else {
                return;
            };
            match self.spec.shape {
                TweenShape::Standard => lerp_value(start, end, eased),
                TweenShape::Punch => punch(start, end, eased, &self.spec),
                TweenShape::Shake => shake(start, end, eased, &self.spec, self.seed),
                TweenShape::Circle => circle(start, end, eased, self.spec.shape_options.degrees),
            }
        };
        self.write(computed);
    }

    fn write(&self, computed: Value) {
        let axis = self.spec.axis;
        let out = if axis.applies_to(computed.kind()) {
            match (self.spec.getter)() {
                Some(live) => axis.merge(&live, &computed),
                None => return,
            }
        } else {
            computed
        };
        (self.spec.setter)(&out);
    }
}

fn with_offsets(base: &Value, offset: impl Fn(usize) -> f32) -> Value {
    let (mut c, n) = base.components();
    for (i, slot) in c.iter_mut().enumerate().take(n) {
        *slot += offset(i);
    }
    Value::from_components(base.kind(), c).unwrap_or_else(|| base.clone())
}

fn punch(start: &Value, strength: &Value, t: f32, spec: &TweenSpec) -> Value {
    if t >= 1.0 {
        return start.clone();
    }
    let (s, _) = strength.components();
    let opts = &spec.shape_options;
    let wave = (t * opts.vibrato.max(1) as f32 * PI).sin();
    let wave = if wave < 0.0 { wave * opts.elasticity } else { wave };
    let decay = 1.0 - t;
    with_offsets(start, |i| s[i] * decay * wave)
}

fn shake(start: &Value, strength: &Value, t: f32, spec: &TweenSpec, seed: u32) -> Value {
    if t >= 1.0 {
        return start.clone();
    }
    let (s, _) = strength.components();
    let opts = &spec.shape_options;
    let fade = if opts.fade_out { 1.0 - t } else { 1.0 };
    let wave = (t * opts.vibrato.max(1) as f32 * TAU).sin();
    let spread = opts.randomness.to_radians();
    with_offsets(start, |i| {
        let dir = (unit_noise(seed, i as u32) * spread).cos();
        s[i] * fade * wave * dir
    })
}

fn circle(start: &Value, centre: &Value, t: f32, degrees: f32) -> Value {
    match (start, centre) {
        (Value::Vec2(p), Value::Vec2(c)) => {
            let angle = (degrees * t).to_radians();
            let (sin, cos) = angle.sin_cos();
            let (dx, dy) = (p[0] - c[0], p[1] - c[1]);
            Value::Vec2([c[0] + dx * cos - dy * sin, c[1] + dx * sin + dy * cos])
        }
        _ => lerp_value(start, centre, t),
    }
}

/// Deterministic noise in [-1, 1].
fn unit_noise(seed: u32, i: u32) -> f32 {
    let mut x = seed ^ i.wrapping_add(1).wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    (x as f32 / u32::MAX as f32) * 2.0 - 1.0
}

// ---------- sequence ----------

enum Item {
    Tween { at: f32, run: Rc<TweenRun> },
    Call { at: f32, callback: Callback },
}

impl Item {
    fn at(&self) -> f32 {
        match self {
            Item::Tween { at, .. } | Item::Call { at, .. } => *at,
        }
    }
}

enum Effect {
    Render(Rc<TweenRun>, f32),
    /// Render only if the tween has started by the time this runs.
    Restore(Rc<TweenRun>, f32),
    Call(Callback),
    Fire(Callbacks),
}

struct SeqState {
    id: Option<String>,
    items: Vec<Item>,
    duration: f32,
    delay: f32,
    delay_elapsed: f32,
    /// -1 loops forever.
    loops: i32,
    loop_type: LoopType,
    time_scale: f32,
    ignore_time_scale: bool,
    inverted: bool,
    auto_kill: bool,
    active: bool,
    playing: bool,
    started: bool,
    complete: bool,
    elapsed: f32,
    loop_index: i32,
    /// Rendered position inside the current loop.
    position: f32,
    /// Items sitting exactly at `position` are still due.
    entering: bool,
    callbacks: HashMap<CallbackKind, Callbacks>,
}

impl SeqState {
    fn fire(&self, kind: CallbackKind, out: &mut Vec<Effect>) {
        if let Some(cbs) = self.callbacks.get(&kind).filter(|c| !c.is_empty()) {
            out.push(Effect::Fire(cbs.clone()));
        }
    }

    fn loop_limit(&self) -> Option<i32> {
        (self.loops >= 0).then(|| self.loops.max(1))
    }

    /// Position inside loop `index` after `local` seconds of that loop.
    fn position_in_loop(&self, index: i32, local: f32) -> f32 {
        let d = self.duration;
        let mut p = local.clamp(0.0, d);
        if self.loop_type == LoopType::Yoyo && index % 2 == 1 {
            p = d - p;
        }
        if self.inverted {
            p = d - p;
        }
        p
    }

    /// Mark as started; inverted sequences first settle every tween at its end.
    fn begin(&mut self, fire: bool, out: &mut Vec<Effect>) {
        if self.started {
            return;
        }
        self.started = true;
        if fire {
            self.fire(CallbackKind::Start, out);
        }
        if self.inverted {
            self.entering = false;
            self.traverse(0.0, self.duration, false, out);
        }
        self.position = self.position_in_loop(0, 0.0);
        self.entering = true;
    }

    /// Move the rendered position inside one loop.
    fn traverse(&mut self, from: f32, to: f32, fire: bool, out: &mut Vec<Effect>) {
        let entering = std::mem::replace(&mut self.entering, false);
        if to >= from {
            for item in &self.items {
                match item {
                    Item::Tween { at, run } => {
                        let end = at + run.full_duration();
                        if to >= *at && from <= end {
                            let local = (to - at).min(run.full_duration());
                            out.push(Effect::Render(run.clone(), local));
                        }
                    }
                    Item::Call { at, callback } => {
                        let due = *at > from || (entering && *at == from);
                        if fire && due && *at <= to {
                            out.push(Effect::Call(callback.clone()));
                        }
                    }
                }
            }
        } else {
            for item in self.items.iter().rev() {
                match item {
                    Item::Tween { at, run } => {
                        let end = at + run.full_duration();
                        if from >= *at && to <= end {
                            out.push(Effect::Restore(run.clone(), (to - at).max(0.0)));
                        }
                    }
                    Item::Call { at, callback } => {
                        let due = *at < from || (entering && *at == from);
                        if fire && due && *at >= to {
                            out.push(Effect::Call(callback.clone()));
                        }
                    }
                }
            }
        }
    }

    /// Advance elapsed time by `dt`. Returns true when the last loop finished.
    fn advance(
        &mut self,
        mut dt: f32,
        limit: Option<i32>,
        fire: bool,
        out: &mut Vec<Effect>,
    ) -> bool {
        let d = self.duration;
        if d <= 0.0 {
            self.traverse(self.position, self.position, fire, out);
            if fire {
                self.fire(CallbackKind::StepComplete, out);
            }
            return true;
        }
        loop {
            let loop_start = self.loop_index as f32 * d;
            let loop_end = loop_start + d;
            let target = self.elapsed + dt;
            if target < loop_end {
                let pos = self.position_in_loop(self.loop_index, target - loop_start);
                self.traverse(self.position, pos, fire, out);
                self.position = pos;
                self.elapsed = target;
                return false;
            }
            let end_pos = self.position_in_loop(self.loop_index, d);
            self.traverse(self.position, end_pos, fire, out);
            self.position = end_pos;
            self.elapsed = loop_end;
            dt = target - loop_end;
            if fire {
                self.fire(CallbackKind::StepComplete, out);
            }
            if limit.is_some_and(|l| self.loop_index + 1 >= l) {
                return true;
            }
            self.loop_index += 1;
            let start_pos = self.position_in_loop(self.loop_index, 0.0);
            if start_pos != self.position {
                self.traverse(self.position, start_pos, false, out);
                self.position = start_pos;
                self.entering = true;
            }
        }
    }
}

/// Reference composite: a time-ordered list of tweens and callbacks.
pub struct Sequence {
    shake_seed: u32,
    state: RefCell<SeqState>,
}

impl Sequence {
    fn new(auto_kill: bool, shake_seed: u32) -> Self {
        Self {
            shake_seed,
            state: RefCell::new(SeqState {
                id: None,
                items: Vec::new(),
                duration: 0.0,
                delay: 0.0,
                delay_elapsed: 0.0,
                loops: 1,
                loop_type: LoopType::Restart,
                time_scale: 1.0,
                ignore_time_scale: false,
                inverted: false,
                auto_kill,
                active: true,
                playing: true,
                started: false,
                complete: false,
                elapsed: 0.0,
                loop_index: 0,
                position: 0.0,
                entering: true,
                callbacks: HashMap::new(),
            }),
        }
    }

    fn insert(&self, item: Item, span: f32) {
        let mut st = self.state.borrow_mut();
        let at = item.at();
        st.duration = st.duration.max(at + span);
        st.items.push(item);
        st.items.sort_by(|a, b| a.at().total_cmp(&b.at()));
    }

    /// Run collected effects, stopping if a callback kills the sequence.
    fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            if !self.state.borrow().active {
                break;
            }
            match effect {
                Effect::Render(run, local) => run.render(local),
                Effect::Restore(run, local) => {
                    if run.is_started() {
                        run.render(local);
                    }
                }
                Effect::Call(cb) => cb(),
                Effect::Fire(cbs) => cbs.invoke_all(),
            }
        }
    }

    fn finish_kill(&self) {
        let mut st = self.state.borrow_mut();
        st.active = false;
        st.playing = false;
        st.items.clear();
    }

    fn tick(&self, dt: f32, global_scale: f32) {
        let mut out = Vec::new();
        let kill_after;
        {
            let mut st = self.state.borrow_mut();
            if !st.active || !st.playing {
                return;
            }
            let scale = if st.ignore_time_scale { 1.0 } else { global_scale };
            let mut dt = (dt * scale * st.time_scale).max(0.0);
            if st.delay_elapsed < st.delay {
                let wait = st.delay - st.delay_elapsed;
                if dt < wait {
                    st.delay_elapsed += dt;
                    return;
                }
                st.delay_elapsed = st.delay;
                dt -= wait;
            }
            st.begin(true, &mut out);
            let limit = st.loop_limit();
            let done = st.advance(dt, limit, true, &mut out);
            st.fire(CallbackKind::Update, &mut out);
            if done {
                st.complete = true;
                st.playing = false;
                st.fire(CallbackKind::Complete, &mut out);
            }
            kill_after = done && st.auto_kill;
        }
        self.run(out);
        if kill_after {
            self.finish_kill();
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("Sequence")
            .field("id", &st.id)
            .field("duration", &st.duration)
            .field("items", &st.items.len())
            .field("elapsed", &st.elapsed)
            .field("active", &st.active)
            .field("playing", &st.playing)
            .finish()
    }
}

impl Composite for Sequence {
    fn insert_tween(&self, at: f32, tween: TweenSpec) {
        let at = at.max(0.0);
        let span = tween.full_duration();
        let seed = {
            let st = self.state.borrow();
            self.shake_seed ^ (st.items.len() as u32).wrapping_mul(0x2545_F491)
        };
        let run = Rc::new(TweenRun::new(tween, seed));
        self.insert(Item::Tween { at, run }, span);
    }

    fn insert_callback(&self, at: f32, callback: Callback) {
        self.insert(
            Item::Call {
                at: at.max(0.0),
                callback,
            },
            0.0,
        );
    }

    fn append_interval(&self, interval: f32) {
        self.state.borrow_mut().duration += interval.max(0.0);
    }

    fn duration(&self) -> f32 {
        self.state.borrow().duration
    }

    fn set_delay(&self, delay: f32) {
        self.state.borrow_mut().delay = delay.max(0.0);
    }

    fn set_auto_kill(&self, auto_kill: bool) {
        self.state.borrow_mut().auto_kill = auto_kill;
    }

    fn set_loops(&self, loops: i32, loop_type: LoopType) {
        let mut st = self.state.borrow_mut();
        st.loops = if loops < 0 { -1 } else { loops.max(1) };
        st.loop_type = loop_type;
    }

    fn set_id(&self, id: &str) {
        self.state.borrow_mut().id = Some(id.to_string());
    }

    fn id(&self) -> Option<String> {
        self.state.borrow().id.clone()
    }

    fn set_inverted(&self, inverted: bool) {
        let mut st = self.state.borrow_mut();
        if !st.started {
            st.inverted = inverted;
        }
    }

    fn set_ignore_time_scale(&self, ignore: bool) {
        self.state.borrow_mut().ignore_time_scale = ignore;
    }

    fn set_time_scale(&self, scale: f32) {
        self.state.borrow_mut().time_scale = scale.max(0.0);
    }

    fn time_scale(&self) -> f32 {
        self.state.borrow().time_scale
    }

    fn set_callbacks(&self, kind: CallbackKind, callbacks: Callbacks) {
        self.state.borrow_mut().callbacks.insert(kind, callbacks);
    }

    fn play(&self) {
        let mut st = self.state.borrow_mut();
        if st.active && !st.complete {
            st.playing = true;
        }
    }

    fn pause(&self) {
        self.state.borrow_mut().playing = false;
    }

    fn rewind(&self) {
        let mut out = Vec::new();
        {
            let mut st = self.state.borrow_mut();
            if !st.active {
                return;
            }
            if st.started {
                let start = if st.inverted { st.duration } else { 0.0 };
                st.entering = false;
                let from = st.position;
                st.traverse(from, start, false, &mut out);
                st.position = start;
            }
            st.started = false;
            st.complete = false;
            st.playing = false;
            st.elapsed = 0.0;
            st.loop_index = 0;
            st.delay_elapsed = 0.0;
            st.entering = true;
            st.fire(CallbackKind::Rewind, &mut out);
        }
        self.run(out);
    }

    fn restart(&self) {
        self.rewind();
        self.play();
    }

    fn complete(&self, with_callbacks: bool) {
        let mut out = Vec::new();
        let kill_after;
        {
            let mut st = self.state.borrow_mut();
            if !st.active || st.complete {
                return;
            }
            st.delay_elapsed = st.delay;
            st.begin(with_callbacks, &mut out);
            let limit = st.loop_limit().unwrap_or(st.loop_index + 1);
            let remaining = (limit as f32 * st.duration - st.elapsed).max(0.0);
            st.advance(remaining, Some(limit), with_callbacks, &mut out);
            st.complete = true;
            st.playing = false;
            if with_callbacks {
                st.fire(CallbackKind::Complete, &mut out);
            }
            kill_after = st.auto_kill;
        }
        self.run(out);
        if kill_after {
            self.finish_kill();
        }
    }

    fn force_init(&self) {
        let runs: Vec<Rc<TweenRun>> = {
            let st = self.state.borrow();
            if !st.active {
                return;
            }
            st.items
                .iter()
                .rev()
                .filter_map(|item| match item {
                    Item::Tween { run, .. } if run.has_explicit_start() => Some(run.clone()),
                    _ => None,
                })
                .collect()
        };
        for run in runs {
            run.render(0.0);
        }
    }

    fn kill(&self, complete: bool) {
        if !self.is_active() {
            return;
        }
        if complete {
            self.complete(true);
        }
        self.finish_kill();
    }

    fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    fn is_playing(&self) -> bool {
        let st = self.state.borrow();
        st.active && st.playing
    }

    fn is_complete(&self) -> bool {
        self.state.borrow().complete
    }

    fn elapsed(&self) -> f32 {
        self.state.borrow().elapsed
    }
}
