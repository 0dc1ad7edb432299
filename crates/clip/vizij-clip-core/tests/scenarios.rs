mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{approx, Harness, Inserted, RecordingEngine};
use vizij_clip_core::{
    ActionBody, ActionPayload, Callbacks, Clip, ClipElement, CompileContext, DescriptorRef, Ease,
    EaseSettings, LoopType, StartupBehavior, TargetRef, TimeMode, TweenBody, Value,
};

fn linear_alpha(target: &str, to: f32, duration: f32) -> TweenBody {
    TweenBody::new(target, DescriptorRef::id("alpha"), duration, Value::f(to))
        .with_ease(EaseSettings::named(Ease::Linear))
}

fn clip_of(name: &str, elements: Vec<ClipElement>) -> Clip {
    let mut clip = Clip::new(name);
    clip.layers[0].element_ids = elements.iter().map(|e| e.id).collect();
    clip.elements = elements;
    clip
}

/// it should tween a float from its live value to the literal over one second
#[test]
fn dynamic_from_tweens_live_value_to_literal() {
    let h = Harness::new();
    let mut clip = clip_of(
        "scenario-a",
        vec![ClipElement::tween(0.0, linear_alpha("sprite", 5.0, 1.0))],
    );

    let handle = clip
        .generate_tween(&h.live(), None, None, false)
        .expect("composite");
    assert!(approx(handle.duration(), 1.0, 1e-6));
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-6), "nothing renders before the first tick");

    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 3.5, 1e-4));
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 5.0, 1e-4));
    assert!(!handle.is_active(), "autokill after completion");
    assert!(clip.tween().is_none());
}

/// it should rescale element times in live mode and only the time scale in preview
#[test]
fn duration_overload_scales_elements_live_and_speed_in_preview() {
    let h = Harness::new();
    let mut clip = clip_of(
        "scenario-b",
        vec![
            ClipElement::tween(0.0, linear_alpha("sprite", 1.0, 2.0)),
            ClipElement::tween(2.0, linear_alpha("sprite", 0.0, 2.0)),
        ],
    );
    clip.settings.time_mode = TimeMode::DurationOverload;
    clip.settings.duration_overload = 2.0;
    assert!(approx(clip.authored_duration(), 4.0, 1e-6));

    let engine = RecordingEngine::default();
    let live = CompileContext::live(&h.registry, &h.targets, &engine);
    clip.generate_independent_tween(&live, true, None, None)
        .expect("live composite");
    let rec = engine.last();
    assert_eq!(
        *rec.inserted.borrow(),
        vec![
            Inserted::Tween { at: 0.0, duration: 1.0 },
            Inserted::Tween { at: 1.0, duration: 1.0 },
        ]
    );
    assert!(approx(rec.duration.get(), 2.0, 1e-6));
    assert!(approx(rec.time_scale.get(), 1.0, 1e-6));

    let preview = CompileContext::preview(&h.registry, &h.targets, &engine);
    clip.generate_independent_tween(&preview, false, None, None)
        .expect("preview composite");
    let rec = engine.last();
    assert_eq!(
        *rec.inserted.borrow(),
        vec![
            Inserted::Tween { at: 0.0, duration: 2.0 },
            Inserted::Tween { at: 2.0, duration: 2.0 },
        ]
    );
    assert!(approx(rec.duration.get(), 4.0, 1e-6));
    assert!(approx(rec.time_scale.get(), 2.0, 1e-6));
    assert!(!rec.playing.get(), "preview composites stay paused");
}

/// it should complete, kill and forget the composite when starting with Complete and autokill
#[test]
fn complete_startup_with_autokill_leaves_no_handle() {
    let h = Harness::new();
    let mut clip = clip_of(
        "scenario-c",
        vec![ClipElement::tween(0.0, linear_alpha("sprite", 5.0, 1.0))],
    );
    clip.settings.startup_behavior = StartupBehavior::Complete;
    clip.settings.autokill = true;

    assert!(clip.generate_tween(&h.live(), None, None, false).is_none());
    assert!(clip.tween().is_none());
    assert!(approx(h.sprite.alpha.get(), 5.0, 1e-4), "end state applied");
    assert_eq!(h.timeline.active_count(), 0);
}

/// it should keep the composite when Complete runs without autokill
#[test]
fn complete_startup_without_autokill_keeps_handle() {
    let h = Harness::new();
    let mut clip = clip_of(
        "scenario-c2",
        vec![ClipElement::tween(0.0, linear_alpha("sprite", 5.0, 1.0))],
    );
    clip.settings.startup_behavior = StartupBehavior::Complete;
    clip.settings.autokill = false;

    let handle = clip
        .generate_tween(&h.live(), None, None, false)
        .expect("composite kept");
    assert!(handle.is_complete());
    assert!(handle.is_active());
    assert!(approx(h.sprite.alpha.get(), 5.0, 1e-4));
}

/// Clip fading alpha to 5 with an event half way through.
fn fade_with_event(name: &str) -> (Clip, Rc<Cell<u32>>) {
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    let mut listeners = Callbacks::new();
    listeners.push(move || counter.set(counter.get() + 1));
    let mut clip = clip_of(
        name,
        vec![
            ClipElement::tween(0.0, linear_alpha("sprite", 5.0, 1.0)),
            ClipElement::event(0.5, listeners),
        ],
    );
    clip.settings.autokill = false;
    (clip, hits)
}

/// it should fire event listeners when completing with internal callbacks
#[test]
fn complete_with_internal_callbacks_fires_events() {
    let h = Harness::new();
    let (mut clip, hits) = fade_with_event("complete-loud");
    let handle = clip
        .generate_tween(
            &h.live(),
            Some(StartupBehavior::CompleteWithInternalCallbacks),
            None,
            false,
        )
        .expect("composite kept");
    assert_eq!(hits.get(), 1);
    assert!(approx(h.sprite.alpha.get(), 5.0, 1e-4));
    assert!(handle.is_complete());
}

/// it should reach the end state without firing listeners when completing silently
#[test]
fn complete_startup_fires_no_events() {
    let h = Harness::new();
    let (mut clip, hits) = fade_with_event("complete-silent");
    let handle = clip
        .generate_tween(&h.live(), Some(StartupBehavior::Complete), None, false)
        .expect("composite kept");
    assert_eq!(hits.get(), 0);
    assert!(approx(h.sprite.alpha.get(), 5.0, 1e-4));
    assert!(handle.is_complete());
    h.timeline.update(1.0);
    assert_eq!(hits.get(), 0, "a completed composite does not replay");
}

/// it should play an inverted clip from its end state back to the start
#[test]
fn inverted_clip_plays_backwards() {
    let h = Harness::new();
    let body = linear_alpha("sprite", 5.0, 1.0).with_from(Value::f(1.0));
    let mut clip = clip_of("inverted", vec![ClipElement::tween(0.0, body)]);
    clip.settings.inverted = true;

    clip.generate_tween(&h.live(), None, None, false)
        .expect("composite");
    h.timeline.update(0.25);
    assert!(approx(h.sprite.alpha.get(), 4.0, 1e-4));
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 1.0, 1e-4));
}

/// it should loop the whole clip back and forth when it yoyos
#[test]
fn yoyo_clip_returns_to_start() {
    let h = Harness::new();
    let body = linear_alpha("sprite", 1.0, 1.0).with_from(Value::f(0.0));
    let mut clip = clip_of("yoyo", vec![ClipElement::tween(0.0, body)]);
    clip.settings.loops = 2;
    clip.settings.loop_type = LoopType::Yoyo;

    let handle = clip
        .generate_tween(&h.live(), None, None, false)
        .expect("composite");
    h.timeline.update(0.75);
    assert!(approx(h.sprite.alpha.get(), 0.75, 1e-4));
    h.timeline.update(0.75);
    assert!(approx(h.sprite.alpha.get(), 0.5, 1e-4), "second loop runs backwards");
    assert!(handle.is_active());
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 0.0, 1e-4));
    assert!(!handle.is_active());
}

/// it should run on_create at compile time and the action before a same-time tween
#[test]
fn action_and_tween_at_same_time_keep_array_order() {
    let h = Harness::new();
    let hide = ClipElement::action(
        0.0,
        ActionBody {
            plugin_id: "debug".into(),
            descriptor: DescriptorRef::id("hide"),
            target: Some("sprite".into()),
            payload: ActionPayload::default(),
            execute_in_preview: false,
        },
    );
    let fade = ClipElement::tween(0.0, linear_alpha("sprite", 1.0, 1.0));
    let mut clip = clip_of("scenario-d", vec![hide, fade]);

    clip.generate_tween(&h.live(), None, None, false)
        .expect("composite");
    assert_eq!(h.log(), vec!["created".to_string()]);
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-6));

    h.timeline.update(0.5);
    assert_eq!(h.log(), vec!["created".to_string(), "hide".to_string()]);
    // the tween sampled its start after the action zeroed alpha
    assert!(approx(h.sprite.alpha.get(), 0.5, 1e-4));
}

/// it should ignore an odd substitution list and compile against the original targets
#[test]
fn odd_substitution_list_is_ignored() {
    let h = Harness::new();
    let clip = clip_of(
        "scenario-e",
        vec![ClipElement::tween(0.0, linear_alpha("sprite", 4.0, 1.0))],
    );
    let subs: Vec<TargetRef> = vec!["sprite".into(), "other".into(), "label".into()];

    let handle = clip
        .generate_independent_tween(&h.live(), true, None, Some(&subs))
        .expect("still compiles");
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 4.0, 1e-4));
    assert!(approx(h.other_sprite.alpha.get(), 0.0, 1e-6));
    assert!(!handle.is_active());
}

/// it should retarget through an even substitution list
#[test]
fn even_substitution_list_retargets() {
    let h = Harness::new();
    let clip = clip_of(
        "retarget",
        vec![ClipElement::tween(0.0, linear_alpha("sprite", 4.0, 1.0))],
    );
    let subs: Vec<TargetRef> = vec!["sprite".into(), "other".into()];

    clip.generate_independent_tween(&h.live(), true, None, Some(&subs))
        .expect("composite");
    h.timeline.update(1.0);
    assert!(approx(h.other_sprite.alpha.get(), 4.0, 1e-4));
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-6));
}
