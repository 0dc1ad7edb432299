mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{approx, Harness};
use vizij_clip_core::{
    parse_clip_set_json, Clip, ClipElement, ClipSettings, ClipVariant, DescriptorRef, Ease,
    EaseSettings, StartupBehavior, TweenBody, Value,
};

fn alpha(target: &str, to: f32, duration: f32) -> TweenBody {
    TweenBody::new(target, DescriptorRef::id("alpha"), duration, Value::f(to))
        .with_ease(EaseSettings::named(Ease::Linear))
}

fn fade(name: &str, target: &str, to: f32) -> Clip {
    let element = ClipElement::tween(0.0, alpha(target, to, 1.0));
    let mut clip = Clip::new(name);
    clip.layers[0].element_ids.push(element.id);
    clip.elements.push(element);
    clip
}

/// it should hand back the same composite while it is alive
#[test]
fn generate_tween_is_idempotent() {
    let h = Harness::new();
    let mut clip = fade("idem", "sprite", 1.0);
    let first = clip.generate_tween(&h.live(), None, None, false).expect("first");
    let second = clip.generate_tween(&h.live(), None, None, false).expect("second");
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(h.timeline.active_count(), 1);
}

/// it should rebuild once the cached composite was killed
#[test]
fn killed_composite_is_rebuilt() {
    let h = Harness::new();
    let mut clip = fade("rebuild", "sprite", 1.0);
    let first = clip.generate_tween(&h.live(), None, None, false).expect("first");
    h.timeline.update(2.0);
    assert!(!first.is_active());
    assert!(clip.tween().is_none());
    let second = clip.generate_tween(&h.live(), None, None, false).expect("second");
    assert!(!Rc::ptr_eq(&first, &second));
}

/// it should always build a fresh composite and kill the previous one
#[test]
fn force_generate_replaces_cached_composite() {
    let h = Harness::new();
    let mut clip = fade("force", "sprite", 1.0);
    let first = clip.generate_tween(&h.live(), None, None, false).expect("first");
    let second = clip
        .force_generate_tween(&h.live(), None, None, false)
        .expect("second");
    assert!(!first.is_active());
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(h.timeline.active_count(), 1);
}

/// it should not build anything for an inactive clip, unless forced
#[test]
fn inactive_clip_only_builds_when_forced() {
    let h = Harness::new();
    let mut clip = fade("off", "sprite", 1.0);
    clip.is_active = false;
    assert!(clip.generate_tween(&h.live(), None, None, false).is_none());
    assert!(clip.force_generate_tween(&h.live(), None, None, false).is_some());
}

/// it should build a fresh uncached composite on every independent call
#[test]
fn independent_tweens_are_never_cached() {
    let h = Harness::new();
    let mut clip = fade("independent", "sprite", 1.0);
    clip.is_active = false;

    let first = clip
        .generate_independent_tween(&h.live(), true, None, None)
        .expect("ignores the active flag");
    let second = clip
        .generate_independent_tween(&h.live(), true, None, None)
        .expect("second");
    assert!(!Rc::ptr_eq(&first, &second));
    assert!(first.is_active() && second.is_active());
    assert!(clip.tween().is_none());
    assert_eq!(h.timeline.active_count(), 2);

    clip.is_active = true;
    let cached = clip.generate_tween(&h.live(), None, None, false).expect("cached");
    let third = clip
        .generate_independent_tween(&h.live(), true, None, None)
        .expect("third");
    assert!(!Rc::ptr_eq(&cached, &third));
    assert!(Rc::ptr_eq(clip.tween().expect("cache kept"), &cached));
}

/// it should honour DoNothing and the autoplay override
#[test]
fn startup_overrides_per_call() {
    let h = Harness::new();
    let mut clip = fade("startup", "sprite", 1.0);
    clip.settings.startup_behavior = StartupBehavior::DoNothing;
    assert!(clip.generate_tween(&h.live(), None, None, false).is_none());

    let paused = clip
        .generate_tween(&h.live(), Some(StartupBehavior::Create), Some(false), false)
        .expect("built");
    assert!(!paused.is_playing());
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-6));

    clip.play(&h.live(), false).expect("cached");
    assert!(paused.is_playing());
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 1.5, 1e-4));
}

/// it should render explicit start values immediately on ForceInitialization
#[test]
fn force_initialization_renders_start() {
    let h = Harness::new();
    let element = ClipElement::tween(0.5, alpha("sprite", 1.0, 1.0).with_from(Value::f(0.0)));
    let mut clip = Clip::new("init");
    clip.layers[0].element_ids.push(element.id);
    clip.elements.push(element);
    clip.settings.startup_behavior = StartupBehavior::ForceInitialization;
    clip.settings.autoplay = false;

    let handle = clip.generate_tween(&h.live(), None, None, false).expect("built");
    assert!(approx(h.sprite.alpha.get(), 0.0, 1e-6));
    assert!(!handle.is_playing());
}

/// it should fire clip callbacks from the compiled composite
#[test]
fn clip_callbacks_are_forwarded() {
    let h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut clip = fade("callbacks", "sprite", 1.0);
    let (s, c) = (seen.clone(), seen.clone());
    clip.callbacks.on_start.push(move || s.borrow_mut().push("start"));
    clip.callbacks.on_complete.push(move || c.borrow_mut().push("complete"));

    clip.generate_tween(&h.live(), None, None, false).expect("built");
    h.timeline.update(0.5);
    h.timeline.update(0.5);
    assert_eq!(*seen.borrow(), vec!["start", "complete"]);
}

/// it should rewind and replay the cached composite on restart
#[test]
fn restart_rewinds_cached_composite() {
    let h = Harness::new();
    let mut clip = fade("restart", "sprite", 1.0);
    clip.settings.autokill = false;
    let first = clip.play(&h.live(), false).expect("built");
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 1.0, 1e-4));

    let again = clip.play(&h.live(), true).expect("cached");
    assert!(Rc::ptr_eq(&first, &again));
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-4), "rewound to the sampled start");
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 1.5, 1e-4));
}

/// it should compile a variant against substituted targets with its own cache
#[test]
fn variant_retargets_and_caches_separately() {
    let h = Harness::new();
    let mut clip = fade("base", "sprite", 4.0);
    let mut variant = ClipVariant::new(&clip).substitute("sprite", "other");

    let own = clip.generate_tween(&h.live(), None, None, false).expect("clip");
    let via = variant
        .generate_tween(&clip, &h.live(), None, None, false)
        .expect("variant");
    assert!(!Rc::ptr_eq(&own, &via));
    assert!(Rc::ptr_eq(
        &via,
        &variant
            .generate_tween(&clip, &h.live(), None, None, false)
            .expect("cached")
    ));

    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 4.0, 1e-4));
    assert!(approx(h.other_sprite.alpha.get(), 4.0, 1e-4));
}

/// it should use override settings only when asked to
#[test]
fn variant_override_settings() {
    let h = Harness::new();
    let clip = fade("base", "sprite", 1.0);
    let slow = ClipSettings {
        time_scale: 0.5,
        ..ClipSettings::default()
    };
    let mut variant = ClipVariant::new(&clip).with_settings(slow);
    let handle = variant
        .generate_tween(&clip, &h.live(), None, None, false)
        .expect("variant");
    assert!(approx(handle.time_scale(), 0.5, 1e-6));

    variant.override_settings = false;
    assert!(approx(variant.effective_settings(&clip).time_scale, 1.0, 1e-6));
}

/// it should refuse to compile a clip other than the one it was made for
#[test]
fn variant_rejects_other_clip() {
    let h = Harness::new();
    let clip = fade("base", "sprite", 1.0);
    let stranger = fade("stranger", "sprite", 1.0);
    let mut variant = ClipVariant::new(&clip);
    assert!(variant
        .generate_tween(&stranger, &h.live(), None, None, false)
        .is_none());
    assert!(variant
        .generate_independent_tween(&stranger, &h.live(), true, None)
        .is_none());
    assert!(variant
        .generate_independent_tween(&clip, &h.live(), true, None)
        .is_some());
}

/// it should need both the variant and its clip to be active
#[test]
fn variant_respects_both_active_flags() {
    let h = Harness::new();
    let mut clip = fade("base", "sprite", 1.0);
    let mut variant = ClipVariant::new(&clip);
    clip.is_active = false;
    assert!(variant
        .generate_tween(&clip, &h.live(), None, None, false)
        .is_none());
    clip.is_active = true;
    variant.is_active = false;
    assert!(variant
        .generate_tween(&clip, &h.live(), None, None, false)
        .is_none());
    assert!(variant
        .force_generate_tween(&clip, &h.live(), None, None, false)
        .is_some());
}

/// it should address the first clip with a given name
#[test]
fn clip_set_uses_first_match() {
    let h = Harness::new();
    let json = vizij_test_fixtures::clip_sets::json("ui").expect("fixture");
    let mut set = parse_clip_set_json(&json).expect("clip set");
    assert_eq!(set.clips.len(), 3);

    set.startup(&h.live());
    assert_eq!(h.timeline.active_count(), 3, "autoplay off still builds paused composites");
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 2.0, 1e-6));

    set.play("intro", &h.live(), false).expect("intro");
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 1.0, 1e-4));

    assert!(set.pause("outro"));
    assert!(!set.pause("credits"));
    assert!(set.kill("outro", false));
    set.kill_all(false);
    assert_eq!(h.timeline.active_count(), 0);
}
