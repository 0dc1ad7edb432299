mod common;

use common::{approx, Harness};
use vizij_clip_core::{clip_to_json, parse_clip_json, Clip, ElementKind, ResolutionMode};

fn load(name: &str) -> Clip {
    let json = vizij_test_fixtures::clips::json(name).expect("fixture");
    parse_clip_json(&json).expect("clip parses")
}

/// it should load every clip fixture
#[test]
fn all_fixtures_parse() {
    for key in vizij_test_fixtures::clips::keys() {
        let clip = load(&key);
        assert!(!clip.id.is_nil(), "{key}");
        assert!(!clip.layers.is_empty(), "{key}");
    }
}

/// it should keep ids and content across a save and reload
#[test]
fn round_trip_keeps_ids() {
    let clip = load("fade-in");
    let reloaded = parse_clip_json(&clip_to_json(&clip).expect("serialize")).expect("reload");
    assert_eq!(reloaded.id, clip.id);
    assert_eq!(reloaded.name, clip.name);
    assert_eq!(reloaded.elements, clip.elements);
    assert_eq!(reloaded.layers, clip.layers);
    assert_eq!(reloaded.settings, clip.settings);
    assert_eq!(
        reloaded.elements.iter().map(|e| e.kind()).collect::<Vec<_>>(),
        vec![ElementKind::Tween, ElementKind::Event]
    );
}

/// it should repair a damaged clip on load without dropping elements
#[test]
fn damaged_clip_is_repaired() {
    let json = vizij_test_fixtures::clips::json("damaged").expect("fixture");
    let mut raw: Clip = serde_json::from_str(&json).expect("raw parse");
    let report = raw.validate();

    assert!(report.regenerated_clip_id);
    assert!(report.regenerated_layer_ids.is_empty());
    assert_eq!(report.regenerated_element_ids.len(), 2);
    assert_eq!(report.removed_layer_refs, 1);
    assert_eq!(report.deduplicated_memberships, 1);
    assert_eq!(report.rebound_elements.len(), 3);
    assert!(report.recovery_layer.is_some());
    assert_eq!(report.normalized_slots.len(), 1);
    assert_eq!(report.clamped_times.len(), 1);

    assert_eq!(raw.elements.len(), 4);
    for element in &raw.elements {
        assert_eq!(
            raw.layers.iter().filter(|l| l.contains(element.id)).count(),
            1,
            "every element sits in exactly one layer"
        );
        assert!(element.start_time >= 0.0);
        let body = element.body.tween().expect("tween");
        let both_dynamic =
            body.from.mode == ResolutionMode::Dynamic && body.to.mode == ResolutionMode::Dynamic;
        assert!(!both_dynamic);
    }
    assert!(raw.validate().is_clean(), "validation is idempotent");

    let loaded = load("damaged");
    assert_eq!(loaded.elements.len(), 4);
    assert_eq!(loaded.layers.len(), 3);
}

/// it should resolve a descriptor stored by position only
#[test]
fn legacy_positional_descriptor_plays() {
    let h = Harness::new();
    let mut clip = load("legacy-positional");
    clip.generate_tween(&h.live(), None, None, false)
        .expect("positional descriptor resolves");
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 1.25, 1e-4));
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 0.5, 1e-4));
}

/// it should squeeze a stored four second clip into its two second overload
#[test]
fn stretch_fixture_plays_in_overload_time() {
    let h = Harness::new();
    let mut clip = load("stretch");
    assert!(approx(clip.authored_duration(), 4.0, 1e-6));

    let handle = clip
        .generate_tween(&h.live(), None, None, false)
        .expect("composite");
    assert!(approx(handle.duration(), 2.0, 1e-6));
    h.timeline.update(0.5);
    assert!(approx(h.sprite.alpha.get(), 0.5, 1e-4));
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 1.0, 1e-4));
    assert!(handle.is_active(), "the trailing interval still runs");
    h.timeline.update(1.0);
    assert!(!handle.is_active());
}

/// it should play the stored fade and reach full opacity
#[test]
fn fade_in_fixture_plays() {
    let h = Harness::new();
    let mut clip = load("fade-in");
    clip.generate_tween(&h.live(), None, None, false)
        .expect("composite");
    h.timeline.update(0.25);
    assert!(approx(h.sprite.alpha.get(), 0.25, 1e-4));
    h.timeline.update(1.0);
    assert!(approx(h.sprite.alpha.get(), 1.0, 1e-4));
}
