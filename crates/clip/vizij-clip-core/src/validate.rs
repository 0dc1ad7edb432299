//! Data-integrity healing.
//!
//! Stored clips can drift out of shape (hand edits, merges, old tools).
//! `validate` repairs every problem it knows about in place and reports what
//! it changed; it never drops an element.

use hashbrown::HashSet;
use tracing::warn;

use crate::data::{Clip, ClipLayer, ElementBody, ResolutionMode};
use crate::ids::{ClipId, ElementId, LayerId};

/// What [`validate`] repaired.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub regenerated_clip_id: bool,
    /// New ids given to layers whose id was nil or duplicated.
    pub regenerated_layer_ids: Vec<LayerId>,
    /// New ids given to elements whose id was nil or duplicated.
    pub regenerated_element_ids: Vec<ElementId>,
    /// Layer entries pointing at no element.
    pub removed_layer_refs: usize,
    /// Entries dropped because the element was already listed by an earlier layer.
    pub deduplicated_memberships: usize,
    /// Elements that were in no layer.
    pub rebound_elements: Vec<ElementId>,
    /// Layer created to hold rebound elements.
    pub recovery_layer: Option<LayerId>,
    /// Tweens whose `to` slot was switched back to Direct.
    pub normalized_slots: Vec<ElementId>,
    /// Elements with a negative start time or duration.
    pub clamped_times: Vec<ElementId>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        *self == ValidationReport::default()
    }
}

impl Clip {
    /// See [`validate`].
    pub fn validate(&mut self) -> ValidationReport {
        validate(self)
    }
}

/// Name of the layer that receives orphan elements.
pub const RECOVERY_LAYER_NAME: &str = "Recovered";

/// Repair `clip` in place.
pub fn validate(clip: &mut Clip) -> ValidationReport {
    let mut report = ValidationReport::default();

    if clip.id.is_nil() {
        clip.id = ClipId::generate();
        report.regenerated_clip_id = true;
    }

    let mut seen_layers = HashSet::new();
    for layer in &mut clip.layers {
        if layer.id.is_nil() || !seen_layers.insert(layer.id) {
            layer.id = LayerId::generate();
            seen_layers.insert(layer.id);
            report.regenerated_layer_ids.push(layer.id);
        }
    }

    let mut seen_elements = HashSet::new();
    for element in &mut clip.elements {
        if element.id.is_nil() || !seen_elements.insert(element.id) {
            element.id = ElementId::generate();
            seen_elements.insert(element.id);
            report.regenerated_element_ids.push(element.id);
        }
    }

    let mut listed = HashSet::new();
    for layer in &mut clip.layers {
        layer.element_ids.retain(|id| {
            if !seen_elements.contains(id) {
                report.removed_layer_refs += 1;
                false
            } else if !listed.insert(*id) {
                report.deduplicated_memberships += 1;
                false
            } else {
                true
            }
        });
    }

    let orphans: Vec<ElementId> = clip
        .elements
        .iter()
        .map(|e| e.id)
        .filter(|id| !listed.contains(id))
        .collect();
    if !orphans.is_empty() {
        let mut layer = ClipLayer::new(RECOVERY_LAYER_NAME);
        layer.element_ids = orphans.clone();
        report.recovery_layer = Some(layer.id);
        report.rebound_elements = orphans;
        clip.layers.push(layer);
    }

    for element in &mut clip.elements {
        let mut clamped = false;
        if element.start_time < 0.0 || !element.start_time.is_finite() {
            element.start_time = 0.0;
            clamped = true;
        }
        match &mut element.body {
            ElementBody::Tween(t) | ElementBody::GlobalTween(t) => {
                if t.duration < 0.0 {
                    t.duration = 0.0;
                    clamped = true;
                }
                if t.from.is_dynamic() && t.to.is_dynamic() {
                    t.to.mode = ResolutionMode::Direct;
                    report.normalized_slots.push(element.id);
                }
            }
            ElementBody::Interval(i) if i.duration < 0.0 => {
                i.duration = 0.0;
                clamped = true;
            }
            _ => {}
        }
        if clamped {
            report.clamped_times.push(element.id);
        }
    }

    if !report.is_clean() {
        warn!(
            regenerated_ids =
                report.regenerated_element_ids.len() + report.regenerated_layer_ids.len(),
            dangling_refs = report.removed_layer_refs,
            duplicate_memberships = report.deduplicated_memberships,
            orphans_rebound = report.rebound_elements.len(),
            slots_normalized = report.normalized_slots.len(),
            times_clamped = report.clamped_times.len(),
            "clip '{}' repaired",
            clip.name
        );
    }
    report
}
