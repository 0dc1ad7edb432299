//! Editing operations on clips. These keep layer membership consistent, so an
//! edited clip never needs validation.

use crate::data::{Clip, ClipElement, ClipLayer};
use crate::ids::{ClipId, ElementId, LayerId};

impl Clip {
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = ClipLayer::new(name);
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// Remove a layer together with its elements. Returns the removed elements.
    pub fn remove_layer(&mut self, layer: LayerId) -> Vec<ClipElement> {
        let Some(pos) = self.layers.iter().position(|l| l.id == layer) else {
            return Vec::new();
        };
        let removed = self.layers.remove(pos);
        let (gone, kept): (Vec<ClipElement>, Vec<ClipElement>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|e| removed.contains(e.id));
        self.elements = kept;
        gone
    }

    /// Reorder layers. Out-of-range positions are ignored.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() || to >= self.layers.len() {
            return false;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        true
    }

    /// Append `element` to `layer`. A nil id is replaced with a fresh one.
    pub fn add_element(&mut self, layer: LayerId, mut element: ClipElement) -> Option<ElementId> {
        if element.id.is_nil() || self.element(element.id).is_some() {
            element.id = ElementId::generate();
        }
        let id = element.id;
        self.layer_mut(layer)?.element_ids.push(id);
        self.elements.push(element);
        Some(id)
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<ClipElement> {
        let pos = self.elements.iter().position(|e| e.id == id)?;
        for layer in &mut self.layers {
            layer.element_ids.retain(|e| *e != id);
        }
        Some(self.elements.remove(pos))
    }

    pub fn move_element_to_layer(&mut self, id: ElementId, layer: LayerId) -> bool {
        if self.element(id).is_none() || self.layer(layer).is_none() {
            return false;
        }
        for l in &mut self.layers {
            l.element_ids.retain(|e| *e != id);
        }
        if let Some(l) = self.layer_mut(layer) {
            l.element_ids.push(id);
        }
        true
    }

    /// Copy an element into the same layer under a fresh id.
    pub fn duplicate_element(&mut self, id: ElementId) -> Option<ElementId> {
        let mut copy = self.element(id)?.clone();
        copy.id = ElementId::generate();
        let new_id = copy.id;
        let layer = self.layer_of(id).map(|l| l.id);
        self.elements.push(copy);
        match layer.and_then(|l| self.layer_mut(l)) {
            Some(l) => l.element_ids.push(new_id),
            None => {
                self.validate();
            }
        }
        Some(new_id)
    }

    /// Deep copy. With `regenerate_id` the copy is a distinct clip; element
    /// and layer ids are scoped to a clip and stay the same. The copy never
    /// shares the cached composite.
    pub fn duplicate(&self, regenerate_id: bool) -> Clip {
        let mut copy = self.clone();
        if regenerate_id {
            copy.id = ClipId::generate();
        }
        copy
    }
}
