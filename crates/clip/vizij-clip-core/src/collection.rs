//! Named collection of clips.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::CompileContext;
use crate::data::Clip;
use crate::engine::CompositeHandle;

/// Clips owned by one host object. Lookup by name returns the first match.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClipSet {
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl ClipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn find(&self, name: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Clip> {
        let found = self.clips.iter_mut().find(|c| c.name == name);
        if found.is_none() {
            debug!("no clip named '{name}'");
        }
        found
    }

    /// Run every active clip's startup behavior.
    pub fn startup(&mut self, ctx: &CompileContext<'_>) {
        for clip in self.clips.iter_mut().filter(|c| c.is_active) {
            clip.generate_tween(ctx, None, None, false);
        }
    }

    pub fn play(
        &mut self,
        name: &str,
        ctx: &CompileContext<'_>,
        restart: bool,
    ) -> Option<CompositeHandle> {
        self.find_mut(name)?.play(ctx, restart)
    }

    /// Returns false when no clip has that name.
    pub fn pause(&self, name: &str) -> bool {
        self.find(name).map(Clip::pause).is_some()
    }

    pub fn restart(&mut self, name: &str, ctx: &CompileContext<'_>) -> Option<CompositeHandle> {
        self.play(name, ctx, true)
    }

    pub fn complete(&self, name: &str, with_callbacks: bool) -> bool {
        self.find(name)
            .map(|c| c.complete(with_callbacks))
            .is_some()
    }

    pub fn kill(&mut self, name: &str, complete: bool) -> bool {
        self.find_mut(name)
            .map(|c| c.kill_tween(complete))
            .is_some()
    }

    pub fn kill_all(&mut self, complete: bool) {
        for clip in &mut self.clips {
            clip.kill_tween(complete);
        }
    }
}
