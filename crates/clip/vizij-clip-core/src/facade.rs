//! Clip and variant façade.
//!
//! A clip (or a variant of it) owns at most one cached live composite.
//! `generate_tween` is idempotent: while the cached composite is still active
//! it is returned as is, so calling it every frame never rebuilds anything.
//! `force_generate_tween` always rebuilds, and `generate_independent_tween`
//! builds a composite the caller owns outright.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::compiler::{compile, CompileContext};
use crate::data::{Clip, ClipSettings};
use crate::engine::CompositeHandle;
use crate::error::ClipError;
use crate::ids::ClipId;
use crate::startup::StartupBehavior;
use crate::target::TargetRef;

/// Slot for the composite generated on behalf of a clip or variant.
///
/// Cloning a clip does not share its composite: the clone starts empty.
#[derive(Default)]
pub struct HandleCache {
    handle: Option<CompositeHandle>,
}

impl Clone for HandleCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleCache")
            .field("live", &self.live().is_some())
            .finish()
    }
}

impl HandleCache {
    /// The cached composite, if it has not been killed.
    pub fn live(&self) -> Option<&CompositeHandle> {
        self.handle.as_ref().filter(|h| h.is_active())
    }

    /// Reuse the live composite: optionally rewind, then play or pause.
    fn reuse(&self, rewind_if_exists: bool, and_play: bool) -> Option<CompositeHandle> {
        let handle = self.live()?;
        if rewind_if_exists {
            handle.rewind();
        }
        if and_play {
            handle.play();
        } else {
            handle.pause();
        }
        Some(handle.clone())
    }

    fn store(&mut self, handle: Option<CompositeHandle>) -> Option<CompositeHandle> {
        self.handle = handle.clone();
        handle
    }

    /// Kill the cached composite (if live) and forget it.
    pub fn kill(&mut self, complete: bool) {
        if let Some(handle) = self.handle.take() {
            if handle.is_active() {
                handle.kill(complete);
            }
        }
    }

    fn rewind_and_kill(&mut self, rewind_if_exists: bool) {
        if rewind_if_exists {
            if let Some(handle) = self.live() {
                handle.rewind();
            }
        }
        self.kill(false);
    }
}

impl Clip {
    /// Cached live composite, if any.
    pub fn tween(&self) -> Option<&CompositeHandle> {
        self.cache.live()
    }

    /// Return the cached composite or compile one.
    ///
    /// `behavior` overrides the startup behavior and `and_play` overrides
    /// autoplay for this call; both default to the clip's settings.
    pub fn generate_tween(
        &mut self,
        ctx: &CompileContext<'_>,
        behavior: Option<StartupBehavior>,
        and_play: Option<bool>,
        rewind_if_exists: bool,
    ) -> Option<CompositeHandle> {
        let play = and_play.unwrap_or(self.settings.autoplay);
        if let Some(handle) = self.cache.reuse(rewind_if_exists, play) {
            return Some(handle);
        }
        if !self.is_active {
            return None;
        }
        let settings = self.settings.with_overrides(behavior, and_play);
        let handle = compile(self, ctx, &settings, None);
        self.cache.store(handle)
    }

    /// Kill any cached composite and compile a fresh one, regardless of the
    /// clip's active flag.
    pub fn force_generate_tween(
        &mut self,
        ctx: &CompileContext<'_>,
        behavior: Option<StartupBehavior>,
        and_play: Option<bool>,
        rewind_if_exists: bool,
    ) -> Option<CompositeHandle> {
        self.cache.rewind_and_kill(rewind_if_exists);
        let settings = self.settings.with_overrides(behavior, and_play);
        let handle = compile(self, ctx, &settings, None);
        self.cache.store(handle)
    }

    /// Compile an uncached composite, optionally retargeted through a flat
    /// `[old0, new0, ...]` substitution list. Ignores the active flag.
    pub fn generate_independent_tween(
        &self,
        ctx: &CompileContext<'_>,
        and_play: bool,
        startup_delay: Option<f32>,
        substitutions: Option<&[TargetRef]>,
    ) -> Option<CompositeHandle> {
        let mut settings = self.settings.with_overrides(None, Some(and_play));
        if let Some(delay) = startup_delay {
            settings.startup_delay = delay;
        }
        compile(self, ctx, &settings, substitutions)
    }

    /// Play from the cached composite, building it if needed.
    pub fn play(&mut self, ctx: &CompileContext<'_>, restart: bool) -> Option<CompositeHandle> {
        self.generate_tween(ctx, Some(StartupBehavior::Create), Some(true), restart)
    }

    pub fn pause(&self) {
        if let Some(handle) = self.cache.live() {
            handle.pause();
        }
    }

    pub fn rewind(&self) {
        if let Some(handle) = self.cache.live() {
            handle.rewind();
        }
    }

    pub fn complete(&self, with_callbacks: bool) {
        if let Some(handle) = self.cache.live() {
            handle.complete(with_callbacks);
        }
    }

    pub fn kill_tween(&mut self, complete: bool) {
        self.cache.kill(complete);
    }
}

/// Alternate settings and targets for an existing clip. Holds the clip id,
/// never the clip itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClipVariant {
    pub clip_id: ClipId,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Use `settings` instead of the clip's own.
    #[serde(default)]
    pub override_settings: bool,
    #[serde(default)]
    pub settings: ClipSettings,
    /// Flat `[old0, new0, old1, new1, ...]` target substitutions.
    #[serde(default)]
    pub substitutions: Vec<TargetRef>,
    #[serde(skip)]
    cache: HandleCache,
}

fn default_true() -> bool {
    true
}

impl ClipVariant {
    pub fn new(clip: &Clip) -> Self {
        Self {
            clip_id: clip.id,
            is_active: true,
            override_settings: false,
            settings: clip.settings.clone(),
            substitutions: Vec::new(),
            cache: HandleCache::default(),
        }
    }

    /// Replace `old` with `new` when compiling through this variant.
    pub fn substitute(mut self, old: impl Into<TargetRef>, new: impl Into<TargetRef>) -> Self {
        self.substitutions.push(old.into());
        self.substitutions.push(new.into());
        self
    }

    pub fn with_settings(mut self, settings: ClipSettings) -> Self {
        self.settings = settings;
        self.override_settings = true;
        self
    }

    pub fn tween(&self) -> Option<&CompositeHandle> {
        self.cache.live()
    }

    fn check(&self, clip: &Clip) -> Result<(), ClipError> {
        if clip.id == self.clip_id {
            Ok(())
        } else {
            let err = ClipError::ClipMismatch {
                expected: self.clip_id,
                actual: clip.id,
            };
            warn!("{err}");
            Err(err)
        }
    }

    /// Settings used for compilation.
    pub fn effective_settings<'c>(&'c self, clip: &'c Clip) -> &'c ClipSettings {
        if self.override_settings {
            &self.settings
        } else {
            &clip.settings
        }
    }

    fn subs(&self) -> Option<&[TargetRef]> {
        (!self.substitutions.is_empty()).then_some(self.substitutions.as_slice())
    }

    pub fn generate_tween(
        &mut self,
        clip: &Clip,
        ctx: &CompileContext<'_>,
        behavior: Option<StartupBehavior>,
        and_play: Option<bool>,
        rewind_if_exists: bool,
    ) -> Option<CompositeHandle> {
        self.check(clip).ok()?;
        let base = self.effective_settings(clip);
        let play = and_play.unwrap_or(base.autoplay);
        if let Some(handle) = self.cache.reuse(rewind_if_exists, play) {
            return Some(handle);
        }
        if !self.is_active || !clip.is_active {
            return None;
        }
        let settings = base.with_overrides(behavior, and_play);
        let handle = compile(clip, ctx, &settings, self.subs());
        self.cache.store(handle)
    }

    pub fn force_generate_tween(
        &mut self,
        clip: &Clip,
        ctx: &CompileContext<'_>,
        behavior: Option<StartupBehavior>,
        and_play: Option<bool>,
        rewind_if_exists: bool,
    ) -> Option<CompositeHandle> {
        self.check(clip).ok()?;
        self.cache.rewind_and_kill(rewind_if_exists);
        let settings = self
            .effective_settings(clip)
            .with_overrides(behavior, and_play);
        let handle = compile(clip, ctx, &settings, self.subs());
        self.cache.store(handle)
    }

    pub fn generate_independent_tween(
        &self,
        clip: &Clip,
        ctx: &CompileContext<'_>,
        and_play: bool,
        startup_delay: Option<f32>,
    ) -> Option<CompositeHandle> {
        self.check(clip).ok()?;
        let mut settings = self
            .effective_settings(clip)
            .with_overrides(None, Some(and_play));
        if let Some(delay) = startup_delay {
            settings.startup_delay = delay;
        }
        compile(clip, ctx, &settings, self.subs())
    }

    pub fn play(
        &mut self,
        clip: &Clip,
        ctx: &CompileContext<'_>,
        restart: bool,
    ) -> Option<CompositeHandle> {
        self.generate_tween(clip, ctx, Some(StartupBehavior::Create), Some(true), restart)
    }

    pub fn kill_tween(&mut self, complete: bool) {
        self.cache.kill(complete);
    }
}
