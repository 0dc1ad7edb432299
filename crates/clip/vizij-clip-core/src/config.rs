//! Configuration for the reference timeline engine.

use serde::{Deserialize, Serialize};

use crate::ease::EaseSettings;

/// Engine-wide defaults. Clip-level playback settings live in
/// [`ClipSettings`](crate::data::ClipSettings) and travel with the clip.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global time scale applied to every composite unless it ignores time scale.
    pub time_scale: f32,

    /// Autokill flag given to freshly created composites.
    pub default_auto_kill: bool,

    /// Ease used by `TweenSpec`s built without an explicit ease.
    pub default_ease: EaseSettings,

    /// Seed for shake offsets, so shakes replay identically.
    pub shake_seed: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            default_auto_kill: true,
            default_ease: EaseSettings::default(),
            shake_seed: 0x5EED,
        }
    }
}
