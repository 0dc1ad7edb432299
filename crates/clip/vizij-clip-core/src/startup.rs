//! What happens to a live composite right after it is built.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::ClipSettings;
use crate::engine::CompositeHandle;

/// Startup policy for live composites. Ignored in preview.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupBehavior {
    /// Build nothing.
    DoNothing,
    /// Build it; play if autoplay, otherwise leave it paused.
    #[default]
    Create,
    /// Build it and apply every start value at time 0 right away.
    ForceInitialization,
    /// Build it and jump to the end without firing callbacks.
    Complete,
    /// Build it and jump to the end, firing callbacks on the way.
    CompleteWithInternalCallbacks,
}

/// Apply the startup policy to a freshly built live composite. Returns `None`
/// when the composite was completed and killed.
pub(crate) fn apply(
    composite: CompositeHandle,
    settings: &ClipSettings,
) -> Option<CompositeHandle> {
    match settings.startup_behavior {
        // Filtered out before compilation; nothing to do if it gets here.
        StartupBehavior::DoNothing | StartupBehavior::Create => {
            if !settings.autoplay {
                composite.pause();
            }
            Some(composite)
        }
        StartupBehavior::ForceInitialization => {
            composite.force_init();
            if !settings.autoplay {
                composite.pause();
            }
            Some(composite)
        }
        StartupBehavior::Complete | StartupBehavior::CompleteWithInternalCallbacks => {
            let with_callbacks =
                settings.startup_behavior == StartupBehavior::CompleteWithInternalCallbacks;
            composite.complete(with_callbacks);
            if settings.autokill {
                debug!("composite completed at startup and killed");
                composite.kill(false);
                None
            } else {
                Some(composite)
            }
        }
    }
}
