//! JSON storage for clips.
//!
//! Parsing always runs validation, so a loaded clip is safe to compile even if
//! the file was edited by hand or written by an older tool.

use tracing::debug;

use crate::collection::ClipSet;
use crate::data::Clip;
use crate::error::ClipError;

/// Parse and validate one clip.
pub fn parse_clip_json(json: &str) -> Result<Clip, ClipError> {
    let mut clip: Clip = serde_json::from_str(json)?;
    let report = clip.validate();
    if !report.is_clean() {
        debug!("clip '{}' repaired on load: {:?}", clip.name, report);
    }
    Ok(clip)
}

pub fn clip_to_json(clip: &Clip) -> Result<String, ClipError> {
    serde_json::to_string_pretty(clip).map_err(|e| ClipError::Serialize {
        reason: e.to_string(),
    })
}

/// Parse a clip set; every clip is validated.
pub fn parse_clip_set_json(json: &str) -> Result<ClipSet, ClipError> {
    let mut set: ClipSet = serde_json::from_str(json)?;
    for clip in &mut set.clips {
        clip.validate();
    }
    Ok(set)
}
