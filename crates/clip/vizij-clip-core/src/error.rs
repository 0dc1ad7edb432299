//! Error types for clip parsing, registration and compilation setup.
//!
//! Most degraded states (missing plugin, missing target, orphan element) are
//! not errors: the compiler logs them and skips the element. `ClipError` covers
//! the failures a caller can act on.

use thiserror::Error;

use crate::ids::ClipId;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ClipError {
    /// Stored clip JSON could not be parsed.
    #[error("clip parse error: {reason}")]
    Parse { reason: String },

    /// Clip could not be serialized.
    #[error("clip serialize error: {reason}")]
    Serialize { reason: String },

    /// Target substitution lists must hold (old, new) pairs.
    #[error("target substitution list has odd length {len}; expected (old, new) pairs")]
    OddSubstitutionList { len: usize },

    /// A descriptor with the same stable id was already registered.
    #[error("duplicate descriptor id '{descriptor_id}' for plugin '{plugin}'")]
    DuplicateDescriptor {
        plugin: String,
        descriptor_id: String,
    },

    /// A variant was asked to drive a clip it does not reference.
    #[error("variant references clip {expected} but was given clip {actual}")]
    ClipMismatch { expected: ClipId, actual: ClipId },
}

impl ClipError {
    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } | Self::Serialize { .. } => "serialization",
            Self::OddSubstitutionList { .. } | Self::DuplicateDescriptor { .. } => {
                "configuration"
            }
            Self::ClipMismatch { .. } => "variant",
        }
    }
}

impl From<serde_json::Error> for ClipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
