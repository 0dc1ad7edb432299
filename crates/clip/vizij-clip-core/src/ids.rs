//! Stable identifiers for clips, elements and layers.
//!
//! Ids are random v4 uuids serialized as plain strings. They survive
//! (de)serialization unchanged and are only regenerated on true duplication or
//! when validation finds a nil/duplicate id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh random id.
            #[inline]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil id marks data that lost its identity.
            #[inline]
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            #[inline]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(
    /// Identity of a [`Clip`](crate::data::Clip).
    ClipId
);
uuid_id!(
    /// Identity of a timeline element.
    ElementId
);
uuid_id!(
    /// Identity of a layer.
    LayerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_not_nil() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
        assert!(!a.is_nil());
        assert!(ElementId::default().is_nil());
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = ClipId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: ClipId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
