//! Target references, live target objects and target substitution.
//!
//! Clips store [`TargetRef`]s (small string keys). At compile time a
//! [`TargetResolver`] supplied by the host turns them into [`TargetObject`]s:
//! a shared handle to the live object plus the type key used to pick the tween
//! plugin for that object.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::warn;

use crate::error::ClipError;

/// Serializable reference to a host object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetRef(pub String);

impl TargetRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type key for a Rust type, as used by the plugin registry.
#[inline]
pub fn type_key<T: Any>() -> &'static str {
    type_name::<T>()
}

/// A live host object. Objects use interior mutability (`Cell`/`RefCell`)
/// because getters and setters only receive shared access.
#[derive(Clone)]
pub struct TargetObject {
    type_key: String,
    object: Rc<dyn Any>,
}

impl TargetObject {
    /// Wrap an object, keyed by its Rust type name.
    pub fn new<T: Any>(object: Rc<T>) -> Self {
        Self {
            type_key: type_key::<T>().to_string(),
            object,
        }
    }

    /// Wrap an object under an explicit type key (for hosts with dynamic types).
    pub fn with_type_key(type_key: impl Into<String>, object: Rc<dyn Any>) -> Self {
        Self {
            type_key: type_key.into(),
            object,
        }
    }

    #[inline]
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Typed access to the underlying object.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &TargetObject) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }

    /// Handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakTargetObject {
        WeakTargetObject {
            type_key: self.type_key.clone(),
            object: Rc::downgrade(&self.object),
        }
    }
}

/// Non-owning [`TargetObject`].
#[derive(Clone)]
pub struct WeakTargetObject {
    type_key: String,
    object: Weak<dyn Any>,
}

impl WeakTargetObject {
    /// `None` once the host dropped the object.
    pub fn upgrade(&self) -> Option<TargetObject> {
        self.object.upgrade().map(|object| TargetObject {
            type_key: self.type_key.clone(),
            object,
        })
    }
}

impl fmt::Debug for WeakTargetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTargetObject")
            .field("type_key", &self.type_key)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for TargetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetObject")
            .field("type_key", &self.type_key)
            .finish_non_exhaustive()
    }
}

/// Resolves stored target references into live objects.
/// Hosts implement this; `None` means the target is missing or destroyed.
pub trait TargetResolver {
    fn resolve(&self, target: &TargetRef) -> Option<TargetObject>;
}

/// Simple map-backed resolver.
#[derive(Clone, Debug, Default)]
pub struct SceneTargets {
    objects: HashMap<TargetRef, TargetObject>,
}

impl SceneTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the object behind `target`.
    pub fn insert<T: Any>(&mut self, target: impl Into<TargetRef>, object: Rc<T>) -> &mut Self {
        self.objects.insert(target.into(), TargetObject::new(object));
        self
    }

    pub fn insert_object(
        &mut self,
        target: impl Into<TargetRef>,
        object: TargetObject,
    ) -> &mut Self {
        self.objects.insert(target.into(), object);
        self
    }

    /// Forget a target, as when the host object is destroyed.
    pub fn remove(&mut self, target: &TargetRef) -> Option<TargetObject> {
        self.objects.remove(target)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl TargetResolver for SceneTargets {
    fn resolve(&self, target: &TargetRef) -> Option<TargetObject> {
        self.objects.get(target).cloned()
    }
}

/// Validated (old, new) target substitution pairs. Read-only during a
/// compilation and never stored on a clip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSubstitutions {
    pairs: Vec<(TargetRef, TargetRef)>,
}

impl TargetSubstitutions {
    /// Build from a flat `[old0, new0, old1, new1, ...]` list.
    pub fn from_flat(list: &[TargetRef]) -> Result<Self, ClipError> {
        if list.len() % 2 != 0 {
            return Err(ClipError::OddSubstitutionList { len: list.len() });
        }
        let pairs = list
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Ok(Self { pairs })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (TargetRef, TargetRef)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Drop pairs whose live objects resolve to different type keys. Pairs
    /// with an unresolvable side are kept; the element skip happens later.
    pub fn retain_matching_types(mut self, resolver: &dyn TargetResolver) -> Self {
        self.pairs.retain(|(old, new)| {
            match (resolver.resolve(old), resolver.resolve(new)) {
                (Some(a), Some(b)) if a.type_key() != b.type_key() => {
                    warn!(
                        "target substitution {} -> {} ignored: type {} does not match {}",
                        old,
                        new,
                        a.type_key(),
                        b.type_key()
                    );
                    false
                }
                _ => true,
            }
        });
        self
    }

    /// Replacement for `target`, first matching pair wins.
    pub fn apply<'a>(&'a self, target: &'a TargetRef) -> &'a TargetRef {
        self.pairs
            .iter()
            .find(|(old, _)| old == target)
            .map(|(_, new)| new)
            .unwrap_or(target)
    }

    pub fn pairs(&self) -> &[(TargetRef, TargetRef)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
