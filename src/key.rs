//! Identity keys for resource managers.

use std::fmt;

/// Identity of a resource manager.
///
/// Managers are identified by object identity rather than by type or name:
/// two managers wrapping the same strategy type are still distinct
/// resources. The id is derived from the manager's address, which is stable
/// because managers only ever live behind an `Rc`.
///
/// # Examples
///
/// ```rust
/// use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
///
/// let a = ResourceManager::new(FnResource::new(|_| Ok(1u32)));
/// let b = ResourceManager::new(FnResource::new(|_| Ok(1u32)));
///
/// assert_eq!(a.id(), a.id());
/// assert_ne!(a.id(), b.id());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Identity of the value behind `value`.
    pub fn of<T: ?Sized>(value: &T) -> Self {
        ResourceId(value as *const T as *const () as usize)
    }

    /// Raw address, for diagnostics.
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res-{:x}", self.0)
    }
}
