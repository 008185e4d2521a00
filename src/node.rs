//! Type-erased view of a resource manager.

use std::any::Any;
use std::rc::Rc;

use crate::error::ResourceResult;
use crate::key::ResourceId;
use crate::reporter::ActivityReporter;

/// Object-safe interface every [`ResourceManager`](crate::ResourceManager)
/// implements regardless of the instance type it produces.
///
/// Dependencies are declared as `Rc<dyn ResourceNode>`, which lets a
/// manager depend on managers producing unrelated types. Instances cross
/// this boundary as `Rc<dyn Any>` and are downcast again through
/// [`ResourceMap::get`](crate::ResourceMap::get).
pub trait ResourceNode {
    /// Identity of this manager.
    fn id(&self) -> ResourceId;

    /// Human readable name for diagnostics.
    fn name(&self) -> &str;

    /// Relative cost of constructing the resource.
    fn set_up_cost(&self) -> u32;

    /// Relative cost of tearing the resource down.
    fn tear_down_cost(&self) -> u32;

    /// Number of outstanding holders.
    fn uses(&self) -> usize;

    /// Whether an instance is currently cached.
    fn has_instance(&self) -> bool;

    /// Own dirty flag, ignoring dependencies.
    fn is_dirty_self(&self) -> bool;

    /// Own dirty flag, any transitive dependency being dirty, or a
    /// dependency whose live instance is no longer the one this manager's
    /// instance was made with.
    fn is_dirty(&self) -> bool;

    /// The cached instance, type-erased.
    fn current_any(&self) -> Option<Rc<dyn Any>>;

    /// Declared dependencies in declaration order.
    fn dependencies(&self) -> Vec<(String, Rc<dyn ResourceNode>)>;

    /// Takes a reference to the instance, making or resetting it as needed.
    fn acquire(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Rc<dyn Any>>;

    /// Drops one reference, cleaning up when it was the last one.
    fn release_use(&self, reporter: &dyn ActivityReporter) -> ResourceResult<()>;

    /// Resets the cached instance if dirty and returns the current one.
    ///
    /// Returns `None` when no instance is cached.
    fn reset_current(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Option<Rc<dyn Any>>>;

    /// Marks the cached instance as mutated.
    fn mark_dirty(&self);
}

/// Dependency closure of a type-erased manager.
///
/// Same ordering as
/// [`ResourceManager::needed_resources`](crate::ResourceManager::needed_resources):
/// dependencies before dependents, each once, `root` last.
pub fn needed_resources(root: &Rc<dyn ResourceNode>) -> Vec<Rc<dyn ResourceNode>> {
    crate::internal::dependency_closure(root)
}
