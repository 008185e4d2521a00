//! # ferrous-resources
//!
//! Reference-counted test resources with dirty tracking, cheap resets and
//! dependency ordering.
//!
//! ## Features
//!
//! - **Shared instances**: a resource is made once and handed to every holder
//!   until the last one releases it
//! - **Dirty tracking**: holders that mutate a shared instance mark it dirty
//!   and it is reset before anyone else sees it
//! - **Custom resets**: strategies may restore an instance in place instead of
//!   tearing it down and making a new one
//! - **Dependencies**: resources may need other resources; they are made
//!   first, cleaned last, and cycles are rejected when declared
//! - **Activity reporting**: every make and clean can be observed for timing
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
//! use std::rc::Rc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let url = ResourceManager::new(FnResource::new(|_| Ok("sqlite::memory:".to_string())));
//! let db = ResourceManager::builder(FnResource::new(|deps| {
//!     Ok(Database { url: deps.get::<String>("url")?.to_string() })
//! }))
//! .depends_on("url", url.clone())
//! .build()
//! .unwrap();
//!
//! let first = db.get().unwrap();
//! let second = db.get().unwrap();
//! assert!(Rc::ptr_eq(&first, &second));
//! assert_eq!(first.url, "sqlite::memory:");
//! assert_eq!(url.uses(), 1);
//!
//! db.release(first).unwrap();
//! db.release(second).unwrap();
//! assert_eq!(url.uses(), 0);
//! ```
//!
//! ## Dirty Resources
//!
//! ```rust
//! use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let manager = ResourceManager::new(FnResource::new(|_| Ok(RefCell::new(Vec::<u32>::new()))));
//!
//! let held = manager.get().unwrap();
//! held.borrow_mut().push(1);
//! manager.dirtied(&held);
//! assert!(manager.is_dirty());
//!
//! // The next acquisition gets a fresh instance.
//! let fresh = manager.get().unwrap();
//! assert!(!Rc::ptr_eq(&held, &fresh));
//! assert!(fresh.borrow().is_empty());
//! assert!(!manager.is_dirty());
//!
//! manager.release(held).unwrap();
//! manager.release(fresh).unwrap();
//! ```

// Module declarations
pub mod dependencies;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod manager;
pub mod node;
pub mod reporter;
pub mod resource;
pub mod resourced;

// Internal modules
mod internal;

// Re-export core types
pub use dependencies::{BoundResources, Dependencies, ResourceMap};
pub use error::{BoxError, ResourceError, ResourceResult};
pub use graph_export::{ExportFormat, GraphEdge, GraphNode, ResourceGraph};
pub use key::ResourceId;
pub use manager::{ResourceManager, ResourceManagerBuilder};
pub use node::{needed_resources, ResourceNode};
pub use reporter::{
    Activity, ActivityRecord, ActivityReporter, ActivityStats, NoopReporter, Phase,
    RecordingReporter, TimingReporter, TracingReporter,
};
pub use resource::{FnResource, Reset, Resource};
pub use resourced::ResourcedTest;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_shared_instance() {
        let manager = ResourceManager::new(FnResource::new(|_| Ok(42usize)));

        let a = manager.get().unwrap();
        let b = manager.get().unwrap();

        assert_eq!(*a, 42);
        assert!(Rc::ptr_eq(&a, &b)); // Same instance
        manager.release(a).unwrap();
        manager.release(b).unwrap();
    }

    #[test]
    fn test_release_cycle_makes_new_instance() {
        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();
        let manager = ResourceManager::new(FnResource::new(move |_| {
            counter_clone.set(counter_clone.get() + 1);
            Ok(format!("instance-{}", counter_clone.get()))
        }));

        let a = manager.get().unwrap();
        assert_eq!(a.as_str(), "instance-1");
        manager.release(a).unwrap();

        let b = manager.get().unwrap();
        assert_eq!(b.as_str(), "instance-2");
        manager.release(b).unwrap();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_free_needed_resources_matches_method() {
        let dep = ResourceManager::new(FnResource::new(|_| Ok(1u8)));
        let top = ResourceManager::builder(FnResource::new(|_| Ok(2u8)))
            .depends_on("dep", dep.clone())
            .build()
            .unwrap();

        let erased: Rc<dyn ResourceNode> = top.clone();
        let ids: Vec<_> = needed_resources(&erased).iter().map(|n| n.id()).collect();
        let expected: Vec<_> = top.needed_resources().iter().map(|n| n.id()).collect();
        assert_eq!(ids, expected);
        assert_eq!(ids, vec![dep.id(), top.id()]);
    }
}
