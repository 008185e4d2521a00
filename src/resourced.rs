//! Binding declared resources around a single test.

use std::rc::Rc;

use tracing::{debug, error};

use crate::dependencies::BoundResources;
use crate::error::{ResourceError, ResourceResult};
use crate::node::ResourceNode;
use crate::reporter::{ActivityReporter, NoopReporter};

/// The resources a test declares, as `(label, manager)` pairs.
///
/// [`set_up`](Self::set_up) acquires every declared resource in declaration
/// order and returns the instances keyed by label;
/// [`tear_down`](Self::tear_down) releases them in reverse order.
///
/// # Examples
///
/// ```
/// use ferrous_resources::{FnResource, ResourceManager, ResourceNode, ResourcedTest};
///
/// let db = ResourceManager::new(FnResource::new(|_| Ok(String::from("db"))));
/// let dir = ResourceManager::new(FnResource::new(|_| Ok(std::path::PathBuf::from("/tmp/x"))));
///
/// let test = ResourcedTest::new()
///     .with_resource("db", db.clone()).unwrap()
///     .with_resource("dir", dir.clone()).unwrap();
///
/// let bound = test.set_up().unwrap();
/// assert_eq!(*bound.get::<String>("db").unwrap(), "db");
/// assert_eq!(db.uses(), 1);
///
/// test.tear_down(bound).unwrap();
/// assert_eq!(db.uses(), 0);
/// assert_eq!(dir.uses(), 0);
/// ```
#[derive(Clone, Default)]
pub struct ResourcedTest {
    resources: Vec<(String, Rc<dyn ResourceNode>)>,
}

impl ResourcedTest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a resource bound under `label`.
    pub fn declare(&mut self, label: impl Into<String>, resource: Rc<dyn ResourceNode>) -> ResourceResult<()> {
        let label = label.into();
        if self.resources.iter().any(|(l, _)| *l == label) {
            return Err(ResourceError::DuplicateLabel {
                resource: "test".to_string(),
                label,
            });
        }
        self.resources.push((label, resource));
        Ok(())
    }

    pub fn with_resource(mut self, label: impl Into<String>, resource: Rc<dyn ResourceNode>) -> ResourceResult<Self> {
        self.declare(label, resource)?;
        Ok(self)
    }

    /// Declared resources in declaration order.
    pub fn resources(&self) -> &[(String, Rc<dyn ResourceNode>)] {
        &self.resources
    }

    /// Acquires every declared resource without activity reporting.
    pub fn set_up(&self) -> ResourceResult<BoundResources> {
        self.set_up_with(&NoopReporter)
    }

    /// Acquires every declared resource in declaration order.
    ///
    /// If one fails, those already acquired are released again in reverse
    /// order and the original error is returned.
    pub fn set_up_with(&self, reporter: &dyn ActivityReporter) -> ResourceResult<BoundResources> {
        let mut bound = BoundResources::new();
        for (index, (label, resource)) in self.resources.iter().enumerate() {
            match resource.acquire(reporter) {
                Ok(instance) => bound.insert(label.clone(), instance),
                Err(err) => {
                    drop(bound);
                    for (_, held) in self.resources[..index].iter().rev() {
                        if let Err(release_err) = held.release_use(reporter) {
                            error!(resource = held.name(), error = %release_err, "failed to release resource after set-up error");
                        }
                    }
                    return Err(err);
                }
            }
        }
        debug!(resources = self.resources.len(), "test resources set up");
        Ok(bound)
    }

    /// Releases everything bound by [`set_up`](Self::set_up).
    pub fn tear_down(&self, bound: BoundResources) -> ResourceResult<()> {
        self.tear_down_with(bound, &NoopReporter)
    }

    /// Releases bound resources in reverse declaration order.
    ///
    /// Every resource is released even if an earlier release fails; the
    /// first error is returned.
    pub fn tear_down_with(&self, mut bound: BoundResources, reporter: &dyn ActivityReporter) -> ResourceResult<()> {
        let mut result = Ok(());
        for (label, resource) in self.resources.iter().rev() {
            drop(bound.remove(label));
            let released = resource.release_use(reporter);
            if result.is_ok() {
                result = released;
            }
        }
        debug!(resources = self.resources.len(), "test resources torn down");
        result
    }
}
