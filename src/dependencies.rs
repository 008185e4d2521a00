//! Label-keyed maps of live resource instances.

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

use crate::error::{ResourceError, ResourceResult};

/// Ordered mapping from label to a shared resource instance.
///
/// Handed to [`Resource::make`](crate::Resource::make) with the instances of
/// the declared dependencies, and returned by
/// [`ResourcedTest::set_up`](crate::ResourcedTest::set_up) with the instances
/// bound for one test. Lookups are typed; instances are shared, never copied.
///
/// # Examples
///
/// ```rust
/// use ferrous_resources::{FnResource, ResourceManager};
///
/// let port = ResourceManager::new(FnResource::new(|_| Ok(5432u16)));
/// let url = ResourceManager::builder(FnResource::new(|deps| {
///     let port = deps.get::<u16>("port")?;
///     Ok(format!("postgres://localhost:{}", port))
/// }))
/// .depends_on("port", port.clone())
/// .build()
/// .unwrap();
///
/// let value = url.get().unwrap();
/// assert_eq!(*value, "postgres://localhost:5432");
/// ```
#[derive(Clone, Default)]
pub struct ResourceMap {
    entries: Vec<(String, Rc<dyn Any>)>,
}

/// Instances of a manager's dependencies, keyed by dependency label.
pub type Dependencies = ResourceMap;

/// Instances bound for a single test, keyed by declaration label.
pub type BoundResources = ResourceMap;

impl ResourceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, label: impl Into<String>, instance: Rc<dyn Any>) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = instance,
            None => self.entries.push((label, instance)),
        }
    }

    pub(crate) fn remove(&mut self, label: &str) -> Option<Rc<dyn Any>> {
        let index = self.entries.iter().position(|(l, _)| l == label)?;
        Some(self.entries.remove(index).1)
    }

    /// Typed lookup of the instance bound under `label`.
    pub fn get<T: 'static>(&self, label: &str) -> ResourceResult<Rc<T>> {
        let instance = self
            .get_any(label)
            .ok_or_else(|| ResourceError::MissingDependency(label.to_string()))?;
        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| ResourceError::TypeMismatch {
                label: label.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Untyped lookup of the instance bound under `label`.
    pub fn get_any(&self, label: &str) -> Option<&Rc<dyn Any>> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, instance)| instance)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get_any(label).is_some()
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<dyn Any>)> {
        self.entries.iter().map(|(l, i)| (l.as_str(), i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.labels()).finish()
    }
}
