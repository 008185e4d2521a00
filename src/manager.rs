//! Reference-counted lifecycle manager for a single resource.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::dependencies::Dependencies;
use crate::error::{ResourceError, ResourceResult};
use crate::internal::{dependency_closure, find_path};
use crate::key::ResourceId;
use crate::node::ResourceNode;
use crate::reporter::{Activity, ActivityReporter, NoopReporter};
use crate::resource::{Reset, Resource};

type DependencyList = Vec<(String, Rc<dyn ResourceNode>)>;

/// Owns the lifecycle of one logical resource.
///
/// The first [`get_resource`](Self::get_resource) makes the instance (after
/// acquiring every dependency); later calls hand out the same `Rc` until the
/// last holder calls [`finished_with`](Self::finished_with), at which point
/// the instance is cleaned and the dependencies are released. A holder that
/// mutates the shared instance calls [`dirtied`](Self::dirtied) and the next
/// acquisition resets it.
///
/// Managers are created behind an `Rc` and are single-threaded.
///
/// # Examples
///
/// ```rust
/// use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
/// use std::rc::Rc;
///
/// let manager = ResourceManager::new(FnResource::new(|_| Ok(vec![0u8; 16])));
///
/// let a = manager.get().unwrap();
/// let b = manager.get().unwrap();
/// assert!(Rc::ptr_eq(&a, &b));
/// assert_eq!(manager.uses(), 2);
///
/// manager.release(a).unwrap();
/// manager.release(b).unwrap();
/// assert!(!manager.has_instance());
/// ```
pub struct ResourceManager<R: Resource> {
    resource: R,
    name: String,
    dependencies: RefCell<DependencyList>,
    cached: RefCell<Option<Rc<R::Instance>>>,
    made_with: RefCell<Dependencies>,
    uses: Cell<usize>,
    dirty: Cell<bool>,
}

impl<R: Resource> ResourceManager<R> {
    /// Creates a manager with no dependencies.
    pub fn new(resource: R) -> Rc<Self> {
        let name = resource.name().into_owned();
        Rc::new(Self::with_name(resource, name))
    }

    /// Starts a builder for a manager with dependencies.
    pub fn builder(resource: R) -> ResourceManagerBuilder<R> {
        ResourceManagerBuilder::new(resource)
    }

    fn with_name(resource: R, name: String) -> Self {
        Self {
            resource,
            name,
            dependencies: RefCell::new(Vec::new()),
            cached: RefCell::new(None),
            made_with: RefCell::new(Dependencies::new()),
            uses: Cell::new(0),
            dirty: Cell::new(false),
        }
    }

    /// The strategy this manager drives.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Declares a dependency whose instance is passed to `make` under `label`.
    ///
    /// Fails if the label is taken, if the declaration would close a cycle,
    /// or if the resource is currently held.
    pub fn add_dependency(
        &self,
        label: impl Into<String>,
        dependency: Rc<dyn ResourceNode>,
    ) -> ResourceResult<()> {
        let label = label.into();
        if self.uses.get() > 0 {
            return Err(ResourceError::InUse(self.name.clone()));
        }
        if self.dependencies.borrow().iter().any(|(l, _)| *l == label) {
            return Err(ResourceError::DuplicateLabel {
                resource: self.name.clone(),
                label,
            });
        }
        if let Some(path) = find_path(&dependency, self.id()) {
            let mut names = vec![self.name.clone()];
            names.extend(path.iter().map(|node| node.name().to_string()));
            error!(resource = %self.name, cycle = ?names, "rejected cyclic dependency");
            return Err(ResourceError::Circular(names));
        }
        debug!(resource = %self.name, label = %label, dependency = dependency.name(), "dependency declared");
        self.dependencies.borrow_mut().push((label, dependency));
        Ok(())
    }

    /// Acquires the shared instance without activity reporting.
    pub fn get(&self) -> ResourceResult<Rc<R::Instance>> {
        self.get_resource(&NoopReporter)
    }

    /// Acquires the shared instance, making or resetting it as needed.
    ///
    /// Every successful call must be paired with one
    /// [`finished_with`](Self::finished_with). If making fails, the
    /// dependencies acquired for it are released again and the use count is
    /// unchanged; the error is returned as the strategy produced it.
    pub fn get_resource(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Rc<R::Instance>> {
        let current = self.cached.borrow().clone();
        let instance = match current {
            None if self.uses.get() > 0 => {
                // A failed reset discarded the instance; dependencies are still held.
                let dependencies = self.reset_dependencies(reporter)?;
                let instance = Rc::new(self.invoke_make(&dependencies, reporter)?);
                self.store(instance.clone(), dependencies);
                instance
            }
            None => {
                let (made, dependencies) = self.make_all(reporter)?;
                let instance = Rc::new(made);
                self.store(instance.clone(), dependencies);
                instance
            }
            Some(instance) if self.is_dirty() => self.reset(instance, reporter)?,
            Some(instance) => instance,
        };
        self.uses.set(self.uses.get() + 1);
        trace!(resource = %self.name, uses = self.uses.get(), "resource acquired");
        Ok(instance)
    }

    /// Releases a holder's instance without activity reporting.
    pub fn release(&self, instance: Rc<R::Instance>) -> ResourceResult<()> {
        self.finished_with(instance, &NoopReporter)
    }

    /// Releases a holder's instance.
    ///
    /// When the last holder releases, the cached instance is cleaned and
    /// discarded and every dependency is released in reverse declaration
    /// order. Releasing more often than acquiring returns
    /// [`ResourceError::OverReleased`] and leaves the manager untouched.
    pub fn finished_with(
        &self,
        instance: Rc<R::Instance>,
        reporter: &dyn ActivityReporter,
    ) -> ResourceResult<()> {
        drop(instance);
        self.release_use(reporter)
    }

    /// Marks the shared instance as mutated.
    ///
    /// Affects every holder; the instance is reset on the next acquisition.
    pub fn dirtied(&self, instance: &R::Instance) {
        let _ = instance;
        self.mark_dirty();
    }

    /// Restores `instance` to a clean state if this resource or any
    /// dependency is dirty (or was reset since `instance` was made),
    /// otherwise returns it unchanged.
    ///
    /// Dependencies are reset first. The strategy's
    /// [`Resource::reset`] then either hands back a restored instance or asks
    /// for the default clean-then-make, which is reported as a `clean` and a
    /// `make` activity. If that `make` fails, the cleaned instance is no
    /// longer cached and the next acquisition makes a new one.
    pub fn reset(
        &self,
        instance: Rc<R::Instance>,
        reporter: &dyn ActivityReporter,
    ) -> ResourceResult<Rc<R::Instance>> {
        if !self.is_dirty() {
            return Ok(instance);
        }
        debug!(resource = %self.name, "resetting dirty resource");

        let holds_instance = self.cached.borrow().is_some();
        let dependencies = self.reset_dependencies(reporter)?;
        let fresh = match self.resource.reset(&instance, &dependencies)? {
            Reset::Reused(restored) => restored,
            Reset::Recreate => {
                self.invoke_clean(&instance, reporter)?;
                drop(instance);
                if holds_instance {
                    // Once cleaned, the old instance is gone even if make fails.
                    self.cached.borrow_mut().take();
                    *self.made_with.borrow_mut() = Dependencies::new();
                }
                Rc::new(self.invoke_make(&dependencies, reporter)?)
            }
        };

        self.dirty.set(false);
        if holds_instance {
            *self.cached.borrow_mut() = Some(fresh.clone());
            *self.made_with.borrow_mut() = dependencies;
        }
        Ok(fresh)
    }

    /// The instance currently cached, if any.
    pub fn current(&self) -> Option<Rc<R::Instance>> {
        self.cached.borrow().clone()
    }

    /// Dependency closure: every manager this one needs, dependencies
    /// before dependents, each once, with this manager last.
    pub fn needed_resources(self: &Rc<Self>) -> Vec<Rc<dyn ResourceNode>> {
        let root: Rc<dyn ResourceNode> = self.clone();
        dependency_closure(&root)
    }

    fn store(&self, instance: Rc<R::Instance>, dependencies: Dependencies) {
        *self.cached.borrow_mut() = Some(instance);
        *self.made_with.borrow_mut() = dependencies;
        self.dirty.set(false);
    }

    fn make_all(&self, reporter: &dyn ActivityReporter) -> ResourceResult<(R::Instance, Dependencies)> {
        let dependencies = self.acquire_dependencies(reporter)?;
        match self.invoke_make(&dependencies, reporter) {
            Ok(instance) => Ok((instance, dependencies)),
            Err(err) => {
                drop(dependencies);
                if let Err(release_err) = self.release_dependencies(reporter) {
                    error!(resource = %self.name, error = %release_err, "failed to release dependencies after make error");
                }
                Err(err)
            }
        }
    }

    fn acquire_dependencies(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Dependencies> {
        let declared = self.dependencies.borrow().clone();
        let mut acquired = Dependencies::new();
        for (index, (label, dependency)) in declared.iter().enumerate() {
            match dependency.acquire(reporter) {
                Ok(instance) => acquired.insert(label.clone(), instance),
                Err(err) => {
                    drop(acquired);
                    for (_, held) in declared[..index].iter().rev() {
                        if let Err(release_err) = held.release_use(reporter) {
                            error!(resource = held.name(), error = %release_err, "failed to release dependency");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(acquired)
    }

    fn release_dependencies(&self, reporter: &dyn ActivityReporter) -> ResourceResult<()> {
        let declared = self.dependencies.borrow().clone();
        let mut result = Ok(());
        for (_, dependency) in declared.iter().rev() {
            let released = dependency.release_use(reporter);
            if result.is_ok() {
                result = released;
            }
        }
        result
    }

    fn reset_dependencies(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Dependencies> {
        let declared = self.dependencies.borrow().clone();
        let mut current = Dependencies::new();
        for (label, dependency) in declared {
            if let Some(instance) = dependency.reset_current(reporter)? {
                current.insert(label, instance);
            }
        }
        Ok(current)
    }

    fn invoke_make(
        &self,
        dependencies: &Dependencies,
        reporter: &dyn ActivityReporter,
    ) -> ResourceResult<R::Instance> {
        debug!(resource = %self.name, "making resource");
        reporter.start_activity(Activity::Make, self);
        let made = self.resource.make(dependencies);
        reporter.stop_activity(Activity::Make, self);
        made
    }

    fn invoke_clean(&self, instance: &R::Instance, reporter: &dyn ActivityReporter) -> ResourceResult<()> {
        debug!(resource = %self.name, "cleaning resource");
        reporter.start_activity(Activity::Clean, self);
        let cleaned = self.resource.clean(instance);
        reporter.stop_activity(Activity::Clean, self);
        cleaned
    }
}

impl<R: Resource> ResourceNode for ResourceManager<R> {
    fn id(&self) -> ResourceId {
        ResourceId::of(self)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_up_cost(&self) -> u32 {
        self.resource.set_up_cost()
    }

    fn tear_down_cost(&self) -> u32 {
        self.resource.tear_down_cost()
    }

    fn uses(&self) -> usize {
        self.uses.get()
    }

    fn has_instance(&self) -> bool {
        self.cached.borrow().is_some()
    }

    fn is_dirty_self(&self) -> bool {
        self.dirty.get()
    }

    fn is_dirty(&self) -> bool {
        if self.dirty.get() {
            return true;
        }
        // A dependency reset behind our back leaves us holding a stale instance.
        let made_with = self.made_with.borrow();
        self.dependencies.borrow().iter().any(|(label, dependency)| {
            dependency.is_dirty()
                || match (made_with.get_any(label), dependency.current_any()) {
                    (Some(bound), Some(current)) => !Rc::ptr_eq(bound, &current),
                    _ => false,
                }
        })
    }

    fn current_any(&self) -> Option<Rc<dyn Any>> {
        let current: Rc<dyn Any> = self.current()?;
        Some(current)
    }

    fn dependencies(&self) -> Vec<(String, Rc<dyn ResourceNode>)> {
        self.dependencies.borrow().clone()
    }

    fn acquire(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Rc<dyn Any>> {
        let instance: Rc<dyn Any> = self.get_resource(reporter)?;
        Ok(instance)
    }

    fn release_use(&self, reporter: &dyn ActivityReporter) -> ResourceResult<()> {
        let uses = self.uses.get();
        if uses == 0 {
            error!(resource = %self.name, "resource released more times than acquired");
            return Err(ResourceError::OverReleased(self.name.clone()));
        }
        self.uses.set(uses - 1);
        trace!(resource = %self.name, uses = uses - 1, "resource released");
        if uses > 1 {
            return Ok(());
        }

        let cached = self.cached.borrow_mut().take();
        *self.made_with.borrow_mut() = Dependencies::new();
        self.dirty.set(false);
        let cleaned = match cached {
            Some(instance) => self.invoke_clean(&instance, reporter),
            None => Ok(()),
        };
        let released = self.release_dependencies(reporter);
        cleaned.and(released)
    }

    fn reset_current(&self, reporter: &dyn ActivityReporter) -> ResourceResult<Option<Rc<dyn Any>>> {
        let Some(current) = self.current() else {
            return Ok(None);
        };
        let instance: Rc<dyn Any> = self.reset(current, reporter)?;
        Ok(Some(instance))
    }

    fn mark_dirty(&self) {
        trace!(resource = %self.name, "resource dirtied");
        self.dirty.set(true);
    }
}

impl<R: Resource> fmt::Debug for ResourceManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("name", &self.name)
            .field("uses", &self.uses.get())
            .field("dirty", &self.dirty.get())
            .field("has_instance", &self.cached.borrow().is_some())
            .field(
                "dependencies",
                &self
                    .dependencies
                    .borrow()
                    .iter()
                    .map(|(label, _)| label.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for a [`ResourceManager`] with dependencies.
///
/// # Examples
///
/// ```rust
/// use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
///
/// let config = ResourceManager::new(FnResource::new(|_| Ok("sqlite::memory:".to_string())));
/// let pool = ResourceManager::builder(FnResource::new(|deps| {
///     let url = deps.get::<String>("config")?;
///     Ok(vec![url.to_string(); 2])
/// }))
/// .named("pool")
/// .depends_on("config", config.clone())
/// .build()
/// .unwrap();
///
/// let names: Vec<_> = pool.needed_resources().iter().map(|n| n.name().to_string()).collect();
/// assert_eq!(names.last().map(String::as_str), Some("pool"));
/// assert_eq!(names.len(), 2);
/// ```
pub struct ResourceManagerBuilder<R: Resource> {
    resource: R,
    name: Option<String>,
    dependencies: DependencyList,
}

impl<R: Resource> ResourceManagerBuilder<R> {
    fn new(resource: R) -> Self {
        Self {
            resource,
            name: None,
            dependencies: Vec::new(),
        }
    }

    /// Overrides the strategy's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn depends_on(mut self, label: impl Into<String>, dependency: Rc<dyn ResourceNode>) -> Self {
        self.dependencies.push((label.into(), dependency));
        self
    }

    /// Builds the manager, checking labels for duplicates.
    pub fn build(self) -> ResourceResult<Rc<ResourceManager<R>>> {
        let name = match self.name {
            Some(name) => name,
            None => self.resource.name().into_owned(),
        };
        let manager = Rc::new(ResourceManager::with_name(self.resource, name));
        for (label, dependency) in self.dependencies {
            manager.add_dependency(label, dependency)?;
        }
        Ok(manager)
    }
}
