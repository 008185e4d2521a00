//! Resource strategies: how a kind of resource is made, cleaned and reset.

use std::any::type_name;
use std::borrow::Cow;
use std::rc::Rc;

use crate::dependencies::Dependencies;
use crate::error::{ResourceError, ResourceResult};

/// Outcome of a strategy's [`Resource::reset`].
#[derive(Debug)]
pub enum Reset<T> {
    /// The strategy restored the instance itself; hand this one out.
    Reused(Rc<T>),
    /// Fall back to cleaning the old instance and making a new one.
    Recreate,
}

/// Strategy describing one kind of resource.
///
/// Only [`make`](Resource::make) normally needs implementing. A strategy
/// that leaves it out behaves like an abstract resource: acquiring it fails
/// with [`ResourceError::NotImplemented`].
///
/// # Examples
///
/// ```
/// use ferrous_resources::{Dependencies, Reset, Resource, ResourceManager, ResourceResult};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// struct Table;
///
/// impl Resource for Table {
///     type Instance = RefCell<Vec<String>>;
///
///     fn make(&self, _deps: &Dependencies) -> ResourceResult<Self::Instance> {
///         Ok(RefCell::new(Vec::new()))
///     }
///
///     // Truncating is cheaper than dropping and recreating.
///     fn reset(
///         &self,
///         instance: &Rc<Self::Instance>,
///         _deps: &Dependencies,
///     ) -> ResourceResult<Reset<Self::Instance>> {
///         instance.borrow_mut().clear();
///         Ok(Reset::Reused(instance.clone()))
///     }
/// }
///
/// let table = ResourceManager::new(Table);
/// let rows = table.get().unwrap();
/// rows.borrow_mut().push("row".to_string());
/// table.dirtied(&rows);
///
/// let again = table.get().unwrap();
/// assert!(Rc::ptr_eq(&rows, &again));
/// assert!(again.borrow().is_empty());
/// ```
pub trait Resource: 'static {
    /// Value produced by this resource.
    type Instance: 'static;

    /// Constructs a fresh instance from the dependencies' instances.
    fn make(&self, dependencies: &Dependencies) -> ResourceResult<Self::Instance> {
        let _ = dependencies;
        Err(ResourceError::NotImplemented(self.name().into_owned()))
    }

    /// Tears an instance down. Defaults to doing nothing.
    fn clean(&self, instance: &Self::Instance) -> ResourceResult<()> {
        let _ = instance;
        Ok(())
    }

    /// Restores a dirty instance to a freshly made state.
    ///
    /// Only consulted when the manager (or one of its dependencies) is
    /// dirty. `dependencies` holds the dependencies' instances after they
    /// have been reset themselves. The default asks for a full
    /// clean-then-make cycle.
    fn reset(
        &self,
        instance: &Rc<Self::Instance>,
        dependencies: &Dependencies,
    ) -> ResourceResult<Reset<Self::Instance>> {
        let _ = (instance, dependencies);
        Ok(Reset::Recreate)
    }

    /// Relative set-up cost, used by callers to order work.
    fn set_up_cost(&self) -> u32 {
        1
    }

    /// Relative tear-down cost, used by callers to order work.
    fn tear_down_cost(&self) -> u32 {
        1
    }

    /// Name used in diagnostics and errors.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(type_name::<Self>())
    }
}

type MakeFn<T> = Box<dyn Fn(&Dependencies) -> ResourceResult<T>>;
type CleanFn<T> = Box<dyn Fn(&T) -> ResourceResult<()>>;
type ResetFn<T> = Box<dyn Fn(&Rc<T>, &Dependencies) -> ResourceResult<Reset<T>>>;

/// Closure-backed [`Resource`].
///
/// # Examples
///
/// ```
/// use ferrous_resources::{FnResource, ResourceManager};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let cleaned = Rc::new(Cell::new(0));
/// let counter = cleaned.clone();
///
/// let manager = ResourceManager::new(
///     FnResource::new(|_| Ok(String::from("scratch")))
///         .with_clean(move |_| {
///             counter.set(counter.get() + 1);
///             Ok(())
///         })
///         .with_costs(5, 2)
///         .named("scratch-dir"),
/// );
///
/// let dir = manager.get().unwrap();
/// manager.release(dir).unwrap();
/// assert_eq!(cleaned.get(), 1);
/// ```
pub struct FnResource<T> {
    name: Cow<'static, str>,
    make: MakeFn<T>,
    clean: Option<CleanFn<T>>,
    reset: Option<ResetFn<T>>,
    set_up_cost: u32,
    tear_down_cost: u32,
}

impl<T: 'static> FnResource<T> {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn(&Dependencies) -> ResourceResult<T> + 'static,
    {
        Self {
            name: Cow::Borrowed(type_name::<T>()),
            make: Box::new(make),
            clean: None,
            reset: None,
            set_up_cost: 1,
            tear_down_cost: 1,
        }
    }

    pub fn with_clean<F>(mut self, clean: F) -> Self
    where
        F: Fn(&T) -> ResourceResult<()> + 'static,
    {
        self.clean = Some(Box::new(clean));
        self
    }

    pub fn with_reset<F>(mut self, reset: F) -> Self
    where
        F: Fn(&Rc<T>, &Dependencies) -> ResourceResult<Reset<T>> + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    pub fn with_costs(mut self, set_up_cost: u32, tear_down_cost: u32) -> Self {
        self.set_up_cost = set_up_cost;
        self.tear_down_cost = tear_down_cost;
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<T: 'static> Resource for FnResource<T> {
    type Instance = T;

    fn make(&self, dependencies: &Dependencies) -> ResourceResult<T> {
        (self.make)(dependencies)
    }

    fn clean(&self, instance: &T) -> ResourceResult<()> {
        match &self.clean {
            Some(clean) => clean(instance),
            None => Ok(()),
        }
    }

    fn reset(&self, instance: &Rc<T>, dependencies: &Dependencies) -> ResourceResult<Reset<T>> {
        match &self.reset {
            Some(reset) => reset(instance, dependencies),
            None => Ok(Reset::Recreate),
        }
    }

    fn set_up_cost(&self) -> u32 {
        self.set_up_cost
    }

    fn tear_down_cost(&self) -> u32 {
        self.tear_down_cost
    }

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}
