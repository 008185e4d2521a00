//! Error types for resource lifecycle management.

use thiserror::Error;

/// Boxed error produced by user `make`/`clean`/`reset` code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Resource management errors
///
/// Covers both contract violations by callers (releasing too often,
/// cyclic declarations) and failures raised by resource strategies
/// themselves.
///
/// # Examples
///
/// ```rust
/// use ferrous_resources::ResourceError;
///
/// let circular = ResourceError::Circular(vec!["db".into(), "schema".into(), "db".into()]);
/// assert_eq!(circular.to_string(), "Circular resource dependency: db -> schema -> db");
///
/// let failed = ResourceError::failed("tempdir", "disk full");
/// assert_eq!(failed.to_string(), "Resource 'tempdir' failed: disk full");
/// ```
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The strategy does not provide `make`
    #[error("Resource '{0}' does not implement make")]
    NotImplemented(String),
    /// `finished_with` called more often than `get_resource`
    #[error("Resource '{0}' released more times than it was acquired")]
    OverReleased(String),
    /// Declaring the dependency would create a cycle (includes path)
    #[error("Circular resource dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// The label is already taken by another dependency
    #[error("Resource '{resource}' already declares a dependency labelled '{label}'")]
    DuplicateLabel {
        /// Resource declaring the dependency
        resource: String,
        /// Offending label
        label: String,
    },
    /// Dependencies cannot change while an instance is held
    #[error("Resource '{0}' cannot change its dependencies while in use")]
    InUse(String),
    /// Nothing is bound under the requested label
    #[error("No resource bound under label '{0}'")]
    MissingDependency(String),
    /// Downcast of a bound instance failed
    #[error("Resource bound under '{label}' is not a {expected}")]
    TypeMismatch {
        /// Label that was looked up
        label: String,
        /// Requested type name
        expected: &'static str,
    },
    /// A strategy's make, clean or reset reported an error
    #[error("Resource '{resource}' failed: {source}")]
    Failed {
        /// Resource whose strategy failed
        resource: String,
        /// The strategy's own error
        #[source]
        source: BoxError,
    },
}

impl ResourceError {
    /// Wraps an error raised by user resource code.
    pub fn failed(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ResourceError::Failed {
            resource: resource.into(),
            source: source.into(),
        }
    }
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;
