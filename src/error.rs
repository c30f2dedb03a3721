//! Error types for the dependency injection container.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::key::TypeIdentity;

/// Shared, clonable error cause.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Configuration-time variants are returned by
/// [`ContainerBuilder::build`](crate::ContainerBuilder::build); resolution and
/// close variants are returned by [`Container`](crate::Container) operations.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, DiError, Resolver};
///
/// let container = ContainerBuilder::new().build().unwrap();
/// match container.get::<String>() {
///     Err(DiError::UnresolvedDependency { missing, required_by, .. }) => {
///         assert_eq!(missing.simple_description(), "String");
///         assert!(required_by.is_none());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No binding for `missing` in the container or any ancestor
    #[error("{}", unresolved_message(.missing, .required_by, .scope))]
    UnresolvedDependency {
        missing: TypeIdentity,
        required_by: Option<TypeIdentity>,
        scope: String,
    },
    /// Dependency cycle, first element repeated at the end
    #[error("cyclic dependency detected: {}", render_path(.0))]
    CyclicDependency(Vec<TypeIdentity>),
    /// Scope type not declared under the current container
    #[error("tried to enter unknown scope '{scope}'. Registered scopes: [{}]", .registered.join(", "))]
    ScopeNotConfigured {
        scope: String,
        registered: Vec<String>,
    },
    /// Same scope type declared at two scope paths
    #[error("scope type '{scope_type}' is already used in scope '{path}'")]
    ScopeAlreadyUsed { scope_type: TypeIdentity, path: String },
    /// One or more closers failed
    #[error("exception(s) during close:\n{}", render_failures(.0))]
    AggregatedCloseFailure(Vec<CloseFailure>),
    /// A fallible factory returned an error
    #[error("could not instantiate '{identity}': {cause}")]
    Instantiation { identity: TypeIdentity, cause: Cause },
    /// Type downcast failed
    #[error("type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// The container (or the container owning a binding) is closed
    #[error("container '{0}' is already closed")]
    ContainerClosed(String),
    /// Close on shutdown needs tracked instances to close
    #[error("can only close on shutdown if lifecycle management is activated")]
    ShutdownRequiresLifecycleManagement,
    /// Settings could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl DiError {
    /// Wraps a factory failure for `identity`.
    pub fn instantiation<E>(identity: TypeIdentity, cause: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let cause: Box<dyn Error + Send + Sync + 'static> = cause.into();
        DiError::Instantiation {
            identity,
            cause: Arc::from(cause),
        }
    }
}

/// A single failed close, part of [`DiError::AggregatedCloseFailure`].
#[derive(Debug, Clone)]
pub struct CloseFailure {
    pub identity: TypeIdentity,
    pub cause: Cause,
}

impl fmt::Display for CloseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.identity, self.cause)
    }
}

fn unresolved_message(
    missing: &TypeIdentity,
    required_by: &Option<TypeIdentity>,
    scope: &str,
) -> String {
    match required_by {
        Some(by) => format!(
            "unresolved dependency '{}' required by '{}' in scope '{}'",
            missing, by, scope
        ),
        None => format!("no binding for '{}' in scope '{}'", missing, scope),
    }
}

fn render_path(path: &[TypeIdentity]) -> String {
    path.iter()
        .map(TypeIdentity::simple_description)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn render_failures(failures: &[CloseFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
