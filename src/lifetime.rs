//! Reuse policy definitions.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Reuse policies controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
/// struct RequestModel;
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_constant(Database { url: "postgres://localhost".to_string() });
/// builder.with_custom_type::<Repository, (Database,), _>(ReusePolicy::Singleton, |(db,)| {
///     Repository { db }
/// });
/// builder.with_custom_type::<RequestModel, (), _>(ReusePolicy::Prototype, |()| RequestModel);
///
/// let container = builder.build().unwrap();
///
/// let repo1 = container.get_required::<Repository>();
/// let repo2 = container.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo1, &repo2)); // Cached
///
/// let model1 = container.get_required::<RequestModel>();
/// let model2 = container.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2)); // Always fresh
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReusePolicy {
    /// One instance per owning container, cached for the container's lifetime
    Singleton,
    /// New instance per resolution, never cached and never closed
    Prototype,
    /// One instance per owning scope container
    ///
    /// Behaves like `Singleton` within the container that declares the
    /// binding. Bindings declared inside `with_scope` blocks are owned by each
    /// entered scope, so every scope gets its own instance.
    Scoped,
}

impl ReusePolicy {
    /// Whether instances are cached by the owning container.
    #[inline]
    pub fn is_cached(self) -> bool {
        !matches!(self, ReusePolicy::Prototype)
    }
}

/// When cached bindings are instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum SingletonType {
    /// On first resolution
    #[default]
    Lazy,
    /// As soon as the owning container exists (build or scope entry)
    Eager,
}
