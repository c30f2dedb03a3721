//! Binding declarations and the per-scope registry.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::TypeIdentity;
use crate::lifetime::ReusePolicy;
use crate::traits::CloseError;

// Type-erased Arc for storage
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance from its resolved dependencies, in declaration order.
pub(crate) type FactoryFn = Arc<dyn Fn(Vec<Instance>) -> DiResult<Instance> + Send + Sync>;

/// Releases an instance of a known value type.
pub(crate) type CloseFn = Arc<dyn Fn(&Instance) -> Result<(), CloseError> + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

#[derive(Clone)]
pub(crate) enum Instantiator {
    Factory(FactoryFn),
    /// The object a scope container was entered with
    ScopeObject,
}

/// A registered rule mapping a type identity to a factory and its dependencies.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) target: TypeIdentity,
    pub(crate) dependencies: Vec<TypeIdentity>,
    pub(crate) instantiator: Instantiator,
    pub(crate) reuse_policy: ReusePolicy,
    /// Concrete type of produced instances, used to attach closers
    pub(crate) value_type: Option<TypeId>,
    pub(crate) closer: Option<CloseFn>,
    /// One prebuilt instance shared by every container owning the binding
    pub(crate) shared: bool,
}

impl Binding {
    pub(crate) fn new(
        target: TypeIdentity,
        dependencies: Vec<TypeIdentity>,
        reuse_policy: ReusePolicy,
        factory: FactoryFn,
    ) -> Self {
        Self {
            target,
            dependencies,
            instantiator: Instantiator::Factory(factory),
            reuse_policy,
            value_type: None,
            closer: None,
            shared: false,
        }
    }

    pub(crate) fn scope_object(target: TypeIdentity) -> Self {
        Self {
            target,
            dependencies: Vec::new(),
            instantiator: Instantiator::ScopeObject,
            reuse_policy: ReusePolicy::Singleton,
            value_type: None,
            closer: None,
            shared: false,
        }
    }

    /// Marks the produced instance as shared across scope instances.
    pub(crate) fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub(crate) fn with_value_type(mut self, value_type: TypeId) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Whether the owning container may need to close produced instances.
    pub(crate) fn is_trackable(&self) -> bool {
        self.reuse_policy.is_cached()
            && self.closer.is_some()
            && matches!(self.instantiator, Instantiator::Factory(_))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("target", &self.target)
            .field("dependencies", &self.dependencies)
            .field("reuse_policy", &self.reuse_policy)
            .field("scope_object", &matches!(self.instantiator, Instantiator::ScopeObject))
            .field("closeable", &self.closer.is_some())
            .field("shared", &self.shared)
            .finish()
    }
}

/// Bindings of one scope, keyed by identity, in declaration order.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    order: Vec<TypeIdentity>,
    bindings: FastMap<TypeIdentity, Binding>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding. Last write wins, first declaration position is kept.
    pub(crate) fn insert(&mut self, binding: Binding) {
        if !self.bindings.contains_key(&binding.target) {
            self.order.push(binding.target.clone());
        }
        self.bindings.insert(binding.target.clone(), binding);
    }

    #[inline]
    pub(crate) fn get(&self, identity: &TypeIdentity) -> Option<&Binding> {
        self.bindings.get(identity)
    }

    #[inline]
    pub(crate) fn contains_key(&self, identity: &TypeIdentity) -> bool {
        self.bindings.contains_key(identity)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Bindings in declaration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.order.iter().filter_map(move |id| self.bindings.get(id))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Binding> {
        self.bindings.values_mut()
    }
}
