//! Resolver traits for instance resolution.

use std::sync::Arc;

use crate::dependencies::downcast_instance;
use crate::error::DiResult;
use crate::key::TypeIdentity;
use crate::registration::Instance;

/// Core resolver trait for object-safe resolution.
///
/// Implemented by [`Container`](crate::Container) and
/// [`ScopeHandle`](crate::ScopeHandle). Most users should use the
/// [`Resolver`] trait instead, which provides typed methods on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves `identity` in this container or the nearest ancestor that binds it.
    fn resolve_any(&self, identity: &TypeIdentity) -> DiResult<Instance>;

    /// Whether `identity` is bound in this container or any ancestor.
    fn can_instantiate(&self, identity: &TypeIdentity) -> bool;
}

/// High-level resolver interface with generic methods for type-safe resolution.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{ContainerBuilder, Resolver};
///
/// struct Config { name: &'static str }
/// struct Namespace;
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_constant(42usize);
/// builder.namespace::<Namespace, _>(|ns| {
///     ns.constant(Config { name: "namespaced" });
/// });
///
/// let container = builder.build().unwrap();
///
/// assert_eq!(*container.get_required::<usize>(), 42);
/// assert!(container.get::<Config>().is_err());
/// let config = container.get_namespaced::<Config, Namespace>().unwrap();
/// assert_eq!(config.name, "namespaced");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete type.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let instance = self.resolve_any(&TypeIdentity::of::<T>())?;
        downcast_instance::<T>(instance)
    }

    /// Resolves a concrete type, panicking on failure.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves `T` as registered inside namespace `N`.
    fn get_namespaced<T: Send + Sync + 'static, N: ?Sized + 'static>(&self) -> DiResult<Arc<T>> {
        let instance = self.resolve_any(&TypeIdentity::namespaced::<T, N>())?;
        downcast_instance::<T>(instance)
    }

    fn get_namespaced_required<T: Send + Sync + 'static, N: ?Sized + 'static>(&self) -> Arc<T> {
        self.get_namespaced::<T, N>().unwrap_or_else(|e| {
            panic!(
                "Failed to resolve {} in namespace {}: {}",
                std::any::type_name::<T>(),
                std::any::type_name::<N>(),
                e
            )
        })
    }

    fn can_instantiate_type<T: ?Sized + 'static>(&self) -> bool {
        self.can_instantiate(&TypeIdentity::of::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
