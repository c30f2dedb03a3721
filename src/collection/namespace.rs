//! Namespace-qualified declarations.
//!
//! A namespace lets independently written modules declare bindings for the
//! same type without colliding. Inside a namespace block every declared type
//! `T` is registered as `T` qualified by the namespace type, and the
//! dependencies of namespaced factories are qualified the same way.
//! `importing` and `exporting` bridge between the plain and the qualified view.

use std::error::Error;
use std::sync::Arc;

use crate::collection::{constant_binding, typed_binding, ScopeBuilder};
use crate::dependencies::Dependencies;
use crate::error::DiError;
use crate::key::TypeIdentity;
use crate::lifetime::ReusePolicy;
use crate::registration::{Binding, Instance};

/// Declarations inside a [`ScopeBuilder::namespace`] block.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
/// use std::sync::Arc;
///
/// struct Serializer { prefix: String }
/// struct Json;
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_constant("plain".to_string());
/// builder.namespace::<Json, _>(|ns| {
///     ns.constant("json".to_string());
///     ns.custom_type::<Serializer, (String,), _>(ReusePolicy::Singleton, |(prefix,)| {
///         Serializer { prefix: prefix.to_string() }
///     });
///     ns.exporting::<Serializer>();
/// });
///
/// let container = builder.build().unwrap();
/// assert_eq!(container.get_required::<Serializer>().prefix, "json");
/// assert_eq!(*container.get_required::<String>(), "plain");
/// ```
pub struct NamespaceBuilder<'a> {
    scope: &'a mut ScopeBuilder,
    namespace: TypeIdentity,
}

impl<'a> NamespaceBuilder<'a> {
    pub(crate) fn new(scope: &'a mut ScopeBuilder, namespace: TypeIdentity) -> Self {
        Self { scope, namespace }
    }

    /// Identity of the namespace qualifier.
    pub fn namespace(&self) -> &TypeIdentity {
        &self.namespace
    }

    /// `T` as seen inside this namespace.
    pub fn qualified<T: ?Sized + 'static>(&self) -> TypeIdentity {
        TypeIdentity::of::<T>().namespaced_in(&self.namespace)
    }

    fn qualify_all(&self, identities: Vec<TypeIdentity>) -> Vec<TypeIdentity> {
        identities
            .into_iter()
            .map(|identity| identity.namespaced_in(&self.namespace))
            .collect()
    }

    fn passthrough(&mut self, target: TypeIdentity, source: TypeIdentity) -> &mut Self {
        let factory = |mut instances: Vec<Instance>| match instances.pop() {
            Some(instance) => Ok(instance),
            None => Err(DiError::TypeMismatch("passthrough dependency")),
        };
        self.scope.insert(Binding::new(
            target,
            vec![source],
            ReusePolicy::Prototype,
            Arc::new(factory),
        ));
        self
    }

    /// Makes the outside `T` visible inside the namespace.
    ///
    /// Registers qualified `T` depending on plain `T`. The same instance is
    /// passed through on every resolution.
    pub fn importing<T: ?Sized + 'static>(&mut self) -> &mut Self {
        let target = self.qualified::<T>();
        self.passthrough(target, TypeIdentity::of::<T>())
    }

    /// Publishes the namespace's `T` to the outside.
    ///
    /// Registers plain `T` depending on qualified `T`.
    pub fn exporting<T: ?Sized + 'static>(&mut self) -> &mut Self {
        let source = self.qualified::<T>();
        self.passthrough(TypeIdentity::of::<T>(), source)
    }

    /// Registers a qualified factory whose dependencies are qualified as well.
    pub fn custom_type<T, D, F>(&mut self, reuse_policy: ReusePolicy, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D::Instances) -> T + Send + Sync + 'static,
    {
        let binding = typed_binding::<T, D, _>(
            self.qualified::<T>(),
            self.qualify_all(D::identities()),
            reuse_policy,
            move |deps| Ok(factory(deps)),
        );
        self.scope.insert(binding);
        self
    }

    pub fn fallible_custom_type<T, D, F, E>(&mut self, reuse_policy: ReusePolicy, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D::Instances) -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let identity = self.qualified::<T>();
        let target = identity.clone();
        let binding = typed_binding::<T, D, _>(
            target,
            self.qualify_all(D::identities()),
            reuse_policy,
            move |deps| factory(deps).map_err(|e| DiError::instantiation(identity.clone(), e)),
        );
        self.scope.insert(binding);
        self
    }

    /// Registers a qualified singleton value.
    pub fn constant<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        let binding = constant_binding(self.qualified::<T>(), value);
        self.scope.insert(binding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::identity_of;

    struct Ns;

    #[test]
    fn test_import_and_export_shapes() {
        let mut scope = ScopeBuilder::root();
        {
            let mut ns = NamespaceBuilder::new(&mut scope, identity_of::<Ns>());
            ns.importing::<String>();
            ns.exporting::<u32>();
        }

        let import = scope.registry.get(&TypeIdentity::namespaced::<String, Ns>()).unwrap();
        assert_eq!(import.dependencies, vec![identity_of::<String>()]);
        assert_eq!(import.reuse_policy, ReusePolicy::Prototype);

        let export = scope.registry.get(&identity_of::<u32>()).unwrap();
        assert_eq!(export.dependencies, vec![TypeIdentity::namespaced::<u32, Ns>()]);
    }

    #[test]
    fn test_importing_twice_overwrites() {
        let mut scope = ScopeBuilder::root();
        {
            let mut ns = NamespaceBuilder::new(&mut scope, identity_of::<Ns>());
            ns.importing::<String>().importing::<String>();
        }
        assert_eq!(scope.registry.len(), 1);
    }

    #[test]
    fn test_custom_type_dependencies_are_qualified() {
        let mut scope = ScopeBuilder::root();
        {
            let mut ns = NamespaceBuilder::new(&mut scope, identity_of::<Ns>());
            ns.custom_type::<u64, (String, u8), _>(ReusePolicy::Singleton, |(s, n)| s.len() as u64 + *n as u64);
        }
        let binding = scope.registry.get(&TypeIdentity::namespaced::<u64, Ns>()).unwrap();
        assert_eq!(
            binding.dependencies,
            vec![
                TypeIdentity::namespaced::<String, Ns>(),
                TypeIdentity::namespaced::<u8, Ns>()
            ]
        );
    }
}
