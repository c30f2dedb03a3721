//! Registry builder module for dependency injection.
//!
//! This module contains the [`ContainerBuilder`] and [`ScopeBuilder`] types
//! used to declare bindings, scopes and namespaces before a
//! [`Container`](crate::Container) is built.

use std::any::{Any, TypeId};
use std::error::Error;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::config::ContainerSettings;
use crate::definitions::ScopePath;
use crate::dependencies::Dependencies;
use crate::error::{DiError, DiResult};
use crate::key::TypeIdentity;
use crate::lifetime::{ReusePolicy, SingletonType};
use crate::observer::{DiObserver, Observers};
use crate::provider::{Container, ContainerShared};
use crate::registration::{Binding, CloseFn, FastMap, Instance, Registry};
use crate::traits::{Close, CloseError};
use crate::{shutdown, validation};

pub mod module_system;
pub mod namespace;

pub use module_system::Module;
pub use namespace::NamespaceBuilder;

/// Creates a typed binding whose factory may fail.
pub(crate) fn typed_binding<T, D, F>(
    target: TypeIdentity,
    dependencies: Vec<TypeIdentity>,
    reuse_policy: ReusePolicy,
    factory: F,
) -> Binding
where
    T: Send + Sync + 'static,
    D: Dependencies,
    F: Fn(D::Instances) -> DiResult<T> + Send + Sync + 'static,
{
    let erased = move |instances: Vec<Instance>| -> DiResult<Instance> {
        let resolved = D::downcast(instances)?;
        Ok(Arc::new(factory(resolved)?))
    };
    Binding::new(target, dependencies, reuse_policy, Arc::new(erased)).with_value_type(TypeId::of::<T>())
}

/// Creates a binding for a prebuilt value.
///
/// Every scope instance declaring the constant hands out the same value, so
/// it is tracked by the root container rather than by the scope.
pub(crate) fn constant_binding<T: Send + Sync + 'static>(target: TypeIdentity, value: T) -> Binding {
    let instance: Instance = Arc::new(value);
    Binding::new(
        target,
        Vec::new(),
        ReusePolicy::Singleton,
        Arc::new(move |_| Ok(instance.clone())),
    )
    .with_value_type(TypeId::of::<T>())
    .shared()
}

/// Bindings of one scope level and its nested scope declarations.
///
/// The root level is reached through [`ContainerBuilder`] (which derefs to
/// its root `ScopeBuilder`); nested levels are configured inside
/// [`with_scope`](ScopeBuilder::with_scope) blocks.
pub struct ScopeBuilder {
    pub(crate) path: ScopePath,
    pub(crate) registry: Registry,
    pub(crate) scopes: Vec<ScopeBuilder>,
}

impl ScopeBuilder {
    pub(crate) fn root() -> Self {
        Self::at(ScopePath::root())
    }

    fn at(path: ScopePath) -> Self {
        Self {
            path,
            registry: Registry::new(),
            scopes: Vec::new(),
        }
    }

    /// Path of the scope this builder configures.
    pub fn scope_path(&self) -> &ScopePath {
        &self.path
    }

    pub(crate) fn insert(&mut self, binding: Binding) -> &mut Self {
        self.registry.insert(binding);
        self
    }

    /// Adds or overwrites a type-erased binding.
    ///
    /// The factory receives the resolved dependencies in the order given.
    /// Declaring the same identity twice keeps the last factory.
    pub fn register<F>(
        &mut self,
        identity: TypeIdentity,
        dependencies: Vec<TypeIdentity>,
        reuse_policy: ReusePolicy,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(Vec<Instance>) -> DiResult<Instance> + Send + Sync + 'static,
    {
        self.insert(Binding::new(identity, dependencies, reuse_policy, Arc::new(factory)))
    }

    /// Registers a prebuilt value as a singleton.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_inject::{ContainerBuilder, Resolver};
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.with_constant(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// let container = builder.build().unwrap();
    /// assert_eq!(container.get_required::<Config>().database_url, "postgres://localhost");
    /// ```
    pub fn with_constant<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.insert(constant_binding(TypeIdentity::of::<T>(), value))
    }

    /// Registers a factory for `T` depending on the types in `D`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.with_constant(Database { url: "postgres://localhost".to_string() });
    /// builder.with_custom_type::<UserService, (Database,), _>(ReusePolicy::Singleton, |(db,)| {
    ///     UserService { db }
    /// });
    ///
    /// let container = builder.build().unwrap();
    /// assert_eq!(container.get_required::<UserService>().db.url, "postgres://localhost");
    /// ```
    pub fn with_custom_type<T, D, F>(&mut self, reuse_policy: ReusePolicy, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D::Instances) -> T + Send + Sync + 'static,
    {
        self.insert(typed_binding::<T, D, _>(
            TypeIdentity::of::<T>(),
            D::identities(),
            reuse_policy,
            move |deps| Ok(factory(deps)),
        ))
    }

    /// Like [`with_custom_type`](Self::with_custom_type) for factories that can fail.
    ///
    /// A failure surfaces as [`DiError::Instantiation`] naming `T`.
    pub fn with_fallible_custom_type<T, D, F, E>(&mut self, reuse_policy: ReusePolicy, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D::Instances) -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let identity = TypeIdentity::of::<T>();
        let target = identity.clone();
        self.insert(typed_binding::<T, D, _>(
            target,
            D::identities(),
            reuse_policy,
            move |deps| factory(deps).map_err(|e| DiError::instantiation(identity.clone(), e)),
        ))
    }

    /// Registers `T::default()` as the factory for `T`.
    pub fn with_default<T: Default + Send + Sync + 'static>(&mut self, reuse_policy: ReusePolicy) -> &mut Self {
        self.with_custom_type::<T, (), _>(reuse_policy, |()| T::default())
    }

    /// Declares a child scope entered with objects of type `S`.
    ///
    /// The scope object itself is bound as a singleton for `S` inside the
    /// scope. Declaring the same scope type again under this builder extends
    /// the earlier declaration. Scopes nest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
    /// # use std::sync::Arc;
    /// struct Request { id: u32 }
    /// struct Handler { request: Arc<Request> }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.with_scope::<Request, _>(|scope| {
    ///     scope.with_custom_type::<Handler, (Request,), _>(ReusePolicy::Scoped, |(request,)| {
    ///         Handler { request }
    ///     });
    /// });
    ///
    /// let container = builder.build().unwrap();
    /// let scope = container.enter_scope(Request { id: 7 }).unwrap();
    /// assert_eq!(scope.get_required::<Handler>().request.id, 7);
    /// ```
    pub fn with_scope<S, F>(&mut self, configure: F) -> &mut Self
    where
        S: Any + Send + Sync,
        F: FnOnce(&mut ScopeBuilder),
    {
        let key = TypeIdentity::of::<S>();
        let index = match self
            .scopes
            .iter()
            .position(|scope| scope.path.segments().last() == Some(&key))
        {
            Some(index) => index,
            None => {
                let mut scope = ScopeBuilder::at(self.path.child(key.clone()));
                scope.insert(Binding::scope_object(key));
                self.scopes.push(scope);
                self.scopes.len() - 1
            }
        };
        configure(&mut self.scopes[index]);
        self
    }

    /// Opens a namespace block qualified by `N`.
    ///
    /// See [`NamespaceBuilder`] for the available declarations.
    pub fn namespace<N, F>(&mut self, configure: F) -> &mut Self
    where
        N: ?Sized + 'static,
        F: FnOnce(&mut NamespaceBuilder<'_>),
    {
        let mut namespace = NamespaceBuilder::new(self, TypeIdentity::of::<N>());
        configure(&mut namespace);
        self
    }

    /// Applies a reusable configuration unit.
    pub fn with_module<M: Module>(&mut self, module: M) -> DiResult<&mut Self> {
        module.configure(self)?;
        Ok(self)
    }

    /// Whether `identity` is declared at this level.
    pub fn is_registered(&self, identity: &TypeIdentity) -> bool {
        self.registry.contains_key(identity)
    }
}

/// Accumulates the configuration of a container.
///
/// Derefs to the root [`ScopeBuilder`], so every binding declaration is
/// available directly on the builder. Container-wide options (lifecycle
/// management, closers, singleton type, observers) live here.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
/// use std::sync::Arc;
///
/// struct Greeting(String);
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_constant("world".to_string());
/// builder.with_custom_type::<Greeting, (String,), _>(ReusePolicy::Prototype, |(name,)| {
///     Greeting(format!("hello {}", name))
/// });
///
/// let container = builder.build().unwrap();
/// assert_eq!(container.get_required::<Greeting>().0, "hello world");
/// ```
pub struct ContainerBuilder {
    root: ScopeBuilder,
    lifecycle_management: bool,
    close_on_shutdown: bool,
    closers: FastMap<TypeId, CloseFn>,
    singleton_type: SingletonType,
    observers: Observers,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            root: ScopeBuilder::root(),
            lifecycle_management: false,
            close_on_shutdown: false,
            closers: FastMap::default(),
            singleton_type: SingletonType::Lazy,
            observers: Observers::default(),
        }
    }

    /// Tracks cached instances with a registered closer and closes them with
    /// their owning container.
    ///
    /// Registering a closer with
    /// [`closing_instances_of_type`](Self::closing_instances_of_type) or
    /// [`closeable`](Self::closeable) turns this on as well.
    pub fn with_lifecycle_management(&mut self) -> &mut Self {
        self.lifecycle_management = true;
        self
    }

    /// Closes the root container from [`shutdown::run_shutdown_hooks`].
    ///
    /// Requires lifecycle management (explicit or implied by a closer);
    /// `build()` fails otherwise. See [`shutdown`] for what counts as
    /// shutdown.
    pub fn close_on_shutdown(&mut self) -> &mut Self {
        self.close_on_shutdown = true;
        self
    }

    /// Registers a closer for every instance whose value type is `T`.
    ///
    /// Enables lifecycle management.
    pub fn closing_instances_of_type<T, F>(&mut self, closer: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> Result<(), CloseError> + Send + Sync + 'static,
    {
        let closer: CloseFn = Arc::new(move |instance: &Instance| match (**instance).downcast_ref::<T>() {
            Some(value) => closer(value),
            None => Err(DiError::TypeMismatch(std::any::type_name::<T>()).into()),
        });
        self.closers.insert(TypeId::of::<T>(), closer);
        self
    }

    /// Registers [`Close::close`] as the closer for `T`.
    pub fn closeable<T: Close>(&mut self) -> &mut Self {
        self.closing_instances_of_type::<T, _>(|value| value.close())
    }

    pub fn using_default_singleton_type(&mut self, singleton_type: SingletonType) -> &mut Self {
        self.singleton_type = singleton_type;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Applies loaded settings on top of this builder.
    pub fn with_settings(&mut self, settings: &ContainerSettings) -> &mut Self {
        if settings.lifecycle_management {
            self.lifecycle_management = true;
        }
        if settings.close_on_shutdown {
            self.close_on_shutdown = true;
        }
        self.singleton_type = settings.singleton_type;
        self
    }

    /// Validates the configuration and creates the root container.
    ///
    /// # Errors
    ///
    /// - [`DiError::ShutdownRequiresLifecycleManagement`]
    /// - [`DiError::ScopeAlreadyUsed`]
    /// - [`DiError::UnresolvedDependency`]
    /// - [`DiError::CyclicDependency`]
    /// - any error raised while instantiating eager singletons
    pub fn build(self) -> DiResult<Container> {
        // A registered closer implies lifecycle management
        let lifecycle_management = self.lifecycle_management || !self.closers.is_empty();
        if self.close_on_shutdown && !lifecycle_management {
            return Err(DiError::ShutdownRequiresLifecycleManagement);
        }

        let definition = validation::finalize(self.root, &self.closers)?;

        let shared = Arc::new(ContainerShared {
            lifecycle_management,
            singleton_type: self.singleton_type,
            observers: self.observers,
        });
        let container = Container::new_root(definition, shared);
        tracing::debug!(
            bindings = container.binding_count(),
            lifecycle_management,
            singleton_type = ?self.singleton_type,
            "container built"
        );

        if self.singleton_type == SingletonType::Eager {
            if let Err(error) = container.initialize_all_singletons() {
                container.close_after_failed_init(&error);
                return Err(error);
            }
        }

        if self.close_on_shutdown {
            shutdown::register(&container);
        }
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ContainerBuilder {
    type Target = ScopeBuilder;

    fn deref(&self) -> &ScopeBuilder {
        &self.root
    }
}

impl DerefMut for ContainerBuilder {
    fn deref_mut(&mut self) -> &mut ScopeBuilder {
        &mut self.root
    }
}
