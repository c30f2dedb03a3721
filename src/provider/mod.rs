//! Container module for dependency injection.
//!
//! This module contains the [`Container`] type, which resolves bindings,
//! caches instances per reuse policy, spawns scope containers and closes
//! tracked instances.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::definitions::{ScopeDefinition, ScopePath};
use crate::error::{CloseFailure, DiError, DiResult};
use crate::internal::{CloseBag, TrackedInstance};
use crate::key::TypeIdentity;
use crate::lifetime::SingletonType;
use crate::observer::Observers;
use crate::registration::{Binding, FastMap, Instance, Instantiator};
use crate::shutdown;
use crate::traits::{Close, ResolverCore};

pub mod scope;
pub use scope::ScopeHandle;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Settings shared by a root container and every scope below it.
pub(crate) struct ContainerShared {
    pub(crate) lifecycle_management: bool,
    pub(crate) singleton_type: SingletonType,
    pub(crate) observers: Observers,
}

/// A finalized container: the root created by
/// [`ContainerBuilder::build`](crate::ContainerBuilder::build) or a scope
/// created by [`enter_scope`](Container::enter_scope).
///
/// The binding table is immutable. Resolution looks up the binding locally
/// first and then in each ancestor; a binding found in an ancestor is resolved,
/// cached and tracked by that ancestor.
///
/// Every container binds itself: a factory depending on `Container` receives
/// the container that owns the binding (the scope container for scoped
/// bindings). A user binding for `Container` takes precedence. A cached
/// instance holding its own container keeps that container alive, so such
/// types are usually bound as prototypes.
///
/// `Container` is a cheap handle (`Clone` shares the same container) and is
/// `Send + Sync`. Singleton and scoped instances are created exactly once per
/// owning container, even under concurrent resolution.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{ContainerBuilder, Resolver, ReusePolicy};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Session { user: String }
/// struct UserService { db: Arc<Database>, session: Arc<Session> }
///
/// let mut builder = ContainerBuilder::new();
/// builder.with_constant(Database { url: "postgres://localhost".to_string() });
/// builder.with_scope::<Session, _>(|scope| {
///     scope.with_custom_type::<UserService, (Database, Session), _>(
///         ReusePolicy::Scoped,
///         |(db, session)| UserService { db, session },
///     );
/// });
///
/// let container = builder.build().unwrap();
/// let alice = container.enter_scope(Session { user: "alice".to_string() }).unwrap();
/// let bob = container.enter_scope(Session { user: "bob".to_string() }).unwrap();
///
/// let service = alice.get_required::<UserService>();
/// assert_eq!(service.session.user, "alice");
/// assert!(Arc::ptr_eq(&service.db, &bob.get_required::<UserService>().db));
/// assert!(!Arc::ptr_eq(&service, &bob.get_required::<UserService>()));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    id: u64,
    definition: Arc<ScopeDefinition>,
    shared: Arc<ContainerShared>,
    scope_object: Option<Instance>,
    parent: Option<Container>,
    cache: FastMap<TypeIdentity, OnceCell<Instance>>,
    closed: AtomicBool,
    lifecycle: Mutex<CloseBag>,
    children: Mutex<Vec<(u64, Weak<ContainerInner>)>>,
}

impl Container {
    fn new(
        definition: Arc<ScopeDefinition>,
        shared: Arc<ContainerShared>,
        scope_object: Option<Instance>,
        parent: Option<Container>,
    ) -> Self {
        let cache = definition
            .registry
            .iter()
            .filter(|binding| binding.reuse_policy.is_cached())
            .map(|binding| (binding.target.clone(), OnceCell::new()))
            .collect();

        Self {
            inner: Arc::new(ContainerInner {
                id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
                definition,
                shared,
                scope_object,
                parent,
                cache,
                closed: AtomicBool::new(false),
                lifecycle: Mutex::new(CloseBag::default()),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn new_root(definition: Arc<ScopeDefinition>, shared: Arc<ContainerShared>) -> Self {
        Self::new(definition, shared, None, None)
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    /// Path of this container's scope (`/` for the root).
    pub fn scope_path(&self) -> &ScopePath {
        &self.inner.definition.path
    }

    /// Scope type this container was entered with (`None` for the root).
    pub fn scope_key(&self) -> Option<&TypeIdentity> {
        self.inner.definition.scope_key.as_ref()
    }

    /// The enclosing container (`None` for the root).
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of bindings declared directly in this container's scope.
    pub fn binding_count(&self) -> usize {
        self.inner.definition.registry.len()
    }

    /// Number of live child scopes.
    pub fn live_scopes(&self) -> usize {
        self.inner
            .children
            .lock()
            .iter()
            .filter(|(_, child)| child.strong_count() > 0)
            .count()
    }

    fn ensure_open(&self) -> DiResult<()> {
        if self.is_closed() {
            return Err(DiError::ContainerClosed(self.scope_path().render()));
        }
        Ok(())
    }

    fn root(&self) -> &Container {
        let mut current = self;
        while let Some(parent) = &current.inner.parent {
            current = parent;
        }
        current
    }

    /// Whether `identity` is the container itself, which every container
    /// binds implicitly unless a user binding takes its place.
    pub(crate) fn is_self_identity(identity: &TypeIdentity) -> bool {
        *identity == TypeIdentity::of::<Container>()
    }

    /// Resolves `identity` here or in the nearest ancestor that binds it.
    pub(crate) fn resolve_identity(&self, identity: &TypeIdentity) -> DiResult<Instance> {
        let mut container = self;
        loop {
            if let Some(binding) = container.inner.definition.binding(identity) {
                return container.resolve_binding(binding);
            }
            match &container.inner.parent {
                Some(parent) => container = parent,
                None => break,
            }
        }
        if Self::is_self_identity(identity) {
            return Ok(Arc::new(self.clone()));
        }
        Err(DiError::UnresolvedDependency {
            missing: identity.clone(),
            required_by: None,
            scope: self.scope_path().render(),
        })
    }

    fn resolve_binding(&self, binding: &Binding) -> DiResult<Instance> {
        let observers = &self.inner.shared.observers;
        let started = observers.has_observers().then(|| {
            observers.resolving(&binding.target);
            Instant::now()
        });

        let result = match self.inner.cache.get(&binding.target) {
            Some(cell) if binding.reuse_policy.is_cached() => cell
                .get_or_try_init(|| self.instantiate_cached(binding))
                .map(Arc::clone),
            _ => self.create(binding),
        };

        if let (Some(started), Ok(_)) = (started, &result) {
            observers.resolved(&binding.target, started.elapsed());
        }
        result
    }

    fn create(&self, binding: &Binding) -> DiResult<Instance> {
        match &binding.instantiator {
            Instantiator::ScopeObject => self.inner.scope_object.clone().ok_or_else(|| {
                DiError::UnresolvedDependency {
                    missing: binding.target.clone(),
                    required_by: None,
                    scope: self.scope_path().render(),
                }
            }),
            Instantiator::Factory(factory) => {
                // Depth-first, left to right as declared
                let dependencies = binding
                    .dependencies
                    .iter()
                    .map(|dependency| self.resolve_identity(dependency))
                    .collect::<DiResult<Vec<_>>>()?;
                factory(dependencies)
            }
        }
    }

    fn instantiate_cached(&self, binding: &Binding) -> DiResult<Instance> {
        let instance = self.create(binding)?;
        if self.inner.shared.lifecycle_management && binding.is_trackable() {
            if let Some(closer) = &binding.closer {
                // Shared values outlive every scope instance that hands them out
                let owner = if binding.shared { self.root() } else { self };
                owner.track(TrackedInstance {
                    identity: binding.target.clone(),
                    instance: instance.clone(),
                    closer: closer.clone(),
                })?;
            }
        }
        Ok(instance)
    }

    fn track(&self, tracked: TrackedInstance) -> DiResult<()> {
        let rejected = self.inner.lifecycle.lock().push(tracked);
        if let Err(tracked) = rejected {
            // Created after close: release right away
            if let Err(failure) = tracked.close() {
                tracing::warn!(identity = %failure.identity, error = %failure.cause, "close failed");
            }
            return Err(DiError::ContainerClosed(self.scope_path().render()));
        }
        Ok(())
    }

    /// Enters the scope declared for `S`, with `scope_object` bound as `S`.
    ///
    /// # Errors
    ///
    /// [`DiError::ScopeNotConfigured`] when no scope for `S` is declared
    /// directly under this container, [`DiError::ContainerClosed`] when this
    /// container is closed, or any eager initialization failure.
    pub fn enter_scope<S: Send + Sync + 'static>(&self, scope_object: S) -> DiResult<Container> {
        match self.enter_scope_if_exists(scope_object)? {
            Some(child) => Ok(child),
            None => Err(DiError::ScopeNotConfigured {
                scope: self.scope_path().child(TypeIdentity::of::<S>()).render(),
                registered: self.root().inner.definition.all_scope_paths(),
            }),
        }
    }

    /// Enters the scope declared for `S`, or returns `None` if there is none.
    pub fn enter_scope_if_exists<S: Send + Sync + 'static>(&self, scope_object: S) -> DiResult<Option<Container>> {
        self.ensure_open()?;
        let key = TypeIdentity::of::<S>();
        match self.inner.definition.child(&key) {
            Some(definition) => self.spawn_child(definition.clone(), Arc::new(scope_object)).map(Some),
            None => Ok(None),
        }
    }

    /// Enters the scope declared for `S`, or hands back a transparent handle
    /// to this container when there is none.
    ///
    /// ```
    /// use ferrous_inject::{ContainerBuilder, Resolver, ScopeHandle};
    ///
    /// struct Undeclared;
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.with_constant(1u8);
    /// let container = builder.build().unwrap();
    ///
    /// let handle = container.enter_optional_scope(Undeclared).unwrap();
    /// assert!(matches!(handle, ScopeHandle::Absent(_)));
    /// assert_eq!(*handle.get_required::<u8>(), 1);
    /// handle.close().unwrap();
    /// assert!(!container.is_closed());
    /// ```
    pub fn enter_optional_scope<S: Send + Sync + 'static>(&self, scope_object: S) -> DiResult<ScopeHandle> {
        Ok(match self.enter_scope_if_exists(scope_object)? {
            Some(child) => ScopeHandle::Entered(child),
            None => ScopeHandle::Absent(self.clone()),
        })
    }

    fn spawn_child(&self, definition: Arc<ScopeDefinition>, scope_object: Instance) -> DiResult<Container> {
        let child = Container::new(
            definition,
            self.inner.shared.clone(),
            Some(scope_object),
            Some(self.clone()),
        );
        {
            let mut children = self.inner.children.lock();
            // Checked under the children lock so close() cannot miss this child
            self.ensure_open()?;
            children.retain(|(_, weak)| weak.strong_count() > 0);
            children.push((child.id(), Arc::downgrade(&child.inner)));
        }

        let path = child.scope_path().render();
        tracing::debug!(scope = %path, "scope entered");
        self.inner.shared.observers.scope_entered(&path);

        if self.inner.shared.singleton_type == SingletonType::Eager {
            if let Err(error) = child.initialize_all_singletons() {
                child.close_after_failed_init(&error);
                return Err(error);
            }
        }
        Ok(child)
    }

    /// Instantiates every singleton and scoped binding of this container.
    pub fn initialize_all_singletons(&self) -> DiResult<()> {
        self.ensure_open()?;
        for binding in self.inner.definition.registry.iter() {
            if binding.reuse_policy.is_cached() {
                self.resolve_binding(binding)?;
            }
        }
        Ok(())
    }

    /// Puts an externally created instance under this container's lifecycle.
    ///
    /// The instance is closed with the container. If the container is
    /// already closed, the instance is closed immediately and
    /// [`DiError::ContainerClosed`] is returned.
    pub fn register_closeable<T: Close>(&self, instance: Arc<T>) -> DiResult<()> {
        self.track(TrackedInstance {
            identity: TypeIdentity::of::<T>(),
            instance,
            closer: Arc::new(|instance: &Instance| match (**instance).downcast_ref::<T>() {
                Some(value) => value.close(),
                None => Err(DiError::TypeMismatch(std::any::type_name::<T>()).into()),
            }),
        })
    }

    /// Closes live child scopes, then every tracked instance in reverse
    /// creation order.
    ///
    /// All closers run even if some fail; failures are returned together as
    /// [`DiError::AggregatedCloseFailure`]. Closing twice is a no-op.
    pub fn close(&self) -> DiResult<()> {
        let mut failures = Vec::new();
        self.close_collecting(&mut failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::AggregatedCloseFailure(failures))
        }
    }

    fn close_collecting(&self, failures: &mut Vec<CloseFailure>) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let path = self.scope_path().render();
        tracing::debug!(scope = %path, "closing container");
        self.inner.shared.observers.closing(&path);

        let children: Vec<_> = self.inner.children.lock().drain(..).collect();
        for (_, child) in children.into_iter().rev() {
            if let Some(inner) = child.upgrade() {
                Container { inner }.close_collecting(failures);
            }
        }

        let tracked = self.inner.lifecycle.lock().take_for_close();
        if let Some(tracked) = tracked {
            failures.extend(CloseBag::close_all_reverse(tracked));
        }

        shutdown::unregister(self.id());
        if let Some(parent) = &self.inner.parent {
            let id = self.id();
            parent.inner.children.lock().retain(|(child, _)| *child != id);
        }
    }

    /// Releases whatever an eager pass created before `cause` stopped it.
    pub(crate) fn close_after_failed_init(&self, cause: &DiError) {
        if let Err(close_error) = self.close() {
            tracing::warn!(
                scope = %self.scope_path(),
                %cause,
                error = %close_error,
                "closing after failed eager initialization"
            );
        }
    }

    /// Dump of all bindings declared at and below this container's scope.
    pub fn debug_information(&self) -> String {
        let mut out = format!(
            "container {} (lifecycle management: {}, singleton type: {:?}, closed: {})\n",
            self.scope_path(),
            self.inner.shared.lifecycle_management,
            self.inner.shared.singleton_type,
            self.is_closed()
        );
        self.inner.definition.describe(&mut out);
        out
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, identity: &TypeIdentity) -> DiResult<Instance> {
        let result = self.ensure_open().and_then(|()| self.resolve_identity(identity));
        if let Err(error) = &result {
            self.inner.shared.observers.failed(identity, error);
        }
        result
    }

    fn can_instantiate(&self, identity: &TypeIdentity) -> bool {
        if Container::is_self_identity(identity) {
            return true;
        }
        let mut container = Some(self);
        while let Some(current) = container {
            if current.inner.definition.binding(identity).is_some() {
                return true;
            }
            container = current.inner.parent.as_ref();
        }
        false
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.scope_path().render())
            .field("bindings", &self.binding_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let bag = self.lifecycle.get_mut();
        if !bag.is_closed() && bag.len() > 0 {
            tracing::warn!(
                scope = %self.definition.path,
                unreleased = bag.len(),
                "container dropped with unreleased instances. Call close() before dropping."
            );
        }
    }
}
