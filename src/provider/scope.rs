//! Optional scope handles.
//!
//! [`Container::enter_optional_scope`] returns a [`ScopeHandle`] so callers
//! can treat "scope entered" and "no such scope" the same way: resolve
//! through the handle, then close it.

use crate::error::DiResult;
use crate::key::TypeIdentity;
use crate::registration::Instance;
use crate::traits::{Close, CloseError, ResolverCore};

use super::Container;

/// Result of [`Container::enter_optional_scope`].
///
/// `Entered` owns a freshly created scope container and closes it on
/// [`close`](ScopeHandle::close). `Absent` forwards every resolution to the
/// container the scope was requested from, and its `close` does nothing, so
/// the outer container stays open.
#[derive(Debug, Clone)]
pub enum ScopeHandle {
    Entered(Container),
    Absent(Container),
}

impl ScopeHandle {
    /// Container that resolutions go to.
    pub fn container(&self) -> &Container {
        match self {
            ScopeHandle::Entered(container) | ScopeHandle::Absent(container) => container,
        }
    }

    pub fn is_entered(&self) -> bool {
        matches!(self, ScopeHandle::Entered(_))
    }

    /// Closes the entered scope. No-op for `Absent`.
    pub fn close(&self) -> DiResult<()> {
        match self {
            ScopeHandle::Entered(container) => container.close(),
            ScopeHandle::Absent(_) => Ok(()),
        }
    }
}

impl ResolverCore for ScopeHandle {
    fn resolve_any(&self, identity: &TypeIdentity) -> DiResult<Instance> {
        self.container().resolve_any(identity)
    }

    fn can_instantiate(&self, identity: &TypeIdentity) -> bool {
        self.container().can_instantiate(identity)
    }
}

impl Close for ScopeHandle {
    fn close(&self) -> Result<(), CloseError> {
        ScopeHandle::close(self).map_err(Into::into)
    }
}

impl Close for Container {
    fn close(&self) -> Result<(), CloseError> {
        Container::close(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ContainerBuilder;
    use crate::lifetime::ReusePolicy;
    use crate::traits::Resolver;

    struct Declared;
    struct Undeclared;

    #[test]
    fn test_entered_handle_closes_scope() {
        let mut builder = ContainerBuilder::new();
        builder.with_scope::<Declared, _>(|scope| {
            scope.with_default::<String>(ReusePolicy::Scoped);
        });
        let container = builder.build().unwrap();

        let handle = container.enter_optional_scope(Declared).unwrap();
        assert!(handle.is_entered());
        assert!(handle.can_instantiate_type::<Declared>());
        handle.get_required::<String>();

        ScopeHandle::close(&handle).unwrap();
        assert!(handle.container().is_closed());
        assert!(!container.is_closed());
    }

    #[test]
    fn test_absent_handle_forwards_and_never_closes() {
        let mut builder = ContainerBuilder::new();
        builder.with_constant(5u8);
        let container = builder.build().unwrap();

        let handle = container.enter_optional_scope(Undeclared).unwrap();
        assert!(!handle.is_entered());
        assert_eq!(*handle.get_required::<u8>(), 5);

        Close::close(&handle).unwrap();
        assert!(!container.is_closed());
        assert_eq!(*container.get_required::<u8>(), 5);
    }
}
