//! Module system for modular registration.
//!
//! This module provides the [`Module`] trait for organizing binding
//! declarations into reusable units.

use crate::collection::ScopeBuilder;
use crate::error::DiResult;

/// A reusable configuration unit applied to a [`ScopeBuilder`].
///
/// Any `FnOnce(&mut ScopeBuilder) -> DiResult<()>` is a module as well.
///
/// # Example
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, DiResult, Module, Resolver, ReusePolicy, ScopeBuilder};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserService {
///     config: Arc<UserConfig>,
/// }
///
/// struct UserModule;
///
/// impl Module for UserModule {
///     fn configure(self, scope: &mut ScopeBuilder) -> DiResult<()> {
///         scope.with_default::<UserConfig>(ReusePolicy::Singleton);
///         scope.with_custom_type::<UserService, (UserConfig,), _>(ReusePolicy::Singleton, |(config,)| {
///             UserService { config }
///         });
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut builder = ContainerBuilder::new();
/// builder
///     .with_module(UserModule)?
///     .with_module(|scope: &mut ScopeBuilder| -> DiResult<()> {
///         scope.with_constant(8080u16);
///         Ok(())
///     })?;
/// let container = builder.build()?;
/// assert_eq!(*container.get_required::<u16>(), 8080);
/// # Ok(())
/// # }
/// ```
pub trait Module {
    /// Declare this module's bindings on `scope`.
    fn configure(self, scope: &mut ScopeBuilder) -> DiResult<()>;
}

impl<F> Module for F
where
    F: FnOnce(&mut ScopeBuilder) -> DiResult<()>,
{
    fn configure(self, scope: &mut ScopeBuilder) -> DiResult<()> {
        self(scope)
    }
}
