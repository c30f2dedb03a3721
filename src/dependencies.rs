//! Typed dependency lists for factory declarations.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::TypeIdentity;
use crate::registration::Instance;

/// An ordered list of dependency types, expressed as a tuple.
///
/// `()` declares no dependencies. `(A, B)` declares two dependencies that the
/// factory receives as `(Arc<A>, Arc<B>)`, resolved left to right.
///
/// ```rust
/// use ferrous_inject::{Dependencies, TypeIdentity};
///
/// let ids = <(String, u32)>::identities();
/// assert_eq!(ids, vec![TypeIdentity::of::<String>(), TypeIdentity::of::<u32>()]);
/// ```
pub trait Dependencies: 'static {
    /// Resolved instances handed to the factory.
    type Instances;

    fn identities() -> Vec<TypeIdentity>;

    fn downcast(instances: Vec<Instance>) -> DiResult<Self::Instances>;
}

impl Dependencies for () {
    type Instances = ();

    fn identities() -> Vec<TypeIdentity> {
        Vec::new()
    }

    fn downcast(_instances: Vec<Instance>) -> DiResult<Self::Instances> {
        Ok(())
    }
}

/// Downcasts a type-erased instance to `T`.
pub(crate) fn downcast_instance<T: Send + Sync + 'static>(instance: Instance) -> DiResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

fn downcast_next<T, I>(iter: &mut I) -> DiResult<Arc<T>>
where
    T: Send + Sync + 'static,
    I: Iterator<Item = Instance>,
{
    let instance = iter
        .next()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
    downcast_instance::<T>(instance)
}

macro_rules! impl_dependencies {
    ($($name:ident),+) => {
        impl<$($name: Send + Sync + 'static),+> Dependencies for ($($name,)+) {
            type Instances = ($(Arc<$name>,)+);

            fn identities() -> Vec<TypeIdentity> {
                vec![$(TypeIdentity::of::<$name>()),+]
            }

            fn downcast(instances: Vec<Instance>) -> DiResult<Self::Instances> {
                let mut iter = instances.into_iter();
                Ok(($(downcast_next::<$name, _>(&mut iter)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
