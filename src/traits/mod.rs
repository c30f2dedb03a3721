//! Core traits for the dependency injection container.

mod close;
mod resolver;

pub use close::{Close, CloseError};
pub use resolver::{Resolver, ResolverCore};
