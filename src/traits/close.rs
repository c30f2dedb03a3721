//! Closing traits for resource cleanup.

/// Error returned by a failed close.
pub type CloseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for resources that need structured teardown.
///
/// Register a closeable type with
/// [`ContainerBuilder::closeable`](crate::ContainerBuilder::closeable), which
/// also turns lifecycle management on. Every cached instance of that type is
/// closed once, in reverse creation order, when its owning container closes.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Close, CloseError, ContainerBuilder, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Connection {
///     open: AtomicBool,
/// }
///
/// impl Close for Connection {
///     fn close(&self) -> Result<(), CloseError> {
///         self.open.store(false, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .with_lifecycle_management()
///     .closeable::<Connection>()
///     .with_custom_type::<Connection, (), _>(ferrous_inject::ReusePolicy::Singleton, |()| {
///         Connection { open: AtomicBool::new(true) }
///     });
///
/// let container = builder.build().unwrap();
/// let connection = container.get_required::<Connection>();
/// container.close().unwrap();
/// assert!(!connection.open.load(Ordering::SeqCst));
/// ```
pub trait Close: Send + Sync + 'static {
    /// Release the resources held by this value.
    fn close(&self) -> Result<(), CloseError>;
}
