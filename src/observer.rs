//! Observation hooks for resolution and scope lifecycle events.
//!
//! Observers are registered on the [`ContainerBuilder`](crate::ContainerBuilder)
//! and shared by the root container and every scope entered from it.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::TypeIdentity;

/// Receives container events.
///
/// Only [`resolving`](DiObserver::resolving) and
/// [`resolved`](DiObserver::resolved) are required; the remaining hooks have
/// empty default implementations.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{ContainerBuilder, DiObserver, Resolver, TypeIdentity};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, identity: &TypeIdentity) {
///         self.0.lock().unwrap().push(identity.to_string());
///     }
///
///     fn resolved(&self, _identity: &TypeIdentity, _duration: Duration) {}
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut builder = ContainerBuilder::new();
/// builder.add_observer(recorder.clone());
/// builder.with_constant(7u32);
///
/// let container = builder.build().unwrap();
/// container.get_required::<u32>();
/// assert_eq!(*recorder.0.lock().unwrap(), vec!["u32".to_string()]);
/// ```
pub trait DiObserver: Send + Sync {
    /// A binding is about to be resolved.
    fn resolving(&self, identity: &TypeIdentity);

    /// A binding was resolved (cache hit or fresh instance).
    fn resolved(&self, identity: &TypeIdentity, duration: Duration);

    /// Resolution failed.
    fn failed(&self, _identity: &TypeIdentity, _error: &DiError) {}

    /// A scope container was created.
    fn scope_entered(&self, _scope_path: &str) {}

    /// A container is about to close.
    fn closing(&self, _scope_path: &str) {}
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, identity: &TypeIdentity) {
        for observer in &self.observers {
            observer.resolving(identity);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, identity: &TypeIdentity, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(identity, duration);
        }
    }

    pub(crate) fn failed(&self, identity: &TypeIdentity, error: &DiError) {
        for observer in &self.observers {
            observer.failed(identity, error);
        }
    }

    pub(crate) fn scope_entered(&self, scope_path: &str) {
        for observer in &self.observers {
            observer.scope_entered(scope_path);
        }
    }

    pub(crate) fn closing(&self, scope_path: &str) {
        for observer in &self.observers {
            observer.closing(scope_path);
        }
    }
}

/// Observer that forwards events to `tracing`.
///
/// Resolution events are emitted at `TRACE`, scope events at `DEBUG` and
/// failures at `WARN`, all under the `ferrous_inject` target.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-inject]".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, identity: &TypeIdentity) {
        tracing::trace!(target: "ferrous_inject", prefix = %self.prefix, %identity, "resolving");
    }

    fn resolved(&self, identity: &TypeIdentity, duration: Duration) {
        tracing::trace!(
            target: "ferrous_inject",
            prefix = %self.prefix,
            %identity,
            ?duration,
            "resolved"
        );
    }

    fn failed(&self, identity: &TypeIdentity, error: &DiError) {
        tracing::warn!(target: "ferrous_inject", prefix = %self.prefix, %identity, %error, "resolution failed");
    }

    fn scope_entered(&self, scope_path: &str) {
        tracing::debug!(target: "ferrous_inject", prefix = %self.prefix, scope = scope_path, "scope entered");
    }

    fn closing(&self, scope_path: &str) {
        tracing::debug!(target: "ferrous_inject", prefix = %self.prefix, scope = scope_path, "closing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::identity_of;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Counting {
        events: Mutex<Vec<&'static str>>,
    }

    impl DiObserver for Counting {
        fn resolving(&self, _identity: &TypeIdentity) {
            self.events.lock().push("resolving");
        }

        fn resolved(&self, _identity: &TypeIdentity, _duration: Duration) {
            self.events.lock().push("resolved");
        }

        fn closing(&self, _scope_path: &str) {
            self.events.lock().push("closing");
        }
    }

    #[test]
    fn test_observers_fan_out_in_order() {
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        let mut observers = Observers::default();
        assert!(!observers.has_observers());
        observers.add(first.clone());
        observers.add(second.clone());

        let identity = identity_of::<String>();
        observers.resolving(&identity);
        observers.resolved(&identity, Duration::from_millis(1));
        observers.scope_entered("/Request");
        observers.closing("/Request");

        assert_eq!(*first.events.lock(), vec!["resolving", "resolved", "closing"]);
        assert_eq!(*second.events.lock(), vec!["resolving", "resolved", "closing"]);
    }

    #[test]
    fn test_logging_observer_does_not_panic() {
        let observer = LoggingObserver::with_prefix("[test]");
        let identity = identity_of::<String>();
        observer.resolving(&identity);
        observer.resolved(&identity, Duration::from_millis(1));
        observer.failed(&identity, &DiError::TypeMismatch("String"));
        observer.scope_entered("/");
        observer.closing("/");
    }
}
