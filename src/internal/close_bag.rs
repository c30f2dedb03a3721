//! Internal bag of instances waiting to be closed.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::CloseFailure;
use crate::key::TypeIdentity;
use crate::registration::{CloseFn, Instance};

/// An instance owned by a container together with its closer.
pub(crate) struct TrackedInstance {
    pub(crate) identity: TypeIdentity,
    pub(crate) instance: Instance,
    pub(crate) closer: CloseFn,
}

impl TrackedInstance {
    pub(crate) fn close(&self) -> Result<(), CloseFailure> {
        (self.closer)(&self.instance).map_err(|cause| CloseFailure {
            identity: self.identity.clone(),
            cause: cause.into(),
        })
    }
}

/// Tracked instances in creation order, closed LIFO exactly once.
#[derive(Default)]
pub(crate) struct CloseBag {
    tracked: Vec<TrackedInstance>,
    /// Allocation addresses of `tracked`
    addresses: HashSet<usize>,
    closed: bool,
}

impl CloseBag {
    /// Tracks an instance. Hands it back when the bag is already closed.
    ///
    /// An instance that is already tracked is ignored, so it is closed once.
    pub(crate) fn push(&mut self, tracked: TrackedInstance) -> Result<(), TrackedInstance> {
        if self.closed {
            return Err(tracked);
        }
        let address = Arc::as_ptr(&tracked.instance) as *const () as usize;
        if !self.addresses.insert(address) {
            return Ok(());
        }
        self.tracked.push(tracked);
        Ok(())
    }

    /// Marks the bag closed and takes its content. `None` if already closed.
    pub(crate) fn take_for_close(&mut self) -> Option<Vec<TrackedInstance>> {
        if self.closed {
            return None;
        }
        self.closed = true;
        self.addresses.clear();
        Some(std::mem::take(&mut self.tracked))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Closes every instance in reverse order, continuing past failures.
    pub(crate) fn close_all_reverse(tracked: Vec<TrackedInstance>) -> Vec<CloseFailure> {
        let mut failures = Vec::new();
        for instance in tracked.into_iter().rev() {
            if let Err(failure) = instance.close() {
                tracing::warn!(identity = %failure.identity, error = %failure.cause, "close failed");
                failures.push(failure);
            }
        }
        failures
    }
}
