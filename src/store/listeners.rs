//! Snapshot listeners.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::error;

use super::snapshot::DashboardSnapshot;

/// Callback invoked with every new snapshot.
pub type Listener = Arc<dyn Fn(&Arc<DashboardSnapshot>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Shared, ordered set of listeners.
#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ListenerRegistry {
    pub(crate) fn subscribe(&self, listener: Listener) -> Subscription {
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every listener in registration order.
    ///
    /// The lock is released before the first call, so listeners may
    /// subscribe or unsubscribe from inside their callback. A listener that
    /// panics is logged and removed; the others still run.
    pub(crate) fn notify(&self, snapshot: &Arc<DashboardSnapshot>) {
        let listeners: Vec<(u64, Listener)> = self.inner.lock().listeners.clone();

        let mut failed = Vec::new();
        for (id, listener) in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                error!(
                    "Snapshot listener {} panicked on version {}, removing it",
                    id, snapshot.version
                );
                failed.push(id);
            }
        }

        if !failed.is_empty() {
            self.inner
                .lock()
                .listeners
                .retain(|(id, _)| !failed.contains(id));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

/// Registration handle returned by `subscribe`.
///
/// Dropping it leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
