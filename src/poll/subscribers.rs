use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::Notify;
use tracing::error;

pub type Callback<S, C> = Arc<dyn Fn(&S, &C) + Send + Sync>;

/// Ordered callback list for one stream.
pub struct Subscribers<S, C> {
    entries: Mutex<Vec<(u64, Callback<S, C>)>>,
    next_id: AtomicU64,
    added: Notify,
}

impl<S, C> Subscribers<S, C>
where
    S: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            added: Notify::new(),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Callback<S, C>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn add(self: &Arc<Self>, callback: Callback<S, C>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push((id, callback));
        self.added.notify_one();
        let registry: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription { id, registry }
    }

    /// Calls every subscriber in registration order and returns how many ran.
    ///
    /// The list is copied out first so callbacks may (un)subscribe freely.
    /// A panicking callback is logged and does not stop the others.
    pub fn notify(&self, snapshot: &S, change: &C) -> usize {
        let callbacks: Vec<Callback<S, C>> =
            self.entries().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(snapshot, change))).is_err() {
                error!("subscriber panicked while handling a notification");
            }
        }
        callbacks.len()
    }

    /// Resolves once a subscriber has been added since the last call.
    pub(crate) async fn subscribed(&self) {
        self.added.notified().await
    }
}

impl<S, C> Default for Subscribers<S, C>
where
    S: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<S, C> Unsubscribe for Subscribers<S, C>
where
    S: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    fn unsubscribe(&self, id: u64) {
        self.entries().retain(|(entry, _)| *entry != id);
    }
}

#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unsubscribe>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
