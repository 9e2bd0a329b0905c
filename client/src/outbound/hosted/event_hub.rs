//! Fan-out of auth state changes to subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::SessionEvent;
use crate::domain::ports::AuthSubscription;

type Listeners = Mutex<HashMap<u64, mpsc::UnboundedSender<SessionEvent>>>;

#[derive(Debug, Default)]
pub(super) struct EventHub {
    next_id: AtomicU64,
    listeners: Arc<Listeners>,
}

impl EventHub {
    /// Register a listener; the subscription removes it when released.
    pub(super) fn subscribe(&self) -> AuthSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.listeners).insert(id, tx);

        let listeners = Arc::clone(&self.listeners);
        AuthSubscription::new(rx, move || {
            lock(&listeners).remove(&id);
            debug!(listener = id, "auth listener released");
        })
    }

    /// Deliver `event` to every live listener, pruning closed ones.
    pub(super) fn emit(&self, event: &SessionEvent) {
        lock(&self.listeners).retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(super) fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

fn lock(listeners: &Listeners) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<SessionEvent>>> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}
