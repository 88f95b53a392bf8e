//! Completion correlation between native callbacks and waiting callers.
//!
//! Every asynchronous native request is issued under a fresh
//! [`CorrelationId`] with a resolvable slot parked in a table. Whichever
//! callback path answers first resolves the slot, exactly once; late and
//! duplicate completions find no slot and are discarded, since native layers
//! are not guaranteed to call back exactly once under error races. Disposal
//! resolves every remaining slot with a cancellation outcome so no caller is
//! left suspended forever.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::debug;
use waypoint_common::CorrelationId;

/// Pending-request table: one slot per outstanding native call.
pub struct CompletionTable<T> {
    pending: Mutex<HashMap<CorrelationId, oneshot::Sender<T>>>,
}

/// The caller's side of one parked slot.
pub struct PendingCompletion<T> {
    id: CorrelationId,
    rx: oneshot::Receiver<T>,
}

impl<T> CompletionTable<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CorrelationId, oneshot::Sender<T>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Park a new slot. Returns the identity to hand to the native layer and
    /// the waiter for the suspended caller.
    pub fn register(&self) -> (CorrelationId, PendingCompletion<T>) {
        let id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.clone(), tx);
        (id.clone(), PendingCompletion { id, rx })
    }

    /// Resolve the slot parked under `id`, delivering `value` to the waiting
    /// caller. Returns false when nothing was pending under that identity,
    /// meaning a late or duplicate completion the caller should discard.
    pub fn resolve(&self, id: &CorrelationId, value: T) -> bool {
        let sender = self.lock().remove(id);
        match sender {
            Some(tx) => {
                if tx.send(value).is_err() {
                    debug!(correlation = %id, "completion waiter gone; discarding");
                    return false;
                }
                true
            }
            None => {
                debug!(correlation = %id, "no pending slot for completion; discarding");
                false
            }
        }
    }

    /// Drop the slot parked under `id` without resolving it. Used when the
    /// caller gives up waiting (bounded-wait expiry).
    pub fn discard(&self, id: &CorrelationId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Resolve every pending slot with a cancellation outcome. Returns how
    /// many slots were pending.
    pub fn cancel_all(&self, outcome: impl Fn() -> T) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (id, tx) in drained {
            if tx.send(outcome()).is_err() {
                debug!(correlation = %id, "cancelled slot had no waiter");
            }
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }
}

impl<T> Default for CompletionTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingCompletion<T> {
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Suspend until the matching completion arrives. `None` means the slot
    /// was discarded without resolution.
    pub async fn wait(self) -> Option<T> {
        self.rx.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_delivers_to_the_waiter() {
        let table = CompletionTable::new();
        let (id, waiter) = table.register();

        assert!(table.resolve(&id, 42));
        assert_eq!(waiter.wait().await, Some(42));
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_completion_is_discarded() {
        let table = CompletionTable::new();
        let (id, waiter) = table.register();

        assert!(table.resolve(&id, "first"));
        assert!(!table.resolve(&id, "second"));
        assert_eq!(waiter.wait().await, Some("first"));
    }

    #[test]
    fn unknown_correlation_is_discarded() {
        let table: CompletionTable<u8> = CompletionTable::new();
        assert!(!table.resolve(&CorrelationId::new(), 1));
    }

    #[tokio::test]
    async fn discard_leaves_the_waiter_unresolved() {
        let table = CompletionTable::new();
        let (id, waiter) = table.register();

        assert!(table.discard(&id));
        assert!(!table.resolve(&id, 9));
        assert_eq!(waiter.wait().await, None);
    }

    #[tokio::test]
    async fn cancel_all_resolves_every_pending_slot() {
        let table = CompletionTable::new();
        let (_, first) = table.register();
        let (_, second) = table.register();

        assert_eq!(table.cancel_all(|| "cancelled"), 2);
        assert_eq!(first.wait().await, Some("cancelled"));
        assert_eq!(second.wait().await, Some("cancelled"));
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn registrations_get_distinct_identities() {
        let table: CompletionTable<()> = CompletionTable::new();
        let (a, _wa) = table.register();
        let (b, _wb) = table.register();
        assert_ne!(a, b);
        assert_eq!(table.pending_count(), 2);
    }
}
