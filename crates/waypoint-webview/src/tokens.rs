//! Event subscription token bookkeeping.
//!
//! Subscribing to a native navigation event yields an opaque token that is
//! the only way to revoke exactly that subscription later. The registry owns
//! the kind → token mapping so teardown can walk it and unsubscribe while
//! the issuing content object is still alive.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::engine::{EventToken, NavigationEventKind};

pub struct TokenRegistry {
    tokens: Mutex<HashMap<NavigationEventKind, EventToken>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NavigationEventKind, EventToken>> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the token issued for an event kind. Each kind is subscribed
    /// once per instance; replacing a live token would orphan the old
    /// subscription.
    pub fn record(&self, kind: NavigationEventKind, token: EventToken) {
        if let Some(old) = self.lock().insert(kind, token) {
            warn!(?kind, ?old, "replaced a live subscription token");
        }
    }

    /// Remove and return every recorded token, for the teardown walk.
    pub fn take_all(&self) -> Vec<(NavigationEventKind, EventToken)> {
        self.lock().drain().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
