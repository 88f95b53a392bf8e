//! Teardown.
//!
//! Disposal is idempotent and safe from any state, including mid-handshake
//! and faulted. The terminal state is set first so no further public
//! operation reaches the native layer, every pending completion slot is
//! resolved with a cancellation outcome, subscriptions are revoked while the
//! content object is still alive, and only then are the native layers
//! released.

use tracing::{debug, warn};
use waypoint_common::{BindingError, ScriptError};

use crate::state::BindingState;

use super::EmbeddedWebView;

impl EmbeddedWebView {
    /// Tear the instance down. Safe to call any number of times and from
    /// any state; calls after the first are no-ops.
    pub fn dispose(&self) {
        let shared = self.shared();
        if !shared.state.advance(BindingState::Disposed) {
            debug!("dispose called more than once; ignoring");
            return;
        }

        // Suspended callers resolve instead of hanging forever.
        let cancelled = shared.scripts.cancel_all(|| Err(ScriptError::Cancelled))
            + shared.init.cancel_all(|| Err(BindingError::Disposed));
        if cancelled > 0 {
            debug!(cancelled, "resolved pending completions at disposal");
        }

        let mut handle = shared.lock_handle();
        if let Some(content) = handle.content() {
            // Tokens are only valid against a live content object; revoke
            // them before the engine layers go away.
            for (kind, token) in shared.tokens.take_all() {
                if let Err(e) = content.unsubscribe(kind, token) {
                    warn!(?kind, error = %e, "event unsubscription failed");
                }
            }
        }
        handle.release(shared.driver.as_ref());
        debug!("webview disposed");
    }
}
