//! Steady-state operations: navigation, script execution, bounds and
//! visibility.
//!
//! Navigation operations are documented no-ops outside `Ready`: host UI
//! wiring routinely fires before initialization completes, and a dropped
//! call must not crash a long-lived surface. Failures against the native
//! layer are logged and swallowed for the same reason; hosts observe
//! failures only through notifications and empty script results.

use std::sync::Arc;

use tracing::{debug, warn};
use waypoint_common::ScriptError;

use crate::engine::Bounds;
use crate::state::BindingState;

use super::EmbeddedWebView;

impl EmbeddedWebView {
    /// Load a URL. No-op unless the instance is ready.
    pub fn navigate(&self, url: &str) {
        let Some(content) = self.ready_content() else {
            debug!(url, "navigate ignored: webview not ready");
            return;
        };
        if let Err(e) = content.navigate(url) {
            warn!(url, error = %e, "navigate failed");
            return;
        }
        if let Ok(mut current) = self.shared().current_url.lock() {
            *current = url.to_string();
        }
    }

    /// Render inline HTML. No-op unless the instance is ready.
    pub fn load_html(&self, html: &str) {
        let Some(content) = self.ready_content() else {
            debug!("load_html ignored: webview not ready");
            return;
        };
        if let Err(e) = content.load_html(html) {
            warn!(error = %e, "load_html failed");
            return;
        }
        if let Ok(mut current) = self.shared().current_url.lock() {
            *current = "about:blank".to_string();
        }
    }

    /// Navigate one entry back. No-op unless ready and back history exists.
    pub fn go_back(&self) {
        let Some(content) = self.ready_content() else {
            debug!("go_back ignored: webview not ready");
            return;
        };
        if !content.can_go_back().unwrap_or(false) {
            debug!("go_back ignored: no back history");
            return;
        }
        if let Err(e) = content.go_back() {
            warn!(error = %e, "go_back failed");
        }
    }

    /// Navigate one entry forward. No-op unless ready and forward history
    /// exists.
    pub fn go_forward(&self) {
        let Some(content) = self.ready_content() else {
            debug!("go_forward ignored: webview not ready");
            return;
        };
        if !content.can_go_forward().unwrap_or(false) {
            debug!("go_forward ignored: no forward history");
            return;
        }
        if let Err(e) = content.go_forward() {
            warn!(error = %e, "go_forward failed");
        }
    }

    /// Reload the current document. No-op unless ready.
    pub fn reload(&self) {
        let Some(content) = self.ready_content() else {
            debug!("reload ignored: webview not ready");
            return;
        };
        if let Err(e) = content.reload() {
            warn!(error = %e, "reload failed");
        }
    }

    /// Stop any in-flight navigation. No-op unless ready.
    pub fn stop(&self) {
        let Some(content) = self.ready_content() else {
            debug!("stop ignored: webview not ready");
            return;
        };
        if let Err(e) = content.stop() {
            warn!(error = %e, "stop failed");
        }
    }

    /// Advisory: whether back history exists. Any underlying failure reads
    /// as false, never as an error.
    pub fn can_go_back(&self) -> bool {
        self.ready_content()
            .map(|content| content.can_go_back().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Advisory: whether forward history exists.
    pub fn can_go_forward(&self) -> bool {
        self.ready_content()
            .map(|content| content.can_go_forward().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Execute a script in the engine and return its serialized result.
    /// Returns the empty string on any failure: not ready, engine error,
    /// cancellation, or bounded-wait expiry. Concurrent calls each get their
    /// own pending slot and resolve independently, in any order.
    pub async fn execute_script(&self, script: &str) -> String {
        let Some(content) = self.ready_content() else {
            debug!("execute_script ignored: webview not ready");
            return String::new();
        };

        let shared = self.shared();
        let (correlation, waiter) = shared.scripts.register();
        if shared.state.current() == BindingState::Disposed {
            // Disposal raced the readiness check; the engine must not be
            // touched.
            shared.scripts.discard(&correlation);
            return String::new();
        }
        let weak = Arc::downgrade(shared);
        let callback_id = correlation.clone();
        content.run_script(
            script,
            Box::new(move |result| {
                let Some(shared) = weak.upgrade() else {
                    debug!("script completion after teardown; discarding");
                    return;
                };
                let outcome = result.map_err(|e| ScriptError::Failed(e.to_string()));
                if !shared.scripts.resolve(&callback_id, outcome) {
                    debug!(correlation = %callback_id, "script completion without pending slot; discarding");
                }
            }),
        );

        match tokio::time::timeout(shared.config.script_timeout, waiter.wait()).await {
            Ok(Some(Ok(payload))) => payload,
            Ok(Some(Err(e))) => {
                warn!(error = %e, "script execution failed");
                String::new()
            }
            Ok(None) => String::new(),
            Err(_) => {
                shared.scripts.discard(&correlation);
                warn!(timeout = ?shared.config.script_timeout, "script execution timed out");
                String::new()
            }
        }
    }

    /// Position the view within its parent. Valid before the instance is
    /// ready; applies to whichever native layers already exist.
    pub fn update_bounds(&self, bounds: Bounds) {
        if self.state() == BindingState::Disposed {
            debug!("update_bounds ignored: webview disposed");
            return;
        }
        let shared = self.shared();
        shared
            .lock_handle()
            .apply_bounds(shared.driver.as_ref(), bounds);
    }

    /// Show or hide the view. Valid before the instance is ready.
    pub fn set_visible(&self, visible: bool) {
        if self.state() == BindingState::Disposed {
            debug!("set_visible ignored: webview disposed");
            return;
        }
        let shared = self.shared();
        shared
            .lock_handle()
            .apply_visibility(shared.driver.as_ref(), visible);
    }
}
