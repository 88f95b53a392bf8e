//! Platform binding facade.
//!
//! `EmbeddedWebView` composes the engine driver, the initialization state
//! machine, the completion correlator, and the event token registry into the
//! uniform capability surface the host application holds. One instance per
//! embedded view; torn down exactly once by [`EmbeddedWebView::dispose`].

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;
use waypoint_common::{BindingError, ScriptError};

use crate::config::WebViewConfig;
use crate::correlate::CompletionTable;
use crate::engine::{Bounds, EngineContent, EngineDriver, NavigationSignal, SurfaceHandle};
use crate::events::{NotificationHub, WebViewNotification};
use crate::handle::EngineHandle;
use crate::state::{BindingState, StateCell};
use crate::tokens::TokenRegistry;

mod dispose;
mod init;
mod ops;

/// Uniform navigation-control capability set; one implementation per native
/// engine binding. This is what host applications hold.
#[async_trait]
pub trait WebViewPlatform: Send + Sync {
    /// Run the full engine handshake. Completes only once the instance is
    /// ready or faulted (or the configured bound elapses).
    async fn initialize(&self, parent: SurfaceHandle) -> Result<(), BindingError>;

    fn navigate(&self, url: &str);

    fn load_html(&self, html: &str);

    fn go_back(&self);

    fn go_forward(&self);

    fn reload(&self);

    fn stop(&self);

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    /// Execute a script and return its serialized result, or the empty
    /// string on any failure.
    async fn execute_script(&self, script: &str) -> String;

    fn update_bounds(&self, bounds: Bounds);

    fn set_visible(&self, visible: bool);

    fn dispose(&self);
}

/// Everything one binding instance owns, shared with the completion
/// callbacks handed to the native layer.
pub(crate) struct BindingShared {
    pub(crate) driver: Arc<dyn EngineDriver>,
    pub(crate) config: WebViewConfig,
    pub(crate) state: StateCell,
    pub(crate) handle: Mutex<EngineHandle>,
    pub(crate) init: CompletionTable<Result<(), BindingError>>,
    pub(crate) scripts: CompletionTable<Result<String, ScriptError>>,
    pub(crate) tokens: TokenRegistry,
    pub(crate) notices: NotificationHub,
    pub(crate) current_url: Mutex<String>,
}

impl BindingShared {
    pub(crate) fn lock_handle(&self) -> MutexGuard<'_, EngineHandle> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Translate a raw engine signal into its host notification and publish
    /// it. Signals delivered after disposal are discarded.
    pub(crate) fn publish_signal(&self, signal: NavigationSignal) {
        if self.state.current() == BindingState::Disposed {
            debug!("navigation signal after disposal; discarding");
            return;
        }
        if let NavigationSignal::Completed {
            url, success: true, ..
        } = &signal
        {
            if let Ok(mut current) = self.current_url.lock() {
                *current = url.clone();
            }
        }
        self.notices.publish(WebViewNotification::from_signal(signal));
    }
}

/// One embedded browser view, bound to a native engine through a driver.
pub struct EmbeddedWebView {
    shared: Arc<BindingShared>,
}

impl EmbeddedWebView {
    /// Create an uninitialized view bound to the given engine driver. No
    /// native resources exist until [`initialize`](Self::initialize).
    pub fn new(driver: Arc<dyn EngineDriver>, config: WebViewConfig) -> Self {
        Self {
            shared: Arc::new(BindingShared {
                driver,
                config,
                state: StateCell::new(),
                handle: Mutex::new(EngineHandle::new()),
                init: CompletionTable::new(),
                scripts: CompletionTable::new(),
                tokens: TokenRegistry::new(),
                notices: NotificationHub::new(),
                current_url: Mutex::new(String::new()),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<BindingShared> {
        &self.shared
    }

    pub fn state(&self) -> BindingState {
        self.shared.state.current()
    }

    /// Best-effort tracking of the last known URL: updated on outgoing
    /// navigations and on successful completed events.
    pub fn current_url(&self) -> String {
        self.shared
            .current_url
            .lock()
            .map(|url| url.clone())
            .unwrap_or_default()
    }

    /// Drain all pending host notifications, oldest first.
    pub fn drain_notifications(&self) -> Vec<WebViewNotification> {
        self.shared.notices.drain()
    }

    /// Install an observer invoked inline for each notification, from the
    /// engine's dispatch context. Panics in the observer are contained.
    pub fn set_notification_observer(
        &self,
        observer: impl Fn(&WebViewNotification) + Send + Sync + 'static,
    ) {
        self.shared.notices.set_observer(observer);
    }

    /// The content object, only while the instance is ready.
    pub(crate) fn ready_content(&self) -> Option<Arc<dyn EngineContent>> {
        if !self.shared.state.current().is_ready() {
            return None;
        }
        self.shared.lock_handle().content()
    }
}

impl Drop for EmbeddedWebView {
    fn drop(&mut self) {
        // A leaked facade must still release its native handles.
        self.dispose();
    }
}

#[async_trait]
impl WebViewPlatform for EmbeddedWebView {
    async fn initialize(&self, parent: SurfaceHandle) -> Result<(), BindingError> {
        EmbeddedWebView::initialize(self, parent).await
    }

    fn navigate(&self, url: &str) {
        EmbeddedWebView::navigate(self, url)
    }

    fn load_html(&self, html: &str) {
        EmbeddedWebView::load_html(self, html)
    }

    fn go_back(&self) {
        EmbeddedWebView::go_back(self)
    }

    fn go_forward(&self) {
        EmbeddedWebView::go_forward(self)
    }

    fn reload(&self) {
        EmbeddedWebView::reload(self)
    }

    fn stop(&self) {
        EmbeddedWebView::stop(self)
    }

    fn can_go_back(&self) -> bool {
        EmbeddedWebView::can_go_back(self)
    }

    fn can_go_forward(&self) -> bool {
        EmbeddedWebView::can_go_forward(self)
    }

    async fn execute_script(&self, script: &str) -> String {
        EmbeddedWebView::execute_script(self, script).await
    }

    fn update_bounds(&self, bounds: Bounds) {
        EmbeddedWebView::update_bounds(self, bounds)
    }

    fn set_visible(&self, visible: bool) {
        EmbeddedWebView::set_visible(self, visible)
    }

    fn dispose(&self) {
        EmbeddedWebView::dispose(self)
    }
}
