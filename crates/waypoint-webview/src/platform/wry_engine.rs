//! wry-backed engine driver.
//!
//! `wry::WebView` instances must live on the UI thread, while the engine
//! boundary promises `Send + Sync` objects whose completions may fire from
//! any context. The driver therefore splits in two: [`WryEngine`] implements
//! [`EngineDriver`] by posting commands onto a channel, and
//! [`WryEnginePump`] runs inside the host's event loop, owns the webviews,
//! and services those commands.
//!
//! Engine limitations, handled best-effort: wry exposes no native history
//! query or traversal, so back/forward capability is mirrored from observed
//! navigations and traversal is driven through script evaluation; the
//! page-load hook does not report load failures, so completed signals always
//! carry success.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use wry::dpi::{PhysicalPosition, PhysicalSize};
use wry::raw_window_handle::HasWindowHandle;
use wry::{PageLoadEvent, WebViewBuilder};

use waypoint_common::EngineError;

use crate::config::WebViewConfig;
use crate::engine::{
    Bounds, ControllerCreated, EngineContent, EngineController, EngineDriver, EngineEnvironment,
    EnvironmentCreated, EventToken, NavigationEventKind, NavigationListener, NavigationSignal,
    ScriptCompleted, SurfaceHandle,
};

enum EngineCommand {
    CreateController {
        surface: SurfaceHandle,
        config: WebViewConfig,
        created: ControllerCreated,
    },
    Navigate {
        surface: SurfaceHandle,
        url: String,
    },
    LoadHtml {
        surface: SurfaceHandle,
        html: String,
    },
    HistoryBack {
        surface: SurfaceHandle,
    },
    HistoryForward {
        surface: SurfaceHandle,
    },
    Reload {
        surface: SurfaceHandle,
    },
    StopLoading {
        surface: SurfaceHandle,
    },
    RunScript {
        surface: SurfaceHandle,
        script: String,
        completed: ScriptCompleted,
    },
    SetBounds {
        surface: SurfaceHandle,
        bounds: Bounds,
    },
    SetVisible {
        surface: SurfaceHandle,
        visible: bool,
    },
    CloseView {
        surface: SurfaceHandle,
    },
}

/// Channel endpoint shared by the driver-side objects.
struct CommandTx(Mutex<Sender<EngineCommand>>);

impl CommandTx {
    fn post(&self, command: EngineCommand) {
        let Ok(tx) = self.0.lock() else { return };
        if tx.send(command).is_err() {
            warn!("engine pump gone; command dropped");
        }
    }
}

/// Per-view state shared between the pump and the content object: navigation
/// listeners plus mirrored history capability.
#[derive(Default)]
struct ViewShared {
    listeners: Mutex<HashMap<NavigationEventKind, Vec<(EventToken, NavigationListener)>>>,
    next_token: AtomicU64,
    can_back: AtomicBool,
    can_forward: AtomicBool,
}

impl ViewShared {
    fn dispatch(&self, kind: NavigationEventKind, signal: NavigationSignal) {
        let subscribed: Vec<NavigationListener> = match self.listeners.lock() {
            Ok(map) => map
                .get(&kind)
                .into_iter()
                .flatten()
                .map(|(_, listener)| Arc::clone(listener))
                .collect(),
            Err(_) => return,
        };
        for listener in subscribed {
            listener(signal.clone());
        }
    }
}

/// Driver half. Cheap to share; every call is posted to the pump.
pub struct WryEngine {
    commands: Arc<CommandTx>,
    next_surface: AtomicU64,
}

impl WryEngine {
    /// Create the driver plus the pump the UI thread must service.
    pub fn new<W: HasWindowHandle>(window: W) -> (Self, WryEnginePump<W>) {
        let (tx, rx) = channel();
        let commands = Arc::new(CommandTx(Mutex::new(tx)));
        let engine = Self {
            commands: Arc::clone(&commands),
            next_surface: AtomicU64::new(1),
        };
        let pump = WryEnginePump {
            window,
            inbound: rx,
            outbound: commands,
            views: HashMap::new(),
        };
        (engine, pump)
    }
}

impl EngineDriver for WryEngine {
    fn create_surface(&self, _parent: SurfaceHandle) -> Result<SurfaceHandle, EngineError> {
        // wry hosts its own child view inside the pump's window; the handle
        // identifies the slot that view will occupy.
        Ok(SurfaceHandle(
            self.next_surface.fetch_add(1, Ordering::Relaxed),
        ))
    }

    fn destroy_surface(&self, surface: SurfaceHandle) {
        self.commands.post(EngineCommand::CloseView { surface });
    }

    fn move_surface(&self, surface: SurfaceHandle, bounds: Bounds) {
        self.commands
            .post(EngineCommand::SetBounds { surface, bounds });
    }

    fn show_surface(&self, surface: SurfaceHandle, visible: bool) {
        self.commands
            .post(EngineCommand::SetVisible { surface, visible });
    }

    fn create_environment(&self, config: &WebViewConfig, created: EnvironmentCreated) {
        // wry has no separate environment object; the factory just carries
        // the config to controller creation.
        created(Ok(Box::new(WryEnvironment {
            config: config.clone(),
            commands: Arc::clone(&self.commands),
        })));
    }
}

struct WryEnvironment {
    config: WebViewConfig,
    commands: Arc<CommandTx>,
}

impl EngineEnvironment for WryEnvironment {
    fn create_controller(&self, surface: SurfaceHandle, created: ControllerCreated) {
        self.commands.post(EngineCommand::CreateController {
            surface,
            config: self.config.clone(),
            created,
        });
    }
}

struct WryController {
    surface: SurfaceHandle,
    commands: Arc<CommandTx>,
}

impl EngineController for WryController {
    fn set_bounds(&self, bounds: Bounds) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::SetBounds {
            surface: self.surface,
            bounds,
        });
        Ok(())
    }

    fn set_visible(&self, visible: bool) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::SetVisible {
            surface: self.surface,
            visible,
        });
        Ok(())
    }

    fn close(&self) {
        self.commands.post(EngineCommand::CloseView {
            surface: self.surface,
        });
    }
}

struct WryContent {
    surface: SurfaceHandle,
    commands: Arc<CommandTx>,
    shared: Arc<ViewShared>,
}

impl EngineContent for WryContent {
    fn navigate(&self, url: &str) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::Navigate {
            surface: self.surface,
            url: url.to_string(),
        });
        Ok(())
    }

    fn load_html(&self, html: &str) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::LoadHtml {
            surface: self.surface,
            html: html.to_string(),
        });
        Ok(())
    }

    fn go_back(&self) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::HistoryBack {
            surface: self.surface,
        });
        Ok(())
    }

    fn go_forward(&self) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::HistoryForward {
            surface: self.surface,
        });
        Ok(())
    }

    fn reload(&self) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::Reload {
            surface: self.surface,
        });
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        self.commands.post(EngineCommand::StopLoading {
            surface: self.surface,
        });
        Ok(())
    }

    fn can_go_back(&self) -> Result<bool, EngineError> {
        Ok(self.shared.can_back.load(Ordering::Relaxed))
    }

    fn can_go_forward(&self) -> Result<bool, EngineError> {
        Ok(self.shared.can_forward.load(Ordering::Relaxed))
    }

    fn run_script(&self, script: &str, completed: ScriptCompleted) {
        self.commands.post(EngineCommand::RunScript {
            surface: self.surface,
            script: script.to_string(),
            completed,
        });
    }

    fn subscribe(
        &self,
        kind: NavigationEventKind,
        listener: NavigationListener,
    ) -> Result<EventToken, EngineError> {
        let token = EventToken(self.shared.next_token.fetch_add(1, Ordering::Relaxed));
        self.shared
            .listeners
            .lock()
            .map_err(|_| EngineError::Unavailable("listener table poisoned".into()))?
            .entry(kind)
            .or_default()
            .push((token, listener));
        Ok(token)
    }

    fn unsubscribe(
        &self,
        kind: NavigationEventKind,
        token: EventToken,
    ) -> Result<(), EngineError> {
        let mut listeners = self
            .shared
            .listeners
            .lock()
            .map_err(|_| EngineError::Unavailable("listener table poisoned".into()))?;
        let Some(subscribed) = listeners.get_mut(&kind) else {
            return Err(EngineError::Unavailable("no subscription for token".into()));
        };
        let before = subscribed.len();
        subscribed.retain(|(t, _)| *t != token);
        if subscribed.len() == before {
            return Err(EngineError::Unavailable("no subscription for token".into()));
        }
        Ok(())
    }
}

struct PumpView {
    webview: wry::WebView,
    shared: Arc<ViewShared>,
    history: Vec<String>,
    index: usize,
}

impl PumpView {
    fn record_navigation(&mut self, url: String) {
        if !self.history.is_empty() {
            self.history.truncate(self.index + 1);
        }
        self.history.push(url);
        self.index = self.history.len() - 1;
        self.sync_capabilities();
    }

    fn sync_capabilities(&self) {
        self.shared
            .can_back
            .store(self.index > 0, Ordering::Relaxed);
        self.shared
            .can_forward
            .store(self.index + 1 < self.history.len(), Ordering::Relaxed);
    }
}

/// UI-thread half: owns the `wry::WebView`s and services driver commands.
pub struct WryEnginePump<W: HasWindowHandle> {
    window: W,
    inbound: Receiver<EngineCommand>,
    outbound: Arc<CommandTx>,
    views: HashMap<SurfaceHandle, PumpView>,
}

impl<W: HasWindowHandle> WryEnginePump<W> {
    /// Service every queued command. Call from the host event loop; returns
    /// how many commands were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(command) = self.inbound.try_recv() {
            self.service(command);
            handled += 1;
        }
        handled
    }

    /// How many webviews are currently alive.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    fn service(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::CreateController {
                surface,
                config,
                created,
            } => self.create_view(surface, config, created),
            EngineCommand::Navigate { surface, url } => {
                if let Some(view) = self.views.get_mut(&surface) {
                    match view.webview.load_url(&url) {
                        Ok(()) => view.record_navigation(url),
                        Err(e) => warn!(url, error = %e, "load_url failed"),
                    }
                }
            }
            EngineCommand::LoadHtml { surface, html } => {
                if let Some(view) = self.views.get_mut(&surface) {
                    match view.webview.load_html(&html) {
                        Ok(()) => view.record_navigation("about:blank".to_string()),
                        Err(e) => warn!(error = %e, "load_html failed"),
                    }
                }
            }
            EngineCommand::HistoryBack { surface } => {
                if let Some(view) = self.views.get_mut(&surface) {
                    if view.index > 0 {
                        view.index -= 1;
                        if let Err(e) = view.webview.evaluate_script("history.back()") {
                            warn!(error = %e, "history.back failed");
                        }
                        view.sync_capabilities();
                    }
                }
            }
            EngineCommand::HistoryForward { surface } => {
                if let Some(view) = self.views.get_mut(&surface) {
                    if view.index + 1 < view.history.len() {
                        view.index += 1;
                        if let Err(e) = view.webview.evaluate_script("history.forward()") {
                            warn!(error = %e, "history.forward failed");
                        }
                        view.sync_capabilities();
                    }
                }
            }
            EngineCommand::Reload { surface } => {
                if let Some(view) = self.views.get(&surface) {
                    if let Err(e) = view.webview.evaluate_script("location.reload()") {
                        warn!(error = %e, "reload failed");
                    }
                }
            }
            EngineCommand::StopLoading { surface } => {
                if let Some(view) = self.views.get(&surface) {
                    if let Err(e) = view.webview.evaluate_script("window.stop()") {
                        warn!(error = %e, "stop failed");
                    }
                }
            }
            EngineCommand::RunScript {
                surface,
                script,
                completed,
            } => self.run_script(surface, &script, completed),
            EngineCommand::SetBounds { surface, bounds } => {
                if let Some(view) = self.views.get(&surface) {
                    if let Err(e) = view.webview.set_bounds(to_wry_rect(bounds)) {
                        warn!(error = %e, "set_bounds failed");
                    }
                }
            }
            EngineCommand::SetVisible { surface, visible } => {
                if let Some(view) = self.views.get(&surface) {
                    if let Err(e) = view.webview.set_visible(visible) {
                        warn!(error = %e, "set_visible failed");
                    }
                }
            }
            EngineCommand::CloseView { surface } => {
                if self.views.remove(&surface).is_some() {
                    debug!(surface = surface.0, "webview closed");
                }
            }
        }
    }

    fn create_view(&mut self, surface: SurfaceHandle, config: WebViewConfig, created: ControllerCreated) {
        if self.views.contains_key(&surface) {
            created(Err(EngineError::Unavailable(
                "surface already has a webview".into(),
            )));
            return;
        }

        let shared = Arc::new(ViewShared::default());

        let mut builder = WebViewBuilder::new()
            .with_transparent(config.transparent)
            .with_devtools(config.devtools)
            .with_focused(false);
        if let Some(agent) = &config.user_agent {
            builder = builder.with_user_agent(agent);
        }

        let nav_shared = Arc::clone(&shared);
        builder = builder.with_navigation_handler(move |url| {
            nav_shared.dispatch(
                NavigationEventKind::Starting,
                NavigationSignal::Starting { url },
            );
            true
        });

        let load_shared = Arc::clone(&shared);
        builder = builder.with_on_page_load_handler(move |event, url| {
            if matches!(event, PageLoadEvent::Finished) {
                load_shared.dispatch(
                    NavigationEventKind::Completed,
                    NavigationSignal::Completed {
                        url,
                        success: true,
                        status: 0,
                    },
                );
            }
        });

        match builder.build_as_child(&self.window) {
            Ok(webview) => {
                debug!(surface = surface.0, "webview created");
                self.views.insert(
                    surface,
                    PumpView {
                        webview,
                        shared: Arc::clone(&shared),
                        history: Vec::new(),
                        index: 0,
                    },
                );
                created(Ok((
                    Box::new(WryController {
                        surface,
                        commands: Arc::clone(&self.outbound),
                    }),
                    Arc::new(WryContent {
                        surface,
                        commands: Arc::clone(&self.outbound),
                        shared,
                    }),
                )));
            }
            Err(e) => created(Err(EngineError::Unavailable(e.to_string()))),
        }
    }

    fn run_script(&mut self, surface: SurfaceHandle, script: &str, completed: ScriptCompleted) {
        let Some(view) = self.views.get(&surface) else {
            completed(Err(EngineError::Unavailable(
                "no webview for surface".into(),
            )));
            return;
        };
        let slot = Arc::new(Mutex::new(Some(completed)));
        let callback_slot = Arc::clone(&slot);
        let result = view
            .webview
            .evaluate_script_with_callback(script, move |payload| {
                if let Some(completed) = callback_slot.lock().ok().and_then(|mut s| s.take()) {
                    completed(Ok(payload));
                }
            });
        if let Err(e) = result {
            if let Some(completed) = slot.lock().ok().and_then(|mut s| s.take()) {
                completed(Err(EngineError::Unavailable(e.to_string())));
            }
        }
    }
}

fn to_wry_rect(bounds: Bounds) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Physical(PhysicalPosition::new(bounds.x, bounds.y)),
        size: wry::dpi::Size::Physical(PhysicalSize::new(bounds.width, bounds.height)),
    }
}
