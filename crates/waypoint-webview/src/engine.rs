//! Native engine boundary.
//!
//! The embedded browser engines this crate binds to expose three layered
//! objects: a *surface* (raw window-like handle hosting the rendered
//! content), a *controller* (positioning/visibility authority), and a
//! *content object* (navigation, scripting, event subscription). Creation of
//! the environment and the controller is callback-driven, and so is script
//! execution; completions may fire on the engine's own dispatch context,
//! possibly before the issuing call returns.
//!
//! Everything crossing this boundary is `Send` so an engine is free to
//! deliver completions from whichever thread it dispatches on.

use std::sync::Arc;

use waypoint_common::EngineError;

use crate::config::WebViewConfig;

/// Raw identifier of a native window-like surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Placement of the embedded surface within its parent, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same extent anchored at the surface origin. Controllers position
    /// themselves relative to their own surface, not the parent window.
    pub fn at_origin(self) -> Self {
        Self { x: 0, y: 0, ..self }
    }
}

/// Opaque subscription token returned by [`EngineContent::subscribe`].
/// Only meaningful for unsubscription on the content object that issued it,
/// and never after that object has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventToken(pub u64);

/// Navigation event streams a content object can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationEventKind {
    Starting,
    Completed,
}

/// Raw navigation callback payload delivered to subscribed listeners.
#[derive(Debug, Clone)]
pub enum NavigationSignal {
    Starting {
        url: String,
    },
    /// One signal for both outcomes; `status` is the engine's error status
    /// and only meaningful when `success` is false.
    Completed {
        url: String,
        success: bool,
        status: i32,
    },
}

/// Completion of an environment-creation request.
pub type EnvironmentCreated =
    Box<dyn FnOnce(Result<Box<dyn EngineEnvironment>, EngineError>) + Send>;

/// Completion of a controller-creation request. The controller and its
/// content object are delivered together; they are never present separately.
pub type ControllerCreated = Box<
    dyn FnOnce(Result<(Box<dyn EngineController>, Arc<dyn EngineContent>), EngineError>) + Send,
>;

/// Completion of a script-execution request, carrying the serialized result.
pub type ScriptCompleted = Box<dyn FnOnce(Result<String, EngineError>) + Send>;

/// Listener for navigation signals raised by a content object.
pub type NavigationListener = Arc<dyn Fn(NavigationSignal) + Send + Sync>;

/// Entry point into one native engine: surface management plus the start of
/// the asynchronous environment/controller handshake.
pub trait EngineDriver: Send + Sync {
    /// Create the child surface that will host the rendered content.
    fn create_surface(&self, parent: SurfaceHandle) -> Result<SurfaceHandle, EngineError>;

    fn destroy_surface(&self, surface: SurfaceHandle);

    /// Reposition the surface within its parent. Valid before the
    /// controller exists.
    fn move_surface(&self, surface: SurfaceHandle, bounds: Bounds);

    /// Show or hide the surface. Valid before the controller exists.
    fn show_surface(&self, surface: SurfaceHandle, visible: bool);

    /// Request creation of the engine environment. The completion fires on
    /// the engine's dispatch context, possibly before this call returns.
    fn create_environment(&self, config: &WebViewConfig, created: EnvironmentCreated);
}

/// The created engine environment; factory for controllers.
pub trait EngineEnvironment: Send {
    /// Request a controller attached to the given surface.
    fn create_controller(&self, surface: SurfaceHandle, created: ControllerCreated);
}

/// Positioning and visibility authority over the engine's surface.
pub trait EngineController: Send {
    fn set_bounds(&self, bounds: Bounds) -> Result<(), EngineError>;

    fn set_visible(&self, visible: bool) -> Result<(), EngineError>;

    /// End the controller's lifetime context. Called exactly once, before
    /// the content object is released.
    fn close(&self);
}

/// Navigation, scripting, and event subscription authority.
pub trait EngineContent: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), EngineError>;

    fn load_html(&self, html: &str) -> Result<(), EngineError>;

    fn go_back(&self) -> Result<(), EngineError>;

    fn go_forward(&self) -> Result<(), EngineError>;

    fn reload(&self) -> Result<(), EngineError>;

    fn stop(&self) -> Result<(), EngineError>;

    fn can_go_back(&self) -> Result<bool, EngineError>;

    fn can_go_forward(&self) -> Result<bool, EngineError>;

    /// Execute a script; the completion carries the serialized result value
    /// or the engine's failure status.
    fn run_script(&self, script: &str, completed: ScriptCompleted);

    fn subscribe(
        &self,
        kind: NavigationEventKind,
        listener: NavigationListener,
    ) -> Result<EventToken, EngineError>;

    fn unsubscribe(&self, kind: NavigationEventKind, token: EventToken)
        -> Result<(), EngineError>;
}
