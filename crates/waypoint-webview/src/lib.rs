//! Embedded-browser navigation binding.
//!
//! Presents a uniform navigation-control surface (load URL or inline HTML,
//! history traversal, script execution, bounds/visibility, disposal) over a
//! native embedded-browser engine whose initialization, event delivery, and
//! script results all arrive through asynchronous callbacks:
//! - the engine boundary traits (`engine`)
//! - completion correlation for callback-driven requests (`correlate`)
//! - event-subscription token bookkeeping (`tokens`)
//! - the initialization state machine (`state`)
//! - host-facing notifications (`events`)
//! - the facade host applications hold (`binding`)

pub mod binding;
pub mod config;
pub mod correlate;
pub mod engine;
pub mod events;
pub mod handle;
pub mod state;
pub mod tokens;

#[cfg(feature = "wry-engine")]
pub mod platform;


pub use binding::{EmbeddedWebView, WebViewPlatform};
pub use config::WebViewConfig;
pub use engine::{
    Bounds, EngineContent, EngineController, EngineDriver, EngineEnvironment, EventToken,
    NavigationEventKind, NavigationSignal, SurfaceHandle,
};
pub use events::{NavigationRecord, WebViewNotification};
pub use state::BindingState;
