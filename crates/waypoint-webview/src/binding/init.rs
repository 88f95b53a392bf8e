//! The asynchronous initialization handshake.
//!
//! `initialize` creates the child surface, then requests environment
//! creation; the environment completion requests controller creation; the
//! controller completion attaches the engine objects, subscribes navigation
//! events, and resolves the one pending initialization slot. Whichever
//! callback path completes first wins; every later completion finds the
//! state machine already moved on and is discarded.

use std::sync::Arc;

use tracing::{debug, warn};
use waypoint_common::{BindingError, CorrelationId, EngineError};

use crate::engine::{
    EngineContent, EngineController, EngineEnvironment, NavigationEventKind, NavigationListener,
    SurfaceHandle,
};
use crate::state::BindingState;

use super::{BindingShared, EmbeddedWebView};

impl EmbeddedWebView {
    /// Run the full engine handshake against the parent surface. Completes
    /// once the instance is ready or faulted; a native layer that never
    /// calls back is bounded by `config.init_timeout`.
    ///
    /// Calling this a second time fails with
    /// [`BindingError::AlreadyInitialized`] and leaves the instance as it
    /// was.
    pub async fn initialize(&self, parent: SurfaceHandle) -> Result<(), BindingError> {
        let shared = self.shared();
        shared.state.begin_initialize()?;

        let surface = match shared.driver.create_surface(parent) {
            Ok(surface) => surface,
            Err(e) => {
                warn!(error = %e, "surface creation failed");
                shared.state.advance(BindingState::Faulted);
                return Err(BindingError::Initialization(format!(
                    "surface creation failed: {e}"
                )));
            }
        };
        shared.lock_handle().attach_surface(surface);

        let (correlation, waiter) = shared.init.register();
        if shared.state.current() == BindingState::Disposed {
            // Disposal raced the claim; the engine must not be touched.
            shared.init.discard(&correlation);
            return Err(BindingError::Disposed);
        }
        let weak = Arc::downgrade(shared);
        let callback_id = correlation.clone();
        shared.driver.create_environment(
            &shared.config,
            Box::new(move |result| {
                let Some(shared) = weak.upgrade() else {
                    debug!("environment completion after teardown; discarding");
                    return;
                };
                BindingShared::on_environment_created(&shared, &callback_id, surface, result);
            }),
        );

        match tokio::time::timeout(shared.config.init_timeout, waiter.wait()).await {
            Ok(Some(result)) => result,
            // The slot was discarded without resolution; only teardown does
            // that while a waiter is parked.
            Ok(None) => Err(BindingError::Disposed),
            Err(_) => {
                shared.init.discard(&correlation);
                shared.state.advance(BindingState::Faulted);
                warn!(timeout = ?shared.config.init_timeout, "initialization timed out");
                Err(BindingError::InitializationTimeout(
                    shared.config.init_timeout,
                ))
            }
        }
    }
}

impl BindingShared {
    fn on_environment_created(
        shared: &Arc<Self>,
        correlation: &CorrelationId,
        surface: SurfaceHandle,
        result: Result<Box<dyn EngineEnvironment>, EngineError>,
    ) {
        let environment = match result {
            Ok(environment) => environment,
            Err(e) => {
                Self::fail_initialization(
                    shared,
                    correlation,
                    format!("environment creation failed: {e}"),
                );
                return;
            }
        };

        if !shared.state.advance(BindingState::EnvironmentReady) {
            debug!("environment completion lost the race; discarding");
            return;
        }

        let weak = Arc::downgrade(shared);
        let callback_id = correlation.clone();
        environment.create_controller(
            surface,
            Box::new(move |result| {
                let Some(shared) = weak.upgrade() else {
                    debug!("controller completion after teardown; discarding");
                    return;
                };
                BindingShared::on_controller_created(&shared, &callback_id, result);
            }),
        );
    }

    fn on_controller_created(
        shared: &Arc<Self>,
        correlation: &CorrelationId,
        result: Result<(Box<dyn EngineController>, Arc<dyn EngineContent>), EngineError>,
    ) {
        let (controller, content) = match result {
            Ok(pair) => pair,
            Err(e) => {
                Self::fail_initialization(
                    shared,
                    correlation,
                    format!("controller creation failed: {e}"),
                );
                return;
            }
        };

        if !shared.state.advance(BindingState::ControllerReady) {
            // A stray success after a fault or disposal. The freshly
            // delivered objects must not leak.
            debug!("controller completion lost the race; closing and discarding");
            controller.close();
            return;
        }

        if let Err(e) = Self::subscribe_navigation(shared, &content) {
            // Revoke whatever was subscribed while the content object is
            // still alive, then fail the handshake.
            for (kind, token) in shared.tokens.take_all() {
                let _ = content.unsubscribe(kind, token);
            }
            controller.close();
            Self::fail_initialization(
                shared,
                correlation,
                format!("event subscription failed: {e}"),
            );
            return;
        }

        shared.lock_handle().attach_engine(controller, content);
        if !shared.state.advance(BindingState::Ready) {
            // Disposal or a fault raced the attach; the just-attached
            // objects must be released here, nothing else will.
            debug!("handshake lost the race after attach; releasing engine objects");
            let mut handle = shared.lock_handle();
            if let Some(content) = handle.content() {
                for (kind, token) in shared.tokens.take_all() {
                    let _ = content.unsubscribe(kind, token);
                }
            }
            handle.release(shared.driver.as_ref());
            return;
        }
        if !shared.init.resolve(correlation, Ok(())) {
            debug!(correlation = %correlation, "initialization already resolved; discarding");
        }
    }

    fn subscribe_navigation(
        shared: &Arc<Self>,
        content: &Arc<dyn EngineContent>,
    ) -> Result<(), EngineError> {
        for kind in [NavigationEventKind::Starting, NavigationEventKind::Completed] {
            let weak = Arc::downgrade(shared);
            let listener: NavigationListener = Arc::new(move |signal| {
                if let Some(shared) = weak.upgrade() {
                    shared.publish_signal(signal);
                }
            });
            let token = content.subscribe(kind, listener)?;
            shared.tokens.record(kind, token);
        }
        Ok(())
    }

    fn fail_initialization(shared: &Arc<Self>, correlation: &CorrelationId, message: String) {
        warn!(error = %message, "initialization failed");
        shared.state.advance(BindingState::Faulted);
        if !shared
            .init
            .resolve(correlation, Err(BindingError::Initialization(message)))
        {
            debug!(correlation = %correlation, "initialization failure already resolved; discarding");
        }
    }
}
