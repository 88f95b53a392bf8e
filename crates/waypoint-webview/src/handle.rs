//! Owned native engine resources for one binding instance.

use std::sync::Arc;

use tracing::warn;

use crate::engine::{Bounds, EngineContent, EngineController, EngineDriver, SurfaceHandle};

/// The three layered native objects behind one embedded view: surface,
/// controller, content object. The controller and content object attach and
/// detach together; the surface may exist alone while the engine handshake
/// is still in flight.
#[derive(Default)]
pub struct EngineHandle {
    surface: Option<SurfaceHandle>,
    controller: Option<Box<dyn EngineController>>,
    content: Option<Arc<dyn EngineContent>>,
}

impl EngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_surface(&mut self, surface: SurfaceHandle) {
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    /// Attach the controller and its content object together.
    pub fn attach_engine(
        &mut self,
        controller: Box<dyn EngineController>,
        content: Arc<dyn EngineContent>,
    ) {
        self.controller = Some(controller);
        self.content = Some(content);
    }

    pub fn content(&self) -> Option<Arc<dyn EngineContent>> {
        self.content.clone()
    }

    pub fn has_controller(&self) -> bool {
        self.controller.is_some()
    }

    /// Apply bounds to whichever layers exist: the surface moves within its
    /// parent, the controller fills the surface.
    pub fn apply_bounds(&self, driver: &dyn EngineDriver, bounds: Bounds) {
        if let Some(surface) = self.surface {
            driver.move_surface(surface, bounds);
        }
        if let Some(controller) = &self.controller {
            if let Err(e) = controller.set_bounds(bounds.at_origin()) {
                warn!(error = %e, "controller bounds update failed");
            }
        }
    }

    /// Apply visibility to whichever layers exist.
    pub fn apply_visibility(&self, driver: &dyn EngineDriver, visible: bool) {
        if let Some(surface) = self.surface {
            driver.show_surface(surface, visible);
        }
        if let Some(controller) = &self.controller {
            if let Err(e) = controller.set_visible(visible) {
                warn!(error = %e, "controller visibility update failed");
            }
        }
    }

    /// Release every attached layer: controller first, then the content
    /// object, then the surface. The content object depends on the
    /// controller's lifetime context and the surface must outlive both.
    /// Tolerates any subset of layers being absent.
    pub fn release(&mut self, driver: &dyn EngineDriver) {
        if let Some(controller) = self.controller.take() {
            controller.close();
        }
        drop(self.content.take());
        if let Some(surface) = self.surface.take() {
            driver.destroy_surface(surface);
        }
    }
}
