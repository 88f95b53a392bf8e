//! Initialization state machine for one binding instance.
//!
//! The instance walks `Uninitialized → SurfaceCreated → EnvironmentReady →
//! ControllerReady → Ready` as the asynchronous handshake progresses. Any
//! non-terminal state can fault; disposal is terminal and reachable from
//! everywhere. `Ready` is the only state in which navigation operations are
//! permitted.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use waypoint_common::BindingError;

/// Lifecycle phase of one binding instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Uninitialized,
    /// The child surface exists (or is being created); the engine handshake
    /// has not answered yet.
    SurfaceCreated,
    EnvironmentReady,
    ControllerReady,
    Ready,
    /// A handshake step failed. Sticky: only disposal leaves this state.
    Faulted,
    /// Terminal.
    Disposed,
}

impl BindingState {
    /// Whether navigation and script operations are permitted.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    fn allows(self, next: BindingState) -> bool {
        use BindingState::*;
        match (self, next) {
            (Disposed, _) => false,
            (_, Disposed) => true,
            (Faulted, _) => false,
            (_, Faulted) => true,
            (Uninitialized, SurfaceCreated) => true,
            (SurfaceCreated, EnvironmentReady) => true,
            (EnvironmentReady, ControllerReady) => true,
            (ControllerReady, Ready) => true,
            _ => false,
        }
    }
}

/// Lock-guarded state cell shared between the facade and the engine's
/// dispatch context.
pub struct StateCell {
    current: Mutex<BindingState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(BindingState::Uninitialized),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BindingState> {
        // State must stay readable during teardown even if a holder panicked.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> BindingState {
        *self.lock()
    }

    /// Attempt a transition. Returns false when the table forbids it, which
    /// is how late handshake callbacks discover they lost the race.
    pub fn advance(&self, next: BindingState) -> bool {
        let mut current = self.lock();
        if current.allows(next) {
            debug!(from = ?*current, to = ?next, "state transition");
            *current = next;
            true
        } else {
            debug!(from = ?*current, to = ?next, "state transition rejected");
            false
        }
    }

    /// Claim the one initialization slot and enter the surface-creation
    /// phase. Fails for every state but `Uninitialized`, so a second
    /// `initialize` call is rejected without altering existing state.
    pub fn begin_initialize(&self) -> Result<(), BindingError> {
        let mut current = self.lock();
        match *current {
            BindingState::Uninitialized => {
                *current = BindingState::SurfaceCreated;
                Ok(())
            }
            _ => Err(BindingError::AlreadyInitialized),
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
