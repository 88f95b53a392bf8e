use std::time::Duration;

/// Failures reported by the native engine boundary. Every raw engine call
/// either succeeds or yields one of these; the binding layer decides whether
/// to propagate, log, or swallow.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine call failed with status {status}: {message}")]
    Native { status: i32, message: String },

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Shorthand for a status-code failure delivered by a native callback.
    pub fn native(status: i32, message: impl Into<String>) -> Self {
        Self::Native {
            status,
            message: message.into(),
        }
    }
}

/// Failures surfaced on the public webview capability surface.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("initialization timed out after {0:?}")]
    InitializationTimeout(Duration),

    #[error("webview is already initialized")]
    AlreadyInitialized,

    #[error("webview has been disposed")]
    Disposed,
}

/// Per-call script execution outcomes. These never cross the public surface
/// directly; callers observe an empty result string instead.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script execution failed: {0}")]
    Failed(String),

    #[error("script execution cancelled")]
    Cancelled,

    #[error("script execution timed out after {0:?}")]
    TimedOut(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display() {
        let err = EngineError::native(-2147024894, "class not registered");
        assert_eq!(
            err.to_string(),
            "engine call failed with status -2147024894: class not registered"
        );

        let err = EngineError::Unavailable("runtime not installed".into());
        assert_eq!(err.to_string(), "engine unavailable: runtime not installed");
    }

    #[test]
    fn binding_error_display() {
        let err = BindingError::Initialization("controller creation failed".into());
        assert_eq!(
            err.to_string(),
            "initialization failed: controller creation failed"
        );

        let err = BindingError::AlreadyInitialized;
        assert_eq!(err.to_string(), "webview is already initialized");

        let err = BindingError::Disposed;
        assert_eq!(err.to_string(), "webview has been disposed");
    }

    #[test]
    fn binding_timeout_mentions_duration() {
        let err = BindingError::InitializationTimeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn script_error_display() {
        let err = ScriptError::Failed("engine call failed with status 1".into());
        assert!(err.to_string().starts_with("script execution failed"));

        let err = ScriptError::Cancelled;
        assert_eq!(err.to_string(), "script execution cancelled");
    }
}
