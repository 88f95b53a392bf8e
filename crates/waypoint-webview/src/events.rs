//! Host-facing navigation notifications.
//!
//! One native completed-event fans out into two distinct notification kinds
//! (completed vs. failed) so host code never inspects a success flag. A
//! failed navigation always carries a non-empty, human-readable message
//! derived from the engine's error status.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::NavigationSignal;

/// Immutable description of one navigation lifecycle event, as handed to the
/// host. Produced once per event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRecord {
    pub url: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Notifications published to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WebViewNotification {
    NavigationStarting { url: String },
    NavigationCompleted { url: String },
    NavigationFailed { url: String, error: String },
}

impl WebViewNotification {
    /// Fan a raw engine signal out into the notification the host sees.
    pub fn from_signal(signal: NavigationSignal) -> Self {
        match signal {
            NavigationSignal::Starting { url } => Self::NavigationStarting { url },
            NavigationSignal::Completed {
                url,
                success: true, ..
            } => Self::NavigationCompleted { url },
            NavigationSignal::Completed {
                url,
                success: false,
                status,
            } => Self::NavigationFailed {
                url,
                error: format!("navigation failed with engine status {status}"),
            },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::NavigationStarting { url }
            | Self::NavigationCompleted { url }
            | Self::NavigationFailed { url, .. } => url,
        }
    }

    pub fn record(&self) -> NavigationRecord {
        match self {
            Self::NavigationStarting { url } | Self::NavigationCompleted { url } => {
                NavigationRecord {
                    url: url.clone(),
                    success: true,
                    error: None,
                }
            }
            Self::NavigationFailed { url, error } => NavigationRecord {
                url: url.clone(),
                success: false,
                error: Some(error.clone()),
            },
        }
    }
}

type Observer = Arc<dyn Fn(&WebViewNotification) + Send + Sync>;

/// Notification fan-out point. Notifications are queued for the host to
/// drain from its own loop; an optional observer is additionally invoked
/// inline from the engine's dispatch context. A panicking observer is
/// contained and logged; a faulty host handler must not break that context.
pub struct NotificationHub {
    queue: Mutex<Vec<WebViewNotification>>,
    observer: Mutex<Option<Observer>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            observer: Mutex::new(None),
        }
    }

    pub fn set_observer(&self, observer: impl Fn(&WebViewNotification) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.observer.lock() {
            *slot = Some(Arc::new(observer));
        }
    }

    pub fn publish(&self, notification: WebViewNotification) {
        let observer = self
            .observer
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        if let Some(observer) = observer {
            if catch_unwind(AssertUnwindSafe(|| observer(&notification))).is_err() {
                warn!("notification observer panicked; containing");
            }
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push(notification);
        }
    }

    /// Drain all queued notifications, oldest first.
    pub fn drain(&self) -> Vec<WebViewNotification> {
        self.queue
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_signal_becomes_starting_notification() {
        let notification = WebViewNotification::from_signal(NavigationSignal::Starting {
            url: "https://example.test".into(),
        });
        assert_eq!(
            notification,
            WebViewNotification::NavigationStarting {
                url: "https://example.test".into()
            }
        );
        assert!(notification.record().success);
    }

    #[test]
    fn successful_completion_never_reports_failure() {
        let notification = WebViewNotification::from_signal(NavigationSignal::Completed {
            url: "https://example.test".into(),
            success: true,
            status: 0,
        });
        assert!(matches!(
            notification,
            WebViewNotification::NavigationCompleted { .. }
        ));
    }

    #[test]
    fn failed_completion_reports_failure_with_message() {
        let notification = WebViewNotification::from_signal(NavigationSignal::Completed {
            url: "https://example.test".into(),
            success: false,
            status: 42,
        });
        match &notification {
            WebViewNotification::NavigationFailed { error, .. } => {
                assert!(!error.is_empty());
                assert!(error.contains("42"));
            }
            other => panic!("expected failure notification, got {other:?}"),
        }
        let record = notification.record();
        assert!(!record.success);
        assert!(record.error.is_some());
    }

    #[test]
    fn publish_queues_for_draining() {
        let hub = NotificationHub::new();
        hub.publish(WebViewNotification::NavigationStarting {
            url: "https://a.test".into(),
        });
        hub.publish(WebViewNotification::NavigationCompleted {
            url: "https://a.test".into(),
        });

        let drained = hub.drain();
        assert_eq!(drained.len(), 2);
        assert!(hub.drain().is_empty());
    }

    #[test]
    fn panicking_observer_is_contained() {
        let hub = NotificationHub::new();
        hub.set_observer(|_| panic!("host handler bug"));

        hub.publish(WebViewNotification::NavigationStarting {
            url: "https://a.test".into(),
        });

        // The queue still received the notification and the hub still works.
        assert_eq!(hub.drain().len(), 1);
        hub.publish(WebViewNotification::NavigationCompleted {
            url: "https://a.test".into(),
        });
        assert_eq!(hub.drain().len(), 1);
    }

    #[test]
    fn observer_sees_notifications_inline() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hub = NotificationHub::new();
        let sink = Arc::clone(&seen);
        hub.set_observer(move |notification| {
            sink.lock().unwrap().push(notification.url().to_string());
        });

        hub.publish(WebViewNotification::NavigationStarting {
            url: "https://a.test".into(),
        });
        assert_eq!(seen.lock().unwrap().as_slice(), ["https://a.test"]);
    }
}
