// src/core/notify.rs — User-visible notifications (toasts)

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Success".into(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Error".into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Sink for notifications. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Bounded in-memory queue of recent notifications. Cloning shares the queue.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl ToastQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn latest(&self) -> Option<Notification> {
        self.inner.lock().ok().and_then(|q| q.back().cloned())
    }

    /// Everything currently queued, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn error_count(&self) -> usize {
        self.snapshot().iter().filter(|n| n.is_error()).count()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        if let Ok(mut q) = self.inner.lock() {
            if q.len() == self.capacity {
                q.pop_front();
            }
            q.push_back(notification);
        }
    }
}

/// Prints notifications for one-shot CLI commands.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("\u{2713} {}", notification.description),
            NotificationLevel::Error => {
                eprintln!("\u{2717} {}: {}", notification.title, notification.description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_keeps_latest() {
        let q = ToastQueue::new(2);
        q.notify(Notification::success("one"));
        q.notify(Notification::error("two"));
        q.notify(Notification::success("three"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.latest().unwrap().description, "three");
        assert_eq!(q.snapshot()[0].description, "two");
        assert_eq!(q.error_count(), 1);
    }

    #[test]
    fn test_clones_share_queue() {
        let q = ToastQueue::default();
        let other = q.clone();
        other.notify(Notification::error("boom"));
        assert_eq!(q.latest().unwrap().title, "Error");
    }
}
