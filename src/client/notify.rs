//! User-facing notifications emitted by store operations

use tokio::sync::broadcast;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A notification naming the action and carrying the outcome message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Fan-out channel for notifications
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to future notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Emit to all current subscribers. With none subscribed this is a no-op.
    pub fn emit(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let notifier = Notifier::default();
        let mut receiver = notifier.subscribe();

        notifier.emit(Notification::success("Delete book", "Book deleted successfully."));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.severity, Severity::Success);
        assert_eq!(received.title, "Delete book");
        assert_eq!(received.message, "Book deleted successfully.");
    }

    #[test]
    fn emitting_without_subscribers_is_a_noop() {
        let notifier = Notifier::default();
        notifier.emit(Notification::error("Login", "Invalid credentials."));
    }
}
