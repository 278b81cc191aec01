/// User-facing notifications
///
/// Two channels, matching how the UI reports problems:
///
/// - `alert`: blocking dialog, used for sign-in and account flows
/// - `toast`: transient message, used for failed task/profile writes
///
/// The UI layer implements [`Notifier`]; [`LogNotifier`] writes to the log
/// and [`RecordingNotifier`] keeps messages for inspection.

use std::sync::Mutex;

/// Sink for user-facing messages
pub trait Notifier: Send + Sync {
    /// Shows a blocking alert
    fn alert(&self, message: &str);

    /// Shows a transient message
    fn toast(&self, message: &str);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(kind = "alert", "{}", message);
    }

    fn toast(&self, message: &str) {
        tracing::info!(kind = "toast", "{}", message);
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Alert(String),
    Toast(String),
}

/// Notifier that records every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices so far, oldest first
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Alert messages so far
    pub fn alerts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Alert(message) => Some(message),
                Notice::Toast(_) => None,
            })
            .collect()
    }

    /// Toast messages so far
    pub fn toasts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Toast(message) => Some(message),
                Notice::Alert(_) => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.push(Notice::Alert(message.to_string()));
    }

    fn toast(&self, message: &str) {
        self.push(Notice::Toast(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_separates_channels() {
        let notifier = RecordingNotifier::new();

        notifier.alert("Invalid email or password");
        notifier.toast("Network failure: timeout");
        notifier.alert("Password reset link sent!");

        assert_eq!(notifier.notices().len(), 3);
        assert_eq!(
            notifier.alerts(),
            vec!["Invalid email or password", "Password reset link sent!"]
        );
        assert_eq!(notifier.toasts(), vec!["Network failure: timeout"]);
    }
}
