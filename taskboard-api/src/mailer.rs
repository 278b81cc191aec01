/// Outgoing mail
///
/// The only mail the service sends is the password reset link. Deployments
/// plug in a real transport by implementing [`Mailer`]; the default
/// [`LogMailer`] writes the link to the log, which is enough for local
/// development.

use async_trait::async_trait;
use std::sync::Mutex;

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a password reset link to `email`
    async fn send_password_reset(&self, email: &str, link: &str) -> anyhow::Result<()>;
}

/// Mailer that logs instead of sending
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, link: &str) -> anyhow::Result<()> {
        tracing::info!(%email, %link, "Password reset link issued");
        Ok(())
    }
}

/// A message captured by [`RecordingMailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub link: String,
}

/// Mailer that keeps sent messages in memory
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    /// Creates an empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, email: &str, link: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("Mailbox lock poisoned"))?
            .push(SentMail {
                email: email.to_string(),
                link: link.to_string(),
            });
        Ok(())
    }
}

/// Builds the reset link for `token`
pub fn reset_link(base_url: &str, token: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", base_url, separator, token)
}
