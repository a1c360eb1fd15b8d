//! Outbound email seam.
//!
//! Auth flows hand messages to an [`EmailSender`] on a background task;
//! delivery failures are logged and never fail the triggering request.

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
}

/// A rendered-on-demand email carrying a single-purpose token link.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub kind: EmailKind,
    pub to: String,
    pub username: String,
    pub token: String,
    /// Public base URL of the API, without trailing slash
    pub base_url: String,
}

impl EmailMessage {
    pub fn subject(&self) -> &'static str {
        match self.kind {
            EmailKind::Verification => "Confirm your email",
            EmailKind::PasswordReset => "Reset password",
        }
    }

    /// Link the recipient follows to consume the token.
    pub fn link(&self) -> String {
        let path = match self.kind {
            EmailKind::Verification => "api/auth/confirmed_email",
            EmailKind::PasswordReset => "api/users/reset_password",
        };
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            path,
            self.token
        )
    }

    pub fn body(&self) -> String {
        match self.kind {
            EmailKind::Verification => format!(
                "Hi {},\n\nPlease confirm your email address by opening:\n{}\n",
                self.username,
                self.link()
            ),
            EmailKind::PasswordReset => format!(
                "Hi {},\n\nTo choose a new password, submit it to:\n{}\n\n\
                 If you did not ask for a reset, ignore this message.\n",
                self.username,
                self.link()
            ),
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = message.subject(),
            "Email queued (log delivery)"
        );
        tracing::debug!(body = %message.body(), "Email body");
        Ok(())
    }
}

/// Send on a background task; failures are logged only.
pub fn dispatch(mailer: Arc<dyn EmailSender>, message: EmailMessage) {
    tokio::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject();
        if let Err(e) = mailer.send(message).await {
            tracing::warn!(error = %e, to = %to, subject, "Failed to send email");
        }
    });
}
