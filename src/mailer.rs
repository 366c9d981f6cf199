use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
#[error("mail transport error: {0}")]
pub struct MailError(pub String);

/// Outbound email port. Delivery is best-effort: callers log failures and
/// never roll back the notification row that triggered the send.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Default transport: writes the message to the log. Swapped out for a real
/// SMTP client at the composition root.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, subject = %subject, "email dispatched (log transport)");
        Ok(())
    }
}
