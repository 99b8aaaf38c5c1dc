//! Mail collaborator boundary.
//!
//! The directory hands the freshly minted raw token to the sender and
//! moves on. Delivery is fire-and-forget from the core's perspective:
//! failures are logged, never surfaced back into control flow.

use anyhow::Result;
use tracing::info;

use crate::models::User;

/// Outbound mail abstraction for activation and reset messages.
pub trait MailSender: Send + Sync {
    /// Deliver the account-activation message carrying the raw token.
    fn send_activation_email(&self, user: &User, token: &str) -> Result<()>;

    /// Deliver the password-reset message carrying the raw token.
    fn send_password_reset_email(&self, user: &User, token: &str) -> Result<()>;
}

/// Local dev sender that logs instead of delivering real email.
///
/// Raw tokens are secrets; only their length is logged.
#[derive(Clone, Debug, Default)]
pub struct LogMailSender;

impl MailSender for LogMailSender {
    fn send_activation_email(&self, user: &User, token: &str) -> Result<()> {
        info!(
            to_email = %user.email,
            token_len = token.len(),
            "account activation mail stub"
        );
        Ok(())
    }

    fn send_password_reset_email(&self, user: &User, token: &str) -> Result<()> {
        info!(
            to_email = %user.email,
            token_len = token.len(),
            "password reset mail stub"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{LogMailSender, MailSender};
    use crate::models::User;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Example User".to_string(),
            email: "user@example.com".to_string(),
            password_digest: String::new(),
            activated: false,
            activated_at: None,
            activation_digest: String::new(),
            remember_digest: None,
            reset_digest: None,
            reset_sent_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn log_sender_always_succeeds() {
        let sender = LogMailSender;
        assert!(sender.send_activation_email(&user(), "token").is_ok());
        assert!(sender.send_password_reset_email(&user(), "token").is_ok());
    }
}
