//! Notification Channel
//!
//! Narrow mail contract consumed by the lifecycle and distribution engines,
//! plus the SMTP implementation.

pub mod smtp;
pub mod templates;

pub use smtp::{MailConfig, SmtpNotifier};
pub use templates::TemplateName;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("message assembly failed: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("smtp transport failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("bundle directory unreadable: {0}")]
    Bundle(#[from] std::io::Error),
}

/// Sends named, parameterized mails to a single address.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Opt-in step 1: confirmation request carrying the user token.
    async fn send_confirm_request(&self, to: &str, token: &str) -> Result<(), NotifyError>;

    /// Sent to the subscriber once confirmed, while owner approval is pending.
    async fn send_wait_notice(&self, to: &str) -> Result<(), NotifyError>;

    /// Sent to the list owner carrying the approval token for `username`.
    async fn send_approval_request(&self, username: &str, token: &str) -> Result<(), NotifyError>;

    /// Rate-limited broadcast with the current document bundle attached.
    /// `first` selects the welcome variant over the update variant; the
    /// unsubscribe token ends up in the revocation link.
    async fn send_broadcast(
        &self,
        to: &str,
        unsubscribe_token: &str,
        first: bool,
    ) -> Result<(), NotifyError>;
}
