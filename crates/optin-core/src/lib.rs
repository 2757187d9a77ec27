//! Double opt-in subscription core.
//!
//! A subscriber registers, confirms via a mailed token, the list owner
//! approves via a second token, and the subscriber may revoke via a third.
//! Owner-approved subscribers receive the periodically broadcast document
//! bundle through a rate-limited mail channel.

pub mod distribution;
pub mod notify;
pub mod shared;
pub mod subscription;

pub use distribution::{DistributionConfig, DistributionEngine};
pub use notify::{MailConfig, Notifier, NotifyError, SmtpNotifier};
pub use shared::error::{CoreError, Result};
pub use subscription::entity::Subscription;
pub use subscription::service::{Subscriber, SubscriberConfig};
pub use subscription::store::{MongoSubscriptionStore, SubscriptionPage, SubscriptionStore};
