//! Subscription Lifecycle Engine
//!
//! Owns the state machine: creation, confirmation, owner approval,
//! revocation, and lockout by error count. State changes are persisted
//! before the notification goes out, so a mail failure never rolls back a
//! transition.

use std::sync::Arc;
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::shared::error::{CoreError, Result};
use crate::subscription::entity::Subscription;
use crate::subscription::store::SubscriptionStore;
use crate::subscription::token::{self, DeleteOutcome, UpdateOutcome};

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Failed presentations after which a record locks out
    pub max_token_errors: u32,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            max_token_errors: 3,
        }
    }
}

pub struct Subscriber {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    config: SubscriberConfig,
}

impl Subscriber {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        config: SubscriberConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Register a new subscriber and mail the confirmation request.
    pub async fn subscribe(&self, email: &str) -> Result<Subscription> {
        if self.store.exists_by_email(email).await? {
            return Err(CoreError::AlreadyExists);
        }

        let mut subscription = Subscription::new(email);
        self.store.save(&mut subscription).await?;
        info!(email = %subscription.email, "subscription created");

        self.notifier
            .send_confirm_request(&subscription.email, &subscription.user_confirmation_token)
            .await?;

        Ok(subscription)
    }

    /// Apply a confirmation or approval token to the record for `email`.
    ///
    /// Locked and unknown records are indistinguishable to the caller so
    /// account existence does not leak.
    pub async fn apply_update_token(&self, email: &str, presented: &str) -> Result<Subscription> {
        if presented.trim().is_empty() {
            return Err(CoreError::FalseToken);
        }

        let mut subscription = self
            .store
            .find_active_by_email(email, self.config.max_token_errors)
            .await?
            .ok_or(CoreError::UserUnknownOrLocked)?;

        match token::verify_update_token(&subscription, presented) {
            UpdateOutcome::ApproveByOwner => {
                subscription.confirmed_by_owner = true;
                subscription.reset_num_token_errors();
                self.store.save(&mut subscription).await?;
                info!(email = %subscription.email, "subscription approved by owner");

                self.notifier
                    .send_broadcast(
                        &subscription.email,
                        &subscription.user_unsubscribe_token,
                        true,
                    )
                    .await?;
            }
            UpdateOutcome::ConfirmByUser => {
                subscription.confirmed_by_user = true;
                subscription.reset_num_token_errors();
                self.store.save(&mut subscription).await?;
                info!(email = %subscription.email, "subscription confirmed by user");

                self.notifier.send_wait_notice(&subscription.email).await?;
                self.notifier
                    .send_approval_request(
                        &subscription.email,
                        &subscription.owner_confirmation_token,
                    )
                    .await?;
            }
            UpdateOutcome::Mismatch => {
                return self.record_token_error(subscription).await;
            }
        }

        Ok(subscription)
    }

    /// Apply an unsubscribe token. Unknown emails succeed as a no-op so the
    /// unsubscribe link stays idempotent.
    pub async fn apply_delete_token(&self, email: &str, presented: &str) -> Result<()> {
        if presented.trim().is_empty() {
            return Err(CoreError::FalseToken);
        }

        if !self.store.exists_by_email(email).await? {
            return Ok(());
        }

        let subscription = self
            .store
            .find_active_by_email(email, self.config.max_token_errors)
            .await?
            .ok_or(CoreError::UserUnknownOrLocked)?;

        match token::verify_delete_token(&subscription, presented) {
            DeleteOutcome::Unsubscribe => {
                self.store.delete(&subscription).await?;
                info!(email = %subscription.email, "subscription deleted");
                Ok(())
            }
            DeleteOutcome::Mismatch => self.record_token_error(subscription).await,
        }
    }

    /// Persist the failed presentation so lockout accumulates across
    /// retries, then fail the operation.
    async fn record_token_error<T>(&self, mut subscription: Subscription) -> Result<T> {
        subscription.inc_num_token_errors();
        self.store.save(&mut subscription).await?;
        warn!(
            email = %subscription.email,
            num_token_errors = subscription.num_token_errors,
            "token mismatch"
        );
        Err(CoreError::FalseToken)
    }
}
