//! Bulk Distribution Engine
//!
//! Broadcasts the current bundle to every owner-approved subscription. A
//! single-permit semaphore guarantees at most one run system-wide; a rate
//! limiter throttles sending to one page per period, the page size being the
//! mail channel's per-period send budget.

use std::sync::Arc;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::notify::Notifier;
use crate::shared::error::Result;
use crate::subscription::store::SubscriptionStore;

type PageLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone)]
pub struct DistributionConfig {
    /// Recipients per page, equal to the per-period send budget
    pub page_size: u32,
    /// Length of one rate limiter period
    pub period: Duration,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            page_size: 3,
            period: Duration::from_secs(1),
        }
    }
}

pub struct DistributionEngine {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    config: DistributionConfig,
    limiter: Option<PageLimiter>,
    lock: Arc<Semaphore>,
}

impl DistributionEngine {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        config: DistributionConfig,
    ) -> Self {
        // one page per period; burst 1 lets the first page pass immediately.
        // A zero period disables pacing entirely
        let limiter = Quota::with_period(config.period)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        Self {
            store,
            notifier,
            config,
            limiter,
            lock: Arc::new(Semaphore::new(1)),
        }
    }

    /// Whether a distribution run currently holds the lock. Callable from
    /// any task, never blocks.
    pub fn is_running(&self) -> bool {
        self.lock.available_permits() == 0
    }

    /// Try to start a run on the current runtime. Returns `false` without
    /// doing any work when a run is already in flight.
    pub fn trigger(self: &Arc<Self>) -> bool {
        let permit = match self.lock.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("distribution already running, trigger ignored");
                return false;
            }
        };

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            // dropping the permit releases the lock on every exit path
            let _permit = permit;
            if let Err(e) = engine.run().await {
                error!(error = %e, "distribution aborted");
            }
        });

        true
    }

    async fn run(&self) -> Result<()> {
        let page_size = u64::from(self.config.page_size.max(1));
        let mut page_index = 0u64;
        let mut sent = 0u64;

        info!(page_size, "distribution started");

        loop {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let page = self.store.find_approved_page(page_index, page_size).await?;
            for subscription in &page.content {
                match self
                    .notifier
                    .send_broadcast(
                        &subscription.email,
                        &subscription.user_unsubscribe_token,
                        false,
                    )
                    .await
                {
                    Ok(()) => sent += 1,
                    // one failed recipient must not abort the batch
                    Err(e) => {
                        error!(email = %subscription.email, error = %e, "broadcast send failed")
                    }
                }
            }

            if !page.has_next {
                break;
            }
            page_index += 1;
        }

        info!(sent, pages = page_index + 1, "distribution finished");
        Ok(())
    }
}
