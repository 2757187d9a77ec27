//! Subscription Store
//!
//! Narrow persistence contract plus the MongoDB implementation. The store
//! owns audit metadata: id, timestamps and the optimistic version are
//! assigned here on every write.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};

use crate::shared::error::{CoreError, Result};
use crate::subscription::entity::Subscription;

/// One bounded slice of the owner-approved result set.
#[derive(Debug, Clone)]
pub struct SubscriptionPage {
    pub content: Vec<Subscription>,
    pub has_next: bool,
}

/// Durable keyed storage of subscription records with a uniqueness
/// constraint on email and optimistic versioning.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// The record for `email` that is still below the error ceiling.
    async fn find_active_by_email(
        &self,
        email: &str,
        max_token_errors: u32,
    ) -> Result<Option<Subscription>>;

    /// Insert or update. Inserts assign id, timestamps and version 0;
    /// updates are guarded by the supplied version and fail with
    /// [`CoreError::Conflict`] when a concurrent writer got there first.
    async fn save(&self, subscription: &mut Subscription) -> Result<()>;

    async fn delete(&self, subscription: &Subscription) -> Result<()>;

    /// Page of owner-approved subscriptions in stable id order.
    async fn find_approved_page(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> Result<SubscriptionPage>;
}

pub struct MongoSubscriptionStore {
    collection: Collection<Subscription>,
}

impl MongoSubscriptionStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("subscriptions"),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_error))
            if write_error.code == 11000
    )
}

#[async_trait]
impl SubscriptionStore for MongoSubscriptionStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count = self
            .collection
            .count_documents(doc! { "email": email })
            .await?;
        Ok(count > 0)
    }

    async fn find_active_by_email(
        &self,
        email: &str,
        max_token_errors: u32,
    ) -> Result<Option<Subscription>> {
        Ok(self
            .collection
            .find_one(doc! {
                "email": email,
                "numTokenErrors": { "$lt": max_token_errors as i64 }
            })
            .await?)
    }

    async fn save(&self, subscription: &mut Subscription) -> Result<()> {
        let now = Utc::now();

        match subscription.version {
            None => {
                subscription.id = Some(uuid::Uuid::new_v4().to_string());
                subscription.created_at = Some(now);
                subscription.modified_at = Some(now);
                subscription.version = Some(0);
                self.collection
                    .insert_one(&*subscription)
                    .await
                    .map_err(|e| {
                        // the unique email index closes the race between the
                        // exists pre-check and the insert
                        if is_duplicate_key(&e) {
                            CoreError::AlreadyExists
                        } else {
                            e.into()
                        }
                    })?;
            }
            Some(current) => {
                let id = subscription.id.clone().ok_or_else(|| {
                    CoreError::validation("cannot update a subscription without an id")
                })?;
                // the caller's record is only advanced once the guarded
                // replace actually matched; on conflict it still reflects
                // stored state and can be re-read cleanly
                let mut replacement = subscription.clone();
                replacement.modified_at = Some(now);
                replacement.version = Some(current + 1);
                let result = self
                    .collection
                    .replace_one(doc! { "_id": &id, "version": current }, &replacement)
                    .await?;
                if result.matched_count == 0 {
                    return Err(CoreError::Conflict {
                        email: subscription.email.clone(),
                    });
                }
                *subscription = replacement;
            }
        }

        Ok(())
    }

    async fn delete(&self, subscription: &Subscription) -> Result<()> {
        if let Some(id) = &subscription.id {
            self.collection.delete_one(doc! { "_id": id }).await?;
        }
        Ok(())
    }

    async fn find_approved_page(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> Result<SubscriptionPage> {
        // one extra record tells us whether another page follows
        let cursor = self
            .collection
            .find(doc! { "confirmedByOwner": true })
            .sort(doc! { "_id": 1 })
            .skip(page_index * page_size)
            .limit(page_size as i64 + 1)
            .await?;
        let mut content: Vec<Subscription> = cursor.try_collect().await?;

        let has_next = content.len() as u64 > page_size;
        content.truncate(page_size as usize);

        Ok(SubscriptionPage { content, has_next })
    }
}
