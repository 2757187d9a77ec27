//! Subscription Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subscription::token;

/// A double opt-in subscription record.
///
/// The three tokens are generated once at construction and never reissued.
/// Id, timestamps and version are audit/concurrency metadata owned by the
/// store and assigned on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Document id, assigned by the store on first save
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Subscriber address (unique, case-preserved)
    pub email: String,

    /// Token mailed to the subscriber for the confirmation step
    pub user_confirmation_token: String,

    /// Token mailed to the list owner for the approval step
    pub owner_confirmation_token: String,

    /// Token embedded in every broadcast for revocation
    pub user_unsubscribe_token: String,

    /// Failed token presentations; at the configured ceiling the record
    /// becomes unreachable via token operations
    #[serde(default)]
    pub num_token_errors: u32,

    #[serde(default)]
    pub confirmed_by_user: bool,

    /// Requires `confirmed_by_user` to already be true
    #[serde(default)]
    pub confirmed_by_owner: bool,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub modified_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency version, maintained by the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
}

impl Subscription {
    /// New unconfirmed subscription with freshly generated tokens.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            user_confirmation_token: token::new_token(),
            owner_confirmation_token: token::new_token(),
            user_unsubscribe_token: token::new_token(),
            num_token_errors: 0,
            confirmed_by_user: false,
            confirmed_by_owner: false,
            created_at: None,
            modified_at: None,
            version: None,
        }
    }

    pub fn inc_num_token_errors(&mut self) {
        self.num_token_errors += 1;
    }

    pub fn reset_num_token_errors(&mut self) {
        self.num_token_errors = 0;
    }
}
