//! Token generation and verification.
//!
//! Pure decision logic: no side effects, no I/O. The caller maps outcomes
//! to store writes and notifications.

use uuid::Uuid;

use crate::subscription::entity::Subscription;

/// Outcome of presenting a token on the update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Owner token matched and the user had already confirmed
    ApproveByOwner,
    /// User confirmation token matched
    ConfirmByUser,
    /// No token matched
    Mismatch,
}

/// Outcome of presenting a token on the delete path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Unsubscribe,
    Mismatch,
}

/// Fresh unguessable token: uuid v4, 128 bits of randomness from the OS.
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}

/// Decide which update transition a presented token triggers.
///
/// The owner token is checked first, gated on prior user confirmation; the
/// order fixes the precedence should both stored tokens ever compare equal.
pub fn verify_update_token(subscription: &Subscription, presented: &str) -> UpdateOutcome {
    if subscription.confirmed_by_user && presented == subscription.owner_confirmation_token {
        UpdateOutcome::ApproveByOwner
    } else if presented == subscription.user_confirmation_token {
        UpdateOutcome::ConfirmByUser
    } else {
        UpdateOutcome::Mismatch
    }
}

/// Decide whether a presented token revokes the subscription.
pub fn verify_delete_token(subscription: &Subscription, presented: &str) -> DeleteOutcome {
    if presented == subscription.user_unsubscribe_token {
        DeleteOutcome::Unsubscribe
    } else {
        DeleteOutcome::Mismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> Subscription {
        let mut s = Subscription::new("a@x.com");
        s.user_confirmation_token = "u".into();
        s.owner_confirmation_token = "o".into();
        s.user_unsubscribe_token = "s".into();
        s
    }

    #[test]
    fn user_token_confirms() {
        let s = subscription();
        assert_eq!(verify_update_token(&s, "u"), UpdateOutcome::ConfirmByUser);
    }

    #[test]
    fn owner_token_requires_prior_user_confirmation() {
        let mut s = subscription();
        assert_eq!(verify_update_token(&s, "o"), UpdateOutcome::Mismatch);

        s.confirmed_by_user = true;
        assert_eq!(verify_update_token(&s, "o"), UpdateOutcome::ApproveByOwner);
    }

    #[test]
    fn owner_token_wins_on_pathological_collision() {
        let mut s = subscription();
        s.owner_confirmation_token = "u".into();
        s.confirmed_by_user = true;
        assert_eq!(verify_update_token(&s, "u"), UpdateOutcome::ApproveByOwner);
    }

    #[test]
    fn unknown_token_is_a_mismatch() {
        let s = subscription();
        assert_eq!(
            verify_update_token(&s, "wrong"),
            UpdateOutcome::Mismatch
        );
        // the unsubscribe token does not confirm anything
        assert_eq!(verify_update_token(&s, "s"), UpdateOutcome::Mismatch);
    }

    #[test]
    fn delete_path_only_accepts_the_unsubscribe_token() {
        let s = subscription();
        assert_eq!(verify_delete_token(&s, "s"), DeleteOutcome::Unsubscribe);
        assert_eq!(verify_delete_token(&s, "u"), DeleteOutcome::Mismatch);
        assert_eq!(verify_delete_token(&s, "o"), DeleteOutcome::Mismatch);
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }
}
