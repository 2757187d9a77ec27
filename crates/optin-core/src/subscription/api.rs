//! Subscription REST API
//!
//! `/v1/subscription` endpoints: register, apply an update token, apply a
//! delete token, and trigger a distribution run.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::distribution::DistributionEngine;
use crate::shared::error::CoreError;
use crate::subscription::service::Subscriber;

/// Email validation pattern
fn email_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
    })
}

/// Subscription request body: the email plus, for update/delete, the
/// presented token.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub email: String,

    #[serde(default)]
    pub token: Option<String>,
}

/// Subscription service state
#[derive(Clone)]
pub struct SubscriptionsState {
    pub subscriber: Arc<Subscriber>,
    pub distribution: Arc<DistributionEngine>,
}

fn validated_email(details: &SubscriptionDetails) -> Result<&str, CoreError> {
    let email = details.email.trim();
    if email.is_empty() || !email_pattern().is_match(email) {
        return Err(CoreError::validation("invalid email address"));
    }
    Ok(email)
}

/// Blank tokens are rejected before the engine sees them.
fn presented_token(details: &SubscriptionDetails) -> Result<&str, CoreError> {
    match details.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(CoreError::FalseToken),
    }
}

/// Register a new subscriber
#[utoipa::path(
    post,
    path = "",
    tag = "subscription",
    request_body = SubscriptionDetails,
    responses(
        (status = 201, description = "Subscription created, confirmation mail sent"),
        (status = 400, description = "Invalid email address"),
        (status = 409, description = "Email already subscribed")
    )
)]
pub async fn create_subscription(
    State(state): State<SubscriptionsState>,
    Json(details): Json<SubscriptionDetails>,
) -> Result<StatusCode, CoreError> {
    let email = validated_email(&details)?;
    state.subscriber.subscribe(email).await?;
    Ok(StatusCode::CREATED)
}

/// Apply a confirmation or approval token
#[utoipa::path(
    put,
    path = "",
    tag = "subscription",
    request_body = SubscriptionDetails,
    responses(
        (status = 204, description = "Token applied"),
        (status = 400, description = "Blank or false token"),
        (status = 404, description = "User unknown or locked")
    )
)]
pub async fn update_subscription(
    State(state): State<SubscriptionsState>,
    Json(details): Json<SubscriptionDetails>,
) -> Result<StatusCode, CoreError> {
    let email = validated_email(&details)?;
    let token = presented_token(&details)?;
    state.subscriber.apply_update_token(email, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply an unsubscribe token (idempotent for unknown emails)
#[utoipa::path(
    delete,
    path = "",
    tag = "subscription",
    request_body = SubscriptionDetails,
    responses(
        (status = 204, description = "Subscription deleted or unknown"),
        (status = 400, description = "Blank or false token"),
        (status = 404, description = "User locked")
    )
)]
pub async fn delete_subscription(
    State(state): State<SubscriptionsState>,
    Json(details): Json<SubscriptionDetails>,
) -> Result<StatusCode, CoreError> {
    let email = validated_email(&details)?;
    let token = presented_token(&details)?;
    state.subscriber.apply_delete_token(email, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Trigger a distribution run
#[utoipa::path(
    post,
    path = "/distribute",
    tag = "subscription",
    responses(
        (status = 202, description = "Distribution started"),
        (status = 423, description = "Distribution already running")
    )
)]
pub async fn distribute(State(state): State<SubscriptionsState>) -> StatusCode {
    if state.distribution.trigger() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::LOCKED
    }
}

pub fn subscription_router(state: SubscriptionsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(
            create_subscription,
            update_subscription,
            delete_subscription
        ))
        .routes(routes!(distribute))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(email: &str, token: Option<&str>) -> SubscriptionDetails {
        SubscriptionDetails {
            email: email.to_string(),
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn rejects_invalid_email_syntax() {
        assert!(validated_email(&details("", None)).is_err());
        assert!(validated_email(&details("not-an-email", None)).is_err());
        assert!(validated_email(&details("a@x", None)).is_err());
        assert_eq!(validated_email(&details("a@x.com", None)).unwrap(), "a@x.com");
    }

    #[test]
    fn rejects_blank_tokens() {
        assert!(matches!(
            presented_token(&details("a@x.com", None)),
            Err(CoreError::FalseToken)
        ));
        assert!(matches!(
            presented_token(&details("a@x.com", Some("   "))),
            Err(CoreError::FalseToken)
        ));
        assert_eq!(presented_token(&details("a@x.com", Some("t"))).unwrap(), "t");
    }
}
