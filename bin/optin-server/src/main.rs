//! Double Opt-In Subscription Server
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OPTIN_API_PORT` | `8080` | HTTP API port |
//! | `OPTIN_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `OPTIN_MONGO_DB` | `optin` | MongoDB database name |
//! | `OPTIN_SMTP_URL` | `smtp://localhost:25` | SMTP relay URL |
//! | `OPTIN_MAIL_SENDER` | `list@localhost` | From/reply-to address |
//! | `OPTIN_MAIL_OWNER` | `owner@localhost` | Approval request recipient |
//! | `OPTIN_BASE_URL` | `http://localhost:8080` | Base URL for mailed links |
//! | `OPTIN_BUNDLE_DIR` | `bundle` | Directory attached to broadcasts |
//! | `OPTIN_MAX_TOKEN_ERRORS` | `3` | Lockout ceiling |
//! | `OPTIN_PAGE_SIZE` | `3` | Broadcasts per rate limiter period |
//! | `OPTIN_PERIOD_SECS` | `1` | Rate limiter period in seconds |
//! | `OPTIN_CORS_ORIGIN` | - | Allowed CORS origin (any when unset) |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{http::HeaderValue, response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use optin_core::distribution::{DistributionConfig, DistributionEngine};
use optin_core::notify::{MailConfig, SmtpNotifier};
use optin_core::shared::indexes::initialize_indexes;
use optin_core::subscription::api::{subscription_router, SubscriptionsState};
use optin_core::subscription::service::{Subscriber, SubscriberConfig};
use optin_core::subscription::store::MongoSubscriptionStore;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    optin_common::logging::init_logging("optin-server");

    info!("Starting subscription server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("OPTIN_API_PORT", 8080);
    let mongo_url = env_or("OPTIN_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("OPTIN_MONGO_DB", "optin");
    let smtp_url = env_or("OPTIN_SMTP_URL", "smtp://localhost:25");
    let max_token_errors: u32 = env_or_parse("OPTIN_MAX_TOKEN_ERRORS", 3);
    let page_size: u32 = env_or_parse("OPTIN_PAGE_SIZE", 3);
    let period_secs: u64 = env_or_parse("OPTIN_PERIOD_SECS", 1);

    let mail_config = MailConfig {
        default_sender: env_or("OPTIN_MAIL_SENDER", "list@localhost"),
        owner_address: env_or("OPTIN_MAIL_OWNER", "owner@localhost"),
        base_url: env_or("OPTIN_BASE_URL", "http://localhost:8080"),
        bundle_dir: env_or("OPTIN_BUNDLE_DIR", "bundle").into(),
    };

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);
    initialize_indexes(&db).await?;

    // Wire the engines
    let store = Arc::new(MongoSubscriptionStore::new(&db));
    let notifier = Arc::new(SmtpNotifier::from_url(&smtp_url, mail_config)?);
    let subscriber = Arc::new(Subscriber::new(
        store.clone(),
        notifier.clone(),
        SubscriberConfig { max_token_errors },
    ));
    let distribution = Arc::new(DistributionEngine::new(
        store,
        notifier,
        DistributionConfig {
            page_size,
            period: Duration::from_secs(period_secs),
        },
    ));

    let state = SubscriptionsState {
        subscriber,
        distribution,
    };

    // Build the API router with auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/v1/subscription", subscription_router(state))
        .split_for_parts();

    openapi.info.title = "Subscription API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description =
        Some("Double opt-in subscriptions with rate-limited bundle distribution".to_string());

    let cors = match std::env::var("OPTIN_CORS_ORIGIN") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    info!("Subscription server started");
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();

    info!("Subscription server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
