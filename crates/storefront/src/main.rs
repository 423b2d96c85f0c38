//! Audie Boutique Storefront - Customer API.
//!
//! This binary serves the customer API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON API
//! - tower-sessions with `PostgreSQL` store for the cart
//! - Supabase Postgres via sqlx for products, orders and addresses
//! - Supabase Auth for customer tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Router, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audie_boutique_storefront::config::{LogFormat, StorefrontConfig};
use audie_boutique_storefront::middleware::{create_session_layer, postgres_store};
use audie_boutique_storefront::state::{AppState, Backends};
use audie_boutique_supabase::{PgStore, SupabaseClient, create_pool};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "audie_boutique_storefront=info,tower_http=debug".into());

    let is_json = config.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Initialize database connection pool
    let pool = create_pool(&config.database_url, config.backend_timeout)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // Session table lives in its own schema, separate from the shop tables
    let session_store = postgres_store(pool.clone());
    session_store
        .migrate()
        .await
        .expect("Failed to prepare session store");
    let session_layer = create_session_layer(session_store, config.is_secure());

    let store = PgStore::new(pool);
    let supabase = SupabaseClient::new(&config.supabase).expect("Failed to create Supabase client");
    let store_port = Arc::new(store.clone());

    let backends = Backends {
        authenticator: Arc::new(supabase),
        orders: store_port.clone(),
        users: store_port.clone(),
        addresses: store_port.clone(),
        products: store_port,
    };
    let addr = config.socket_addr();
    let state = AppState::new(config, backends);

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(move || readiness(store.clone())))
        .merge(audie_boutique_storefront::app(state, session_layer))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("storefront listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(store: PgStore) -> StatusCode {
    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
