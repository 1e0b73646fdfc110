//! Service entrypoint: configuration, database pool, provider gateway,
//! and the Axum HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use http::{HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use praktika_payments::adapters::http::payment::{payment_router, PaymentAppState};
use praktika_payments::adapters::paypal::{PayPalConfig, PayPalGateway};
use praktika_payments::adapters::postgres::{
    PostgresCaptureLedger, PostgresPendingOrderStore, PostgresPurchaseRepository,
};
use praktika_payments::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        sandbox = config.payment.is_sandbox(),
        "Starting praktika-payments"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let gateway = PayPalGateway::new(
        PayPalConfig::new(
            config.payment.paypal_client_id.clone(),
            config.payment.paypal_client_secret.clone(),
        )
        .with_base_url(config.payment.paypal_base_url.clone())
        .with_timeout_secs(config.payment.request_timeout_secs),
    );

    let state = PaymentAppState {
        gateway: Arc::new(gateway),
        purchase_repository: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        pending_orders: Arc::new(PostgresPendingOrderStore::new(pool.clone())),
        capture_ledger: Arc::new(PostgresCaptureLedger::new(pool)),
        default_currency: config.payment.parsed_default_currency()?,
        access_ttl_days: config.payment.access_ttl_days,
    };

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .route("/health", get(health))
        .merge(payment_router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                )))
                .layer(cors),
        );

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Allow only the configured origins; with none configured (development),
/// allow any origin.
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
