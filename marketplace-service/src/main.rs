use std::sync::Arc;
use std::time::Duration;

use marketplace_service::config::{AppState, EnvVars};
use marketplace_service::storage::{MemoryStorage, MongoStorage, Storage};
use marketplace_service::{routes, seed};
use tokio::signal;
use tower_http::{
    LatencyUnit,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(sentry::integrations::tracing::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .init();
    info!("Starting marketplace service...");
    dotenvy::dotenv().ok();

    let env_vars = EnvVars::new();

    let _guard = if let Some(sentry_dsn) = env_vars.sentry_dsn.clone() {
        info!("initializing Sentry");
        // NOTE: Events are only emitted, once the guard goes out of scope.
        Some(sentry::init((
            sentry_dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        )))
    } else {
        None
    };

    let storage = connect_storage(&env_vars).await;
    if let Err(e) = seed::ensure_seed_data(storage.as_ref()).await {
        error!("Error seeding demo data: {:?}", e);
    }

    let port = env_vars.port;
    let request_timeout_in_ms = env_vars.request_timeout_in_ms;
    let request_body_size_limit = env_vars.request_body_size_limit;

    let app_state = AppState { storage, env_vars };

    let app = routes::router(app_state)
        .layer(TimeoutLayer::new(Duration::from_millis(
            request_timeout_in_ms,
        )))
        .layer(RequestBodyLimitLayer::new(request_body_size_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("port to be free");
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!("Server error: {}", err);
    }
}

/// Connects to the document store when MONGODB_URI is set and reachable,
/// otherwise serves from a fresh in-memory store.
async fn connect_storage(env_vars: &EnvVars) -> Arc<dyn Storage> {
    if let Some(uri) = &env_vars.mongodb_uri {
        match MongoStorage::connect(uri).await {
            Ok(storage) => {
                info!("MongoDB connected");
                return Arc::new(storage);
            }
            Err(e) => {
                warn!("Error connecting to MongoDB: {e}. Using in-memory storage instead.");
            }
        }
    }
    Arc::new(MemoryStorage::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
