use crate::config::{self, Config};
use crate::publisher::SharedPublisher;
use crate::queue::BatchQueue;
use crate::state::AppState;
use crate::streaming::{self, Transcoder};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mediasort_db::pool::{init_pool, DbPool};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_batches;
pub mod routes_series;
pub mod routes_sse;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Canonical pending-media root; every served path must stay inside it
    pub input_root: Arc<PathBuf>,
    pub state: Arc<AppState>,
    pub queue: BatchQueue,
    pub publisher: Arc<SharedPublisher>,
    pub transcoder: Arc<Transcoder>,
}

impl AppContext {
    pub fn new(config: Config, input_root: PathBuf, db_pool: DbPool) -> Self {
        let state = AppState::new();
        let publisher = Arc::new(SharedPublisher::from_config(config.publisher.clone()));
        Self::with_publisher(config, input_root, db_pool, state, publisher)
    }

    /// Context with an externally built publisher holder.
    pub fn with_publisher(
        config: Config,
        input_root: PathBuf,
        db_pool: DbPool,
        state: Arc<AppState>,
        publisher: Arc<SharedPublisher>,
    ) -> Self {
        let transcoder = Arc::new(Transcoder::new(&config.transcode));
        let queue = BatchQueue::new(db_pool, publisher.clone(), state.clone());

        Self {
            config: Arc::new(config),
            input_root: Arc::new(input_root),
            state,
            queue,
            publisher,
            transcoder,
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .nest("/api/stream", streaming::stream_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // SPA fallback: serves index.html for any route that doesn't match a file
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .merge(routes_series::series_routes())
        .merge(routes_batches::batch_routes())
        .merge(routes_sse::sse_routes())
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let batches: serde_json::Value = match ctx.queue.counts().await {
        Ok(counts) => counts
            .into_iter()
            .map(|(status, count)| (status.to_string(), serde_json::Value::from(count)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Err(e) => {
            tracing::warn!("Failed to count batches: {}", e);
            serde_json::Value::Null
        }
    };

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "publisher_ready": ctx.publisher.is_initialized(),
        "batches": batches,
        "events": ctx.state.get_stats(),
    }))
}

/// Start the HTTP server.
///
/// Fails fast when the input root is missing or the database cannot be
/// opened.
pub async fn start_server_with_options(config: Config, config_path: Option<&Path>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let input_root = config::require_input_root(&config)?;
    tracing::info!("Serving pending media from {}", input_root.display());

    let db_path = config::database_path(&config, config_path);
    tracing::info!("Initializing database at {}", db_path.display());
    let db_pool = init_pool(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {:?}", db_path))?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext::new(config, input_root, db_pool);
    let publisher = ctx.publisher.clone();
    tracing::info!("Transcoder: {}", ctx.transcoder.ffmpeg().display());

    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    publisher.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
