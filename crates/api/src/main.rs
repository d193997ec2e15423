//! LinguaNotes API
//!
//! The single entry point for all external requests.
//! Handles:
//! - Bearer authentication against the identity provider
//! - Note CRUD, summarisation, and translation
//! - Background audit trail recording
//! - Observability (logging, request tracing)

mod audit;
mod handlers;
mod services;

use axum::{
    extract::FromRef,
    routing::{delete, get, post, put},
    Router,
};
use linguanotes_common::{
    auth::{IdentityResolver, TokenVerifier},
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    events::EventSink,
    translation::Translator,
    Repository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use audit::AuditRecorder;
use services::{NoteService, SummariseService, TranslateService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub identity: Arc<IdentityResolver>,
    pub notes: NoteService,
    pub summarise: SummariseService,
    pub translate: TranslateService,
}

impl FromRef<AppState> for Arc<IdentityResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration before tracing exists
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    let config = Arc::new(config);

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting LinguaNotes API v{}",
        linguanotes_common::VERSION
    );

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db.clone());

    // Start the audit recorder before anything can emit
    let (events, event_rx) = EventSink::channel();
    tokio::spawn(AuditRecorder::new(repo.clone(), event_rx).run());

    // Identity resolution against the external provider
    let verifier = TokenVerifier::new(&config.auth);
    let identity = Arc::new(IdentityResolver::new(verifier, repo.clone()));

    // Translation provider (external endpoint when configured, mock otherwise)
    let translator = Arc::new(Translator::from_config(&config.translation));

    let notes = NoteService::new(repo.clone(), events.clone());
    let summarise = SummariseService::new(notes.clone(), repo.clone(), events.clone());
    let translate = TranslateService::new(notes.clone(), repo, translator, events);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        identity,
        notes,
        summarise,
        translate,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Tracing setup from the observability section; RUST_LOG still wins
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Note endpoints
        .route("/notes", post(handlers::notes::create_note))
        .route("/notes", get(handlers::notes::list_notes))
        .route("/notes/{id}", get(handlers::notes::get_note))
        .route("/notes/{id}", put(handlers::notes::update_note))
        .route("/notes/{id}", delete(handlers::notes::delete_note))
        // Derived artifacts
        .route("/summarise", post(handlers::summarise::summarise))
        .route("/translate", post(handlers::translate::translate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .layer(timeout)
        .with_state(state)
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
