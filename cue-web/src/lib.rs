//! cue-web library - cumulative top-scorers service
//!
//! Upload the current standings (`bron`) and the results of the latest round
//! (`uitslagen`), export the merged standings as a Word document.

pub mod api;
pub mod client;
pub mod converters;
pub mod error;
pub mod export;
pub mod models;
pub mod session;
pub mod slots;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use cue_common::config::ServiceConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::export::ExportOrchestrator;
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Upload slots per browser session
    pub sessions: SessionStore,
    pub orchestrator: Arc<ExportOrchestrator>,
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_orchestrator(config, ExportOrchestrator::default())
    }

    /// State with a custom orchestrator (tests swap the document converter)
    pub fn with_orchestrator(config: ServiceConfig, orchestrator: ExportOrchestrator) -> Self {
        Self {
            sessions: SessionStore::new(Duration::from_secs(config.session_ttl_secs)),
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Workflow routes sit behind the session middleware; the page, script and
/// health routes do not create sessions.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let workflow = api::cumulated_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(workflow)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
