//! hildegard-suggest library - guided song suggestions
//!
//! A four-step wizard (liturgy date, search, pick, details) that records
//! song suggestions for a liturgy into a spreadsheet.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod flow;
pub mod matcher;
pub mod rows;
pub mod session;
pub mod store;
pub mod submit;
pub mod validation;
pub mod wizard;

use catalog::CatalogCache;
use matcher::TitleMatcher;
use session::SessionStore;
use store::Destination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Song catalog, reloaded lazily once stale
    pub catalog: Arc<CatalogCache>,
    pub matcher: Arc<dyn TitleMatcher>,
    /// Fixed at startup; `Unavailable` disables submission only
    pub destination: Destination,
    pub sessions: Arc<SessionStore>,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(
        catalog: Arc<CatalogCache>,
        matcher: Arc<dyn TitleMatcher>,
        destination: Destination,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            catalog,
            matcher,
            destination,
            sessions,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let sessions = Router::new()
        .route("/api/sessions", post(api::create_session))
        .route(
            "/api/sessions/:id",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/api/sessions/:id/actions", post(api::apply_action));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(sessions)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
