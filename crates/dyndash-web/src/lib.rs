// # dyndash-web
//
// Presentation layer for the dyndash dashboard: a JSON API over the core
// reconciler/binding-store/provider surface, plus an embedded single-page
// UI. All DNS and reconciliation logic lives in dyndash-core; the handlers
// here are thin translations between HTTP and that surface.

pub mod assets;
pub mod auth;
pub mod handlers;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use dyndash_core::traits::{BindingStore, IpResolver, SharedProvider};
use dyndash_core::{AppConfig, Reconciler};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use auth::SessionStore;

/// Shared application state handed to every handler
pub struct AppState {
    /// Live configuration; the settings page mutates and persists it
    pub config: RwLock<AppConfig>,

    /// Where the configuration is written back to
    pub config_path: PathBuf,

    /// Swappable handle to the DNS provider client
    pub provider: SharedProvider,

    /// Current-address lookup (also behind the probe endpoint)
    pub resolver: Arc<dyn IpResolver>,

    /// Binding store shared with the reconciler
    pub bindings: Arc<dyn BindingStore>,

    /// Reconciler, for the manual refresh endpoint
    pub reconciler: Arc<Reconciler>,

    /// Valid login sessions
    pub sessions: SessionStore,

    /// Directory holding the rotated log files
    pub log_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

/// Build the full application router (API + embedded UI)
pub fn create_router(state: SharedState) -> Router {
    use handlers::{records, session, settings, system};

    let spa_routes = get(assets::frontend).head(assets::frontend);

    Router::new()
        // session
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        // records and bindings
        .route("/api/domains", get(records::domains))
        .route("/api/records", get(records::list).post(records::add))
        .route("/api/records/{id}", axum::routing::delete(records::remove))
        .route(
            "/api/records/{id}/ddns",
            axum::routing::put(records::ddns_enable).delete(records::ddns_disable),
        )
        // system
        .route("/api/probe-ip", post(system::probe_ip))
        .route("/api/interfaces", get(system::interfaces))
        .route("/api/reconcile", post(system::reconcile))
        .route("/api/logs", get(system::logs))
        // settings
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        // embedded UI
        .route("/", spa_routes.clone())
        .route("/{*path}", spa_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
