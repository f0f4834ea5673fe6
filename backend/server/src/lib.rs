//! Backend for the Zayathon student hackathon portal.
//!
//!
//!
//! # General Infrastructure
//! - Frontend bundle is served from `STATIC_DIR`, every page route gets `index.html`
//! - Registrations, payment proofs and admin actions go through `/api`
//! - Persistence, file storage and auth are delegated to the hosted backend-as-a-service
//! - Email goes through Resend
//! - No state of our own besides config, HTTP clients and the change broadcaster
//!
//!
//!
//! # Request Flow
//!
//! **Registration**: form JSON -> [`roster::validation`] -> store insert -> `{ id, redirect }`
//!
//! - All blank required fields are reported together
//! - Otherwise every rule violation is reported together
//! - Store failures are returned with the store's own message, never retried
//!
//! **Payment**: multipart `file` -> type/size check -> bucket upload -> link URL on the row
//!
//! - Malformed ids, unknown registrations and ones already paid are refused before upload
//! - Upload and link are not atomic, a failed link leaves the object behind (logged)
//!
//! **Admin**: bearer token verified with the auth provider, then every store
//! call carries that token so row-level security still applies
//!
//!
//!
//! # Notes
//!
//! ## Change notifications
//! The dashboard used to listen to the store's realtime feed. Since every write now
//! goes through this service, we publish our own signal after each write and expose it
//! as server-sent events. Dashboards refetch the whole list on any signal.
//!
//! ## Email
//! `/api/send-email` validates the request before anything else, including the
//! token check, so a bad request never reaches the network.
//!
//!
//!
//! # Setup
//!
//! Run locally.
//! ```sh
//! SUPABASE_URL=https://project.supabase.co SUPABASE_ANON_KEY=... RUST_LOG=info cargo run
//! ```
//!
//! Secrets are read from `/run/secrets/<NAME>` first, then the environment.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, patch, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod mailer;
pub mod routes;
pub mod state;
pub mod utils;

use admin::{
    add_problem_handler, add_winner_handler, delete_problem_handler, delete_winner_handler,
    edit_handler, events_handler, export_handler, list_handler, list_problems_handler,
    list_winners_handler, send_email_handler, stats_handler, status_handler, templates_handler,
    toggle_problem_handler,
};
use auth::{login_handler, logout_handler};
use config::Config;
use routes::{count_handler, domains_handler, not_found_handler, payment_handler, register_handler};
use state::AppState;

/// Client-side routes, all rendered by the bundle's `index.html`.
pub const PAGES: [&str; 5] = ["/", "/login", "/admin", "/payment", "/register"];

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config)?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/domains", get(domains_handler))
        .route("/api/registrations", post(register_handler))
        .route("/api/registrations/count", get(count_handler))
        .route(
            "/api/registrations/{id}/payment",
            // read_upload enforces the size limit while streaming
            post(payment_handler).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/send-email", post(send_email_handler))
        .route("/api/admin/registrations", get(list_handler))
        .route("/api/admin/registrations/export", get(export_handler))
        .route("/api/admin/registrations/{id}", patch(edit_handler))
        .route("/api/admin/registrations/{id}/status", post(status_handler))
        .route("/api/admin/stats", get(stats_handler))
        .route("/api/admin/templates", get(templates_handler))
        .route("/api/admin/events", get(events_handler))
        .route(
            "/api/admin/problems",
            get(list_problems_handler).post(add_problem_handler),
        )
        .route("/api/admin/problems/{id}", delete(delete_problem_handler))
        .route(
            "/api/admin/problems/{id}/toggle",
            post(toggle_problem_handler),
        )
        .route(
            "/api/admin/winners",
            get(list_winners_handler).post(add_winner_handler),
        )
        .route("/api/admin/winners/{id}", delete(delete_winner_handler));

    let static_dir = &state.config.static_dir;
    let index = static_dir.join("index.html");

    let pages = PAGES.iter().fold(api, |router, page| {
        router.route_service(page, ServeFile::new(&index))
    });

    let assets = ServeDir::new(static_dir).not_found_service(not_found_handler.into_service());

    pages
        .fallback_service(assets)
        .layer(cors(&state.config))
        .with_state(state)
}

fn cors(config: &Config) -> CorsLayer {
    let origin = match config.allowed_origin.as_str() {
        "*" => AllowOrigin::any(),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Invalid ALLOWED_ORIGIN {origin}: {e}, allowing any");
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
