//! Control surface — Axum web server for operating the monitor.
//!
//! Serves a small JSON API: health, status, and the run-state verbs.
//! CORS enabled for local tooling.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::monitor::Monitor;

/// Start the control web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_control_server(monitor: Monitor, port: u16) -> Result<()> {
    let app = build_router(monitor);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Control server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind control port");

        axum::serve(listener, app)
            .await
            .expect("Control server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(monitor: Monitor) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/status", get(routes::get_status))
        .route("/start", post(routes::start))
        .route("/stop", post(routes::stop))
        .route("/restart", post(routes::restart))
        .route("/pause", post(routes::pause))
        .route("/resume", post(routes::resume))
        .route("/handles", put(routes::update_handles))
        .route("/target-amount", put(routes::update_target_amount))
        .layer(cors)
        .with_state(monitor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
