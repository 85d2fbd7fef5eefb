//! Control API route handlers.
//!
//! All endpoints return JSON. The shared state is the `Monitor` itself —
//! it is cheaply cloneable and already synchronized internally.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::monitor::Monitor;
use crate::types::MonitorStatus;

pub type AppState = Monitor;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetAmountRequest {
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /status
pub async fn get_status(State(monitor): State<AppState>) -> Json<MonitorStatus> {
    Json(monitor.status().await)
}

/// POST /start
pub async fn start(State(monitor): State<AppState>) -> Json<MessageResponse> {
    monitor.start().await;
    Json(MessageResponse {
        message: "Monitor started".to_string(),
    })
}

/// POST /stop
pub async fn stop(State(monitor): State<AppState>) -> Json<MessageResponse> {
    monitor.stop().await;
    Json(MessageResponse {
        message: "Monitor stopped".to_string(),
    })
}

/// POST /restart
pub async fn restart(State(monitor): State<AppState>) -> Json<MessageResponse> {
    monitor.stop().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    monitor.start().await;
    Json(MessageResponse {
        message: "Monitor restarted".to_string(),
    })
}

/// POST /pause
pub async fn pause(State(monitor): State<AppState>) -> Json<MessageResponse> {
    monitor.pause().await;
    Json(MessageResponse {
        message: "Monitor paused".to_string(),
    })
}

/// POST /resume
pub async fn resume(State(monitor): State<AppState>) -> Json<MessageResponse> {
    monitor.resume().await;
    Json(MessageResponse {
        message: "Monitor resumed".to_string(),
    })
}

/// PUT /handles
pub async fn update_handles(
    State(monitor): State<AppState>,
    Json(handles): Json<Vec<String>>,
) -> Json<MessageResponse> {
    monitor.update_handles(handles).await;
    Json(MessageResponse {
        message: "Handles updated".to_string(),
    })
}

/// PUT /target-amount
pub async fn update_target_amount(
    State(monitor): State<AppState>,
    Json(request): Json<TargetAmountRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match monitor.update_target_usd(request.amount).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: format!("Target amount updated to ${}", request.amount),
        })),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
