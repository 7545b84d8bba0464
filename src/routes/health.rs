use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::AppState;

/// API index listing the available endpoints
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "DhanRakshak API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": [
                "GET /",
                "GET /health",
                "POST /auth/google",
                "POST /verify",
                "POST /chat"
            ],
            "authenticated": [
                "POST /submit",
                "GET /record/:id",
                "GET /records (with pagination)"
            ]
        }
    }))
}

fn configured(present: bool, ready: &'static str) -> &'static str {
    if present {
        ready
    } else {
        "not configured"
    }
}

/// Health check endpoint
///
/// Reports database connectivity and which external services are configured.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    // Check database connectivity by attempting a read transaction
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || match db.begin_read() {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    })
    .await
    .unwrap_or("disconnected");

    let assistant = match &state.assistant {
        Some(assistant) if assistant.is_ready() => "ready",
        Some(_) => "configured",
        None => "not configured",
    };

    Json(json!({
        "success": true,
        "status": "online",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "services": {
            "database": db_status,
            "blockchain": configured(state.ledger.is_some(), "initialized"),
            "googleAuth": configured(state.identity.is_some(), "configured"),
            "assistant": assistant,
        }
    }))
}
