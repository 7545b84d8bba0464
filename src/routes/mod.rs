pub mod auth;
pub mod chat;
pub mod health;
pub mod records;
pub mod submit;
pub mod validation;
pub mod verify;

pub use auth::google_login;
pub use chat::chat;
pub use health::{api_index, health_check};
pub use records::{get_record, list_records};
pub use submit::submit_record;
pub use verify::verify_record;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::constants::MAX_BODY_BYTES;
use crate::middleware::rate_limit;
use crate::AppState;

/// Headers the frontend reads from the certificate download
const EXPOSED_HEADERS: [HeaderName; 3] = [
    header::CONTENT_DISPOSITION,
    HeaderName::from_static("x-record-id"),
    HeaderName::from_static("x-transaction-hash"),
];

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers(EXPOSED_HEADERS);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Endpoint not found",
            "requestedPath": uri.path(),
            "method": method.as_str(),
        })),
    )
}

/// Build the application router with its middleware stack
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(api_index))
        .route("/health", get(health_check))
        .route("/auth/google", post(google_login))
        .route("/submit", post(submit_record))
        .route("/verify", post(verify_record))
        .route("/record/:id", get(get_record))
        .route("/records", get(list_records))
        .route("/chat", post(chat))
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
