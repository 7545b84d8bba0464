use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::validation::JsonBody;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

/// Exchange a Google ID token for a session token
///
/// The user is looked up by Google subject, then by email (linking the
/// account), and created when neither matches.
pub async fn google_login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<GoogleLoginRequest>,
) -> Result<Json<LoginResponse>> {
    let id_token = payload
        .id_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing id_token in request body".to_string()))?;

    let verifier = state
        .identity
        .clone()
        .ok_or(AppError::ServiceUnavailable("Google authentication not configured"))?;

    let identity = verifier
        .verify(&id_token)
        .await
        .map_err(|e| AppError::IdentityRejected(e.to_string()))?;

    if !identity.email_verified {
        return Err(AppError::EmailNotVerified);
    }

    let db = state.db.clone();
    let (user_id, record) = tokio::task::spawn_blocking(move || {
        db::users::upsert_google_user(&db, &identity, Utc::now().timestamp())
    })
    .await??;

    let token = state.tokens.issue(&user_id, &record.email)?;

    tracing::info!("User {} signed in with Google", user_id);

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: User::from_record(&user_id, &record),
    }))
}
