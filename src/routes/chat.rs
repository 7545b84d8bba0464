use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::validation::JsonBody;
use crate::error::{AppError, Result};
use crate::rag::Exchange;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// Earlier exchanges in this conversation, oldest first
    #[serde(default)]
    pub history: Vec<Exchange>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
}

/// Answer an ITR question from the knowledge base
pub async fn chat(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let question = payload
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Question is required".to_string()))?;

    let assistant = state
        .assistant
        .clone()
        .ok_or(AppError::ServiceUnavailable("Assistant not configured"))?;

    let answer = assistant.answer(question, &payload.history).await?;

    Ok(Json(ChatResponse {
        success: true,
        answer,
    }))
}
