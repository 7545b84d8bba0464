use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::certificate::CertificateError;
use crate::chain::ChainError;
use crate::rag::ModelError;
use crate::security::CipherError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("Hashing error: {0}")]
    Hashing(serde_json::Error),

    #[error("No authorization header provided")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthScheme,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Identity verification failed: {0}")]
    IdentityRejected(String),

    #[error("Email not verified by identity provider")]
    EmailNotVerified,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Record belongs to another user")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate submission of record {record_id}")]
    DuplicateSubmission { record_id: String, tx_hash: String },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(&'static str),

    #[error("Blockchain write failed: {0}")]
    ChainWrite(ChainError),

    #[error("Blockchain read failed: {0}")]
    ChainRead(ChainError),

    #[error("Encryption error: {0}")]
    Encryption(CipherError),

    #[error("Decryption error: {0}")]
    Decryption(CipherError),

    #[error("Stored record is not valid JSON: {0}")]
    CorruptRecord(serde_json::Error),

    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    #[error("Assistant error: {0}")]
    Assistant(#[from] ModelError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request body too large")]
    PayloadTooLarge,
}

/// Implement IntoResponse to convert AppError into HTTP responses
///
/// Every body has the shape `{ "success": false, "error": "..." }`, with a few
/// variants adding context fields next to `error`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = Map::new();

        let (status, error_message): (StatusCode, String) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                internal()
            }
            AppError::Transaction(ref e) => {
                tracing::error!("Transaction error: {:?}", e);
                internal()
            }
            AppError::Table(ref e) => {
                tracing::error!("Table error: {:?}", e);
                internal()
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                internal()
            }
            AppError::Commit(ref e) => {
                tracing::error!("Commit error: {:?}", e);
                internal()
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {:?}", e);
                internal()
            }
            AppError::Deserialization(ref e) => {
                tracing::error!("Deserialization error: {:?}", e);
                internal()
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                internal()
            }
            AppError::TokenSigning(ref e) => {
                tracing::error!("Token signing error: {:?}", e);
                internal()
            }
            AppError::Encryption(ref e) => {
                tracing::error!("Encryption error: {:?}", e);
                internal()
            }
            AppError::Hashing(ref e) => {
                tracing::error!("Hashing error: {:?}", e);
                internal()
            }
            AppError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "No authorization header provided".to_string(),
            ),
            AppError::InvalidAuthScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format. Use: Bearer <token>".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
            ),
            AppError::IdentityRejected(ref reason) => {
                tracing::warn!("ID token rejected: {}", reason);
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid Google ID token or authentication failed".to_string(),
                )
            }
            AppError::EmailNotVerified => (
                StatusCode::BAD_REQUEST,
                "Email not verified by Google".to_string(),
            ),
            AppError::RecordNotFound => (StatusCode::NOT_FOUND, "Record not found".to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this record".to_string(),
            ),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DuplicateSubmission { record_id, tx_hash } => {
                extra.insert("recordId".to_string(), Value::String(record_id));
                extra.insert("txHash".to_string(), Value::String(tx_hash));
                (
                    StatusCode::CONFLICT,
                    "This data has already been submitted".to_string(),
                )
            }
            AppError::ServiceUnavailable(what) => {
                (StatusCode::SERVICE_UNAVAILABLE, what.to_string())
            }
            AppError::ChainWrite(e) => {
                tracing::error!("Blockchain transaction error: {}", e);
                extra.insert("details".to_string(), Value::String(e.to_string()));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store record on blockchain".to_string(),
                )
            }
            AppError::ChainRead(e) => {
                tracing::error!("Blockchain verification error: {}", e);
                extra.insert("details".to_string(), Value::String(e.to_string()));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to verify on blockchain".to_string(),
                )
            }
            AppError::Decryption(ref e) => {
                tracing::error!("Decryption error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to decrypt record data".to_string(),
                )
            }
            AppError::CorruptRecord(ref e) => {
                tracing::error!("Decrypted record is not valid JSON: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to decrypt record data".to_string(),
                )
            }
            AppError::Certificate(ref e) => {
                tracing::error!("PDF generation error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate certificate PDF".to_string(),
                )
            }
            AppError::Assistant(ref e) => {
                tracing::error!("RAG route error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RAG processing failed".to_string(),
                )
            }
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
        };

        let mut body = json!({
            "success": false,
            "error": error_message,
        });
        if let Some(object) = body.as_object_mut() {
            object.extend(extra);
        }

        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
