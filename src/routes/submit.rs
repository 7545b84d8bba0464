use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::Value;

use super::validation::{extracted_data, JsonBody};
use crate::auth::AuthUser;
use crate::certificate::{render_certificate, CertificateDetails};
use crate::constants::CERTIFICATE_FILENAME;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::record::millis_to_rfc3339;
use crate::models::RecordRow;
use crate::security::sha256_hex;
use crate::AppState;

const X_RECORD_ID: HeaderName = HeaderName::from_static("x-record-id");
const X_TRANSACTION_HASH: HeaderName = HeaderName::from_static("x-transaction-hash");

/// Anchor a filing and return its integrity certificate
///
/// Steps: hash the payload, reject a repeat from the same user, anchor the
/// hash on chain, store the encrypted payload, render the PDF. Nothing is
/// rolled back if a later step fails after the transaction is mined.
pub async fn submit_record(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response> {
    let data = extracted_data(&body)?;

    let ledger = state
        .ledger
        .clone()
        .ok_or(AppError::ServiceUnavailable("Blockchain service not available"))?;

    let data_hash = sha256_hex(data).map_err(AppError::Hashing)?;

    let db = state.db.clone();
    let (user_id, hash) = (user.id.clone(), data_hash.clone());
    tokio::task::spawn_blocking(move || {
        if let Some((record_id, existing)) =
            db::records::find_user_record_by_hash(&db, &user_id, &hash)?
        {
            tracing::info!("Duplicate submission {} from user {}", record_id, user_id);
            return Err(AppError::DuplicateSubmission {
                record_id,
                tx_hash: existing.tx_hash,
            });
        }
        Ok(())
    })
    .await??;

    let receipt = ledger
        .anchor(&data_hash)
        .await
        .map_err(AppError::ChainWrite)?;

    let encrypted_data = state
        .cipher
        .encrypt(&data.to_string())
        .map_err(AppError::Encryption)?;

    let row = RecordRow {
        user_id: user.id.clone(),
        data_hash: data_hash.clone(),
        tx_hash: receipt.tx_hash.clone(),
        tx_block: receipt.block_number,
        chain_record_id: receipt.chain_record_id.clone(),
        encrypted_data,
        created_at_ms: Utc::now().timestamp_millis(),
    };

    let db = state.db.clone();
    let stored = row.clone();
    let record_id =
        tokio::task::spawn_blocking(move || db::records::insert_record(&db, &stored)).await??;

    tracing::info!(
        "Record {} anchored in tx {} (block {}, chain id {})",
        record_id,
        row.tx_hash,
        row.tx_block,
        row.chain_record_id
    );

    let details = CertificateDetails {
        certificate_id: record_id.clone(),
        user_id: user.id,
        data_hash,
        chain_record_id: row.chain_record_id,
        explorer_url: format!("{}{}", state.config.explorer_tx_prefix, row.tx_hash),
        tx_hash: row.tx_hash.clone(),
        block_number: row.tx_block,
        issued_at: millis_to_rfc3339(row.created_at_ms),
    };
    let pdf = render_certificate(&details)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", CERTIFICATE_FILENAME),
            ),
            (X_RECORD_ID, record_id),
            (X_TRANSACTION_HASH, row.tx_hash),
        ],
        pdf,
    )
        .into_response())
}
