use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::pagination;
use crate::auth::AuthUser;
use crate::constants::ERR_INVALID_RECORD_ID;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::record::validate_record_id;
use crate::models::RecordSummary;
use crate::AppState;

/// Fetch and decrypt one of the caller's records
pub async fn get_record(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<String>,
) -> Result<Json<Value>> {
    if !validate_record_id(&record_id) {
        return Err(AppError::InvalidInput(ERR_INVALID_RECORD_ID.to_string()));
    }

    let db = state.db.clone();
    let id = record_id.clone();
    let row = tokio::task::spawn_blocking(move || db::records::get_record(&db, &id))
        .await??
        .ok_or(AppError::RecordNotFound)?;

    if row.user_id != user.id {
        tracing::warn!(
            "User {} attempted to read record {} owned by another user",
            user.id,
            record_id
        );
        return Err(AppError::Forbidden);
    }

    let plaintext = state
        .cipher
        .decrypt(&row.encrypted_data)
        .map_err(AppError::Decryption)?;
    let record: Value = serde_json::from_str(&plaintext).map_err(AppError::CorruptRecord)?;

    let metadata = RecordSummary::from_row(&record_id, &row);

    Ok(Json(json!({
        "success": true,
        "record": record,
        "metadata": {
            "id": metadata.id,
            "dataHash": metadata.data_hash,
            "txHash": metadata.tx_hash,
            "txBlock": metadata.tx_block,
            "blockchainRecordId": metadata.blockchain_record_id,
            "createdAt": metadata.created_at,
        }
    })))
}

/// Raw query values; parsed leniently by [`pagination`]
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// List the caller's records, newest first, without encrypted payloads
pub async fn list_records(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = pagination(query.page.as_deref(), query.limit.as_deref())?;
    let offset = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);

    let db = state.db.clone();
    let user_id = user.id.clone();
    let (rows, total) = tokio::task::spawn_blocking(move || {
        db::records::list_user_records(&db, &user_id, offset, limit as usize)
    })
    .await??;

    let records: Vec<RecordSummary> = rows
        .iter()
        .map(|(id, row)| RecordSummary::from_row(id, row))
        .collect();

    let total = total as u64;

    Ok(Json(json!({
        "success": true,
        "records": records,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": total.div_ceil(limit),
            "hasMore": page.saturating_mul(limit) < total,
        }
    })))
}
