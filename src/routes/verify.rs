use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use super::validation::{extracted_data, JsonBody};
use crate::db;
use crate::error::{AppError, Result};
use crate::security::sha256_hex;
use crate::AppState;

/// Check a payload against the stored hash and the on-chain record
///
/// The contract cannot be searched by hash, so the local record supplies the
/// contract id and the chain copy is compared against it.
pub async fn verify_record(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let data = extracted_data(&body)?;

    let ledger = state
        .ledger
        .clone()
        .ok_or(AppError::ServiceUnavailable("Blockchain service not available"))?;

    let data_hash = sha256_hex(data).map_err(AppError::Hashing)?;

    let db = state.db.clone();
    let hash = data_hash.clone();
    let found =
        tokio::task::spawn_blocking(move || db::records::find_record_by_hash(&db, &hash)).await??;

    let row = match found {
        Some((_, row)) if !row.chain_record_id.is_empty() => row,
        _ => {
            return Ok(Json(json!({
                "success": true,
                "match": false,
                "reason": "Data hash not found in database",
                "dataHash": data_hash,
            })))
        }
    };

    let on_chain = ledger
        .fetch(&row.chain_record_id)
        .await
        .map_err(AppError::ChainRead)?;

    if on_chain.data_hash != data_hash {
        tracing::warn!(
            "Hash mismatch for chain record {}: stored {}, chain {}",
            row.chain_record_id,
            data_hash,
            on_chain.data_hash
        );
        return Ok(Json(json!({
            "success": true,
            "match": false,
            "reason": "Hash mismatch between database and blockchain",
            "databaseHash": data_hash,
            "blockchainHash": on_chain.data_hash,
        })));
    }

    Ok(Json(json!({
        "success": true,
        "match": true,
        "dataHash": data_hash,
        "blockchainRecordId": row.chain_record_id,
        "timestamp": on_chain.timestamp,
        "submitter": on_chain.owner,
        "transactionHash": row.tx_hash,
        "blockNumber": row.tx_block,
        "verifiedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}
