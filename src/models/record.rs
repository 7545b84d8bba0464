use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anchored submission stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    /// Owning user ID
    pub user_id: String,
    /// `0x`-prefixed SHA-256 of the submitted JSON
    pub data_hash: String,
    /// Ethereum transaction that anchored the hash
    pub tx_hash: String,
    pub tx_block: u64,
    /// Record identifier assigned by the contract
    pub chain_record_id: String,
    /// AES-GCM envelope of the submitted JSON (base64)
    pub encrypted_data: String,
    /// When the record was created (Unix timestamp, milliseconds)
    pub created_at_ms: i64,
}

/// Record metadata returned by the API (never includes the encrypted payload)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    pub user_id: String,
    pub data_hash: String,
    pub tx_hash: String,
    pub tx_block: u64,
    pub blockchain_record_id: String,
    pub created_at: String,
}

impl RecordSummary {
    pub fn from_row(id: &str, row: &RecordRow) -> Self {
        Self {
            id: id.to_string(),
            user_id: row.user_id.clone(),
            data_hash: row.data_hash.clone(),
            tx_hash: row.tx_hash.clone(),
            tx_block: row.tx_block,
            blockchain_record_id: row.chain_record_id.clone(),
            created_at: millis_to_rfc3339(row.created_at_ms),
        }
    }
}

/// Validate that a record ID is a UUID
pub fn validate_record_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Generate a new record or user ID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Convert Unix milliseconds to an RFC3339 string, defaulting to now if invalid
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_record_id() {
        assert!(validate_record_id(&new_id()));
        assert!(!validate_record_id("abc123"));
        assert!(!validate_record_id(""));
    }

    #[test]
    fn test_millis_to_rfc3339() {
        assert_eq!(millis_to_rfc3339(1733788800123), "2024-12-10T00:00:00.123Z");
    }

    #[test]
    fn test_summary_omits_payload() {
        let row = RecordRow {
            user_id: "u1".to_string(),
            data_hash: format!("0x{}", "a".repeat(64)),
            tx_hash: format!("0x{}", "b".repeat(64)),
            tx_block: 42,
            chain_record_id: "7".to_string(),
            encrypted_data: "c2VjcmV0".to_string(),
            created_at_ms: 1733788800000,
        };

        let value = serde_json::to_value(RecordSummary::from_row("r1", &row)).unwrap();
        assert_eq!(value["blockchainRecordId"], "7");
        assert_eq!(value["txBlock"], 42);
        assert!(value.get("encryptedData").is_none());
    }
}
