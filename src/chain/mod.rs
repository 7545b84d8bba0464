//! On-chain anchoring of submission hashes

pub mod ethereum;

use async_trait::async_trait;
use thiserror::Error;

pub use ethereum::EthereumLedger;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("transaction {0} was dropped before confirmation")]
    Dropped(String),

    #[error("Transaction failed on blockchain: {0}")]
    Reverted(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}

/// Proof that a hash was written on chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    /// Identifier the contract assigned to the stored hash
    pub chain_record_id: String,
}

/// Record as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainRecord {
    pub data_hash: String,
    /// Block timestamp of the write (decimal string of a uint256)
    pub timestamp: String,
    /// Address that submitted the record (checksummed)
    pub owner: String,
}

/// Append-only registry of content hashes
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Write a hash and wait for the transaction to be mined
    async fn anchor(&self, data_hash: &str) -> Result<AnchorReceipt, ChainError>;

    /// Read a stored record by its contract identifier
    async fn fetch(&self, chain_record_id: &str) -> Result<OnChainRecord, ChainError>;
}
