//! Ethereum-backed ledger using ethers-rs
//!
//! Talks to the integrity registry contract over JSON-RPC and signs
//! transactions with a local wallet.

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::utils::to_checksum;
use std::sync::Arc;

use super::{AnchorReceipt, ChainError, Ledger, OnChainRecord};
use crate::config::ChainConfig;

abigen!(
    IntegrityRegistry,
    r#"[
        function addRecord(string dataHash) external returns (uint256)
        function recordCount() external view returns (uint256)
        function getRecord(uint256 id) external view returns (string, uint256, address)
    ]"#
);

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Gas limit with a percentage buffer over the node's estimate
pub fn buffered_gas_limit(estimate: U256, buffer_percent: u64) -> U256 {
    estimate * U256::from(100 + buffer_percent) / U256::from(100)
}

fn contract_err<M: Middleware>(e: ContractError<M>) -> ChainError {
    ChainError::Contract(e.to_string())
}

pub struct EthereumLedger {
    contract: IntegrityRegistry<Client>,
    gas_buffer_percent: u64,
}

impl EthereumLedger {
    /// Connect to the RPC endpoint and bind the wallet to its chain id
    pub async fn connect(config: &ChainConfig) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ChainError::Config(format!("invalid RPC URL: {}", e)))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?
            .as_u64();

        let wallet = config
            .private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Config(format!("invalid private key: {}", e)))?
            .with_chain_id(chain_id);

        let address = config
            .contract_address
            .trim()
            .parse::<Address>()
            .map_err(|e| ChainError::Config(format!("invalid contract address: {}", e)))?;

        tracing::info!(
            "Blockchain connection initialized (chain id {}, contract {}, signer {})",
            chain_id,
            to_checksum(&address, None),
            to_checksum(&wallet.address(), None)
        );

        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Self {
            contract: IntegrityRegistry::new(address, client),
            gas_buffer_percent: config.gas_buffer_percent,
        })
    }
}

#[async_trait]
impl Ledger for EthereumLedger {
    async fn anchor(&self, data_hash: &str) -> Result<AnchorReceipt, ChainError> {
        let call = self.contract.add_record(data_hash.to_string());

        let estimate = call.estimate_gas().await.map_err(contract_err)?;
        let gas_limit = buffered_gas_limit(estimate, self.gas_buffer_percent);
        tracing::debug!("Gas estimate {} -> limit {}", estimate, gas_limit);

        let call = call.gas(gas_limit);
        let pending = call.send().await.map_err(contract_err)?;
        let tx_hash = format!("{:#x}", *pending);
        tracing::info!("Anchor transaction sent: {}", tx_hash);

        let receipt = pending
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?
            .ok_or_else(|| ChainError::Dropped(tx_hash.clone()))?;

        if receipt.status != Some(U64::from(1)) {
            return Err(ChainError::Reverted(tx_hash));
        }

        let block_number = receipt
            .block_number
            .map(|n| n.as_u64())
            .unwrap_or_default();

        // The contract numbers records sequentially; the count after our
        // write is the id of the record we just added
        let count = self
            .contract
            .record_count()
            .call()
            .await
            .map_err(contract_err)?;

        Ok(AnchorReceipt {
            tx_hash: format!("{:#x}", receipt.transaction_hash),
            block_number,
            chain_record_id: count.to_string(),
        })
    }

    async fn fetch(&self, chain_record_id: &str) -> Result<OnChainRecord, ChainError> {
        let id = U256::from_dec_str(chain_record_id)
            .map_err(|_| ChainError::InvalidRecordId(chain_record_id.to_string()))?;

        let (data_hash, timestamp, owner) = self
            .contract
            .get_record(id)
            .call()
            .await
            .map_err(contract_err)?;

        Ok(OnChainRecord {
            data_hash,
            timestamp: timestamp.to_string(),
            owner: to_checksum(&owner, None),
        })
    }
}
