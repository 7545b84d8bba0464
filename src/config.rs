use std::env;

use crate::constants::{DEFAULT_EXPLORER_TX_PREFIX, DEFAULT_GAS_BUFFER_PERCENT};

/// Ethereum connection settings; present only when all three variables are set
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: String,
    pub gas_buffer_percent: u64,
}

/// OpenAI-compatible endpoints used by the FAQ assistant
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub generation_base_url: String,
    pub generation_api_key: String,
    pub generation_model: String,
    pub embedding_base_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub knowledge_base_path: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub environment: String,
    /// Raw HS256 secret (already base64-decoded)
    pub jwt_secret: Vec<u8>,
    /// AES-256 key-encryption key as 64 hex characters
    pub aes_kek_hex: String,
    pub google_client_id: Option<String>,
    pub chain: Option<ChainConfig>,
    pub explorer_tx_prefix: String,
    pub assistant: Option<AssistantConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/dhanrakshak.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_requests = env::var("RATE_LIMIT_REQUESTS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| "Invalid RATE_LIMIT_REQUESTS")?;

        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| "Invalid RATE_LIMIT_WINDOW_SECS")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = parse_jwt_secret(
            &env::var("JWT_SECRET_B64").map_err(|_| "JWT_SECRET_B64 must be set")?,
        )?;

        let aes_kek_hex =
            env::var("AES_KEK_HEX").map_err(|_| "AES_KEK_HEX must be set for record encryption")?;
        if !is_valid_kek_hex(&aes_kek_hex) {
            return Err("AES_KEK_HEX must be 64 hex characters (32 bytes)".to_string());
        }

        let google_client_id = optional_var("GOOGLE_CLIENT_ID");
        if google_client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID not set - Google auth will not work");
        }

        let gas_buffer_percent = match optional_var("GAS_BUFFER_PERCENT") {
            Some(v) => v.parse().map_err(|_| "Invalid GAS_BUFFER_PERCENT")?,
            None => DEFAULT_GAS_BUFFER_PERCENT,
        };

        let chain = match (
            optional_var("INFURA_URL"),
            optional_var("PRIVATE_KEY"),
            optional_var("CONTRACT_ADDRESS"),
        ) {
            (Some(rpc_url), Some(private_key), Some(contract_address)) => Some(ChainConfig {
                rpc_url,
                private_key,
                contract_address,
                gas_buffer_percent,
            }),
            _ => {
                tracing::warn!(
                    "INFURA_URL, PRIVATE_KEY and CONTRACT_ADDRESS are required for blockchain access"
                );
                None
            }
        };

        let explorer_tx_prefix = optional_var("ETHERSCAN_TX_PREFIX")
            .unwrap_or_else(|| DEFAULT_EXPLORER_TX_PREFIX.to_string());

        let assistant = optional_var("LLM_API_KEY").map(|generation_api_key| AssistantConfig {
            generation_base_url: optional_var("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
            generation_model: optional_var("LLM_MODEL")
                .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string()),
            embedding_base_url: optional_var("EMBEDDING_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            embedding_api_key: optional_var("EMBEDDING_API_KEY")
                .unwrap_or_else(|| generation_api_key.clone()),
            embedding_model: optional_var("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            knowledge_base_path: optional_var("KNOWLEDGE_BASE_PATH")
                .unwrap_or_else(|| "./data/data.txt".to_string()),
            generation_api_key,
        });

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            rate_limit_requests,
            rate_limit_window_secs,
            environment,
            jwt_secret,
            aes_kek_hex,
            google_client_id,
            chain,
            explorer_tx_prefix,
            assistant,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// True when CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_jwt_secret(encoded: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;

    let secret = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| "JWT_SECRET_B64 is not valid base64")?;
    if secret.is_empty() {
        return Err("JWT_SECRET_B64 decodes to an empty secret".to_string());
    }
    Ok(secret)
}

fn is_valid_kek_hex(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jwt_secret() {
        assert_eq!(parse_jwt_secret("c2VjcmV0").unwrap(), b"secret");
        assert!(parse_jwt_secret("not base64!").is_err());
        assert!(parse_jwt_secret("").is_err());
    }

    #[test]
    fn test_is_valid_kek_hex() {
        assert!(is_valid_kek_hex(&"ab".repeat(32)));
        assert!(!is_valid_kek_hex(&"ab".repeat(16)));
        assert!(!is_valid_kek_hex(&"zz".repeat(32)));
    }
}
