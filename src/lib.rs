//! DhanRakshak Backend Library
//!
//! Tamper-evident tax filing records: payload hashes are anchored on
//! Ethereum, encrypted copies are kept locally, and users receive a PDF
//! certificate. This module exports the core types for testing and reuse.

pub mod auth;
pub mod certificate;
pub mod chain;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod rag;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use routes::create_router;

use std::sync::Arc;

use auth::TokenIssuer;
use chain::Ledger;
use identity::IdentityVerifier;
use middleware::{client_limiter, ClientLimiter};
use rag::Assistant;
use security::{CipherError, RecordCipher};

/// Application state shared across all handlers
///
/// External services are optional; routes that need a missing one answer 503.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub cipher: RecordCipher,
    pub tokens: TokenIssuer,
    pub ledger: Option<Arc<dyn Ledger>>,
    pub identity: Option<Arc<dyn IdentityVerifier>>,
    pub assistant: Option<Arc<Assistant>>,
    pub limiter: Arc<ClientLimiter>,
}

impl AppState {
    /// Create state with no external services attached
    pub fn new(db: Db, config: Config) -> std::result::Result<Self, CipherError> {
        let cipher = RecordCipher::from_hex(&config.aes_kek_hex)?;
        let tokens = TokenIssuer::new(&config.jwt_secret);
        let limiter = Arc::new(client_limiter(
            config.rate_limit_requests,
            config.rate_limit_window_secs,
        ));

        Ok(Self {
            db,
            config,
            cipher,
            tokens,
            ledger: None,
            identity: None,
            assistant: None,
            limiter,
        })
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_assistant(mut self, assistant: Arc<Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }
}
