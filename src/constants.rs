/// Maximum JSON request body size in bytes (3MB)
/// A fully extracted ITR form is well under 100KB
pub const MAX_BODY_BYTES: usize = 3 * 1024 * 1024;

/// Gas buffer applied on top of the node's estimate, in percent
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 20;

/// Session token lifetime (1 hour)
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Pagination defaults for GET /records
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Explorer used for certificate links when none is configured
pub const DEFAULT_EXPLORER_TX_PREFIX: &str = "https://etherscan.io/tx/";

/// Filename offered for the certificate download
pub const CERTIFICATE_FILENAME: &str = "tax_integrity_certificate.pdf";

// =============================================================================
// Retrieval
// =============================================================================

/// Target chunk size for the knowledge base, in characters
pub const CHUNK_SIZE: usize = 800;

/// Characters carried over between neighbouring chunks
pub const CHUNK_OVERLAP: usize = 200;

/// Number of chunks placed into the prompt context
pub const RETRIEVAL_TOP_K: usize = 5;

/// Number of previous exchanges replayed to the model
pub const MAX_HISTORY_EXCHANGES: usize = 5;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_MISSING_EXTRACTED_DATA: &str = "Missing extractedData in request body";

pub const ERR_EXTRACTED_DATA_NOT_OBJECT: &str = "extractedData must be an object";

pub const ERR_EXTRACTED_DATA_EMPTY: &str = "extractedData cannot be empty";

pub const ERR_INVALID_RECORD_ID: &str = "Invalid record ID format";

pub const ERR_INVALID_PAGINATION: &str =
    "Invalid pagination parameters. Page must be ≥1, limit must be 1-100";

/// Fixed reply the assistant gives for questions outside ITR topics
pub const OFF_TOPIC_REPLY: &str = "I don't know about this sorry";
