use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};
use sha2::{Digest, Sha256};
use std::io;
use thiserror::Error;

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
const TAG_LEN: usize = 16;

// =============================================================================
// Content Hashing
// =============================================================================

/// Largest integer an ECMAScript number holds exactly (`Number.MAX_SAFE_INTEGER`)
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Compact JSON formatter that writes numbers the way `JSON.stringify` does
///
/// Floats go through `ryu-js`, so `1.0` becomes `1`, `1e20` is written out in
/// full and `1e21` becomes `1e+21`. Integers past the safe range are rounded
/// to the nearest double first, as a JS client would have parsed them.
struct EcmaScriptFormatter;

impl Formatter for EcmaScriptFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // JSON.stringify(-0) is "0"
        let value = if value == 0.0 { 0.0 } else { value };
        let mut buffer = ryu_js::Buffer::new();
        writer.write_all(buffer.format(value).as_bytes())
    }

    fn write_u64<W>(&mut self, writer: &mut W, value: u64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if value <= MAX_SAFE_INTEGER {
            CompactFormatter.write_u64(writer, value)
        } else {
            self.write_f64(writer, value as f64)
        }
    }

    fn write_i64<W>(&mut self, writer: &mut W, value: i64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if value.unsigned_abs() <= MAX_SAFE_INTEGER {
            CompactFormatter.write_i64(writer, value)
        } else {
            self.write_f64(writer, value as f64)
        }
    }
}

/// Serialize a JSON value byte-for-byte as `JSON.stringify` would
pub fn to_ecmascript_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, EcmaScriptFormatter);
    value.serialize(&mut serializer)?;
    // Formatter output is always UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Hash a JSON value the way the submission is anchored on chain
///
/// Keys keep their original order and numbers are formatted as in
/// ECMAScript, so the digest matches hashing `JSON.stringify(value)` on the
/// client. Returned as `0x`-prefixed lowercase hex.
///
/// # Algorithm
/// `hash = "0x" + hex(SHA256(json))`
pub fn sha256_hex(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let json = to_ecmascript_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("0x{}", hex::encode(hasher.finalize())))
}

// =============================================================================
// Record Encryption
// =============================================================================

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("key must be 32 bytes of hex")]
    InvalidKey,

    #[error("ciphertext is not valid base64")]
    InvalidEncoding,

    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("authentication failed")]
    Authentication,

    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// AES-256-GCM envelope for stored record payloads
///
/// Blob layout: `base64(nonce(12) || tag(16) || ciphertext)`.
#[derive(Clone)]
pub struct RecordCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher").finish_non_exhaustive()
    }
}

impl RecordCipher {
    /// Build a cipher from a 64-character hex key
    pub fn from_hex(kek_hex: &str) -> Result<Self, CipherError> {
        let key = hex::decode(kek_hex.trim()).map_err(|_| CipherError::InvalidKey)?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Encrypt a string under a fresh random nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // aes-gcm appends the tag to the ciphertext
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Authentication)?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(ciphertext);

        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob produced by [`RecordCipher::encrypt`]
    pub fn decrypt(&self, blob: &str) -> Result<String, CipherError> {
        let data = BASE64
            .decode(blob.trim())
            .map_err(|_| CipherError::InvalidEncoding)?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated(data.len()));
        }

        let (nonce, rest) = data.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut sealed = Vec::with_capacity(rest.len());
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}
