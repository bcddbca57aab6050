//! Crypto error types.

use thiserror::Error;

/// Errors raised by message encryption, decryption and signing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The encoding AES key does not decode to exactly 32 bytes.
    #[error("Invalid AES key: {0}")]
    InvalidAesKey(String),

    /// A signature could not be produced.
    #[error("Signature error: {0}")]
    Signature(String),

    /// The received envelope carries no readable `Encrypt` field.
    #[error("Receive message format error: {0}")]
    ReceiveMsgFormat(String),

    /// The supplied signature does not match the envelope.
    #[error("Invalid signature: {expected} != {actual}")]
    InvalidSignature { expected: String, actual: String },

    /// Encryption failed.
    #[error("Encrypt error: {0}")]
    Encrypt(String),

    /// Decryption or plaintext framing failed.
    #[error("Decrypt error: {0}")]
    Decrypt(String),

    /// The decrypted payload was built for another application.
    #[error("Invalid appid: {actual} != {expected}")]
    InvalidAppid { expected: String, actual: String },

    /// A random string of length zero was requested.
    #[error("Nonce length must be greater than zero")]
    InvalidNonceLength,

    /// Payment signing only knows MD5 and HMAC-SHA256.
    #[error("Unsupported sign type {0:?}: only MD5 and HMAC-SHA256 are supported")]
    UnsupportedSignType(String),
}

/// Crypto result type.
pub type Result<T> = std::result::Result<T, CryptoError>;
