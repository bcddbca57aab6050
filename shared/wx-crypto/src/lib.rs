//! Push-message Cryptography
//!
//! Encryption and signing for the platform's secure push mode.
//!
//! - **crypt**: AES-256-CBC message envelopes with SHA-1 signatures
//! - **sign**: MD5 / HMAC-SHA256 signing of payment request parameters
//! - **nonce**: random alphanumeric strings

pub mod crypt;
pub mod envelope;
pub mod error;
pub mod nonce;
pub mod padding;
pub mod sign;
pub mod signature;

pub use crypt::MessageCrypto;
pub use envelope::Envelope;
pub use error::{CryptoError, Result};
pub use nonce::random_nonce_str;
pub use sign::{sign_for_pay, SignType};
