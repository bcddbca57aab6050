//! SHA-1 Push Signature
//!
//! Signs `(token, timestamp, nonce, encrypt)`: the four UTF-8 values are sorted
//! as byte strings and hashed back to back with no delimiter.

use sha1::{Digest, Sha1};

/// Compute the hex-encoded signature.
pub fn sign(token: &str, timestamp: &str, nonce: &str, encrypt: &str) -> String {
    let mut parts = [
        token.as_bytes(),
        timestamp.as_bytes(),
        nonce.as_bytes(),
        encrypt.as_bytes(),
    ];
    parts.sort_unstable();

    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Verify a signature against the four signed values.
pub fn verify(token: &str, timestamp: &str, nonce: &str, encrypt: &str, signature: &str) -> bool {
    constant_time_eq(&sign(token, timestamp, nonce, encrypt), signature)
}

/// Compare two signatures without short-circuiting on the first mismatch.
pub fn constant_time_eq(expected: &str, actual: &str) -> bool {
    expected.len() == actual.len()
        && expected
            .as_bytes()
            .iter()
            .zip(actual.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
