//! Random alphanumeric strings for nonces and plaintext prefixes.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::{CryptoError, Result};

/// Generate `length` characters drawn uniformly from ASCII letters and digits.
pub fn random_nonce_str(length: usize) -> Result<String> {
    if length == 0 {
        return Err(CryptoError::InvalidNonceLength);
    }

    Ok(rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_length() {
        assert_eq!(random_nonce_str(0), Err(CryptoError::InvalidNonceLength));
    }

    #[test]
    fn produces_requested_length_of_alphanumerics() {
        for length in [5, 10, 16, 20] {
            let nonce = random_nonce_str(length).unwrap();
            assert_eq!(nonce.len(), length);
            assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn consecutive_nonces_differ() {
        assert_ne!(random_nonce_str(16).unwrap(), random_nonce_str(16).unwrap());
    }
}
