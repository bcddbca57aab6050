//! Message Encryption
//!
//! AES-256-CBC encryption of push payloads for the platform's secure mode.
//!
//! Plaintext framing before padding:
//!
//! ```text
//! random (16 bytes) | payload length (u32, big endian) | payload | appid
//! ```
//!
//! The frame is padded to 32-byte blocks (see [`crate::padding`]), encrypted
//! with the IV set to the first 16 key bytes, and base64 encoded.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::warn;
use zeroize::Zeroizing;

use crate::envelope::Envelope;
use crate::{nonce, padding, signature, CryptoError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Raw AES key length.
pub const KEY_LEN: usize = 32;

/// Length of the random plaintext prefix and of generated nonces.
const RANDOM_LEN: usize = 16;

/// IV length; the IV is the key prefix.
const IV_LEN: usize = 16;

/// Standard alphabet that tolerates non-zero trailing bits.
///
/// The platform hands out 43-character keys whose final symbol does not
/// always encode zero bits past the 32nd byte.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Encrypts and decrypts push payloads for one application.
///
/// Holds no mutable state, so a single instance can be shared across threads.
#[derive(Clone)]
pub struct MessageCrypto {
    token: String,
    key: Zeroizing<[u8; KEY_LEN]>,
    appid: String,
}

impl std::fmt::Debug for MessageCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCrypto")
            .field("appid", &self.appid)
            .finish_non_exhaustive()
    }
}

impl MessageCrypto {
    /// Create a crypto instance.
    ///
    /// `encoding_aes_key` is the 43-character key from the platform console; a
    /// trailing `=` is appended before base64 decoding.
    pub fn new(token: &str, encoding_aes_key: &str, appid: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            BASE64
                .decode(format!("{encoding_aes_key}="))
                .map_err(|e| CryptoError::InvalidAesKey(e.to_string()))?,
        );

        let key: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidAesKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;

        Ok(Self {
            token: token.to_string(),
            key: Zeroizing::new(key),
            appid: appid.to_string(),
        })
    }

    /// Application id expected inside every plaintext.
    pub fn appid(&self) -> &str {
        &self.appid
    }

    /// Encrypt and sign `plaintext`.
    ///
    /// A random 16-character nonce and the current time are used when `nonce`
    /// or `timestamp` are not given.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        nonce: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<Envelope> {
        let random = nonce::random_nonce_str(RANDOM_LEN)?;
        self.encrypt_with_random(random.as_bytes(), plaintext, nonce, timestamp)
    }

    /// Verify and decrypt an envelope.
    ///
    /// Only the `Encrypt` field is read from `envelope_xml`; the signature,
    /// timestamp and nonce come from the request query.
    pub fn decrypt(
        &self,
        envelope_xml: &str,
        signature: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<Vec<u8>> {
        let encrypt = wx_common::xml::parse_fields(envelope_xml)
            .ok()
            .and_then(|mut fields| fields.remove("Encrypt"))
            .ok_or_else(|| {
                CryptoError::ReceiveMsgFormat(format!("can not parse: {envelope_xml}"))
            })?;

        let expected = signature::sign(&self.token, timestamp, nonce, &encrypt);
        if !signature::constant_time_eq(&expected, signature) {
            warn!(appid = %self.appid, timestamp, nonce, "Push message signature mismatch");
            return Err(CryptoError::InvalidSignature {
                expected,
                actual: signature.to_string(),
            });
        }

        self.open(&encrypt)
    }

    fn encrypt_with_random(
        &self,
        random: &[u8],
        plaintext: &[u8],
        nonce: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<Envelope> {
        let encrypt = self.seal(random, plaintext)?;

        let nonce = match nonce {
            Some(nonce) => nonce.to_string(),
            None => nonce::random_nonce_str(RANDOM_LEN)?,
        };
        let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
        let signature = signature::sign(&self.token, &timestamp.to_string(), &nonce, &encrypt);

        Ok(Envelope {
            encrypt,
            signature,
            timestamp,
            nonce,
        })
    }

    fn seal(&self, random: &[u8], plaintext: &[u8]) -> Result<String> {
        let length = u32::try_from(plaintext.len())
            .map_err(|_| CryptoError::Encrypt("plaintext longer than u32::MAX bytes".into()))?;

        let mut frame =
            Vec::with_capacity(random.len() + 4 + plaintext.len() + self.appid.len() + padding::BLOCK_SIZE);
        frame.extend_from_slice(random);
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(plaintext);
        frame.extend_from_slice(self.appid.as_bytes());

        let mut frame = Zeroizing::new(padding::pad(frame));
        let frame_len = frame.len();

        let cipher = Aes256CbcEnc::new_from_slices(&self.key[..], self.iv())
            .map_err(|e| CryptoError::Encrypt(format!("cipher init failed: {e}")))?;
        let ciphertext = cipher
            .encrypt_padded_mut::<NoPadding>(&mut frame, frame_len)
            .map_err(|_| CryptoError::Encrypt("frame is not block aligned".into()))?;

        Ok(BASE64.encode(ciphertext))
    }

    fn open(&self, encrypt: &str) -> Result<Vec<u8>> {
        let mut buf = Zeroizing::new(
            BASE64
                .decode(encrypt)
                .map_err(|e| CryptoError::Decrypt(format!("invalid base64: {e}")))?,
        );

        let cipher = Aes256CbcDec::new_from_slices(&self.key[..], self.iv())
            .map_err(|e| CryptoError::Decrypt(format!("cipher init failed: {e}")))?;
        let decrypted = cipher
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|_| CryptoError::Decrypt("ciphertext is not block aligned".into()))?;

        let frame = padding::unpad(decrypted);
        let (length, rest) = frame
            .get(RANDOM_LEN..)
            .and_then(|content| content.split_first_chunk::<4>())
            .ok_or_else(|| CryptoError::Decrypt("plaintext frame too short".into()))?;
        let length = u32::from_be_bytes(*length) as usize;

        let (plaintext, from_appid) = rest.split_at_checked(length).ok_or_else(|| {
            CryptoError::Decrypt(format!(
                "declared length {length} exceeds frame ({} bytes)",
                rest.len()
            ))
        })?;

        if from_appid != self.appid.as_bytes() {
            let actual = String::from_utf8_lossy(from_appid).into_owned();
            warn!(expected = %self.appid, actual = %actual, "Push message appid mismatch");
            return Err(CryptoError::InvalidAppid {
                expected: self.appid.clone(),
                actual,
            });
        }

        Ok(plaintext.to_vec())
    }

    fn iv(&self) -> &[u8] {
        &self.key[..IV_LEN]
    }
}
