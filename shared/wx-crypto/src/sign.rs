//! Payment Parameter Signing
//!
//! Signs request parameters for the payment API:
//!
//! 1. sort parameter names ascending, skipping `sign` and empty values
//! 2. join as `k1=v1&k2=v2&...&key=<sign key>`
//! 3. digest with MD5 or HMAC-SHA256 and render as upper-case hex

use std::collections::BTreeMap;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Parameter naming the digest; signed along with the others when present.
pub const SIGN_TYPE_PARAM: &str = "sign_type";

/// Parameter carrying the signature itself; never signed.
const SIGN_PARAM: &str = "sign";

/// Digest used for payment signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignType {
    #[default]
    Md5,
    HmacSha256,
}

impl SignType {
    /// Parse from the wire form (`"MD5"` or `"HMAC-SHA256"`).
    pub fn parse_str(s: &str) -> Result<Self> {
        match s {
            "MD5" => Ok(Self::Md5),
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            other => Err(CryptoError::UnsupportedSignType(other.to_string())),
        }
    }

    /// Convert to the wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }
}

impl FromStr for SignType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for SignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign payment parameters.
///
/// The digest comes from the `sign_type` parameter, defaulting to MD5.
/// HMAC-SHA256 needs a `sign_key`.
pub fn sign_for_pay(sign_key: Option<&str>, params: &BTreeMap<String, String>) -> Result<String> {
    let sign_type = params
        .get(SIGN_TYPE_PARAM)
        .map_or(Ok(SignType::default()), |s| s.parse())?;
    let sign_str = build_sign_str(sign_key, params);

    match sign_type {
        SignType::Md5 => Ok(hex::encode_upper(Md5::digest(sign_str.as_bytes()))),
        SignType::HmacSha256 => {
            let key = sign_key.ok_or_else(|| {
                CryptoError::Signature("HMAC-SHA256 signing requires a sign key".into())
            })?;
            let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                .map_err(|e| CryptoError::Signature(e.to_string()))?;
            mac.update(sign_str.as_bytes());
            Ok(hex::encode_upper(mac.finalize().into_bytes()))
        }
    }
}

fn build_sign_str(sign_key: Option<&str>, params: &BTreeMap<String, String>) -> String {
    let mut sign_str: String = params
        .iter()
        .filter(|(key, value)| key.as_str() != SIGN_PARAM && !value.is_empty())
        .map(|(key, value)| format!("{key}={value}&"))
        .collect();

    if let Some(sign_key) = sign_key {
        sign_str.push_str("key=");
        sign_str.push_str(sign_key);
    }
    sign_str
}
