//! Encrypted Envelope
//!
//! Wire container of an encrypted push message:
//!
//! ```xml
//! <xml><Encrypt><![CDATA[base64]]></Encrypt><MsgSignature><![CDATA[sha1hex]]></MsgSignature><TimeStamp>1409735669</TimeStamp><Nonce><![CDATA[nonce]]></Nonce></xml>
//! ```

use wx_common::xml::{self, XmlDocument};

use crate::{CryptoError, Result};

/// An encrypted message with its signature material. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Base64 ciphertext.
    pub encrypt: String,
    /// Hex SHA-1 signature over token, timestamp, nonce and ciphertext.
    pub signature: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub nonce: String,
}

impl Envelope {
    /// Render the four-field XML document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        XmlDocument::new()
            .cdata("Encrypt", &self.encrypt)
            .cdata("MsgSignature", &self.signature)
            .text("TimeStamp", self.timestamp)
            .cdata("Nonce", &self.nonce)
            .finish()
    }

    /// Parse a complete envelope carrying all four fields.
    pub fn from_xml(raw: &str) -> Result<Self> {
        let fields = xml::parse_fields(raw)
            .map_err(|e| CryptoError::ReceiveMsgFormat(format!("can not parse envelope: {e}")))?;
        let field = |name: &str| {
            fields.get(name).cloned().ok_or_else(|| {
                CryptoError::ReceiveMsgFormat(format!("envelope is missing {name}"))
            })
        };

        let timestamp = field("TimeStamp")?;
        let timestamp = timestamp.trim().parse().map_err(|_| {
            CryptoError::ReceiveMsgFormat(format!("envelope TimeStamp is not numeric: {timestamp}"))
        })?;

        Ok(Self {
            encrypt: field("Encrypt")?,
            signature: field("MsgSignature")?,
            timestamp,
            nonce: field("Nonce")?,
        })
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_xml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            encrypt: "Y2lwaGVy".into(),
            signature: "1f4874576de4a1ad6e860ec3b4aa09158897b784".into(),
            timestamp: 1409735669,
            nonce: "1320562132".into(),
        }
    }

    #[test]
    fn renders_wire_layout() {
        assert_eq!(
            sample().to_xml(),
            "<xml><Encrypt><![CDATA[Y2lwaGVy]]></Encrypt>\
             <MsgSignature><![CDATA[1f4874576de4a1ad6e860ec3b4aa09158897b784]]></MsgSignature>\
             <TimeStamp>1409735669</TimeStamp>\
             <Nonce><![CDATA[1320562132]]></Nonce></xml>"
        );
    }

    #[test]
    fn parses_rendered_envelope() {
        let envelope = sample();
        assert_eq!(Envelope::from_xml(&envelope.to_xml()).unwrap(), envelope);
    }

    #[test]
    fn missing_fields_are_format_errors() {
        let err = Envelope::from_xml("<xml><Encrypt>abc</Encrypt></xml>").unwrap_err();
        assert!(matches!(err, CryptoError::ReceiveMsgFormat(_)));

        let err = Envelope::from_xml(
            "<xml><Encrypt>a</Encrypt><MsgSignature>b</MsgSignature><TimeStamp>now</TimeStamp><Nonce>n</Nonce></xml>",
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::ReceiveMsgFormat(_)));
    }
}
