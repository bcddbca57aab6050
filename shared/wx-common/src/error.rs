//! Error types for parsing and building push messages.

use thiserror::Error;

/// XML decoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The document is not well formed.
    #[error("Malformed XML: {0}")]
    Malformed(String),

    /// The document contains no element at all.
    #[error("XML document has no root element")]
    MissingRoot,

    /// Text or CDATA content is not valid UTF-8.
    #[error("XML content is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors raised while reading a parsed message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The raw payload could not be decoded.
    #[error("Message format error: {0}")]
    Format(#[from] XmlError),

    /// A field required by the accessor is absent.
    #[error("Message field missing: {0}")]
    MissingField(&'static str),

    /// A field is present but does not hold the expected value.
    #[error("Message field {field} is invalid: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Errors raised while building a reply payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The reply kind has no builder yet.
    #[error("Reply builder not implemented for {0} messages")]
    NotImplemented(&'static str),
}
