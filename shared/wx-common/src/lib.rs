//! Push-message Common Library
//!
//! Types and codecs shared by the crypto layer and the server:
//!
//! - **xml**: flat field extraction and the compact `<xml>` writer
//! - **message**: the read-only view over a parsed push message or event
//! - **builder**: parsing entry point and reply payload construction

pub mod builder;
pub mod error;
pub mod message;
pub mod xml;

pub use error::{BuildError, MessageError, XmlError};
pub use message::{EventType, Message, MessageType};

/// Client identifier sent with outbound platform requests.
///
/// Package name immediately followed by its version, no separator.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
