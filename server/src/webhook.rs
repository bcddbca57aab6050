//! Push Webhook Processing
//!
//! One inbound push request end to end:
//!
//! 1. decrypt the body when running in secure mode
//! 2. parse and run the message through the [`Pipeline`]
//! 3. render the handler result as a reply
//! 4. re-encrypt the reply in secure mode

use std::string::FromUtf8Error;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use wx_common::{builder, BuildError, Message, MessageError};
use wx_crypto::{CryptoError, MessageCrypto};

use crate::message::{Context, ContextValue, Pipeline, PipelineError};

/// Query parameters sent with every push request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushParams {
    pub msg_signature: Option<String>,
    pub timestamp: Option<String>,
    pub nonce: Option<String>,
}

impl PushParams {
    /// Decode a request query string; a leading `?` is ignored.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
    }
}

/// Webhook processing errors.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// A query parameter needed for decryption is absent.
    #[error("Missing query parameter: {0}")]
    MissingParam(&'static str),

    /// The decrypted body is not UTF-8.
    #[error("Decrypted message is not UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// The handler result has no reply form.
    #[error("Cannot build a reply from a {0} result")]
    UnsupportedReply(&'static str),
}

impl From<MessageError> for WebhookError {
    fn from(err: MessageError) -> Self {
        Self::Pipeline(PipelineError::Parse(err))
    }
}

/// Turns push request bodies into reply bodies.
#[derive(Debug, Clone)]
pub struct WebhookProcessor {
    crypto: Option<MessageCrypto>,
    pipeline: Pipeline,
}

impl WebhookProcessor {
    /// `crypto` selects secure mode; `None` processes plaintext bodies.
    pub const fn new(crypto: Option<MessageCrypto>, pipeline: Pipeline) -> Self {
        Self { crypto, pipeline }
    }

    pub const fn is_encrypted(&self) -> bool {
        self.crypto.is_some()
    }

    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Process one push request.
    ///
    /// Returns `None` when no handler produced a result, so the caller can
    /// answer with an empty body.
    #[instrument(skip_all, fields(encrypted = self.is_encrypted()))]
    pub fn process(
        &self,
        body: &str,
        params: &PushParams,
        context: Context,
    ) -> Result<Option<Vec<u8>>, WebhookError> {
        let raw = match &self.crypto {
            Some(crypto) => Self::open(crypto, body, params)?,
            None => body.to_string(),
        };

        let message = Arc::new(Message::parse(raw)?);
        let Some(result) = self.pipeline.handle_message(Arc::clone(&message), context)? else {
            debug!("No handler produced a result");
            return Ok(None);
        };

        let reply = match result {
            ContextValue::Bytes(bytes) => bytes,
            ContextValue::Text(text) => builder::build_reply_text(&message, &text),
            other => return Err(WebhookError::UnsupportedReply(other.kind())),
        };

        match &self.crypto {
            Some(crypto) => Ok(Some(crypto.encrypt(&reply, None, None)?.to_xml().into_bytes())),
            None => Ok(Some(reply)),
        }
    }

    fn open(crypto: &MessageCrypto, body: &str, params: &PushParams) -> Result<String, WebhookError> {
        let signature = params
            .msg_signature
            .as_deref()
            .ok_or(WebhookError::MissingParam("msg_signature"))?;
        let timestamp = params
            .timestamp
            .as_deref()
            .ok_or(WebhookError::MissingParam("timestamp"))?;
        let nonce = params
            .nonce
            .as_deref()
            .ok_or(WebhookError::MissingParam("nonce"))?;

        let plaintext = crypto.decrypt(body, signature, timestamp, nonce)?;
        Ok(String::from_utf8(plaintext)?)
    }
}
