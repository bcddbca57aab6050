//! Message Builder
//!
//! Parses raw payloads into [`Message`] and builds reply payloads for them.
//! Replies swap the sender and recipient of the message they answer.

use crate::xml::XmlDocument;
use crate::{BuildError, Message, MessageError, MessageType};

/// A single entry of a news reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub pic_url: String,
    pub url: String,
}

/// Optional metadata of a music reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Music {
    pub title: Option<String>,
    pub description: Option<String>,
    pub music_url: Option<String>,
    pub hq_music_url: Option<String>,
}

/// Parse a raw payload into a [`Message`].
pub fn parse(raw: impl Into<String>) -> Result<Message, MessageError> {
    Message::parse(raw)
}

/// Build a UTF-8 text reply to `message`.
pub fn build_reply_text(message: &Message, content: &str) -> Vec<u8> {
    reply_header(message, MessageType::Text)
        .cdata("Content", content)
        .finish()
        .into_bytes()
}

/// Image replies are not supported yet.
pub fn build_reply_image(_message: &Message, _media_id: &str) -> Result<Vec<u8>, BuildError> {
    Err(BuildError::NotImplemented("image"))
}

/// Voice replies are not supported yet.
pub fn build_reply_voice(_message: &Message, _media_id: &str) -> Result<Vec<u8>, BuildError> {
    Err(BuildError::NotImplemented("voice"))
}

/// Video replies are not supported yet.
pub fn build_reply_video(
    _message: &Message,
    _media_id: &str,
    _title: Option<&str>,
    _description: Option<&str>,
) -> Result<Vec<u8>, BuildError> {
    Err(BuildError::NotImplemented("video"))
}

/// Music replies are not supported yet.
pub fn build_reply_music(
    _message: &Message,
    _thumb_media_id: &str,
    _music: &Music,
) -> Result<Vec<u8>, BuildError> {
    Err(BuildError::NotImplemented("music"))
}

/// News replies are not supported yet.
pub fn build_reply_news(_message: &Message, _articles: &[Article]) -> Result<Vec<u8>, BuildError> {
    Err(BuildError::NotImplemented("news"))
}

fn reply_header(message: &Message, kind: MessageType) -> XmlDocument {
    XmlDocument::new()
        .cdata("ToUserName", message.from_id().unwrap_or_default())
        .cdata("FromUserName", message.to_id().unwrap_or_default())
        .text("CreateTime", chrono::Utc::now().timestamp())
        .cdata("MsgType", kind.as_str())
}
