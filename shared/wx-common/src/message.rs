//! Push Message Model
//!
//! A read-only view over a parsed message or event payload, for example:
//!
//! ```xml
//! <xml>
//!   <ToUserName><![CDATA[toUser]]></ToUserName>
//!   <FromUserName><![CDATA[fromUser]]></FromUserName>
//!   <CreateTime>1348831860</CreateTime>
//!   <MsgType><![CDATA[text]]></MsgType>
//!   <Content><![CDATA[this is a test]]></Content>
//!   <MsgId>1234567890123456</MsgId>
//! </xml>
//! ```

use std::borrow::Cow;

use serde::Serialize;

use crate::xml::{self, Fields};
use crate::MessageError;

/// Message kinds carried in `MsgType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Link,
    Image,
    Event,
    Voice,
    Video,
    Location,
    #[serde(rename = "shortvideo")]
    ShortVideo,
}

impl MessageType {
    /// Parse from the wire form (e.g., `"text"`).
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "link" => Some(Self::Link),
            "image" => Some(Self::Image),
            "event" => Some(Self::Event),
            "voice" => Some(Self::Voice),
            "video" => Some(Self::Video),
            "location" => Some(Self::Location),
            "shortvideo" => Some(Self::ShortVideo),
            _ => None,
        }
    }

    /// Convert to the wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::Image => "image",
            Self::Event => "event",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Location => "location",
            Self::ShortVideo => "shortvideo",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds carried in `Event` when `MsgType` is `event`.
///
/// The platform mixes upper- and lower-case names; the wire form is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    #[serde(rename = "VIEW")]
    View,
    #[serde(rename = "SCAN")]
    Scan,
    #[serde(rename = "CLICK")]
    Click,
    #[serde(rename = "LOCATION")]
    Location,
    #[serde(rename = "subscribe")]
    Subscribe,
    #[serde(rename = "unsubscribe")]
    Unsubscribe,
}

impl EventType {
    /// Parse from the wire form (e.g., `"CLICK"`, `"subscribe"`).
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "VIEW" => Some(Self::View),
            "SCAN" => Some(Self::Scan),
            "CLICK" => Some(Self::Click),
            "LOCATION" => Some(Self::Location),
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            _ => None,
        }
    }

    /// Convert to the wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Scan => "SCAN",
            Self::Click => "CLICK",
            Self::Location => "LOCATION",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event key prefix used when a user subscribes by scanning a parametric QR code.
const QRSCENE_PREFIX: &str = "qrscene_";

/// A parsed push message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip)]
    raw: String,
    fields: Fields,
}

impl Message {
    /// Parse a raw payload.
    pub fn parse(raw: impl Into<String>) -> Result<Self, MessageError> {
        let raw = raw.into();
        let fields = xml::parse_fields(&raw)?;
        Ok(Self { raw, fields })
    }

    /// The payload this message was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Look up any field by element name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw `MsgType` text.
    pub fn msg_type_str(&self) -> Option<&str> {
        self.get("MsgType")
    }

    /// Typed `MsgType`; `None` when absent or not a known kind.
    pub fn msg_type(&self) -> Option<MessageType> {
        self.msg_type_str().and_then(MessageType::parse_str)
    }

    /// Typed `Event`; `None` for non-events or unknown event names.
    pub fn event(&self) -> Option<EventType> {
        if self.is_event() {
            self.get("Event").and_then(EventType::parse_str)
        } else {
            None
        }
    }

    pub fn event_key(&self) -> Option<&str> {
        self.get("EventKey")
    }

    /// Human-readable body.
    ///
    /// Text messages yield their `Content`, CLICK events their `EventKey`, and
    /// every other kind a `[type]` placeholder.
    pub fn content(&self) -> Cow<'_, str> {
        if self.is_text() {
            Cow::Borrowed(self.get("Content").unwrap_or_default())
        } else if self.is_click_event() {
            Cow::Borrowed(self.event_key().unwrap_or_default())
        } else {
            Cow::Owned(format!("[{}]", self.msg_type_str().unwrap_or_default()))
        }
    }

    /// Numeric message id; events carry none and report `-1`.
    pub fn id(&self) -> Result<i64, MessageError> {
        if self.is_event() {
            return Ok(-1);
        }
        self.parse_int("MsgId")
    }

    /// Sender `OpenID`.
    pub fn from_id(&self) -> Option<&str> {
        self.get("FromUserName")
    }

    /// Recipient account id.
    pub fn to_id(&self) -> Option<&str> {
        self.get("ToUserName")
    }

    /// `CreateTime` as Unix seconds.
    pub fn create_time(&self) -> Result<i64, MessageError> {
        self.parse_int("CreateTime")
    }

    pub fn is_text(&self) -> bool {
        self.msg_type() == Some(MessageType::Text)
    }

    pub fn is_link(&self) -> bool {
        self.msg_type() == Some(MessageType::Link)
    }

    pub fn is_image(&self) -> bool {
        self.msg_type() == Some(MessageType::Image)
    }

    pub fn is_event(&self) -> bool {
        self.msg_type() == Some(MessageType::Event)
    }

    pub fn is_voice(&self) -> bool {
        self.msg_type() == Some(MessageType::Voice)
    }

    pub fn is_video(&self) -> bool {
        self.msg_type() == Some(MessageType::Video)
    }

    pub fn is_location(&self) -> bool {
        self.msg_type() == Some(MessageType::Location)
    }

    pub fn is_shortvideo(&self) -> bool {
        self.msg_type() == Some(MessageType::ShortVideo)
    }

    pub fn is_subscribe_event(&self) -> bool {
        self.event() == Some(EventType::Subscribe)
    }

    pub fn is_unsubscribe_event(&self) -> bool {
        self.event() == Some(EventType::Unsubscribe)
    }

    /// Subscription triggered by scanning a parametric QR code.
    pub fn is_qrscene_subscribe_event(&self) -> bool {
        self.is_subscribe_event()
            && self
                .event_key()
                .is_some_and(|key| key.starts_with(QRSCENE_PREFIX))
    }

    pub fn is_scan_event(&self) -> bool {
        self.event() == Some(EventType::Scan)
    }

    pub fn is_click_event(&self) -> bool {
        self.event() == Some(EventType::Click)
    }

    fn parse_int(&self, field: &'static str) -> Result<i64, MessageError> {
        let value = self.get(field).ok_or(MessageError::MissingField(field))?;
        value
            .trim()
            .parse()
            .map_err(|_| MessageError::InvalidField {
                field,
                value: value.to_string(),
            })
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
