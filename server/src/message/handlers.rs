//! Built-in handlers available by name.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use wx_common::Message;

use super::context::{Context, ContextValue};
use super::handler::{Capabilities, HandlerRegistry, HandlerResult, MessageHandler};

/// Context key set by [`AuditHandler`] when a message enters the pipeline.
pub const RECEIVED_AT: &str = "received_at";

/// Replies to text messages with their own content.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl EchoHandler {
    pub const NAME: &'static str = "echo";
}

impl MessageHandler for EchoHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, message: &Message, _context: &mut Context) -> HandlerResult<Option<ContextValue>> {
        if !message.is_text() {
            return Ok(None);
        }
        Ok(Some(ContextValue::Text(message.content().into_owned())))
    }
}

/// Logs every message on the way in and the outcome on the way out.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditHandler;

impl AuditHandler {
    pub const NAME: &'static str = "audit";
}

impl MessageHandler for AuditHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PRE_PROCESS | Capabilities::POST_PROCESS
    }

    fn pre_process(&self, message: &Message, context: &mut Context) -> HandlerResult<()> {
        info!(
            msg_type = message.msg_type_str().unwrap_or_default(),
            from = message.from_id().unwrap_or_default(),
            "Message received"
        );
        context.set(RECEIVED_AT, Utc::now().timestamp_millis());
        Ok(())
    }

    fn post_process(&self, message: &Message, context: &mut Context) -> HandlerResult<()> {
        let elapsed_ms = context
            .get(RECEIVED_AT)
            .and_then(ContextValue::as_int)
            .map(|start| Utc::now().timestamp_millis() - start);

        info!(
            msg_type = message.msg_type_str().unwrap_or_default(),
            handler = context.handler().map(|h| h.name()),
            result = context.handle_result().map(ContextValue::kind),
            elapsed_ms,
            "Message processed"
        );
        Ok(())
    }
}

/// Registry holding every built-in handler.
#[must_use]
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(EchoHandler::NAME, || Arc::new(EchoHandler))
        .register(AuditHandler::NAME, || Arc::new(AuditHandler));
    registry
}
