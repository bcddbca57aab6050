//! Pipeline error types.

use std::sync::Arc;

use thiserror::Error;
use wx_common::MessageError;

use super::handler::{HandlerError, MessageHandler};

/// Pipeline phase in which a handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreProcess,
    Handle,
    PostProcess,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreProcess => "pre_process",
            Self::Handle => "handle",
            Self::PostProcess => "post_process",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler failed while processing a message.
#[derive(Error)]
#[error("{phase} failed in handler {}: {source}", .handler.name())]
pub struct MessageProcessError {
    /// The handler that failed.
    pub handler: Arc<dyn MessageHandler>,
    /// The payload being processed.
    pub raw_message: String,
    pub phase: Phase,
    pub source: HandlerError,
}

impl std::fmt::Debug for MessageProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageProcessError")
            .field("handler", &self.handler.name())
            .field("phase", &self.phase)
            .field("raw_message", &self.raw_message)
            .field("source", &self.source)
            .finish()
    }
}

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A named handler is not in the registry.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    /// The payload could not be parsed into a message.
    #[error(transparent)]
    Parse(#[from] MessageError),

    /// A handler failed.
    #[error(transparent)]
    Process(#[from] MessageProcessError),
}
