//! Message Processing
//!
//! Context, handler contract, and the three-phase pipeline that runs parsed
//! push messages through business handlers.

pub mod context;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod pipeline;

pub use context::{Context, ContextValue};
pub use error::{MessageProcessError, Phase, PipelineError};
pub use handler::{
    Capabilities, HandlerError, HandlerRegistry, HandlerResult, HandlerSpec, MessageHandler,
};
pub use handlers::{default_registry, AuditHandler, EchoHandler};
pub use pipeline::Pipeline;
