//! Message Handlers
//!
//! A handler is a unit of business logic that may take part in any of the
//! three pipeline phases. The phases it joins are declared once through
//! [`MessageHandler::capabilities`]; the pipeline reads them at construction.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use wx_common::Message;

use super::context::{Context, ContextValue};

/// Error type handlers may return from any phase.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Handler result type.
pub type HandlerResult<T> = Result<T, HandlerError>;

bitflags! {
    /// Pipeline phases a handler takes part in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const HANDLE = 1 << 0;
        const PRE_PROCESS = 1 << 1;
        const POST_PROCESS = 1 << 2;
    }
}

/// Business logic invoked by the pipeline.
///
/// Every phase method defaults to a no-op; only the phases listed in
/// [`capabilities`](Self::capabilities) are ever called.
pub trait MessageHandler: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::HANDLE
    }

    /// Produce a result for `message`, or `None` to let the next handler try.
    fn handle(&self, _message: &Message, _context: &mut Context) -> HandlerResult<Option<ContextValue>> {
        Ok(None)
    }

    fn pre_process(&self, _message: &Message, _context: &mut Context) -> HandlerResult<()> {
        Ok(())
    }

    fn post_process(&self, _message: &Message, _context: &mut Context) -> HandlerResult<()> {
        Ok(())
    }
}

/// Builds a fresh handler instance.
pub type HandlerFactory = Box<dyn Fn() -> Arc<dyn MessageHandler> + Send + Sync>;

/// Name → factory lookup used to resolve named handlers.
///
/// Populate it before building pipelines; lookups take `&self` only.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn MessageHandler> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Instantiate the handler registered as `name`.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn MessageHandler>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// A handler given directly or by registry name.
#[derive(Clone)]
pub enum HandlerSpec {
    Instance(Arc<dyn MessageHandler>),
    Named(String),
}

impl HandlerSpec {
    pub fn instance(handler: impl MessageHandler + 'static) -> Self {
        Self::Instance(Arc::new(handler))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl From<Arc<dyn MessageHandler>> for HandlerSpec {
    fn from(handler: Arc<dyn MessageHandler>) -> Self {
        Self::Instance(handler)
    }
}

impl From<&str> for HandlerSpec {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for HandlerSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}
