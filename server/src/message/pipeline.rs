//! Message Pipeline
//!
//! Runs one message through three phases over an ordered set of handlers:
//!
//! 1. **pre-process**: every pre-processor, in registration order
//! 2. **handle**: handlers in order until one returns a result, unless the
//!    context asks to continue
//! 3. **post-process**: every post-processor, whether or not a result exists
//!
//! Any handler error aborts the run; later phases do not execute.

use std::sync::Arc;

use tracing::{debug, warn};
use wx_common::Message;

use super::context::{Context, ContextValue, HANDLER, HANDLE_RESULT, MESSAGE, RAW_MESSAGE};
use super::error::{MessageProcessError, Phase, PipelineError};
use super::handler::{Capabilities, HandlerError, HandlerRegistry, HandlerSpec, MessageHandler};

/// Handler lists classified by capability. Immutable after construction.
#[derive(Clone, Default)]
pub struct Pipeline {
    handlers: Vec<Arc<dyn MessageHandler>>,
    pre_processors: Vec<Arc<dyn MessageHandler>>,
    post_processors: Vec<Arc<dyn MessageHandler>>,
}

impl Pipeline {
    /// Build a pipeline, resolving named handlers through `registry`.
    ///
    /// Fails on the first name the registry does not know.
    pub fn new<I>(specs: I, registry: &HandlerRegistry) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = HandlerSpec>,
    {
        let handlers = specs
            .into_iter()
            .map(|spec| match spec {
                HandlerSpec::Instance(handler) => Ok(handler),
                HandlerSpec::Named(name) => registry
                    .resolve(&name)
                    .ok_or(PipelineError::UnknownHandler(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_handlers(handlers))
    }

    /// Build a pipeline from handler instances.
    pub fn from_handlers<I>(handlers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn MessageHandler>>,
    {
        let mut pipeline = Self::default();
        for handler in handlers {
            let capabilities = handler.capabilities();
            if capabilities.contains(Capabilities::PRE_PROCESS) {
                pipeline.pre_processors.push(Arc::clone(&handler));
            }
            if capabilities.contains(Capabilities::POST_PROCESS) {
                pipeline.post_processors.push(Arc::clone(&handler));
            }
            if capabilities.contains(Capabilities::HANDLE) {
                pipeline.handlers.push(handler);
            }
        }
        pipeline
    }

    pub fn handlers(&self) -> &[Arc<dyn MessageHandler>] {
        &self.handlers
    }

    pub fn pre_processors(&self) -> &[Arc<dyn MessageHandler>] {
        &self.pre_processors
    }

    pub fn post_processors(&self) -> &[Arc<dyn MessageHandler>] {
        &self.post_processors
    }

    /// Parse `raw_message` and run it through every phase.
    ///
    /// `context` carries caller fields; `message` and `raw_message` are added
    /// unless the caller already set them. Returns the last handler result.
    pub fn handle(
        &self,
        raw_message: &str,
        context: Context,
    ) -> Result<Option<ContextValue>, PipelineError> {
        let message = Arc::new(Message::parse(raw_message)?);
        self.handle_message(message, context)
    }

    /// Run an already parsed message through every phase.
    pub fn handle_message(
        &self,
        message: Arc<Message>,
        mut context: Context,
    ) -> Result<Option<ContextValue>, PipelineError> {
        context.defaults([
            (MESSAGE, ContextValue::Message(Arc::clone(&message))),
            (RAW_MESSAGE, ContextValue::Text(message.raw().to_string())),
        ]);

        for pre_processor in &self.pre_processors {
            pre_processor
                .pre_process(&message, &mut context)
                .map_err(|source| failure(pre_processor, Phase::PreProcess, &message, source))?;
        }

        let mut recorded = None;
        for handler in &self.handlers {
            let result = handler
                .handle(&message, &mut context)
                .map_err(|source| failure(handler, Phase::Handle, &message, source))?;

            if let Some(result) = result {
                debug!(handler = handler.name(), kind = result.kind(), "Handler produced a result");
                context.set(HANDLE_RESULT, result.clone());
                recorded = Some(result);
                context.set(HANDLER, ContextValue::Handler(Arc::clone(handler)));

                if !context.should_continue() {
                    break;
                }
            }
        }

        for post_processor in &self.post_processors {
            post_processor
                .post_process(&message, &mut context)
                .map_err(|source| failure(post_processor, Phase::PostProcess, &message, source))?;
        }

        Ok(recorded)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |list: &[Arc<dyn MessageHandler>]| {
            list.iter().map(|h| h.name().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("Pipeline")
            .field("handlers", &names(&self.handlers))
            .field("pre_processors", &names(&self.pre_processors))
            .field("post_processors", &names(&self.post_processors))
            .finish()
    }
}

fn failure(
    handler: &Arc<dyn MessageHandler>,
    phase: Phase,
    message: &Message,
    source: HandlerError,
) -> PipelineError {
    warn!(
        handler = handler.name(),
        phase = %phase,
        msg_type = message.msg_type_str().unwrap_or_default(),
        error = %source,
        "Message processing failed"
    );
    PipelineError::Process(MessageProcessError {
        handler: Arc::clone(handler),
        raw_message: message.raw().to_string(),
        phase,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::handler::HandlerResult;

    struct Fixed(&'static str);

    impl MessageHandler for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn handle(&self, _: &Message, _: &mut Context) -> HandlerResult<Option<ContextValue>> {
            Ok(Some(ContextValue::from(self.0)))
        }
    }

    struct Observer;

    impl MessageHandler for Observer {
        fn name(&self) -> &str {
            "observer"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::all()
        }
    }

    #[test]
    fn classifies_by_capability() {
        let pipeline = Pipeline::from_handlers([
            Arc::new(Fixed("a")) as Arc<dyn MessageHandler>,
            Arc::new(Observer),
        ]);

        assert_eq!(pipeline.handlers().len(), 2);
        assert_eq!(pipeline.pre_processors().len(), 1);
        assert_eq!(pipeline.post_processors().len(), 1);
        assert_eq!(pipeline.pre_processors()[0].name(), "observer");
    }

    #[test]
    fn unknown_names_fail_construction() {
        let registry = HandlerRegistry::new();
        let err = Pipeline::new([HandlerSpec::named("missing")], &registry).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownHandler(name) if name == "missing"));
    }

    #[test]
    fn caller_fields_win_over_defaults() {
        struct ReadsRaw;

        impl MessageHandler for ReadsRaw {
            fn name(&self) -> &str {
                "reads_raw"
            }

            fn handle(&self, _: &Message, context: &mut Context) -> HandlerResult<Option<ContextValue>> {
                Ok(context.raw_message().map(ContextValue::from))
            }
        }

        let pipeline = Pipeline::from_handlers([Arc::new(ReadsRaw) as Arc<dyn MessageHandler>]);
        let result = pipeline
            .handle("<xml/>", Context::new().with(RAW_MESSAGE, "overridden"))
            .unwrap();
        assert_eq!(result, Some(ContextValue::from("overridden")));
    }

    #[test]
    fn seeded_result_is_not_returned() {
        let context = Context::new().with(HANDLE_RESULT, "stale");
        assert_eq!(Pipeline::default().handle("<xml/>", context).unwrap(), None);
    }

    #[test]
    fn debug_lists_handler_names() {
        let pipeline = Pipeline::from_handlers([Arc::new(Fixed("a")) as Arc<dyn MessageHandler>]);
        let debug = format!("{pipeline:?}");
        assert!(debug.contains("\"a\""));
    }
}
