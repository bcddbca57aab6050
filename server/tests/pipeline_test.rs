//! Pipeline phase ordering and failure semantics.

use std::sync::{Arc, Mutex};

use wx_common::Message;
use wx_server::message::{
    default_registry, Capabilities, Context, ContextValue, HandlerResult, HandlerSpec,
    MessageHandler, Phase, Pipeline, PipelineError,
};

const TEXT: &str = "<xml><ToUserName><![CDATA[toUser]]></ToUserName>\
    <FromUserName><![CDATA[fromUser]]></FromUserName>\
    <CreateTime>1348831860</CreateTime><MsgType><![CDATA[text]]></MsgType>\
    <Content><![CDATA[this is a test]]></Content><MsgId>1234567890123456</MsgId></xml>";

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Fail {
    Never,
    PreProcess,
    Handle,
    PostProcess,
}

/// Handler that records every call and returns a fixed result.
struct Recorder {
    name: &'static str,
    capabilities: Capabilities,
    result: Option<&'static str>,
    fail: Fail,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            capabilities: Capabilities::HANDLE,
            result: None,
            fail: Fail::Never,
            log: Arc::clone(log),
        }
    }

    fn returning(mut self, result: &'static str) -> Self {
        self.result = Some(result);
        self
    }

    fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn failing(mut self, fail: Fail) -> Self {
        self.fail = fail;
        self
    }

    fn record(&self, phase: &str, fail: Fail) -> HandlerResult<()> {
        self.log.lock().unwrap().push(format!("{}:{phase}", self.name));
        if self.fail == fail {
            return Err(format!("{} refused", self.name).into());
        }
        Ok(())
    }

    fn into_spec(self) -> HandlerSpec {
        HandlerSpec::instance(self)
    }
}

impl MessageHandler for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn handle(&self, _: &Message, _: &mut Context) -> HandlerResult<Option<ContextValue>> {
        self.record("handle", Fail::Handle)?;
        Ok(self.result.map(ContextValue::from))
    }

    fn pre_process(&self, _: &Message, _: &mut Context) -> HandlerResult<()> {
        self.record("pre", Fail::PreProcess)
    }

    fn post_process(&self, _: &Message, _: &mut Context) -> HandlerResult<()> {
        self.record("post", Fail::PostProcess)
    }
}

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn pipeline(specs: Vec<HandlerSpec>) -> Pipeline {
    Pipeline::new(specs, &default_registry()).unwrap()
}

#[test]
fn first_result_stops_handling() {
    let log = log();
    let all = Capabilities::all();
    let pipeline = pipeline(vec![
        Recorder::new("a", &log).with_capabilities(all).into_spec(),
        Recorder::new("b", &log).with_capabilities(all).into_spec(),
        Recorder::new("c", &log).with_capabilities(all).returning("X").into_spec(),
        Recorder::new("d", &log).returning("Y").into_spec(),
    ]);

    let result = pipeline.handle(TEXT, Context::new()).unwrap();

    assert_eq!(result, Some(ContextValue::from("X")));
    assert_eq!(
        entries(&log),
        vec![
            "a:pre", "b:pre", "c:pre", "a:handle", "b:handle", "c:handle", "a:post", "b:post",
            "c:post",
        ]
    );
}

#[test]
fn caller_seeded_result_is_ignored() {
    let log = log();
    let pipeline = pipeline(vec![Recorder::new("silent", &log).into_spec()]);

    let result = pipeline
        .handle(TEXT, Context::new().with("handle_result", "stale"))
        .unwrap();

    assert_eq!(result, None);
    assert_eq!(entries(&log), vec!["silent:handle"]);
}

#[test]
fn should_continue_runs_every_handler() {
    let log = log();
    let pipeline = pipeline(vec![
        Recorder::new("a", &log).returning("X").into_spec(),
        Recorder::new("b", &log).into_spec(),
        Recorder::new("c", &log).returning("Y").into_spec(),
    ]);

    let mut context = Context::new();
    context.set_should_continue(true);
    let result = pipeline.handle(TEXT, context).unwrap();

    assert_eq!(result, Some(ContextValue::from("Y")));
    assert_eq!(entries(&log), vec!["a:handle", "b:handle", "c:handle"]);
}

#[test]
fn phases_run_in_order() {
    let log = log();
    let all = Capabilities::all();
    let pipeline = pipeline(vec![
        Recorder::new("p", &log).with_capabilities(all).returning("X").into_spec(),
        Recorder::new("q", &log).with_capabilities(all).into_spec(),
    ]);

    pipeline.handle(TEXT, Context::new()).unwrap();

    assert_eq!(
        entries(&log),
        vec!["p:pre", "q:pre", "p:handle", "p:post", "q:post"]
    );
}

#[test]
fn pre_process_failure_aborts_everything() {
    let log = log();
    let all = Capabilities::all();
    let pipeline = pipeline(vec![
        Recorder::new("p", &log).with_capabilities(all).failing(Fail::PreProcess).into_spec(),
        Recorder::new("q", &log).with_capabilities(all).into_spec(),
    ]);

    let err = pipeline.handle(TEXT, Context::new()).unwrap_err();

    let PipelineError::Process(err) = err else {
        panic!("expected a processing error, got {err:?}");
    };
    assert_eq!(err.phase, Phase::PreProcess);
    assert_eq!(err.handler.name(), "p");
    assert_eq!(err.raw_message, TEXT);
    assert_eq!(err.source.to_string(), "p refused");
    assert_eq!(entries(&log), vec!["p:pre"]);
}

#[test]
fn handler_failure_skips_post_process() {
    let log = log();
    let pipeline = pipeline(vec![
        Recorder::new("observer", &log)
            .with_capabilities(Capabilities::POST_PROCESS)
            .into_spec(),
        Recorder::new("broken", &log).failing(Fail::Handle).into_spec(),
        Recorder::new("never", &log).returning("X").into_spec(),
    ]);

    let err = pipeline.handle(TEXT, Context::new()).unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::Process(e) if e.phase == Phase::Handle && e.handler.name() == "broken"
    ));
    assert_eq!(err.to_string(), "handle failed in handler broken: broken refused");
    assert_eq!(entries(&log), vec!["broken:handle"]);
}

#[test]
fn post_process_failure_discards_result() {
    let log = log();
    let pipeline = pipeline(vec![
        Recorder::new("answer", &log).returning("X").into_spec(),
        Recorder::new("observer", &log)
            .with_capabilities(Capabilities::POST_PROCESS)
            .failing(Fail::PostProcess)
            .into_spec(),
    ]);

    let err = pipeline.handle(TEXT, Context::new()).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Process(e) if e.phase == Phase::PostProcess && e.handler.name() == "observer"
    ));
    assert_eq!(entries(&log), vec!["answer:handle", "observer:post"]);
}

#[test]
fn post_processors_run_without_a_result() {
    let log = log();
    let pipeline = pipeline(vec![
        Recorder::new("silent", &log).into_spec(),
        Recorder::new("observer", &log)
            .with_capabilities(Capabilities::POST_PROCESS)
            .into_spec(),
    ]);

    assert_eq!(pipeline.handle(TEXT, Context::new()).unwrap(), None);
    assert_eq!(entries(&log), vec!["silent:handle", "observer:post"]);
}

#[test]
fn empty_pipeline_returns_nothing() {
    let pipeline = pipeline(Vec::new());
    assert_eq!(pipeline.handle(TEXT, Context::new()).unwrap(), None);
}

#[test]
fn named_handlers_resolve_through_registry() {
    let pipeline = pipeline(vec![HandlerSpec::named("audit"), HandlerSpec::named("echo")]);

    assert_eq!(pipeline.handlers().len(), 1);
    assert_eq!(pipeline.pre_processors()[0].name(), "audit");
    assert_eq!(pipeline.post_processors()[0].name(), "audit");
    assert_eq!(
        pipeline.handle(TEXT, Context::new()).unwrap(),
        Some(ContextValue::from("this is a test"))
    );
}

#[test]
fn unknown_handler_name_fails_construction() {
    let err = Pipeline::new([HandlerSpec::named("nope")], &default_registry()).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownHandler(name) if name == "nope"));
}

#[test]
fn malformed_payload_is_a_parse_error() {
    let err = pipeline(Vec::new()).handle("<xml><a></xml>", Context::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[test]
fn handlers_see_message_and_caller_fields() {
    struct Inspector;

    impl MessageHandler for Inspector {
        fn name(&self) -> &str {
            "inspector"
        }

        fn handle(&self, _: &Message, context: &mut Context) -> HandlerResult<Option<ContextValue>> {
            let message = context.message().ok_or("message missing")?;
            let greeting = context
                .get("greeting")
                .and_then(ContextValue::as_str)
                .ok_or("greeting missing")?;
            Ok(Some(ContextValue::from(format!(
                "{greeting} {}",
                message.from_id().unwrap_or_default()
            ))))
        }
    }

    let pipeline = pipeline(vec![HandlerSpec::instance(Inspector)]);
    let result = pipeline
        .handle(TEXT, Context::new().with("greeting", "hi"))
        .unwrap();

    assert_eq!(result, Some(ContextValue::from("hi fromUser")));
}
