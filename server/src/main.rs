//! Push Message Server - Main Entry Point
//!
//! Replays one push request: the body is read from stdin, the query string
//! (`msg_signature=..&timestamp=..&nonce=..`) is the first argument, and the
//! reply body is written to stdout.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::info;

use wx_server::config;
use wx_server::message::{default_registry, Context as MessageContext, HandlerSpec, Pipeline};
use wx_server::webhook::{PushParams, WebhookProcessor};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wx_server=info,wx_crypto=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        user_agent = wx_common::USER_AGENT,
        encrypted = config.encrypted,
        "Starting push message server"
    );

    let registry = default_registry();
    let pipeline = Pipeline::new(
        config.handlers.iter().cloned().map(HandlerSpec::Named),
        &registry,
    )?;
    info!(
        handlers = pipeline.handlers().len(),
        pre_processors = pipeline.pre_processors().len(),
        post_processors = pipeline.post_processors().len(),
        "Pipeline initialized"
    );

    let processor = WebhookProcessor::new(config.message_crypto()?, pipeline);
    let query = std::env::args().nth(1).unwrap_or_default();
    let params = PushParams::from_query(&query).context("Invalid query string")?;

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read push body from stdin")?;

    match processor.process(&body, &params, MessageContext::new())? {
        Some(reply) => std::io::stdout()
            .write_all(&reply)
            .context("Failed to write reply")?,
        None => info!("No reply produced"),
    }

    Ok(())
}
