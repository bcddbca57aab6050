//! Push Message Server
//!
//! Receives platform push messages, optionally decrypts them, routes them
//! through a three-phase handler pipeline, and builds the reply.

pub mod config;
pub mod message;
pub mod webhook;
