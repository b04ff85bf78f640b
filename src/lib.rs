//! video-assistant library crate.
//!
//! Exposes the Veo client, the form session and the CLI handlers so the
//! binary and the integration tests share one implementation.

pub mod cli;
pub mod config;
pub mod prompt;
pub mod session;
pub mod veo;
