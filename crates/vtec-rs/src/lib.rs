//! Host crate for the VTEC engine.
//!
//! - config: layered TOML configuration
//! - telemetry: tracing subscriber setup
//! - store: JSON-lines active table
//! - harness: scripted test-drive runner and product rendering
//! - cli: the `vtec` command

#![forbid(unsafe_code)]

pub use vtec_core as core;

pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
mod paths;
pub mod store;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
