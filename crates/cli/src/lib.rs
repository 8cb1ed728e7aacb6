//! # fsgate CLI Library
//!
//! Command-line front end for the [`gateway`] crate. It wires a
//! [`gateway::FileManagerImpl`] to a configuration file, a persistent command
//! history and tracing output.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`commands`]: File operations as parseable, recordable commands
//! - [`history`]: Persistent command history
//! - [`logging`]: Tracing subscriber setup
//! - [`paths`]: Home directory expansion

pub mod commands;
pub mod config;
pub mod history;
pub mod logging;
pub mod paths;

// Re-export the gateway for convenience
pub use gateway;

pub use commands::{Operation, Output, ParseError};
pub use config::{Config, ConfigError};
pub use history::{History, HistoryError};
pub use paths::expand_tilde;
