//! Parsing and validation of `tuindex.toml` configuration files.
//!
//! This crate reads the index configuration and produces a strongly-typed
//! [`IndexConfig`]: verbosity and analyzer context settings, the shutdown
//! policy of the process-wide index, and the compile arguments to use per file.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use resolve::resolve_compile_args;
pub use types::*;
