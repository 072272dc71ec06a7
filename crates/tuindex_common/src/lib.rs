//! Shared foundational types used across the tuindex workspace.
//!
//! This crate provides the internal error type, file write timestamps used as
//! part of the translation unit cache key, and classification of C-family
//! source files by extension.

#![warn(missing_docs)]

pub mod result;
pub mod source_kind;
pub mod write_time;

pub use result::{IndexResult, InternalError};
pub use source_kind::{is_source_file, SourceKind};
pub use write_time::WriteTime;
