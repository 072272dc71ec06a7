//! Translation unit cache in front of a C/C++ semantic analyzer.
//!
//! Editors ask for an up-to-date parse of a file over and over while the
//! user types. [`TranslationUnitCache`] keeps one parsed unit per file and
//! decides per request whether it can be reused as is, reparsed in place
//! because the file changed, or must be rebuilt because its compile
//! arguments changed. The analyzer itself, the source of compile arguments,
//! and the editor's unsaved buffers are collaborators behind the
//! [`Analyzer`], [`ArgumentProvider`], and [`UnsavedFilesOverlay`] traits.

#![warn(missing_docs)]

pub mod analyzer;
pub mod arguments;
pub mod cache;
pub mod error;
#[cfg(feature = "libclang")]
pub mod libclang;
pub mod process;
pub mod record;
#[cfg(test)]
mod test_support;
pub mod unit;
pub mod unsaved;

pub use analyzer::{Analyzer, AnalyzerError, ContextOptions, GlobalOptions};
pub use arguments::{ArgumentProvider, ConfiguredArguments};
pub use cache::{CacheBuilder, TranslationUnitCache};
pub use error::CacheError;
#[cfg(feature = "libclang")]
pub use libclang::{ClangIndex, ClangUnit, LibClang};
pub use process::ProcessIndex;
pub use record::{CacheRecord, OwnedContext, OwnedUnit};
pub use unit::TranslationUnit;
pub use unsaved::{UnsavedFile, UnsavedFiles, UnsavedFilesOverlay};
pub use tuindex_common::{is_source_file, SourceKind, WriteTime};
