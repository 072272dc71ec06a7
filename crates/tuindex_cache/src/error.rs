//! Error types for translation unit cache operations.

use std::path::PathBuf;

use tuindex_diagnostics::Diagnostic;

use crate::analyzer::AnalyzerError;

/// Errors that can occur while serving a translation unit request.
///
/// None of these escape the cache's public operations: a failing request
/// returns no unit, and the error is turned into a [`Diagnostic`] and a log
/// event instead.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The source file's timestamp could not be read.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The analyzer failed to reparse an existing unit.
    #[error("error re-parsing translation unit {path}: {source}")]
    ReparseFailed {
        /// The file whose unit was being reparsed.
        path: PathBuf,
        /// The analyzer's explanation.
        source: AnalyzerError,
    },

    /// The analyzer failed to parse a file from scratch.
    #[error("error parsing translation unit {path}: {source}")]
    ParseFailed {
        /// The file being parsed.
        path: PathBuf,
        /// The analyzer's explanation.
        source: AnalyzerError,
    },

    /// The cache was asked for a unit after it was destroyed.
    #[error("index has been destroyed; cannot parse {path}")]
    Destroyed {
        /// The requested file.
        path: PathBuf,
    },

    /// The analyzer reported a failure, or panicked, while releasing a handle.
    #[error("fault while disposing {what}: {reason}")]
    DisposeFailed {
        /// The handle being released, e.g. `translation unit a.cpp`.
        what: String,
        /// What went wrong.
        reason: String,
    },
}

impl CacheError {
    /// Converts this error into the diagnostic reported to the embedder.
    ///
    /// Codes: `E001` unreadable file, `E002` reparse failure, `E003` parse
    /// failure, `E004` use after destroy, `W001` disposal fault.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CacheError::Unreadable { path, source } => {
                Diagnostic::error(1, "cannot read source file")
                    .with_path(path)
                    .with_note(source.to_string())
            }
            CacheError::ReparseFailed { path, source } => {
                Diagnostic::error(2, "error re-parsing translation unit")
                    .with_path(path)
                    .with_note(source.to_string())
                    .with_help("the previously parsed unit is kept; request a forced reparse to retry")
            }
            CacheError::ParseFailed { path, source } => {
                Diagnostic::error(3, "error parsing translation unit")
                    .with_path(path)
                    .with_note(source.to_string())
            }
            CacheError::Destroyed { path } => {
                Diagnostic::error(4, "index has been destroyed").with_path(path)
            }
            CacheError::DisposeFailed { what, reason } => {
                Diagnostic::warning(1, format!("fault while disposing {what}")).with_note(reason)
            }
        }
    }
}
