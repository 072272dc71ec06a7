//! Structured diagnostic messages with severity, code, and the affected file.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A structured diagnostic message about one indexing request.
///
/// Each diagnostic includes:
/// - A severity level and unique code
/// - A primary message and, when known, the file it concerns
/// - Optional notes (e.g. the analyzer's own explanation) and help text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic. Its prefix always
    /// agrees with `severity`.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The source file the diagnostic concerns, if any.
    pub path: Option<PathBuf>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and message.
    pub fn error(number: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, number, message)
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(number: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, number, message)
    }

    fn new(severity: Severity, number: u16, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: DiagnosticCode::new(severity, number),
            message: message.into(),
            path: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Attaches the file this diagnostic concerns.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

/// Renders the diagnostic in a compact, rustc-like multi-line form:
///
/// ```text
/// error[E003]: failed to parse translation unit
///   --> src/main.cpp
///    = note: unknown argument '-fbogus'
/// ```
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(path) = &self.path {
            write!(f, "\n  --> {}", path.display())?;
        }
        for note in &self.notes {
            write!(f, "\n   = note: {note}")?;
        }
        for help in &self.help {
            write!(f, "\n   = help: {help}")?;
        }
        Ok(())
    }
}
