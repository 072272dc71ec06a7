//! How serious a reported indexing problem is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a diagnostic.
///
/// Index requests either recover from a problem or give up on the file, so
/// there are only two levels. `Warning < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A problem that was recovered from, such as a fault while disposing a unit.
    Warning,
    /// A problem that left a file without an up-to-date parsed unit.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// The letter that starts every diagnostic code of this severity.
    pub fn code_prefix(self) -> char {
        match self {
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_is_less_severe() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn code_prefixes() {
        assert_eq!(Severity::Error.code_prefix(), 'E');
        assert_eq!(Severity::Warning.code_prefix(), 'W');
    }

    #[test]
    fn display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
