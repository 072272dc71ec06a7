//! Stable codes identifying each kind of indexing diagnostic.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A diagnostic code: the severity's prefix letter and a number.
///
/// Displayed zero-padded to three digits, e.g. `E002` for a reparse failure
/// or `W001` for a disposal fault. Warning and error numbers are independent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Severity the code is reported with; supplies the prefix.
    pub severity: Severity,
    /// The number within that severity.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(severity: Severity, number: u16) -> Self {
        Self { severity, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.severity.code_prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::new(Severity::Error, 2).to_string(), "E002");
        assert_eq!(DiagnosticCode::new(Severity::Warning, 1).to_string(), "W001");
        assert_eq!(DiagnosticCode::new(Severity::Warning, 42).to_string(), "W042");
    }

    #[test]
    fn same_number_differs_by_severity() {
        assert_ne!(
            DiagnosticCode::new(Severity::Error, 1),
            DiagnosticCode::new(Severity::Warning, 1)
        );
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Severity::Error, 3);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
