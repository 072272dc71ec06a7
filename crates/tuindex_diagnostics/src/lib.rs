//! Out-of-band diagnostics for the translation unit index.
//!
//! Index operations never fail loudly: a file that cannot be read or parsed
//! yields an empty result. The reason is recorded as a structured
//! [`Diagnostic`] in a thread-safe [`DiagnosticSink`] that the embedding
//! application can drain and show to the user.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::DiagnosticCode;
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
