//! Common result and error types for the tuindex workspace.

/// The standard result type for fallible operations that can only fail on
/// unrecoverable conditions.
///
/// `Err` indicates something the caller cannot reasonably recover from, such
/// as the analyzer refusing to allocate an index context. Per-file failures
/// (unreadable sources, parse errors) are never reported this way; they are
/// surfaced through diagnostics and an empty result instead.
pub type IndexResult<T> = Result<T, InternalError>;

/// An unrecoverable error raised while setting up or driving the index.
#[derive(Debug, thiserror::Error)]
#[error("internal index error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
