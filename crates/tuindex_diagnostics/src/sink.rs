//! Thread-safe diagnostic accumulator shared between the index and its embedder.

use crate::diagnostic::Diagnostic;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe accumulator for diagnostics emitted while indexing.
///
/// The index emits from whichever thread drives it while the embedder drains
/// from another, via [`emit`](Self::emit) and [`take_all`](Self::take_all).
/// The error count is tracked atomically for fast `has_errors` checks without
/// locking the diagnostic vector.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    ///
    /// If the diagnostic has [`Severity::Error`](crate::Severity::Error), the error count is incremented atomically.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.lock().push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Returns a snapshot of the diagnostics concerning `path`.
    pub fn diagnostics_for(&self, path: &Path) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.path.as_deref() == Some(path))
            .cloned()
            .collect()
    }

    // A panic while holding the lock cannot leave the vector half-written,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_error() -> Diagnostic {
        Diagnostic::error(3, "failed to parse translation unit").with_path("a.cpp")
    }

    fn make_warning() -> Diagnostic {
        Diagnostic::warning(1, "fault while disposing unit")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn emit_error() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn emit_warning_not_error() {
        let sink = DiagnosticSink::new();
        sink.emit(make_warning());
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        sink.emit(make_warning());
        let all = sink.take_all();
        assert_eq!(all.len(), 2);
        assert!(sink.take_all().is_empty());
        // the counter survives draining
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn diagnostics_for_filters_by_path() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        sink.emit(make_warning());
        sink.emit(Diagnostic::error(1, "cannot read file").with_path("b.cpp"));
        let for_a = sink.diagnostics_for(Path::new("a.cpp"));
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].code.number, 3);
        assert_eq!(sink.diagnostics().len(), 3);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    sink.emit(make_error());
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.error_count(), 200);
        assert_eq!(sink.diagnostics().len(), 200);
    }
}
