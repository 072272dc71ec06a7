//! Borrowed handles to cached translation units.

use std::fmt;
use std::path::Path;

use crate::analyzer::Analyzer;
use crate::unsaved::{UnsavedFile, UnsavedFilesOverlay};

/// A parsed translation unit lent out by the cache, together with the
/// unsaved-files overlay queries against it must see.
///
/// The handle borrows the cache, so the unit cannot be disposed (by removal,
/// rebuild, or teardown) while the handle is alive.
pub struct TranslationUnit<'a, A: Analyzer> {
    path: &'a Path,
    unit: &'a A::Unit,
    overlay: &'a dyn UnsavedFilesOverlay,
}

impl<'a, A: Analyzer> TranslationUnit<'a, A> {
    pub(crate) fn new(
        path: &'a Path,
        unit: &'a A::Unit,
        overlay: &'a dyn UnsavedFilesOverlay,
    ) -> Self {
        Self {
            path,
            unit,
            overlay,
        }
    }

    /// The file this unit was parsed from.
    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// The analyzer's parsed unit, for read-only queries.
    pub fn unit(&self) -> &'a A::Unit {
        self.unit
    }

    /// The current unsaved editor buffers, fetched from the live overlay.
    pub fn unsaved_files(&self) -> Vec<UnsavedFile> {
        self.overlay.current_overlay()
    }

    /// Runs a query against the unit with the current unsaved buffers.
    ///
    /// Completion and similar queries need both; this saves the caller a
    /// second trip to the overlay.
    pub fn with_unit<R>(&self, query: impl FnOnce(&A::Unit, &[UnsavedFile]) -> R) -> R {
        let unsaved = self.overlay.current_overlay();
        query(self.unit, &unsaved)
    }
}

impl<A: Analyzer> Clone for TranslationUnit<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: Analyzer> Copy for TranslationUnit<'_, A> {}

impl<A: Analyzer> fmt::Debug for TranslationUnit<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
