//! The process-wide translation unit index.
//!
//! Editors keep one index for the whole session. `ProcessIndex` is meant to
//! live in a `static`, and statics are never dropped, so by default the cache
//! and its analyzer context are leaked at exit rather than torn down. This is
//! deliberate: some analyzers (libclang among them) have been seen to crash
//! when disposing translation units while the process is shutting down. An
//! application that needs the cleanup anyway calls [`ProcessIndex::shutdown`]
//! with [`ShutdownPolicy::Dispose`].
//!
//! ```ignore
//! static INDEX: ProcessIndex<LibClang> = ProcessIndex::new();
//!
//! let mut index = INDEX.get_or_try_init(|| TranslationUnitCache::from_config(clang, &config, root))?;
//! index.prime_editor_translation_unit(path);
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tuindex_common::{IndexResult, InternalError};
use tuindex_config::ShutdownPolicy;

use crate::analyzer::Analyzer;
use crate::cache::TranslationUnitCache;

/// A lazily created, process-lifetime [`TranslationUnitCache`].
///
/// Access is serialized through a mutex, which satisfies the cache's
/// single-writer requirement when several threads issue requests.
pub struct ProcessIndex<A: Analyzer> {
    slot: OnceLock<Mutex<TranslationUnitCache<A>>>,
}

impl<A: Analyzer> ProcessIndex<A> {
    /// Creates an empty slot. Usable in `static` initializers.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Returns the index, creating it with `init` on first use.
    ///
    /// If `init` fails the slot stays empty and a later call may try again.
    pub fn get_or_try_init(
        &self,
        init: impl FnOnce() -> IndexResult<TranslationUnitCache<A>>,
    ) -> IndexResult<MutexGuard<'_, TranslationUnitCache<A>>> {
        if let Some(index) = self.slot.get() {
            return Ok(lock(index));
        }
        let cache = init()?;
        // Losing a race here drops our cache and uses the winner's.
        let _ = self.slot.set(Mutex::new(cache));
        self.slot
            .get()
            .map(lock)
            .ok_or_else(|| InternalError::new("process index slot empty after initialization"))
    }

    /// Returns the index if it has been created.
    pub fn get(&self) -> Option<MutexGuard<'_, TranslationUnitCache<A>>> {
        self.slot.get().map(lock)
    }

    /// Returns `true` once the index has been created.
    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Applies the shutdown policy: with [`ShutdownPolicy::Dispose`] every
    /// unit and the analyzer context are disposed now; with
    /// [`ShutdownPolicy::Leak`] they are left for the operating system.
    ///
    /// Returns `true` if anything was disposed.
    pub fn shutdown(&self, policy: ShutdownPolicy) -> bool {
        let Some(index) = self.slot.get() else {
            return false;
        };
        match policy {
            ShutdownPolicy::Leak => {
                tracing::debug!("leaving process index alive until exit");
                false
            }
            ShutdownPolicy::Dispose => {
                let mut cache = lock(index);
                let disposed = !cache.is_destroyed();
                cache.destroy();
                disposed
            }
        }
    }
}

impl<A: Analyzer> Default for ProcessIndex<A> {
    fn default() -> Self {
        Self::new()
    }
}

// A request that panicked mid-way leaves the cache consistent: records are
// only installed or updated after the analyzer call returns.
fn lock<A: Analyzer>(
    index: &Mutex<TranslationUnitCache<A>>,
) -> MutexGuard<'_, TranslationUnitCache<A>> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}
