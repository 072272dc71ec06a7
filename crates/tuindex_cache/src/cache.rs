//! The translation unit cache.
//!
//! `TranslationUnitCache` maps each source file to the parsed unit the
//! analyzer produced for it, plus the compile arguments and file timestamp
//! that unit reflects. Every request decides between three outcomes:
//!
//! - **hit**: args and timestamp are unchanged, the stored unit is returned;
//! - **reparse**: args are unchanged but the file changed (or a reparse was
//!   forced), the unit is reparsed in place;
//! - **rebuild**: there is no unit yet or the args changed, any old unit is
//!   disposed and the file is parsed from scratch.
//!
//! Failures never escape a request. They are logged, recorded in the
//! optional [`DiagnosticSink`], and the request returns `None`.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tuindex_common::{IndexResult, InternalError, WriteTime};
use tuindex_config::{IndexConfig, IndexSettings};
use tuindex_diagnostics::DiagnosticSink;

use crate::analyzer::{Analyzer, AnalyzerError, ContextOptions, GlobalOptions};
use crate::arguments::{ArgumentProvider, ConfiguredArguments};
use crate::error::CacheError;
use crate::record::{CacheRecord, OwnedContext, OwnedUnit};
use crate::unit::TranslationUnit;
use crate::unsaved::{UnsavedFiles, UnsavedFilesOverlay};

/// Verbosity at which full parses also ask the compiler for verbose output.
const COMPILER_VERBOSE_LEVEL: u8 = 2;

/// Flag appended to the parse arguments at [`COMPILER_VERBOSE_LEVEL`].
const COMPILER_VERBOSE_FLAG: &str = "-v";

/// What a request has to do to produce an up-to-date unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Hit,
    ForcedReparse,
    ChangedOnDisk,
    Rebuild,
}

/// A cache of parsed translation units in front of an [`Analyzer`].
///
/// All mutating operations take `&mut self`; the cache does no locking of
/// its own. Callers that share it between threads serialize access, e.g.
/// through [`ProcessIndex`](crate::ProcessIndex).
pub struct TranslationUnitCache<A: Analyzer> {
    analyzer: Arc<A>,
    context: Option<OwnedContext<A>>,
    provider: Option<Box<dyn ArgumentProvider>>,
    overlay: Arc<dyn UnsavedFilesOverlay>,
    diagnostics: Option<Arc<DiagnosticSink>>,
    verbosity: u8,
    records: HashMap<PathBuf, CacheRecord<A>>,
}

impl<A: Analyzer> TranslationUnitCache<A> {
    /// Creates a cache that asks `provider` for compile arguments.
    ///
    /// Fails only if the analyzer cannot allocate an index context.
    pub fn new(
        analyzer: A,
        provider: impl ArgumentProvider + 'static,
        verbosity: u8,
    ) -> IndexResult<Self> {
        Self::builder(analyzer)
            .argument_provider(provider)
            .verbosity(verbosity)
            .build()
    }

    /// Creates a cache configured from `tuindex.toml` settings, resolving
    /// compile arguments relative to the project `root`.
    pub fn from_config(analyzer: A, config: &IndexConfig, root: &Path) -> IndexResult<Self> {
        Self::builder(analyzer)
            .settings(&config.index)
            .argument_provider(ConfiguredArguments::new(root, config.arguments.clone()))
            .build()
    }

    /// Starts building a cache around `analyzer`.
    pub fn builder(analyzer: A) -> CacheBuilder<A> {
        CacheBuilder::new(analyzer)
    }

    /// Returns an up-to-date unit for `path`, parsing or reparsing as needed.
    ///
    /// Returns `None` when the file is not indexable (the argument provider
    /// returned no arguments), when its timestamp cannot be read, or when the
    /// analyzer fails. A failed reparse keeps the previous unit cached; a
    /// failed rebuild leaves the file uncached.
    pub fn get_translation_unit(
        &mut self,
        path: &Path,
        force_reparse: bool,
    ) -> Option<TranslationUnit<'_, A>> {
        let started = Instant::now();
        if self.verbosity > 0 {
            tracing::info!(path = %path.display(), "indexing");
        }

        let args = match &self.provider {
            Some(provider) => {
                let args = provider.compile_args_for(path);
                if args.is_empty() {
                    tracing::trace!(path = %path.display(), "not indexable");
                    return None;
                }
                args
            }
            None => Vec::new(),
        };

        let write_time = match WriteTime::of(path) {
            Ok(t) => t,
            Err(source) => {
                self.report(CacheError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                });
                return None;
            }
        };

        let action = match self.records.get(path) {
            None => Action::Rebuild,
            Some(record) if record.compile_args != args => Action::Rebuild,
            Some(_) if force_reparse => Action::ForcedReparse,
            Some(record) if record.is_current(&args, write_time) => Action::Hit,
            Some(_) => Action::ChangedOnDisk,
        };

        match action {
            Action::Hit => {
                self.trace(path, "index already up to date", started);
                self.lend(path)
            }
            Action::ForcedReparse | Action::ChangedOnDisk => {
                self.reparse(path, write_time, action, started)
            }
            Action::Rebuild => self.rebuild(path, args, write_time, started),
        }
    }

    /// Removes and disposes the unit for `path`. No-op if it is not cached.
    ///
    /// Any [`TranslationUnit`] for the path must be out of use, which the
    /// borrow checker enforces.
    pub fn remove_translation_unit(&mut self, path: &Path) {
        if let Some(record) = self.records.remove(path) {
            if self.verbosity > 0 {
                tracing::info!(path = %path.display(), "removing index");
            }
            self.dispose_record(record);
        }
    }

    /// Removes and disposes every cached unit.
    pub fn remove_all_translation_units(&mut self) {
        let records = std::mem::take(&mut self.records);
        for (path, record) in records {
            if self.verbosity > 0 {
                tracing::info!(path = %path.display(), "removing index");
            }
            self.dispose_record(record);
        }
    }

    /// Parses `path` ahead of its first real use if it is not cached yet.
    ///
    /// Does nothing for a cached file, even a stale one.
    pub fn prime_editor_translation_unit(&mut self, path: &Path) {
        if !self.records.contains_key(path) {
            self.get_translation_unit(path, false);
        }
    }

    /// Brings the unit for `path` up to date if it is already cached.
    ///
    /// Never creates a unit for an uncached file.
    pub fn reprime_editor_translation_unit(&mut self, path: &Path) {
        if self.records.contains_key(path) {
            self.get_translation_unit(path, false);
        }
    }

    /// Returns every cached unit as it currently stands, without checking
    /// for staleness.
    pub fn indexed_translation_units(&self) -> impl Iterator<Item = TranslationUnit<'_, A>> + '_ {
        self.records.values().map(move |record| {
            TranslationUnit::new(&record.path, record.unit.get(), &*self.overlay)
        })
    }

    /// Returns `true` if a unit for `path` is cached.
    pub fn is_indexed(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    /// Returns the compile arguments the cached unit for `path` was parsed with.
    pub fn compile_args(&self, path: &Path) -> Option<&[String]> {
        self.records.get(path).map(|r| r.compile_args.as_slice())
    }

    /// Returns the file timestamp the cached unit for `path` reflects.
    pub fn last_write_time(&self, path: &Path) -> Option<WriteTime> {
        self.records.get(path).map(|r| r.last_write_time)
    }

    /// Returns the number of cached units.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no units are cached.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the configured verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Returns the overlay of unsaved editor buffers the cache parses against.
    pub fn unsaved_files(&self) -> &Arc<dyn UnsavedFilesOverlay> {
        &self.overlay
    }

    /// Reads the analyzer's global options. Returns
    /// [`GlobalOptions::NONE`] once the cache has been destroyed.
    pub fn global_options(&self) -> GlobalOptions {
        match &self.context {
            Some(context) => self.analyzer.global_options(context.get()),
            None => GlobalOptions::NONE,
        }
    }

    /// Sets the analyzer's global options. No-op once the cache has been destroyed.
    pub fn set_global_options(&self, options: GlobalOptions) {
        if let Some(context) = &self.context {
            self.analyzer.set_global_options(context.get(), options);
        }
    }

    /// Disposes every cached unit, then the index context.
    ///
    /// Faults raised by the analyzer, including panics, are logged and
    /// swallowed so teardown always completes. Calling this more than once
    /// is harmless. Also runs on drop.
    pub fn destroy(&mut self) {
        self.remove_all_translation_units();
        if let Some(context) = self.context.take() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.dispose()));
            self.report_dispose_fault("index context", outcome);
        }
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.context.is_none()
    }

    fn reparse(
        &mut self,
        path: &Path,
        write_time: WriteTime,
        action: Action,
        started: Instant,
    ) -> Option<TranslationUnit<'_, A>> {
        if self.verbosity > 0 {
            let reason = if action == Action::ForcedReparse {
                "forced reparse"
            } else {
                "file changed on disk, reparsing"
            };
            tracing::info!(path = %path.display(), "{reason}");
        }

        let unsaved = self.overlay.current_overlay();
        let record = self.records.get_mut(path)?;
        match self.analyzer.reparse(record.unit.get_mut(), &unsaved) {
            Ok(()) => {
                record.last_write_time = write_time;
                self.trace(path, "reparsed", started);
                self.lend(path)
            }
            Err(source) => {
                self.report(CacheError::ReparseFailed {
                    path: path.to_path_buf(),
                    source,
                });
                None
            }
        }
    }

    fn rebuild(
        &mut self,
        path: &Path,
        args: Vec<String>,
        write_time: WriteTime,
        started: Instant,
    ) -> Option<TranslationUnit<'_, A>> {
        // The superseded unit goes first so a path never has two live units.
        self.remove_translation_unit(path);

        let Some(context) = &self.context else {
            self.report(CacheError::Destroyed {
                path: path.to_path_buf(),
            });
            return None;
        };

        if self.verbosity > 0 {
            tracing::info!(path = %path.display(), "creating new index");
        }

        let mut parse_args = args.clone();
        if self.verbosity >= COMPILER_VERBOSE_LEVEL {
            parse_args.push(COMPILER_VERBOSE_FLAG.to_string());
        }

        let unsaved = self.overlay.current_overlay();
        match self
            .analyzer
            .parse(context.get(), path, &parse_args, &unsaved)
        {
            Ok(unit) => {
                let record = CacheRecord {
                    path: path.to_path_buf(),
                    compile_args: args,
                    last_write_time: write_time,
                    unit: OwnedUnit::new(Arc::clone(&self.analyzer), unit),
                };
                self.records.insert(path.to_path_buf(), record);
                self.trace(path, "parsed", started);
                self.lend(path)
            }
            Err(source) => {
                self.report(CacheError::ParseFailed {
                    path: path.to_path_buf(),
                    source,
                });
                None
            }
        }
    }

    fn lend(&self, path: &Path) -> Option<TranslationUnit<'_, A>> {
        let record = self.records.get(path)?;
        Some(TranslationUnit::new(
            &record.path,
            record.unit.get(),
            &*self.overlay,
        ))
    }

    fn dispose_record(&self, record: CacheRecord<A>) {
        let CacheRecord { path, unit, .. } = record;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit.dispose()));
        self.report_dispose_fault(&format!("translation unit {}", path.display()), outcome);
    }

    fn report_dispose_fault(
        &self,
        what: &str,
        outcome: std::thread::Result<Result<(), AnalyzerError>>,
    ) {
        let reason = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.message,
            Err(payload) => panic_message(payload.as_ref()),
        };
        let err = CacheError::DisposeFailed {
            what: what.to_string(),
            reason,
        };
        tracing::warn!("{err}");
        if let Some(sink) = &self.diagnostics {
            sink.emit(err.to_diagnostic());
        }
    }

    fn report(&self, err: CacheError) {
        tracing::error!("{err}");
        if let Some(sink) = &self.diagnostics {
            sink.emit(err.to_diagnostic());
        }
    }

    fn trace(&self, path: &Path, outcome: &str, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if self.verbosity > 0 {
            tracing::info!(path = %path.display(), elapsed_ms, "{outcome}");
        } else {
            tracing::trace!(path = %path.display(), elapsed_ms, "{outcome}");
        }
    }
}

impl<A: Analyzer> Drop for TranslationUnitCache<A> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("analyzer panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("analyzer panicked: {s}")
    } else {
        "analyzer panicked".to_string()
    }
}

/// Builder for [`TranslationUnitCache`].
pub struct CacheBuilder<A: Analyzer> {
    analyzer: A,
    provider: Option<Box<dyn ArgumentProvider>>,
    overlay: Option<Arc<dyn UnsavedFilesOverlay>>,
    diagnostics: Option<Arc<DiagnosticSink>>,
    verbosity: u8,
    exclude_declarations_from_pch: bool,
    display_diagnostics: Option<bool>,
    global_options: Option<GlobalOptions>,
}

impl<A: Analyzer> CacheBuilder<A> {
    fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            provider: None,
            overlay: None,
            diagnostics: None,
            verbosity: 0,
            exclude_declarations_from_pch: false,
            display_diagnostics: None,
            global_options: None,
        }
    }

    /// Sets where compile arguments come from. Without a provider every file
    /// is parsed with no arguments.
    pub fn argument_provider(mut self, provider: impl ArgumentProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Sets the overlay of unsaved editor buffers. Defaults to an empty
    /// [`UnsavedFiles`].
    pub fn unsaved_files(mut self, overlay: Arc<dyn UnsavedFilesOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Sets the sink that receives a diagnostic for every failed request.
    pub fn diagnostics(mut self, sink: Arc<DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Sets the verbosity (0 silent, 1 trace decisions, 2+ verbose compiler).
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Lets the analyzer skip declarations from precompiled headers.
    pub fn exclude_declarations_from_pch(mut self, exclude: bool) -> Self {
        self.exclude_declarations_from_pch = exclude;
        self
    }

    /// Lets the analyzer print its own diagnostics. Defaults to `verbosity > 0`.
    pub fn display_diagnostics(mut self, display: bool) -> Self {
        self.display_diagnostics = Some(display);
        self
    }

    /// Global options applied to the index context right after it is created.
    pub fn global_options(mut self, options: GlobalOptions) -> Self {
        self.global_options = Some(options);
        self
    }

    /// Applies the `[index]` section of `tuindex.toml`.
    pub fn settings(mut self, settings: &IndexSettings) -> Self {
        self.verbosity = settings.verbosity;
        self.exclude_declarations_from_pch = settings.exclude_declarations_from_pch;
        self.display_diagnostics = Some(settings.display_diagnostics());
        if !settings.global_options.is_empty() {
            self.global_options = Some(GlobalOptions::from(settings.global_options.as_slice()));
        }
        self
    }

    /// Allocates the index context and returns the cache.
    pub fn build(self) -> IndexResult<TranslationUnitCache<A>> {
        let analyzer = Arc::new(self.analyzer);
        let options = ContextOptions {
            exclude_declarations_from_pch: self.exclude_declarations_from_pch,
            display_diagnostics: self.display_diagnostics.unwrap_or(self.verbosity > 0),
        };
        let context = analyzer.create_context(options).map_err(|e| {
            InternalError::new(format!("analyzer could not create an index context: {e}"))
        })?;
        let context = OwnedContext::new(Arc::clone(&analyzer), context);
        if let Some(global) = self.global_options {
            analyzer.set_global_options(context.get(), global);
        }

        Ok(TranslationUnitCache {
            analyzer,
            context: Some(context),
            provider: self.provider,
            overlay: self
                .overlay
                .unwrap_or_else(|| Arc::new(UnsavedFiles::new())),
            diagnostics: self.diagnostics,
            verbosity: self.verbosity,
            records: HashMap::new(),
        })
    }
}
