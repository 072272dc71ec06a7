//! Owned analyzer handles and the per-file cache record.
//!
//! [`OwnedUnit`] and [`OwnedContext`] pair a foreign handle with the analyzer
//! that created it. Each hands its handle back to the analyzer exactly once:
//! either explicitly through `dispose`, which reports the analyzer's answer,
//! or on drop, which can only log it.

use std::path::PathBuf;
use std::sync::Arc;

use tuindex_common::WriteTime;

use crate::analyzer::{Analyzer, AnalyzerError};

/// A parsed unit owned by the cache.
pub struct OwnedUnit<A: Analyzer> {
    analyzer: Arc<A>,
    unit: Option<A::Unit>,
}

impl<A: Analyzer> OwnedUnit<A> {
    /// Takes ownership of `unit`, which must have been created by `analyzer`.
    pub fn new(analyzer: Arc<A>, unit: A::Unit) -> Self {
        Self {
            analyzer,
            unit: Some(unit),
        }
    }

    /// Returns the parsed unit.
    pub fn get(&self) -> &A::Unit {
        // Only `dispose` and `drop` take the unit, and both consume `self`.
        self.unit.as_ref().unwrap_or_else(|| unreachable!("unit used after dispose"))
    }

    /// Returns the parsed unit for in-place reparsing.
    pub fn get_mut(&mut self) -> &mut A::Unit {
        self.unit.as_mut().unwrap_or_else(|| unreachable!("unit used after dispose"))
    }

    /// Releases the unit and returns the analyzer's answer.
    pub fn dispose(mut self) -> Result<(), AnalyzerError> {
        match self.unit.take() {
            Some(unit) => self.analyzer.dispose_unit(unit),
            None => Ok(()),
        }
    }
}

impl<A: Analyzer> Drop for OwnedUnit<A> {
    fn drop(&mut self) {
        if let Some(unit) = self.unit.take() {
            if let Err(e) = self.analyzer.dispose_unit(unit) {
                tracing::warn!(error = %e, "fault while disposing translation unit");
            }
        }
    }
}

/// The index context owned by the cache.
pub struct OwnedContext<A: Analyzer> {
    analyzer: Arc<A>,
    context: Option<A::Context>,
}

impl<A: Analyzer> OwnedContext<A> {
    /// Takes ownership of `context`, which must have been created by `analyzer`.
    pub fn new(analyzer: Arc<A>, context: A::Context) -> Self {
        Self {
            analyzer,
            context: Some(context),
        }
    }

    /// Returns the context handle.
    pub fn get(&self) -> &A::Context {
        self.context
            .as_ref()
            .unwrap_or_else(|| unreachable!("context used after dispose"))
    }

    /// Releases the context and returns the analyzer's answer.
    pub fn dispose(mut self) -> Result<(), AnalyzerError> {
        match self.context.take() {
            Some(context) => self.analyzer.dispose_context(context),
            None => Ok(()),
        }
    }
}

impl<A: Analyzer> Drop for OwnedContext<A> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = self.analyzer.dispose_context(context) {
                tracing::warn!(error = %e, "fault while disposing index context");
            }
        }
    }
}

/// Everything the cache remembers about one indexed file.
///
/// `compile_args` and `last_write_time` are the inputs the unit was last
/// brought up to date with. The args identify the unit: a change forces a
/// full rebuild, while a timestamp change only needs a reparse.
pub struct CacheRecord<A: Analyzer> {
    /// The indexed file.
    pub path: PathBuf,
    /// Arguments the unit was parsed with, in order.
    pub compile_args: Vec<String>,
    /// The file's timestamp when the unit was last parsed or reparsed.
    pub last_write_time: WriteTime,
    /// The parsed unit.
    pub unit: OwnedUnit<A>,
}

impl<A: Analyzer> CacheRecord<A> {
    /// Returns `true` if the record can be served without asking the analyzer.
    pub fn is_current(&self, args: &[String], write_time: WriteTime) -> bool {
        self.compile_args == args && self.last_write_time == write_time
    }
}
