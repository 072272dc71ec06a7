//! The contract the cache needs from the external C-family analyzer.
//!
//! The analyzer parses a source file plus compiler flags into an opaque
//! in-memory unit. Handles are opaque to the cache: it only creates them
//! through [`Analyzer::create_context`] and [`Analyzer::parse`], mutates them
//! through [`Analyzer::reparse`], and hands each one back exactly once to the
//! matching dispose call.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

use tuindex_config::GlobalOption;

use crate::unsaved::UnsavedFile;

/// A failure reported by the analyzer, with its human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AnalyzerError {
    /// What the analyzer said went wrong.
    pub message: String,
}

impl AnalyzerError {
    /// Creates a new analyzer error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Flags used to create the index context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Skip declarations that come from a precompiled header.
    pub exclude_declarations_from_pch: bool,
    /// Let the analyzer print its own diagnostics.
    pub display_diagnostics: bool,
}

/// Thread-priority bits applied to the index context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlobalOptions(u32);

impl GlobalOptions {
    /// No special options.
    pub const NONE: Self = Self(0x0);
    /// Background priority for indexing threads.
    pub const THREAD_BACKGROUND_PRIORITY_FOR_INDEXING: Self = Self(0x1);
    /// Background priority for editing threads (parse, reparse, completion).
    pub const THREAD_BACKGROUND_PRIORITY_FOR_EDITING: Self = Self(0x2);
    /// Background priority for every thread.
    pub const THREAD_BACKGROUND_PRIORITY_FOR_ALL: Self = Self(0x3);

    /// Creates options from raw analyzer bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw analyzer bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GlobalOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GlobalOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<&[GlobalOption]> for GlobalOptions {
    fn from(options: &[GlobalOption]) -> Self {
        options.iter().fold(Self::NONE, |acc, opt| {
            acc | match opt {
                GlobalOption::BackgroundIndexing => Self::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING,
                GlobalOption::BackgroundEditing => Self::THREAD_BACKGROUND_PRIORITY_FOR_EDITING,
            }
        })
    }
}

impl fmt::Debug for GlobalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalOptions({:#x})", self.0)
    }
}

/// An external analyzer the cache drives.
///
/// Implementations wrap a foreign library; none of the operations are
/// expected to be idempotent. The cache guarantees that every `Context` and
/// `Unit` it obtains is passed to the corresponding dispose method exactly
/// once and never used afterwards.
pub trait Analyzer {
    /// The per-process index context every parse runs in.
    type Context;
    /// A parsed translation unit.
    type Unit;

    /// Allocates the index context. Failure is unrecoverable for the cache.
    fn create_context(&self, options: ContextOptions) -> Result<Self::Context, AnalyzerError>;

    /// Parses `path` from scratch with `args`, reading editor buffers from
    /// `unsaved` instead of disk where present.
    fn parse(
        &self,
        context: &Self::Context,
        path: &Path,
        args: &[String],
        unsaved: &[UnsavedFile],
    ) -> Result<Self::Unit, AnalyzerError>;

    /// Reparses `unit` in place against the current files and `unsaved`.
    fn reparse(&self, unit: &mut Self::Unit, unsaved: &[UnsavedFile]) -> Result<(), AnalyzerError>;

    /// Releases a parsed unit.
    fn dispose_unit(&self, unit: Self::Unit) -> Result<(), AnalyzerError>;

    /// Releases the index context. Called after every unit has been disposed.
    fn dispose_context(&self, context: Self::Context) -> Result<(), AnalyzerError>;

    /// Reads the global options of the context.
    fn global_options(&self, context: &Self::Context) -> GlobalOptions;

    /// Replaces the global options of the context.
    fn set_global_options(&self, context: &Self::Context, options: GlobalOptions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_union_of_indexing_and_editing() {
        let both = GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING
            | GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_EDITING;
        assert_eq!(both, GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_ALL);
        assert!(both.contains(GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_EDITING));
        assert!(!GlobalOptions::NONE.contains(GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING));
    }

    #[test]
    fn from_config_names() {
        let opts = GlobalOptions::from(&[GlobalOption::BackgroundEditing][..]);
        assert_eq!(opts.bits(), 0x2);
        assert_eq!(GlobalOptions::from(&[][..]), GlobalOptions::NONE);
    }

    #[test]
    fn bitor_assign() {
        let mut opts = GlobalOptions::NONE;
        opts |= GlobalOptions::from_bits(0x1);
        assert_eq!(opts, GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING);
    }

    #[test]
    fn debug_shows_hex() {
        assert_eq!(format!("{:?}", GlobalOptions::from_bits(3)), "GlobalOptions(0x3)");
    }

    #[test]
    fn analyzer_error_display() {
        assert_eq!(AnalyzerError::new("crashed").to_string(), "crashed");
    }
}
