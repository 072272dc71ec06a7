//! Sources of per-file compile arguments.

use std::path::{Path, PathBuf};

use tuindex_config::{resolve_compile_args, ArgumentsConfig};

/// Supplies the ordered compiler flags to parse a file with.
///
/// An empty list means "do not index this file"; the cache treats it as a
/// silent, non-error early return.
pub trait ArgumentProvider: Send + Sync {
    /// Returns the compile arguments for `path`.
    fn compile_args_for(&self, path: &Path) -> Vec<String>;
}

impl<F> ArgumentProvider for F
where
    F: Fn(&Path) -> Vec<String> + Send + Sync,
{
    fn compile_args_for(&self, path: &Path) -> Vec<String> {
        self(path)
    }
}

/// An [`ArgumentProvider`] driven by the `[arguments]` section of `tuindex.toml`.
#[derive(Debug, Clone)]
pub struct ConfiguredArguments {
    root: PathBuf,
    config: ArgumentsConfig,
}

impl ConfiguredArguments {
    /// Creates a provider resolving paths relative to the project `root`.
    pub fn new(root: impl Into<PathBuf>, config: ArgumentsConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }
}

impl ArgumentProvider for ConfiguredArguments {
    fn compile_args_for(&self, path: &Path) -> Vec<String> {
        resolve_compile_args(&self.config, &self.root, path)
    }
}
