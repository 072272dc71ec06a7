//! Per-file compile argument resolution.

use crate::types::ArgumentsConfig;
use std::path::Path;
use tuindex_common::is_source_file;

/// Resolves the compile arguments for `path` under the project rooted at `root`.
///
/// Returns an empty list when the file must not be indexed: it is not a
/// C-family source file, it is listed in `exclude`, or no arguments are
/// configured for it at all. Otherwise the result is the `default` arguments,
/// then the arguments for the file's extension, then its per-file arguments.
pub fn resolve_compile_args(config: &ArgumentsConfig, root: &Path, path: &Path) -> Vec<String> {
    if !is_source_file(path) {
        return Vec::new();
    }

    let relative = relative_key(root, path);
    if config.exclude.contains(&relative) {
        return Vec::new();
    }

    let mut args = config.default.clone();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    if let Some(extra) = ext.and_then(|e| config.extensions.get(&e)) {
        args.extend(extra.iter().cloned());
    }
    if let Some(extra) = config.files.get(&relative) {
        args.extend(extra.iter().cloned());
    }
    args
}

/// The `/`-separated path of `path` relative to `root`, or `path` itself when
/// it lies outside the root.
fn relative_key(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
