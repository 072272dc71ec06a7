//! Classification of C-family source files by extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The kind of C-family file a path refers to, judged by its extension.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SourceKind {
    /// A C or C++ header (`.h`, `.hh`, `.hpp`).
    Header,
    /// A C source file (`.c`).
    C,
    /// A C++ source file (`.cc`, `.cpp`).
    Cpp,
    /// An Objective-C or Objective-C++ source file (`.m`, `.mm`).
    ObjC,
}

impl SourceKind {
    /// Classifies a path by its extension, ignoring case.
    ///
    /// Returns `None` for anything the analyzer should not be asked to index.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "h" | "hh" | "hpp" => Some(SourceKind::Header),
            "c" => Some(SourceKind::C),
            "cc" | "cpp" => Some(SourceKind::Cpp),
            "m" | "mm" => Some(SourceKind::ObjC),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Header => write!(f, "header"),
            SourceKind::C => write!(f, "c"),
            SourceKind::Cpp => write!(f, "c++"),
            SourceKind::ObjC => write!(f, "objective-c"),
        }
    }
}

/// Returns `true` if `path` has a C-family source or header extension.
pub fn is_source_file(path: &Path) -> bool {
    SourceKind::from_path(path).is_some()
}
