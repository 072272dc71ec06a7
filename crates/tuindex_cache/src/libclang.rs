//! An [`Analyzer`] backed by a dynamically loaded `libclang`.
//!
//! Only the handful of entry points the cache needs are resolved. The
//! library stays loaded for as long as the [`LibClang`] value lives, which
//! is at least as long as every index and unit created through it because
//! the cache holds the analyzer in an `Arc` shared with its handles.

use std::ffi::{c_char, c_int, c_uint, c_ulong, c_void, CString, OsStr};
use std::path::Path;
use std::ptr::NonNull;

use libloading::Library;

use crate::analyzer::{Analyzer, AnalyzerError, ContextOptions, GlobalOptions};
use crate::unsaved::UnsavedFile;

/// Library names tried by [`LibClang::load_default`], in order.
#[cfg(target_os = "macos")]
const DEFAULT_NAMES: &[&str] = &["libclang.dylib"];
#[cfg(target_os = "windows")]
const DEFAULT_NAMES: &[&str] = &["libclang.dll"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_NAMES: &[&str] = &["libclang.so", "libclang.so.1"];

#[repr(C)]
struct CXUnsavedFile {
    filename: *const c_char,
    contents: *const c_char,
    length: c_ulong,
}

type CreateIndexFn = unsafe extern "C" fn(c_int, c_int) -> *mut c_void;
type DisposeIndexFn = unsafe extern "C" fn(*mut c_void);
type GetGlobalOptionsFn = unsafe extern "C" fn(*mut c_void) -> c_uint;
type SetGlobalOptionsFn = unsafe extern "C" fn(*mut c_void, c_uint);
type DefaultEditingOptionsFn = unsafe extern "C" fn() -> c_uint;
type ParseFn = unsafe extern "C" fn(
    *mut c_void,
    *const c_char,
    *const *const c_char,
    c_int,
    *mut CXUnsavedFile,
    c_uint,
    c_uint,
) -> *mut c_void;
type DefaultReparseOptionsFn = unsafe extern "C" fn(*mut c_void) -> c_uint;
type ReparseFn = unsafe extern "C" fn(*mut c_void, c_uint, *mut CXUnsavedFile, c_uint) -> c_int;
type DisposeUnitFn = unsafe extern "C" fn(*mut c_void);

struct Functions {
    create_index: CreateIndexFn,
    dispose_index: DisposeIndexFn,
    get_global_options: GetGlobalOptionsFn,
    set_global_options: SetGlobalOptionsFn,
    default_editing_options: DefaultEditingOptionsFn,
    parse: ParseFn,
    default_reparse_options: DefaultReparseOptionsFn,
    reparse: ReparseFn,
    dispose_unit: DisposeUnitFn,
}

/// A `CXIndex`.
pub struct ClangIndex(NonNull<c_void>);

/// A `CXTranslationUnit`.
pub struct ClangUnit(NonNull<c_void>);

impl ClangUnit {
    /// The raw `CXTranslationUnit`, for running queries through other bindings.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// libclang handles may move between threads as long as each one is used by
// a single thread at a time, which `&mut` access through the cache ensures.
unsafe impl Send for ClangIndex {}
unsafe impl Send for ClangUnit {}

/// The libclang analyzer.
pub struct LibClang {
    fns: Functions,
    // Must outlive every function pointer in `fns`.
    _library: Library,
}

impl LibClang {
    /// Loads libclang from `path` (a file path or a bare library name).
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        // SAFETY: loading libclang runs no initialization with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            AnalyzerError::new(format!("cannot load {}: {e}", path.to_string_lossy()))
        })?;
        // SAFETY: each symbol is declared with its C signature from clang-c/Index.h.
        let fns = unsafe {
            Functions {
                create_index: symbol(&library, b"clang_createIndex\0")?,
                dispose_index: symbol(&library, b"clang_disposeIndex\0")?,
                get_global_options: symbol(&library, b"clang_CXIndex_getGlobalOptions\0")?,
                set_global_options: symbol(&library, b"clang_CXIndex_setGlobalOptions\0")?,
                default_editing_options: symbol(
                    &library,
                    b"clang_defaultEditingTranslationUnitOptions\0",
                )?,
                parse: symbol(&library, b"clang_parseTranslationUnit\0")?,
                default_reparse_options: symbol(&library, b"clang_defaultReparseOptions\0")?,
                reparse: symbol(&library, b"clang_reparseTranslationUnit\0")?,
                dispose_unit: symbol(&library, b"clang_disposeTranslationUnit\0")?,
            }
        };
        tracing::debug!(library = %path.to_string_lossy(), "loaded libclang");
        Ok(Self {
            fns,
            _library: library,
        })
    }

    /// Loads libclang by its platform default name.
    pub fn load_default() -> Result<Self, AnalyzerError> {
        let mut last_err = AnalyzerError::new("no libclang library names to try");
        for name in DEFAULT_NAMES {
            match Self::load(name) {
                Ok(clang) => return Ok(clang),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T, AnalyzerError> {
    library.get::<T>(name).map(|s| *s).map_err(|e| {
        let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        AnalyzerError::new(format!("libclang lacks {printable}: {e}"))
    })
}

/// C views of the unsaved buffers; the owned strings keep the pointers valid.
struct UnsavedArray {
    _names: Vec<CString>,
    files: Vec<CXUnsavedFile>,
}

impl UnsavedArray {
    fn new(unsaved: &[UnsavedFile]) -> Result<Self, AnalyzerError> {
        let names = unsaved
            .iter()
            .map(|f| path_to_cstring(&f.path))
            .collect::<Result<Vec<_>, _>>()?;
        let files = names
            .iter()
            .zip(unsaved)
            .map(|(name, f)| CXUnsavedFile {
                filename: name.as_ptr(),
                contents: f.contents.as_ptr().cast(),
                length: f.contents.len() as c_ulong,
            })
            .collect();
        Ok(Self {
            _names: names,
            files,
        })
    }

    fn len(&self) -> c_uint {
        self.files.len() as c_uint
    }

    fn as_mut_ptr(&mut self) -> *mut CXUnsavedFile {
        if self.files.is_empty() {
            std::ptr::null_mut()
        } else {
            self.files.as_mut_ptr()
        }
    }
}

fn path_to_cstring(path: &Path) -> Result<CString, AnalyzerError> {
    let s = path
        .to_str()
        .ok_or_else(|| AnalyzerError::new(format!("path is not UTF-8: {}", path.display())))?;
    CString::new(s).map_err(|_| AnalyzerError::new(format!("path contains NUL: {s}")))
}

impl Analyzer for LibClang {
    type Context = ClangIndex;
    type Unit = ClangUnit;

    fn create_context(&self, options: ContextOptions) -> Result<ClangIndex, AnalyzerError> {
        // SAFETY: plain integer arguments.
        let raw = unsafe {
            (self.fns.create_index)(
                c_int::from(options.exclude_declarations_from_pch),
                c_int::from(options.display_diagnostics),
            )
        };
        NonNull::new(raw)
            .map(ClangIndex)
            .ok_or_else(|| AnalyzerError::new("clang_createIndex returned null"))
    }

    fn parse(
        &self,
        context: &ClangIndex,
        path: &Path,
        args: &[String],
        unsaved: &[UnsavedFile],
    ) -> Result<ClangUnit, AnalyzerError> {
        let filename = path_to_cstring(path)?;
        let args = args
            .iter()
            .map(|a| {
                CString::new(a.as_str())
                    .map_err(|_| AnalyzerError::new(format!("argument contains NUL: {a}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let arg_ptrs: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();
        let mut unsaved = UnsavedArray::new(unsaved)?;

        // SAFETY: every pointer refers to a live local for the duration of the call.
        let raw = unsafe {
            (self.fns.parse)(
                context.0.as_ptr(),
                filename.as_ptr(),
                arg_ptrs.as_ptr(),
                arg_ptrs.len() as c_int,
                unsaved.as_mut_ptr(),
                unsaved.len(),
                (self.fns.default_editing_options)(),
            )
        };
        NonNull::new(raw).map(ClangUnit).ok_or_else(|| {
            AnalyzerError::new(format!(
                "clang_parseTranslationUnit returned null for {}",
                path.display()
            ))
        })
    }

    fn reparse(&self, unit: &mut ClangUnit, unsaved: &[UnsavedFile]) -> Result<(), AnalyzerError> {
        let mut unsaved = UnsavedArray::new(unsaved)?;
        // SAFETY: the unit is live and exclusively borrowed; the overlay array
        // outlives the call.
        let code = unsafe {
            let options = (self.fns.default_reparse_options)(unit.as_ptr());
            (self.fns.reparse)(unit.as_ptr(), unsaved.len(), unsaved.as_mut_ptr(), options)
        };
        if code == 0 {
            Ok(())
        } else {
            Err(AnalyzerError::new(format!(
                "clang_reparseTranslationUnit failed with code {code}"
            )))
        }
    }

    fn dispose_unit(&self, unit: ClangUnit) -> Result<(), AnalyzerError> {
        // SAFETY: the cache hands each unit back exactly once.
        unsafe { (self.fns.dispose_unit)(unit.as_ptr()) };
        Ok(())
    }

    fn dispose_context(&self, context: ClangIndex) -> Result<(), AnalyzerError> {
        // SAFETY: called once, after every unit of this index was disposed.
        unsafe { (self.fns.dispose_index)(context.0.as_ptr()) };
        Ok(())
    }

    fn global_options(&self, context: &ClangIndex) -> GlobalOptions {
        // SAFETY: the index is live.
        GlobalOptions::from_bits(unsafe { (self.fns.get_global_options)(context.0.as_ptr()) })
    }

    fn set_global_options(&self, context: &ClangIndex, options: GlobalOptions) {
        // SAFETY: the index is live.
        unsafe { (self.fns.set_global_options)(context.0.as_ptr(), options.bits()) }
    }
}
