//! Native library discovery and loading
//!
//! The engine library is located and loaded once per process. The outcome,
//! success or failure, is recorded in a `OnceLock` and every later caller
//! consults it instead of resolving the library again.

use std::ffi::{CStr, OsStr};
use std::fmt;
use std::os::raw::{c_int, c_uint};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use libloading::Library;

use super::{
    CsCloseFn, CsDisasmExFn, CsErrnoFn, CsFreeFn, CsInsnNameFn, CsOpCountFn, CsOpIndexFn, CsOpenFn,
    CsOptionFn, CsRegNameFn, CsStrerrorFn, CsSupportFn, CsVersionFn,
};
use crate::error::{Error, Result};

/// Environment variable holding an explicit path to the engine library.
pub const LIB_PATH_ENV: &str = "CAPSTONE_LIB";

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["capstone.dll", "libcapstone.dll"];
#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &["libcapstone.dylib", "libcapstone.2.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CANDIDATES: &[&str] = &["libcapstone.so", "libcapstone.so.2"];

static NATIVE: OnceLock<std::result::Result<NativeApi, String>> = OnceLock::new();

/// Resolved entry points of one loaded engine library.
///
/// The function pointers stay valid for as long as `library` is alive; a
/// table handed out by [`init`] lives for the rest of the process.
pub struct NativeApi {
    pub(crate) library: Option<Library>,
    pub cs_open: CsOpenFn,
    pub cs_disasm_ex: CsDisasmExFn,
    pub cs_free: CsFreeFn,
    pub cs_close: CsCloseFn,
    pub cs_reg_name: CsRegNameFn,
    pub cs_insn_name: CsInsnNameFn,
    /// Declared for completeness; operand queries run on copied records.
    pub cs_op_count: CsOpCountFn,
    /// Declared for completeness; operand queries run on copied records.
    pub cs_op_index: CsOpIndexFn,
    pub cs_errno: CsErrnoFn,
    pub cs_option: CsOptionFn,
    pub cs_version: CsVersionFn,
    pub cs_support: CsSupportFn,
    pub cs_strerror: CsStrerrorFn,
}

impl NativeApi {
    /// Load the engine library at `path` and resolve every entry point.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path) }.map_err(|e| {
            Error::LibraryLoad(format!("{}: {}", Path::new(path).display(), e))
        })?;

        // SAFETY: the signatures below are the 2.1 C prototypes; the symbols
        // are copied out as plain fn pointers and `library` is kept alongside.
        unsafe {
            Ok(Self {
                cs_open: symbol(&library, b"cs_open\0")?,
                cs_disasm_ex: symbol(&library, b"cs_disasm_ex\0")?,
                cs_free: symbol(&library, b"cs_free\0")?,
                cs_close: symbol(&library, b"cs_close\0")?,
                cs_reg_name: symbol(&library, b"cs_reg_name\0")?,
                cs_insn_name: symbol(&library, b"cs_insn_name\0")?,
                cs_op_count: symbol(&library, b"cs_op_count\0")?,
                cs_op_index: symbol(&library, b"cs_op_index\0")?,
                cs_errno: symbol(&library, b"cs_errno\0")?,
                cs_option: symbol(&library, b"cs_option\0")?,
                cs_version: symbol(&library, b"cs_version\0")?,
                cs_support: symbol(&library, b"cs_support\0")?,
                cs_strerror: symbol(&library, b"cs_strerror\0")?,
                library: Some(library),
            })
        }
    }

    /// Native `(major, minor, combined)` version of the engine.
    pub fn version(&self) -> (i32, i32, i32) {
        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        let combined = unsafe { (self.cs_version)(&mut major, &mut minor) };
        (major, minor, combined)
    }

    /// Raw `cs_support()` query.
    pub fn support(&self, query: c_uint) -> bool {
        unsafe { (self.cs_support)(query as c_int) }
    }

    /// The engine's own message for a status code.
    pub fn strerror(&self, code: c_int) -> String {
        let ptr = unsafe { (self.cs_strerror)(code) };
        if ptr.is_null() {
            return format!("unknown error code {code}");
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    /// Whether this table came from a real shared object.
    pub fn is_loaded_library(&self) -> bool {
        self.library.is_some()
    }
}

impl fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApi")
            .field("loaded_library", &self.library.is_some())
            .finish_non_exhaustive()
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
    let printable = String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]).into_owned();
    let sym: libloading::Symbol<'_, T> = library
        .get(name)
        .map_err(|e| Error::LibraryLoad(format!("missing symbol {printable}: {e}")))?;
    Ok(*sym)
}

/// Load the engine once per process, searching the usual places.
///
/// Order: `$CAPSTONE_LIB`, the running executable's directory, then the
/// system loader's own search path.
pub fn init() -> Result<&'static NativeApi> {
    resolve(NATIVE.get_or_init(|| locate().map_err(|e| e.to_string())))
}

/// Load the engine once per process from an explicit path.
///
/// If the library was already initialised (by either entry point), the
/// recorded outcome is returned and `path` is ignored.
pub fn init_from(path: impl AsRef<Path>) -> Result<&'static NativeApi> {
    let path = path.as_ref();
    if NATIVE.get().is_some() {
        log::debug!("capstone already initialised, ignoring {}", path.display());
    }
    resolve(NATIVE.get_or_init(|| {
        log::debug!("loading capstone from {}", path.display());
        NativeApi::load(path).map_err(|e| e.to_string())
    }))
}

fn resolve(state: &'static std::result::Result<NativeApi, String>) -> Result<&'static NativeApi> {
    state.as_ref().map_err(|msg| Error::LibraryLoad(msg.clone()))
}

fn locate() -> Result<NativeApi> {
    let mut attempts = Vec::new();
    for path in search_paths() {
        match NativeApi::load(&path) {
            Ok(api) => {
                log::debug!("loaded capstone from {}", path.display());
                return Ok(api);
            }
            Err(e) => {
                log::trace!("capstone not at {}: {}", path.display(), e);
                attempts.push(e.to_string());
            }
        }
    }

    log::warn!("capstone library not found ({} locations tried)", attempts.len());
    Err(Error::LibraryLoad(attempts.join("; ")))
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = std::env::var_os(LIB_PATH_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.extend(CANDIDATES.iter().map(|name| dir.join(name)));
    }
    paths.extend(CANDIDATES.iter().map(PathBuf::from));
    paths
}
