//! Version Compatibility Checker
//!
//! The struct layouts in [`crate::ffi`] are only valid against the 2.1 API,
//! so every handle-creating path calls [`check_version`] first.

use std::os::raw::c_uint;

use crate::engine::Arch;
use crate::error::{Error, ErrorCode, Result};
use crate::ffi::loader::{self, NativeApi};
use crate::ffi::{CS_ARCH_ALL, CS_SUPPORT_DIET};

/// API major version this binding was written against.
pub const API_MAJOR: i32 = 2;
/// API minor version this binding was written against.
pub const API_MINOR: i32 = 1;

/// `(major, minor, combined)` of the binding, `combined = major << 8 | minor`.
pub fn binding_version() -> (i32, i32, i32) {
    (API_MAJOR, API_MINOR, (API_MAJOR << 8) + API_MINOR)
}

/// `(major, minor, combined)` reported by the loaded engine.
pub fn engine_version() -> Result<(i32, i32, i32)> {
    Ok(loader::init()?.version())
}

/// Fails with `VersionMismatch` unless the engine speaks our API version.
pub fn check_version(api: &NativeApi) -> Result<()> {
    let (major, minor, _) = api.version();
    if major != API_MAJOR || minor != API_MINOR {
        log::warn!(
            "capstone engine {}.{} does not match binding {}.{}",
            major,
            minor,
            API_MAJOR,
            API_MINOR
        );
        return Err(Error::from_code(api, ErrorCode::VersionMismatch));
    }
    Ok(())
}

/// Capability queries understood by `cs_support()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Is this architecture compiled into the engine?
    Arch(Arch),
    /// Are all architectures compiled in?
    AllArchs,
    /// Is this a diet engine (no mnemonics, operand text or register names)?
    Diet,
}

impl Support {
    pub fn raw(self) -> c_uint {
        match self {
            Support::Arch(arch) => arch.raw(),
            Support::AllArchs => CS_ARCH_ALL,
            Support::Diet => CS_SUPPORT_DIET,
        }
    }
}

/// Ask the process-wide engine about a capability.
pub fn support(query: Support) -> Result<bool> {
    Ok(loader::init()?.support(query.raw()))
}

/// Build descriptor of the process-wide engine, e.g.
/// `rust-standard-arm-arm64-mips-ppc-x86-c2.1-b2.1`.
pub fn debug_info() -> Result<String> {
    Ok(debug_info_with(loader::init()?))
}

pub fn debug_info_with(api: &NativeApi) -> String {
    let flavour = if api.support(Support::Diet.raw()) {
        "diet"
    } else {
        "standard"
    };

    let mut names: Vec<&str> = Arch::ALL
        .iter()
        .filter(|arch| api.support(arch.raw()))
        .map(|arch| arch.name())
        .collect();
    names.sort_unstable();

    let archs: String = names.iter().map(|name| format!("-{name}")).collect();
    let (major, minor, _) = api.version();
    format!("rust-{flavour}{archs}-c{major}.{minor}-b{API_MAJOR}.{API_MINOR}")
}
