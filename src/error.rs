//! Error Mapper - native status codes to typed errors
//!
//! Every native call site funnels its status through [`check`] so messages
//! always come from the engine's own `cs_strerror` table.

use std::os::raw::c_int;

use thiserror::Error;

use crate::ffi::loader::NativeApi;

/// Status codes reported by the engine (`cs_err`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// No error
    Ok = 0,
    /// Engine allocation failed
    OutOfMemory = 1,
    /// Architecture not compiled into the library
    UnsupportedArch = 2,
    /// Handle is not a live engine
    InvalidHandle = 3,
    /// Null or bad handle reference passed to open/close
    InvalidHandleRef = 4,
    /// Mode bits rejected for the architecture
    UnsupportedMode = 5,
    /// Option type or value rejected
    UnsupportedOption = 6,
    /// Detail accessed on a record decoded with detail off
    DetailNotRequested = 7,
    /// Dynamic memory hooks missing or incomplete
    MemSetupFailure = 8,
    /// Library major/minor differs from the binding's
    VersionMismatch = 9,
    /// Text or detail requested from a diet build
    DietUnsupported = 10,
}

impl ErrorCode {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        let code = match raw {
            0 => Self::Ok,
            1 => Self::OutOfMemory,
            2 => Self::UnsupportedArch,
            3 => Self::InvalidHandle,
            4 => Self::InvalidHandleRef,
            5 => Self::UnsupportedMode,
            6 => Self::UnsupportedOption,
            7 => Self::DetailNotRequested,
            8 => Self::MemSetupFailure,
            9 => Self::VersionMismatch,
            10 => Self::DietUnsupported,
            _ => return None,
        };
        Some(code)
    }

    pub fn raw(self) -> c_int {
        self as c_int
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The engine (or the binding, on the engine's behalf) refused an operation.
    #[error("{message} ({code:?})")]
    Engine { code: ErrorCode, message: String },

    #[error("engine reported unknown status {0}")]
    UnknownStatus(c_int),

    #[error("capstone library unavailable: {0}")]
    LibraryLoad(String),
}

impl Error {
    /// Build an error for `code`, with the engine's message for it.
    pub(crate) fn from_code(api: &NativeApi, code: ErrorCode) -> Self {
        Error::Engine {
            code,
            message: api.strerror(code.raw()),
        }
    }

    /// The mapped engine code, if this error came from one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Map a native status: `Ok` passes, anything else becomes an [`Error`].
pub(crate) fn check(api: &NativeApi, status: c_int) -> Result<()> {
    match ErrorCode::from_raw(status) {
        Some(ErrorCode::Ok) => Ok(()),
        Some(code) => Err(Error::from_code(api, code)),
        None => Err(Error::UnknownStatus(status)),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
