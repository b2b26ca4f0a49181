//! Engine Handle Manager
//!
//! Owns one native `csh` from `cs_open` to `cs_close`. Architecture and
//! diet capability are fixed at open; mode, syntax and detail only change
//! through the setters in [`crate::options`], after the engine accepted them.

use std::cell::Cell;
use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int, c_uint};

use crate::error::{self, Error, ErrorCode, Result};
use crate::ffi::loader::{self, NativeApi};
use crate::ffi::{self, Csh};
use crate::options::{Mode, Syntax};
use crate::version::{self, Support};

/// Instruction-set architectures the binding can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm,
    Arm64,
    Mips,
    X86,
    Ppc,
}

impl Arch {
    pub const ALL: [Arch; 5] = [Arch::Arm, Arch::Arm64, Arch::Mips, Arch::X86, Arch::Ppc];

    pub fn raw(self) -> c_uint {
        match self {
            Arch::Arm => ffi::CS_ARCH_ARM,
            Arch::Arm64 => ffi::CS_ARCH_ARM64,
            Arch::Mips => ffi::CS_ARCH_MIPS,
            Arch::X86 => ffi::CS_ARCH_X86,
            Arch::Ppc => ffi::CS_ARCH_PPC,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Mips => "mips",
            Arch::X86 => "x86",
            Arch::Ppc => "ppc",
        }
    }

    /// Syntax a fresh handle starts with; only X86 has one.
    pub fn default_syntax(self) -> Option<Syntax> {
        match self {
            Arch::X86 => Some(Syntax::Intel),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured native engine instance.
///
/// `Send` but not `Sync`: a handle may move between threads but is used by
/// one owner at a time. Prefer [`Engine::close`] so a failing native close is
/// observable; dropping an open engine closes it and only logs a failure.
pub struct Engine {
    /// Resolved native entry points
    pub(crate) api: &'static NativeApi,
    /// Native handle returned by `cs_open`
    pub(crate) handle: Csh,
    /// Cleared before the native close so it runs at most once
    open: bool,
    /// Architecture fixed at open time
    arch: Arch,
    /// Whether the library is a diet build
    diet: bool,
    /// Current mode, committed only after the engine accepts it
    pub(crate) mode: Mode,
    /// Current syntax; `None` on architectures without a syntax choice
    pub(crate) syntax: Option<Syntax>,
    /// Whether decode calls fill in detail
    pub(crate) detail: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl Engine {
    /// Open an engine against the process-wide library, loading it on first use.
    pub fn open(arch: Arch, mode: Mode) -> Result<Self> {
        Self::open_with(loader::init()?, arch, mode)
    }

    /// Open an engine against an explicit native API table.
    pub fn open_with(api: &'static NativeApi, arch: Arch, mode: Mode) -> Result<Self> {
        version::check_version(api)?;

        if !mode.supported_by(arch) {
            log::debug!("rejecting mode {} for {}", mode, arch);
            return Err(Error::from_code(api, ErrorCode::UnsupportedMode));
        }

        let mut handle: Csh = 0;
        let status = unsafe { (api.cs_open)(arch.raw(), mode.bits(), &mut handle) };
        error::check(api, status)?;

        let diet = api.support(Support::Diet.raw());
        log::debug!(
            "opened {} engine (mode {}, diet {}, handle {:#x})",
            arch,
            mode,
            diet,
            handle
        );

        Ok(Self {
            api,
            handle,
            open: true,
            arch,
            diet,
            mode,
            syntax: arch.default_syntax(),
            detail: false,
            _not_sync: PhantomData,
        })
    }

    /// Close the native handle, reporting a failing `cs_close`.
    pub fn close(mut self) -> Result<()> {
        self.close_native()
    }

    fn close_native(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        // marked first: a failing close must not be retried from Drop
        self.open = false;
        let status = unsafe { (self.api.cs_close)(&mut self.handle) };
        log::debug!("closed {} engine (status {})", self.arch, status);
        error::check(self.api, status)
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current syntax, `None` while unset for non-X86 handles.
    pub fn syntax(&self) -> Option<Syntax> {
        self.syntax
    }

    pub fn detail(&self) -> bool {
        self.detail
    }

    /// Whether the engine was built without text tables.
    pub fn diet(&self) -> bool {
        self.diet
    }

    /// Last error the engine recorded for this handle.
    pub fn errno(&self) -> Result<ErrorCode> {
        let status = unsafe { (self.api.cs_errno)(self.handle) };
        ErrorCode::from_raw(status).ok_or(Error::UnknownStatus(status))
    }

    /// Register name for an id, `None` if the engine has no name for it.
    pub fn reg_name(&self, reg_id: u32) -> Result<Option<String>> {
        self.ensure_not_diet()?;
        let ptr = unsafe { (self.api.cs_reg_name)(self.handle, reg_id) };
        Ok(owned_name(ptr))
    }

    /// Instruction name for an id, `None` if the engine has no name for it.
    pub fn insn_name(&self, insn_id: u32) -> Result<Option<String>> {
        self.ensure_not_diet()?;
        let ptr = unsafe { (self.api.cs_insn_name)(self.handle, insn_id) };
        Ok(owned_name(ptr))
    }

    pub(crate) fn ensure_not_diet(&self) -> Result<()> {
        if self.diet {
            return Err(Error::from_code(self.api, ErrorCode::DietUnsupported));
        }
        Ok(())
    }

    /// One `cs_option` round-trip; the caller commits its cache on `Ok`.
    pub(crate) fn set_option(&mut self, opt_type: c_int, value: usize) -> Result<()> {
        let status = unsafe { (self.api.cs_option)(self.handle, opt_type, value) };
        error::check(self.api, status)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.close_native() {
            log::warn!("closing {} engine on drop failed: {}", self.arch, e);
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("arch", &self.arch)
            .field("mode", &self.mode)
            .field("syntax", &self.syntax)
            .field("detail", &self.detail)
            .field("diet", &self.diet)
            .finish_non_exhaustive()
    }
}

fn owned_name(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}
