//! FFI Bindings for the Capstone 2.1 engine
//!
//! Raw `#[repr(C)]` layouts and function signatures of the engine's C ABI.
//! Nothing in here is safe to use directly; the rest of the crate goes
//! through [`loader::NativeApi`] and copies everything out of native memory.

use std::fmt;
use std::os::raw::{c_char, c_int, c_uint, c_void};

pub mod arch;
pub mod loader;

pub use arch::{CsArm, CsArm64, CsMips, CsPpc, CsX86};

/// Native engine handle (`csh`), an opaque `size_t`.
pub type Csh = usize;

// Architecture ids (cs_arch)
pub const CS_ARCH_ARM: c_uint = 0;
pub const CS_ARCH_ARM64: c_uint = 1;
pub const CS_ARCH_MIPS: c_uint = 2;
pub const CS_ARCH_X86: c_uint = 3;
pub const CS_ARCH_PPC: c_uint = 4;
pub const CS_ARCH_ALL: c_uint = 0xFFFF;

/// `cs_support()` query id for diet engines.
pub const CS_SUPPORT_DIET: c_uint = CS_ARCH_ALL + 1;

// Mode bits (cs_mode)
pub const CS_MODE_LITTLE_ENDIAN: c_uint = 0;
pub const CS_MODE_ARM: c_uint = 0;
pub const CS_MODE_16: c_uint = 1 << 1;
pub const CS_MODE_32: c_uint = 1 << 2;
pub const CS_MODE_64: c_uint = 1 << 3;
pub const CS_MODE_THUMB: c_uint = 1 << 4;
pub const CS_MODE_MICRO: c_uint = 1 << 4;
pub const CS_MODE_N64: c_uint = 1 << 5;
pub const CS_MODE_BIG_ENDIAN: c_uint = 1 << 31;

// Option types (cs_opt_type)
pub const CS_OPT_SYNTAX: c_int = 1;
pub const CS_OPT_DETAIL: c_int = 2;
pub const CS_OPT_MODE: c_int = 3;

// Option values (cs_opt_value)
pub const CS_OPT_OFF: usize = 0;
pub const CS_OPT_ON: usize = 3;
pub const CS_OPT_SYNTAX_DEFAULT: usize = 0;
pub const CS_OPT_SYNTAX_INTEL: usize = 1;
pub const CS_OPT_SYNTAX_ATT: usize = 2;
pub const CS_OPT_SYNTAX_NOREGNAME: usize = 3;

// Status codes (cs_err)
pub const CS_ERR_OK: c_int = 0;
pub const CS_ERR_MEM: c_int = 1;
pub const CS_ERR_ARCH: c_int = 2;
pub const CS_ERR_HANDLE: c_int = 3;
pub const CS_ERR_CSH: c_int = 4;
pub const CS_ERR_MODE: c_int = 5;
pub const CS_ERR_OPTION: c_int = 6;
pub const CS_ERR_DETAIL: c_int = 7;
pub const CS_ERR_MEMSETUP: c_int = 8;
pub const CS_ERR_VERSION: c_int = 9;
pub const CS_ERR_DIET: c_int = 10;

/// One decoded instruction as laid out by the engine (`cs_insn`).
#[repr(C)]
pub struct CsInsn {
    pub id: c_uint,
    pub address: u64,
    pub size: u16,
    pub bytes: [u8; 16],
    /// NUL-terminated. Empty on diet engines.
    pub mnemonic: [u8; 32],
    /// NUL-terminated. Empty on diet engines.
    pub op_str: [u8; 160],
    /// Null unless CS_OPT_DETAIL was on for the decode call.
    pub detail: *mut CsDetail,
}

/// Per-instruction detail block (`cs_detail`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsDetail {
    pub regs_read: [u8; 12],
    pub regs_read_count: u8,
    pub regs_write: [u8; 20],
    pub regs_write_count: u8,
    pub groups: [u8; 8],
    pub groups_count: u8,
    /// Which member is live depends on the handle's architecture only.
    pub arch: CsArchDetail,
}

/// The anonymous architecture union at the tail of `cs_detail`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union CsArchDetail {
    pub x86: CsX86,
    pub arm64: CsArm64,
    pub arm: CsArm,
    pub mips: CsMips,
    pub ppc: CsPpc,
}

impl fmt::Debug for CsDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsDetail")
            .field("regs_read_count", &self.regs_read_count)
            .field("regs_write_count", &self.regs_write_count)
            .field("groups_count", &self.groups_count)
            .finish_non_exhaustive()
    }
}

pub type CsOpenFn = unsafe extern "C" fn(arch: c_uint, mode: c_uint, handle: *mut Csh) -> c_int;
pub type CsDisasmExFn = unsafe extern "C" fn(
    handle: Csh,
    code: *const u8,
    code_size: usize,
    address: u64,
    count: usize,
    insn: *mut *mut CsInsn,
) -> usize;
pub type CsFreeFn = unsafe extern "C" fn(insn: *mut c_void, count: usize);
pub type CsCloseFn = unsafe extern "C" fn(handle: *mut Csh) -> c_int;
pub type CsRegNameFn = unsafe extern "C" fn(handle: Csh, reg_id: c_uint) -> *const c_char;
pub type CsInsnNameFn = unsafe extern "C" fn(handle: Csh, insn_id: c_uint) -> *const c_char;
pub type CsOpCountFn =
    unsafe extern "C" fn(handle: Csh, insn: *const CsInsn, op_type: c_uint) -> c_int;
pub type CsOpIndexFn = unsafe extern "C" fn(
    handle: Csh,
    insn: *const CsInsn,
    op_type: c_uint,
    position: c_uint,
) -> c_int;
pub type CsErrnoFn = unsafe extern "C" fn(handle: Csh) -> c_int;
pub type CsOptionFn = unsafe extern "C" fn(handle: Csh, opt_type: c_int, value: usize) -> c_int;
pub type CsVersionFn = unsafe extern "C" fn(major: *mut c_int, minor: *mut c_int) -> c_int;
pub type CsSupportFn = unsafe extern "C" fn(query: c_int) -> bool;
pub type CsStrerrorFn = unsafe extern "C" fn(code: c_int) -> *const c_char;

/// Reads a fixed-size NUL-terminated text field.
pub(crate) fn c_text(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
