//! Disassembly Iterator
//!
//! One `cs_disasm_ex` call per request. The native array is converted into
//! owned records straight away and released through [`NativeInsns`], so no
//! native memory survives the call whatever happens during conversion.

use std::os::raw::c_void;
use std::{ptr, slice, vec};

use crate::engine::{Arch, Engine};
use crate::error::{self, Error, ErrorCode, Result};
use crate::ffi::loader::{self, NativeApi};
use crate::ffi::CsInsn;
use crate::insn::{Insn, LiteInsn};
use crate::options::Mode;
use crate::version::{self, Support};

/// A native `cs_insn` array, freed exactly once when dropped.
struct NativeInsns {
    api: &'static NativeApi,
    ptr: *mut CsInsn,
    count: usize,
}

impl NativeInsns {
    fn as_slice(&self) -> &[CsInsn] {
        if self.ptr.is_null() || self.count == 0 {
            return &[];
        }
        // SAFETY: the engine returned `count` contiguous entries at `ptr`,
        // and they stay allocated until `drop` below.
        unsafe { slice::from_raw_parts(self.ptr, self.count) }
    }
}

impl Drop for NativeInsns {
    fn drop(&mut self) {
        if !self.ptr.is_null() && self.count > 0 {
            unsafe { (self.api.cs_free)(self.ptr.cast::<c_void>(), self.count) };
        }
    }
}

/// Owned instructions of one decode call, in address order.
#[derive(Debug)]
pub struct Disasm {
    insns: vec::IntoIter<Insn>,
}

impl Iterator for Disasm {
    type Item = Insn;

    fn next(&mut self) -> Option<Insn> {
        self.insns.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.insns.size_hint()
    }
}

impl ExactSizeIterator for Disasm {}

/// Text-only records of one decode call.
#[derive(Debug)]
pub struct LiteDisasm {
    insns: vec::IntoIter<LiteInsn>,
}

impl Iterator for LiteDisasm {
    type Item = LiteInsn;

    fn next(&mut self) -> Option<LiteInsn> {
        self.insns.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.insns.size_hint()
    }
}

impl ExactSizeIterator for LiteDisasm {}

impl Engine {
    /// Decode every instruction in `code`, the first one located at `address`.
    ///
    /// Decoding stops at the first invalid encoding; invalid leading bytes
    /// give an empty sequence, not an error.
    pub fn disasm(&self, code: &[u8], address: u64) -> Result<Disasm> {
        self.disasm_count(code, address, 0)
    }

    /// Like [`Engine::disasm`] but stops after `count` instructions (0 = all).
    pub fn disasm_count(&self, code: &[u8], address: u64, count: usize) -> Result<Disasm> {
        let native = self.decode_native(code, address, count)?;
        let (api, arch, diet, detail) = (self.api, self.arch(), self.diet(), self.detail);

        let insns: Vec<Insn> = native
            .as_slice()
            .iter()
            // SAFETY: detail pointers belong to `native`, still alive here.
            .map(|raw| unsafe { Insn::from_native(api, arch, diet, detail, raw) })
            .collect();

        Ok(Disasm {
            insns: insns.into_iter(),
        })
    }

    /// Address, size and text only. Fails up front on diet engines, which
    /// carry no text.
    pub fn disasm_lite(&self, code: &[u8], address: u64, count: usize) -> Result<LiteDisasm> {
        self.ensure_not_diet()?;
        let native = self.decode_native(code, address, count)?;
        let insns: Vec<LiteInsn> = native.as_slice().iter().map(LiteInsn::from_native).collect();

        Ok(LiteDisasm {
            insns: insns.into_iter(),
        })
    }

    fn decode_native(&self, code: &[u8], address: u64, count: usize) -> Result<NativeInsns> {
        let mut insn: *mut CsInsn = ptr::null_mut();
        let decoded = unsafe {
            (self.api.cs_disasm_ex)(
                self.handle,
                code.as_ptr(),
                code.len(),
                address,
                count,
                &mut insn,
            )
        };
        log::trace!(
            "{} decode of {} bytes at {:#x}: {} insns",
            self.arch(),
            code.len(),
            address,
            decoded
        );

        let native = NativeInsns {
            api: self.api,
            ptr: insn,
            count: decoded,
        };
        if decoded == 0 {
            let status = unsafe { (self.api.cs_errno)(self.handle) };
            error::check(self.api, status)?;
        }
        Ok(native)
    }
}

/// Open a temporary engine, decode up to `count` instructions and close it.
pub fn disasm_quick(
    arch: Arch,
    mode: Mode,
    code: &[u8],
    address: u64,
    count: usize,
) -> Result<Vec<Insn>> {
    disasm_quick_with(loader::init()?, arch, mode, code, address, count)
}

pub fn disasm_quick_with(
    api: &'static NativeApi,
    arch: Arch,
    mode: Mode,
    code: &[u8],
    address: u64,
    count: usize,
) -> Result<Vec<Insn>> {
    let engine = Engine::open_with(api, arch, mode)?;
    let decoded = engine.disasm_count(code, address, count);
    let closed = engine.close();
    let insns = decoded?.collect();
    closed?;
    Ok(insns)
}

/// One-shot [`Engine::disasm_lite`]. Diet engines are refused before any
/// handle is opened.
pub fn disasm_lite_quick(
    arch: Arch,
    mode: Mode,
    code: &[u8],
    address: u64,
    count: usize,
) -> Result<Vec<LiteInsn>> {
    disasm_lite_quick_with(loader::init()?, arch, mode, code, address, count)
}

pub fn disasm_lite_quick_with(
    api: &'static NativeApi,
    arch: Arch,
    mode: Mode,
    code: &[u8],
    address: u64,
    count: usize,
) -> Result<Vec<LiteInsn>> {
    version::check_version(api)?;
    if api.support(Support::Diet.raw()) {
        return Err(Error::from_code(api, ErrorCode::DietUnsupported));
    }

    let engine = Engine::open_with(api, arch, mode)?;
    let decoded = engine.disasm_lite(code, address, count);
    let closed = engine.close();
    let insns = decoded?.collect();
    closed?;
    Ok(insns)
}
