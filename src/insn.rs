//! Instruction Record
//!
//! Owned copies of native `cs_insn` entries. Everything the engine handed out
//! is copied during conversion, so a record never points into native memory
//! and outlives both the decode call and the engine that produced it.

use std::cell::OnceCell;
#[cfg(test)]
use std::cell::Cell;
use std::fmt;

use crate::detail::{ArchDetail, Detail, GroupId, Operand, OperandType, RegId};
use crate::engine::Arch;
use crate::error::{Error, ErrorCode, Result};
use crate::ffi::loader::NativeApi;
use crate::ffi::{self, CsDetail, CsInsn};

/// Longest encoding the engine reports (`cs_insn.bytes`).
pub const MAX_INSN_BYTES: usize = 16;

/// One decoded instruction.
///
/// Detail data is copied only when the engine had detail enabled for the
/// decode call, and decoded on first access.
pub struct Insn {
    id: u32,
    address: u64,
    size: u16,
    bytes: Vec<u8>,
    mnemonic: Option<String>,
    op_str: Option<String>,
    arch: Arch,
    diet: bool,
    api: &'static NativeApi,
    raw_detail: Option<Box<CsDetail>>,
    decoded: OnceCell<Detail>,
    #[cfg(test)]
    decodes: Cell<usize>,
}

impl Insn {
    /// Deep-copy one native entry.
    ///
    /// # Safety
    /// `raw.detail` must be null or point at a valid `cs_detail` for as long
    /// as this call runs.
    pub(crate) unsafe fn from_native(
        api: &'static NativeApi,
        arch: Arch,
        diet: bool,
        detail_on: bool,
        raw: &CsInsn,
    ) -> Self {
        let size = raw.size.min(MAX_INSN_BYTES as u16);
        let raw_detail = if detail_on && !raw.detail.is_null() {
            Some(Box::new(*raw.detail))
        } else {
            None
        };
        let (mnemonic, op_str) = if diet {
            (None, None)
        } else {
            (Some(ffi::c_text(&raw.mnemonic)), Some(ffi::c_text(&raw.op_str)))
        };

        Self {
            id: raw.id,
            address: raw.address,
            size,
            bytes: raw.bytes[..usize::from(size)].to_vec(),
            mnemonic,
            op_str,
            arch,
            diet,
            api,
            raw_detail,
            decoded: OnceCell::new(),
            #[cfg(test)]
            decodes: Cell::new(0),
        }
    }

    /// Engine instruction id; see [`crate::Engine::insn_name`].
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// Machine bytes, exactly `size` of them.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Architecture of the engine that decoded this record.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn mnemonic(&self) -> Result<&str> {
        self.mnemonic.as_deref().ok_or_else(|| self.diet_error())
    }

    pub fn op_str(&self) -> Result<&str> {
        self.op_str.as_deref().ok_or_else(|| self.diet_error())
    }

    /// Whether a detail block was captured for this record.
    pub fn has_detail(&self) -> bool {
        self.raw_detail.is_some()
    }

    /// The full decoded detail block, decoded on first access.
    ///
    /// Fails with `DietUnsupported` on diet engines, then with
    /// `DetailNotRequested` if detail was off when this record was decoded.
    pub fn detail(&self) -> Result<&Detail> {
        if self.diet {
            return Err(self.diet_error());
        }
        let raw = self
            .raw_detail
            .as_deref()
            .ok_or_else(|| Error::from_code(self.api, ErrorCode::DetailNotRequested))?;

        Ok(self.decoded.get_or_init(|| {
            log::trace!("decoding {} detail at {:#x}", self.arch, self.address);
            #[cfg(test)]
            self.decodes.set(self.decodes.get() + 1);
            Detail::decode(self.arch, raw)
        }))
    }

    /// Registers implicitly read.
    pub fn regs_read(&self) -> Result<&[RegId]> {
        Ok(self.detail()?.regs_read())
    }

    /// Registers implicitly written.
    pub fn regs_write(&self) -> Result<&[RegId]> {
        Ok(self.detail()?.regs_write())
    }

    pub fn groups(&self) -> Result<&[GroupId]> {
        Ok(self.detail()?.groups())
    }

    pub fn reads_reg(&self, reg: RegId) -> Result<bool> {
        Ok(self.regs_read()?.contains(&reg))
    }

    pub fn writes_reg(&self, reg: RegId) -> Result<bool> {
        Ok(self.regs_write()?.contains(&reg))
    }

    pub fn in_group(&self, group: GroupId) -> Result<bool> {
        Ok(self.groups()?.contains(&group))
    }

    /// Architecture-specific detail.
    pub fn arch_detail(&self) -> Result<&ArchDetail> {
        Ok(self.detail()?.arch_detail())
    }

    pub fn operands(&self) -> Result<&[Operand]> {
        Ok(self.detail()?.operands())
    }

    pub fn op_count(&self, op_type: OperandType) -> Result<usize> {
        Ok(self.detail()?.op_count(op_type))
    }

    /// The `position`-th operand of kind `op_type`, counting from 1.
    pub fn op_find(&self, op_type: OperandType, position: usize) -> Result<Option<&Operand>> {
        Ok(self.detail()?.op_find(op_type, position))
    }

    /// `ADDRESS | BYTES | MNEMONIC OPERANDS`, one line.
    pub fn format_full(&self) -> String {
        let bytes: Vec<String> = self.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        format!(
            "{:08X} | {:<24} | {:<6} {}",
            self.address,
            bytes.join(" "),
            self.mnemonic.as_deref().unwrap_or("?"),
            self.op_str.as_deref().unwrap_or("")
        )
    }

    fn diet_error(&self) -> Error {
        Error::from_code(self.api, ErrorCode::DietUnsupported)
    }

    #[cfg(test)]
    pub(crate) fn decode_count(&self) -> usize {
        self.decodes.get()
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.mnemonic, &self.op_str) {
            (Some(mnemonic), Some(op_str)) if !op_str.is_empty() => {
                write!(f, "0x{:x}:\t{}\t{}", self.address, mnemonic, op_str)
            }
            (Some(mnemonic), _) => write!(f, "0x{:x}:\t{}", self.address, mnemonic),
            _ => write!(f, "0x{:x}:\t<id {}>", self.address, self.id),
        }
    }
}

impl fmt::Debug for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Insn")
            .field("id", &self.id)
            .field("address", &format_args!("{:#x}", self.address))
            .field("bytes", &self.bytes)
            .field("mnemonic", &self.mnemonic)
            .field("op_str", &self.op_str)
            .field("arch", &self.arch)
            .field("has_detail", &self.raw_detail.is_some())
            .finish()
    }
}

/// Text-only record produced by [`crate::Engine::disasm_lite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteInsn {
    pub address: u64,
    pub size: u16,
    pub mnemonic: String,
    pub op_str: String,
}

impl LiteInsn {
    pub(crate) fn from_native(raw: &CsInsn) -> Self {
        Self {
            address: raw.address,
            size: raw.size.min(MAX_INSN_BYTES as u16),
            mnemonic: ffi::c_text(&raw.mnemonic),
            op_str: ffi::c_text(&raw.op_str),
        }
    }
}

impl fmt::Display for LiteInsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}:\t{}\t{}", self.address, self.mnemonic, self.op_str)
    }
}
