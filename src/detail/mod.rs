//! Detail Decoder
//!
//! Turns a copied `cs_detail` into owned, architecture-tagged data. The
//! native union is not self-describing: which member is live is decided by
//! the architecture of the handle that produced the record, so decoding
//! always takes that [`Arch`] alongside the raw block.

mod arm;
mod arm64;
mod mips;
mod ppc;
mod x86;

pub use arm::ArmDetail;
pub use arm64::Arm64Detail;
pub use mips::MipsDetail;
pub use ppc::PpcDetail;
pub use x86::X86Detail;

use crate::engine::Arch;
use crate::ffi::arch::OpShift;
use crate::ffi::CsDetail;

/// Engine register id. 0 is the invalid register on every architecture.
pub type RegId = u32;
/// Engine instruction-group id.
pub type GroupId = u32;

/// Operand kinds, shared by all architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Invalid,
    Reg,
    Imm,
    /// Coprocessor immediate (ARM, ARM64).
    CImm,
    /// Coprocessor register-number immediate (ARM).
    PImm,
    Fp,
    Mem,
}

/// Memory reference. Architectures without an index register report
/// `index == 0` and `scale == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemOperand {
    pub base: RegId,
    pub index: RegId,
    pub scale: i32,
    pub disp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandValue {
    Invalid,
    Reg(RegId),
    Imm(i64),
    CImm(i64),
    PImm(i64),
    Fp(f64),
    Mem(MemOperand),
}

/// Barrel-shifter applied to an ARM / ARM64 operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shift {
    pub kind: u32,
    pub value: u32,
}

impl Shift {
    fn from_raw(raw: OpShift) -> Option<Self> {
        (raw.shift_type != 0).then_some(Shift {
            kind: raw.shift_type,
            value: raw.value,
        })
    }
}

/// One decoded operand plus the per-architecture extras that came with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operand {
    pub value: OperandValue,
    /// ARM / ARM64 only.
    pub shift: Option<Shift>,
    /// ARM64 extender, when one applies.
    pub ext: Option<u32>,
    /// X86 operand size in bytes.
    pub size: Option<u8>,
}

impl Operand {
    pub(crate) fn new(value: OperandValue) -> Self {
        Self {
            value,
            shift: None,
            ext: None,
            size: None,
        }
    }

    pub fn op_type(&self) -> OperandType {
        match self.value {
            OperandValue::Invalid => OperandType::Invalid,
            OperandValue::Reg(_) => OperandType::Reg,
            OperandValue::Imm(_) => OperandType::Imm,
            OperandValue::CImm(_) => OperandType::CImm,
            OperandValue::PImm(_) => OperandType::PImm,
            OperandValue::Fp(_) => OperandType::Fp,
            OperandValue::Mem(_) => OperandType::Mem,
        }
    }

    pub fn reg(&self) -> Option<RegId> {
        match self.value {
            OperandValue::Reg(reg) => Some(reg),
            _ => None,
        }
    }

    pub fn imm(&self) -> Option<i64> {
        match self.value {
            OperandValue::Imm(imm) | OperandValue::CImm(imm) | OperandValue::PImm(imm) => Some(imm),
            _ => None,
        }
    }

    pub fn mem(&self) -> Option<MemOperand> {
        match self.value {
            OperandValue::Mem(mem) => Some(mem),
            _ => None,
        }
    }
}

/// Architecture-specific half of a detail block.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchDetail {
    Arm(ArmDetail),
    Arm64(Arm64Detail),
    Mips(MipsDetail),
    X86(X86Detail),
    Ppc(PpcDetail),
}

impl ArchDetail {
    pub fn arch(&self) -> Arch {
        match self {
            ArchDetail::Arm(_) => Arch::Arm,
            ArchDetail::Arm64(_) => Arch::Arm64,
            ArchDetail::Mips(_) => Arch::Mips,
            ArchDetail::X86(_) => Arch::X86,
            ArchDetail::Ppc(_) => Arch::Ppc,
        }
    }

    pub fn operands(&self) -> &[Operand] {
        match self {
            ArchDetail::Arm(d) => &d.operands,
            ArchDetail::Arm64(d) => &d.operands,
            ArchDetail::Mips(d) => &d.operands,
            ArchDetail::X86(d) => &d.operands,
            ArchDetail::Ppc(d) => &d.operands,
        }
    }
}

/// Decoded detail of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    regs_read: Vec<RegId>,
    regs_write: Vec<RegId>,
    groups: Vec<GroupId>,
    arch: ArchDetail,
}

impl Detail {
    pub(crate) fn decode(arch: Arch, raw: &CsDetail) -> Self {
        // SAFETY: the engine fills the union member of the handle's
        // architecture and `arch` was captured from that handle. Every member
        // is plain data, so no bit pattern is invalid.
        let arch_detail = unsafe {
            match arch {
                Arch::Arm => ArchDetail::Arm(arm::unpack(&raw.arch.arm)),
                Arch::Arm64 => ArchDetail::Arm64(arm64::unpack(&raw.arch.arm64)),
                Arch::Mips => ArchDetail::Mips(mips::unpack(&raw.arch.mips)),
                Arch::X86 => ArchDetail::X86(x86::unpack(&raw.arch.x86)),
                Arch::Ppc => ArchDetail::Ppc(ppc::unpack(&raw.arch.ppc)),
            }
        };

        Self {
            regs_read: widen(counted(&raw.regs_read, raw.regs_read_count)),
            regs_write: widen(counted(&raw.regs_write, raw.regs_write_count)),
            groups: widen(counted(&raw.groups, raw.groups_count)),
            arch: arch_detail,
        }
    }

    /// Registers implicitly read.
    pub fn regs_read(&self) -> &[RegId] {
        &self.regs_read
    }

    /// Registers implicitly written.
    pub fn regs_write(&self) -> &[RegId] {
        &self.regs_write
    }

    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn arch_detail(&self) -> &ArchDetail {
        &self.arch
    }

    pub fn operands(&self) -> &[Operand] {
        self.arch.operands()
    }

    /// Number of operands of kind `op_type`.
    pub fn op_count(&self, op_type: OperandType) -> usize {
        self.operands()
            .iter()
            .filter(|op| op.op_type() == op_type)
            .count()
    }

    /// The `position`-th operand of kind `op_type`, counting from 1.
    pub fn op_find(&self, op_type: OperandType, position: usize) -> Option<&Operand> {
        if position == 0 {
            return None;
        }
        self.operands()
            .iter()
            .filter(|op| op.op_type() == op_type)
            .nth(position - 1)
    }
}

/// The first `count` entries of a fixed native array, clamped to its length.
pub(crate) fn counted<T>(items: &[T], count: u8) -> &[T] {
    &items[..usize::from(count).min(items.len())]
}

fn widen(ids: &[u8]) -> Vec<u32> {
    ids.iter().map(|&id| u32::from(id)).collect()
}
