//! X86 unpacker: prefix, opcode, ModRM and SIB geometry plus operands.

use super::{counted, MemOperand, Operand, OperandValue, RegId};
use crate::ffi::arch::{CsX86, X86Op, X86_OP_FP, X86_OP_IMM, X86_OP_MEM, X86_OP_REG};

/// X86 instruction geometry and operands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct X86Detail {
    /// Prefix bytes, 0 where absent: `[0]` REP/REPNE/LOCK, `[1]` segment
    /// override, `[2]` operand-size, `[3]` address-size.
    pub prefix: [u8; 5],
    /// Segment override register, 0 when none.
    pub segment: RegId,
    /// Opcode bytes, unused trailing bytes are 0.
    pub opcode: [u8; 3],
    /// Operand size in bytes
    pub op_size: u8,
    /// Address size in bytes
    pub addr_size: u8,
    /// Displacement size in bytes
    pub disp_size: u8,
    /// Immediate size in bytes
    pub imm_size: u8,
    /// ModR/M byte
    pub modrm: u8,
    /// SIB byte, 0 when absent
    pub sib: u8,
    /// Displacement value
    pub disp: i32,
    /// SIB index register
    pub sib_index: RegId,
    /// SIB scale
    pub sib_scale: i8,
    /// SIB base register
    pub sib_base: RegId,
    /// Explicit operands in encoding order
    pub operands: Vec<Operand>,
}

pub(super) fn unpack(raw: &CsX86) -> X86Detail {
    X86Detail {
        prefix: raw.prefix,
        segment: raw.segment,
        opcode: raw.opcode,
        op_size: raw.op_size,
        addr_size: raw.addr_size,
        disp_size: raw.disp_size,
        imm_size: raw.imm_size,
        modrm: raw.modrm,
        sib: raw.sib,
        disp: raw.disp,
        sib_index: raw.sib_index,
        sib_scale: raw.sib_scale,
        sib_base: raw.sib_base,
        operands: counted(&raw.operands, raw.op_count)
            .iter()
            .map(operand)
            .collect(),
    }
}

fn operand(op: &X86Op) -> Operand {
    // SAFETY: plain-data union; `op_type` selects the member the engine wrote.
    let value = unsafe {
        match op.op_type {
            X86_OP_REG => OperandValue::Reg(op.value.reg),
            X86_OP_IMM => OperandValue::Imm(op.value.imm),
            X86_OP_FP => OperandValue::Fp(op.value.fp),
            X86_OP_MEM => {
                let mem = op.value.mem;
                OperandValue::Mem(MemOperand {
                    base: mem.base,
                    index: mem.index,
                    scale: mem.scale,
                    disp: mem.disp,
                })
            }
            _ => OperandValue::Invalid,
        }
    };

    Operand {
        size: Some(op.size),
        ..Operand::new(value)
    }
}
