//! MIPS unpacker. MIPS carries operands only.

use super::{counted, MemOperand, Operand, OperandValue};
use crate::ffi::arch::{CsMips, MipsOp, MIPS_OP_IMM, MIPS_OP_MEM, MIPS_OP_REG};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MipsDetail {
    pub operands: Vec<Operand>,
}

pub(super) fn unpack(raw: &CsMips) -> MipsDetail {
    MipsDetail {
        operands: counted(&raw.operands, raw.op_count)
            .iter()
            .map(operand)
            .collect(),
    }
}

fn operand(op: &MipsOp) -> Operand {
    // SAFETY: plain-data union; `op_type` selects the member the engine wrote.
    let value = unsafe {
        match op.op_type {
            MIPS_OP_REG => OperandValue::Reg(op.value.reg),
            MIPS_OP_IMM => OperandValue::Imm(op.value.imm),
            MIPS_OP_MEM => {
                let mem = op.value.mem;
                OperandValue::Mem(MemOperand {
                    base: mem.base,
                    index: 0,
                    scale: 1,
                    disp: mem.disp,
                })
            }
            _ => OperandValue::Invalid,
        }
    };
    Operand::new(value)
}
