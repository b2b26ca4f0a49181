//! PPC unpacker.

use super::{counted, MemOperand, Operand, OperandValue};
use crate::ffi::arch::{CsPpc, PpcOp, PPC_OP_IMM, PPC_OP_MEM, PPC_OP_REG};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PpcDetail {
    /// Branch code (`ppc_bc`).
    pub bc: u32,
    /// Branch hint (`ppc_bh`).
    pub bh: u32,
    /// Whether the instruction updates CR0.
    pub update_cr0: bool,
    pub operands: Vec<Operand>,
}

pub(super) fn unpack(raw: &CsPpc) -> PpcDetail {
    PpcDetail {
        bc: raw.bc,
        bh: raw.bh,
        update_cr0: raw.update_cr0 != 0,
        operands: counted(&raw.operands, raw.op_count)
            .iter()
            .map(operand)
            .collect(),
    }
}

fn operand(op: &PpcOp) -> Operand {
    // SAFETY: plain-data union; `op_type` selects the member the engine wrote.
    let value = unsafe {
        match op.op_type {
            PPC_OP_REG => OperandValue::Reg(op.value.reg),
            PPC_OP_IMM => OperandValue::Imm(i64::from(op.value.imm)),
            PPC_OP_MEM => {
                let mem = op.value.mem;
                OperandValue::Mem(MemOperand {
                    base: mem.base,
                    index: 0,
                    scale: 1,
                    disp: i64::from(mem.disp),
                })
            }
            _ => OperandValue::Invalid,
        }
    };
    Operand::new(value)
}
