//! ARM64 unpacker.

use super::{counted, MemOperand, Operand, OperandValue, Shift};
use crate::ffi::arch::{
    Arm64Op, CsArm64, ARM64_OP_CIMM, ARM64_OP_FP, ARM64_OP_IMM, ARM64_OP_MEM, ARM64_OP_REG,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arm64Detail {
    /// Condition code (`arm64_cc`), 0 when invalid.
    pub cc: u32,
    pub update_flags: bool,
    pub writeback: bool,
    pub operands: Vec<Operand>,
}

pub(super) fn unpack(raw: &CsArm64) -> Arm64Detail {
    Arm64Detail {
        cc: raw.cc,
        update_flags: raw.update_flags != 0,
        writeback: raw.writeback != 0,
        operands: counted(&raw.operands, raw.op_count)
            .iter()
            .map(operand)
            .collect(),
    }
}

fn operand(op: &Arm64Op) -> Operand {
    // SAFETY: plain-data union; `op_type` selects the member the engine wrote.
    let value = unsafe {
        match op.op_type {
            ARM64_OP_REG => OperandValue::Reg(op.value.reg),
            ARM64_OP_CIMM => OperandValue::CImm(i64::from(op.value.imm)),
            ARM64_OP_IMM => OperandValue::Imm(i64::from(op.value.imm)),
            ARM64_OP_FP => OperandValue::Fp(op.value.fp),
            ARM64_OP_MEM => {
                let mem = op.value.mem;
                OperandValue::Mem(MemOperand {
                    base: mem.base,
                    index: mem.index,
                    scale: 1,
                    disp: i64::from(mem.disp),
                })
            }
            _ => OperandValue::Invalid,
        }
    };

    Operand {
        shift: Shift::from_raw(op.shift),
        ext: (op.ext != 0).then_some(op.ext),
        ..Operand::new(value)
    }
}
