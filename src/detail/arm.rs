//! ARM unpacker.

use super::{counted, MemOperand, Operand, OperandValue, Shift};
use crate::ffi::arch::{
    ArmOp, CsArm, ARM_OP_CIMM, ARM_OP_FP, ARM_OP_IMM, ARM_OP_MEM, ARM_OP_PIMM, ARM_OP_REG,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArmDetail {
    /// Condition code (`arm_cc`), 0 when invalid.
    pub cc: u32,
    pub update_flags: bool,
    pub writeback: bool,
    pub operands: Vec<Operand>,
}

pub(super) fn unpack(raw: &CsArm) -> ArmDetail {
    ArmDetail {
        cc: raw.cc,
        update_flags: raw.update_flags != 0,
        writeback: raw.writeback != 0,
        operands: counted(&raw.operands, raw.op_count)
            .iter()
            .map(operand)
            .collect(),
    }
}

fn operand(op: &ArmOp) -> Operand {
    // SAFETY: plain-data union; `op_type` selects the member the engine wrote.
    let value = unsafe {
        match op.op_type {
            ARM_OP_REG => OperandValue::Reg(op.value.reg),
            ARM_OP_CIMM => OperandValue::CImm(i64::from(op.value.imm)),
            ARM_OP_PIMM => OperandValue::PImm(i64::from(op.value.imm)),
            ARM_OP_IMM => OperandValue::Imm(i64::from(op.value.imm)),
            ARM_OP_FP => OperandValue::Fp(op.value.fp),
            ARM_OP_MEM => {
                let mem = op.value.mem;
                OperandValue::Mem(MemOperand {
                    base: mem.base,
                    index: mem.index,
                    scale: mem.scale,
                    disp: i64::from(mem.disp),
                })
            }
            _ => OperandValue::Invalid,
        }
    };

    Operand {
        shift: Shift::from_raw(op.shift),
        ..Operand::new(value)
    }
}
