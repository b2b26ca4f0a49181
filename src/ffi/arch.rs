//! Architecture-specific members of the `cs_detail` union, as laid out
//! by the 2.1 headers. C `bool` fields are kept as `u8` so that any byte the
//! engine writes stays a valid Rust value.

use std::os::raw::{c_int, c_uint};

// ARM operand types (arm_op_type)
pub const ARM_OP_INVALID: c_uint = 0;
pub const ARM_OP_REG: c_uint = 1;
pub const ARM_OP_CIMM: c_uint = 2;
pub const ARM_OP_PIMM: c_uint = 3;
pub const ARM_OP_IMM: c_uint = 4;
pub const ARM_OP_FP: c_uint = 5;
pub const ARM_OP_MEM: c_uint = 6;

// ARM64 operand types (arm64_op_type)
pub const ARM64_OP_INVALID: c_uint = 0;
pub const ARM64_OP_REG: c_uint = 1;
pub const ARM64_OP_CIMM: c_uint = 2;
pub const ARM64_OP_IMM: c_uint = 3;
pub const ARM64_OP_FP: c_uint = 4;
pub const ARM64_OP_MEM: c_uint = 5;

// MIPS operand types (mips_op_type)
pub const MIPS_OP_INVALID: c_uint = 0;
pub const MIPS_OP_REG: c_uint = 1;
pub const MIPS_OP_IMM: c_uint = 2;
pub const MIPS_OP_MEM: c_uint = 3;

// X86 operand types (x86_op_type)
pub const X86_OP_INVALID: c_uint = 0;
pub const X86_OP_REG: c_uint = 1;
pub const X86_OP_IMM: c_uint = 2;
pub const X86_OP_FP: c_uint = 3;
pub const X86_OP_MEM: c_uint = 4;

// PPC operand types (ppc_op_type)
pub const PPC_OP_INVALID: c_uint = 0;
pub const PPC_OP_REG: c_uint = 1;
pub const PPC_OP_IMM: c_uint = 2;
pub const PPC_OP_MEM: c_uint = 3;

/// Shifter attached to an ARM / ARM64 operand. `shift_type == 0` means none.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct OpShift {
    pub shift_type: c_uint,
    pub value: c_uint,
}

// ---------------------------------------------------------------- ARM

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ArmOpMem {
    pub base: c_uint,
    pub index: c_uint,
    pub scale: c_int,
    pub disp: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union ArmOpValue {
    pub reg: c_uint,
    pub imm: i32,
    pub fp: f64,
    pub mem: ArmOpMem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ArmOp {
    pub shift: OpShift,
    pub op_type: c_uint,
    pub value: ArmOpValue,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsArm {
    pub cc: c_uint,
    pub update_flags: u8,
    pub writeback: u8,
    pub op_count: u8,
    pub operands: [ArmOp; 20],
}

// ---------------------------------------------------------------- ARM64

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Arm64OpMem {
    pub base: c_uint,
    pub index: c_uint,
    pub disp: i32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union Arm64OpValue {
    pub reg: c_uint,
    pub imm: i32,
    pub fp: f64,
    pub mem: Arm64OpMem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Arm64Op {
    pub shift: OpShift,
    pub ext: c_uint,
    pub op_type: c_uint,
    pub value: Arm64OpValue,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsArm64 {
    pub cc: c_uint,
    pub update_flags: u8,
    pub writeback: u8,
    pub op_count: u8,
    pub operands: [Arm64Op; 8],
}

// ---------------------------------------------------------------- MIPS

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct MipsOpMem {
    pub base: c_uint,
    pub disp: i64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union MipsOpValue {
    pub reg: c_uint,
    pub imm: i64,
    pub mem: MipsOpMem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct MipsOp {
    pub op_type: c_uint,
    pub value: MipsOpValue,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsMips {
    pub op_count: u8,
    pub operands: [MipsOp; 8],
}

// ---------------------------------------------------------------- X86

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct X86OpMem {
    pub base: c_uint,
    pub index: c_uint,
    pub scale: c_int,
    pub disp: i64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union X86OpValue {
    pub reg: c_uint,
    pub imm: i64,
    pub fp: f64,
    pub mem: X86OpMem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct X86Op {
    pub op_type: c_uint,
    pub value: X86OpValue,
    /// Operand size in bytes.
    pub size: u8,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsX86 {
    /// REP/LOCK, segment override, operand-size and address-size prefixes;
    /// 0 when absent.
    pub prefix: [u8; 5],
    pub segment: c_uint,
    pub opcode: [u8; 3],
    pub op_size: u8,
    pub addr_size: u8,
    pub disp_size: u8,
    pub imm_size: u8,
    pub modrm: u8,
    pub sib: u8,
    pub disp: i32,
    pub sib_index: c_uint,
    pub sib_scale: i8,
    pub sib_base: c_uint,
    pub op_count: u8,
    pub operands: [X86Op; 8],
}

// ---------------------------------------------------------------- PPC

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PpcOpMem {
    pub base: c_uint,
    pub disp: i32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union PpcOpValue {
    pub reg: c_uint,
    pub imm: i32,
    pub mem: PpcOpMem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct PpcOp {
    pub op_type: c_uint,
    pub value: PpcOpValue,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CsPpc {
    /// Branch code.
    pub bc: c_uint,
    /// Branch hint.
    pub bh: c_uint,
    pub update_cr0: u8,
    pub op_count: u8,
    pub operands: [PpcOp; 8],
}
