//! capstone-bind - safe bindings for the Capstone 2.1 disassembly engine
//!
//! The engine library is loaded at runtime (see [`ffi::loader`]). An
//! [`Engine`] owns one native handle; [`Engine::disasm`] turns machine code
//! into owned [`Insn`] records whose detail is decoded lazily.
//!
//! ```no_run
//! use capstone_bind::{Arch, Engine, Mode};
//!
//! let mut engine = Engine::open(Arch::X86, Mode::MODE_32)?;
//! engine.set_detail(true)?;
//! for insn in engine.disasm(&[0x8d, 0x4c, 0x32, 0x08], 0x1000)? {
//!     println!("{} {:?}", insn, insn.regs_read()?);
//! }
//! engine.close()?;
//! # Ok::<(), capstone_bind::Error>(())
//! ```

pub mod detail;
pub mod disasm;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod insn;
pub mod options;
pub mod version;

#[cfg(test)]
mod testing;

pub use detail::{
    Arm64Detail, ArmDetail, ArchDetail, Detail, GroupId, MemOperand, MipsDetail, Operand,
    OperandType, OperandValue, PpcDetail, RegId, Shift, X86Detail,
};
pub use disasm::{disasm_lite_quick, disasm_quick, Disasm, LiteDisasm};
pub use engine::{Arch, Engine};
pub use error::{Error, ErrorCode, Result};
pub use insn::{Insn, LiteInsn};
pub use options::{Mode, Syntax};
pub use version::{binding_version, debug_info, engine_version, support, Support};
