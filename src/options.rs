//! Option Controller - runtime-mutable engine options
//!
//! Setters validate locally, round-trip through `cs_option`, and only then
//! commit the cached value; a rejected call leaves the engine as it was.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::os::raw::c_uint;

use crate::engine::{Arch, Engine};
use crate::error::{Error, ErrorCode, Result};
use crate::ffi;

/// Decode mode bitmask: endianness, bit width and sub-architecture bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mode(c_uint);

impl Mode {
    pub const LITTLE_ENDIAN: Self = Self(ffi::CS_MODE_LITTLE_ENDIAN);
    /// 32-bit ARM; the same value as `LITTLE_ENDIAN`.
    pub const ARM: Self = Self(ffi::CS_MODE_ARM);
    pub const MODE_16: Self = Self(ffi::CS_MODE_16);
    pub const MODE_32: Self = Self(ffi::CS_MODE_32);
    pub const MODE_64: Self = Self(ffi::CS_MODE_64);
    pub const THUMB: Self = Self(ffi::CS_MODE_THUMB);
    /// MicroMips; shares its bit with `THUMB`.
    pub const MICRO: Self = Self(ffi::CS_MODE_MICRO);
    /// Nintendo-64 MIPS.
    pub const N64: Self = Self(ffi::CS_MODE_N64);
    pub const BIG_ENDIAN: Self = Self(ffi::CS_MODE_BIG_ENDIAN);

    const WIDTHS: c_uint = ffi::CS_MODE_16 | ffi::CS_MODE_32 | ffi::CS_MODE_64;

    pub const fn from_bits(bits: c_uint) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> c_uint {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether `arch` accepts every bit set in this mode.
    ///
    /// X86 needs exactly one width; MIPS and PPC take at most one.
    pub fn supported_by(self, arch: Arch) -> bool {
        let allowed = match arch {
            Arch::Arm => ffi::CS_MODE_THUMB | ffi::CS_MODE_BIG_ENDIAN,
            Arch::Arm64 => ffi::CS_MODE_BIG_ENDIAN,
            Arch::Mips => {
                ffi::CS_MODE_MICRO
                    | ffi::CS_MODE_N64
                    | ffi::CS_MODE_32
                    | ffi::CS_MODE_64
                    | ffi::CS_MODE_BIG_ENDIAN
            }
            Arch::X86 => Self::WIDTHS,
            Arch::Ppc => ffi::CS_MODE_32 | ffi::CS_MODE_64 | ffi::CS_MODE_BIG_ENDIAN,
        };
        if self.0 & !allowed != 0 {
            return false;
        }

        let widths = (self.0 & Self::WIDTHS).count_ones();
        match arch {
            Arch::X86 => widths == 1,
            Arch::Mips | Arch::Ppc => widths <= 1,
            Arch::Arm | Arch::Arm64 => true,
        }
    }
}

impl BitOr for Mode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Text rendering style of operand strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Default,
    /// X86 only; the X86 default.
    Intel,
    /// X86 only.
    Att,
    /// Registers printed as bare numbers (PPC).
    NoRegName,
}

impl Syntax {
    pub fn raw(self) -> usize {
        match self {
            Syntax::Default => ffi::CS_OPT_SYNTAX_DEFAULT,
            Syntax::Intel => ffi::CS_OPT_SYNTAX_INTEL,
            Syntax::Att => ffi::CS_OPT_SYNTAX_ATT,
            Syntax::NoRegName => ffi::CS_OPT_SYNTAX_NOREGNAME,
        }
    }
}

impl Engine {
    /// Switch operand text rendering for subsequent decodes.
    pub fn set_syntax(&mut self, syntax: Syntax) -> Result<()> {
        self.set_option(ffi::CS_OPT_SYNTAX, syntax.raw())?;
        log::debug!("{} syntax -> {:?}", self.arch(), syntax);
        self.syntax = Some(syntax);
        Ok(())
    }

    /// Toggle detail population for subsequent decodes.
    ///
    /// Records already produced keep whatever they were decoded with.
    pub fn set_detail(&mut self, on: bool) -> Result<()> {
        let value = if on { ffi::CS_OPT_ON } else { ffi::CS_OPT_OFF };
        self.set_option(ffi::CS_OPT_DETAIL, value)?;
        log::debug!("{} detail -> {}", self.arch(), on);
        self.detail = on;
        Ok(())
    }

    /// Reinterpret width and endianness for subsequent decodes.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if !mode.supported_by(self.arch()) {
            return Err(Error::from_code(self.api, ErrorCode::UnsupportedOption));
        }
        self.set_option(ffi::CS_OPT_MODE, mode.bits() as usize)?;
        log::debug!("{} mode -> {}", self.arch(), mode);
        self.mode = mode;
        Ok(())
    }
}
