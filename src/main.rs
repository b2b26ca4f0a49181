//! capstone-bind - command-line disassembler
//!
//! Decodes a hex string with the runtime-loaded Capstone engine and prints
//! one line per instruction, optionally followed by its detail.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use capstone_bind::ffi::loader;
use capstone_bind::{Arch, ArchDetail, Engine, Insn, Mode, OperandValue, Syntax};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliArch {
    Arm,
    Arm64,
    Mips,
    X86,
    Ppc,
}

impl From<CliArch> for Arch {
    fn from(arch: CliArch) -> Self {
        match arch {
            CliArch::Arm => Arch::Arm,
            CliArch::Arm64 => Arch::Arm64,
            CliArch::Mips => Arch::Mips,
            CliArch::X86 => Arch::X86,
            CliArch::Ppc => Arch::Ppc,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
    Little,
    Big,
    Thumb,
    Micro,
    N64,
    #[value(name = "16")]
    Bits16,
    #[value(name = "32")]
    Bits32,
    #[value(name = "64")]
    Bits64,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Little => Mode::LITTLE_ENDIAN,
            CliMode::Big => Mode::BIG_ENDIAN,
            CliMode::Thumb => Mode::THUMB,
            CliMode::Micro => Mode::MICRO,
            CliMode::N64 => Mode::N64,
            CliMode::Bits16 => Mode::MODE_16,
            CliMode::Bits32 => Mode::MODE_32,
            CliMode::Bits64 => Mode::MODE_64,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliSyntax {
    Default,
    Intel,
    Att,
    Noregname,
}

impl From<CliSyntax> for Syntax {
    fn from(syntax: CliSyntax) -> Self {
        match syntax {
            CliSyntax::Default => Syntax::Default,
            CliSyntax::Intel => Syntax::Intel,
            CliSyntax::Att => Syntax::Att,
            CliSyntax::Noregname => Syntax::NoRegName,
        }
    }
}

/// Disassemble machine code with the Capstone engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target architecture
    #[arg(value_enum, required_unless_present = "info")]
    arch: Option<CliArch>,

    /// Machine code as hex ("8d4c3208", "8d 4c 32 08", "\x8d\x4c...")
    #[arg(required_unless_present = "info")]
    hex: Option<String>,

    /// Mode flags, combined (x86 defaults to 32)
    #[arg(short, long, value_enum)]
    mode: Vec<CliMode>,

    /// Address of the first byte (0x prefix or decimal)
    #[arg(short, long, default_value = "0x1000", value_parser = parse_address)]
    address: u64,

    /// Stop after N instructions (0 = all)
    #[arg(short = 'n', long, default_value_t = 0)]
    count: usize,

    /// Operand syntax
    #[arg(short, long, value_enum)]
    syntax: Option<CliSyntax>,

    /// Print registers, groups and operands of each instruction
    #[arg(short, long, default_value_t = false)]
    detail: bool,

    /// Path to the capstone shared library (overrides CAPSTONE_LIB)
    #[arg(long)]
    lib: Option<std::path::PathBuf>,

    /// Print the engine build descriptor and exit
    #[arg(long, default_value_t = false)]
    info: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    ))
    .init();

    let api = match &args.lib {
        Some(path) => loader::init_from(path),
        None => loader::init(),
    }
    .context("Failed to load the capstone library")?;
    log::info!("capstone {:?} loaded", api.version());

    if args.info {
        println!("{}", capstone_bind::version::debug_info_with(api));
        return Ok(());
    }

    let (Some(arch), Some(hex)) = (args.arch, args.hex.as_deref()) else {
        bail!("an architecture and a hex string are required");
    };
    let arch = Arch::from(arch);
    let code = parse_hex(hex)?;
    let mode = combine_modes(arch, &args.mode);

    let mut engine = Engine::open_with(api, arch, mode)
        .with_context(|| format!("Failed to open {} engine (mode {})", arch, mode))?;
    if let Some(syntax) = args.syntax {
        engine.set_syntax(syntax.into()).context("Syntax rejected")?;
    }
    if args.detail {
        engine.set_detail(true).context("Detail rejected")?;
    }

    let insns = engine
        .disasm_count(&code, args.address, args.count)
        .context("Disassembly failed")?;
    if insns.len() == 0 {
        println!("{}", "(no valid instruction at start of buffer)".dimmed());
    }

    let mut decoded = 0usize;
    for insn in insns {
        println!("{}", insn.format_full());
        if args.detail {
            print_detail(&engine, &insn)?;
        }
        decoded += usize::from(insn.size());
    }
    if decoded < code.len() {
        log::info!("{} trailing bytes not decoded", code.len() - decoded);
    }

    engine.close().context("Failed to close engine")?;
    Ok(())
}

/// OR the `-m` flags together; x86 falls back to 32-bit only when no width was given.
fn combine_modes(arch: Arch, flags: &[CliMode]) -> Mode {
    let mode = flags
        .iter()
        .fold(Mode::LITTLE_ENDIAN, |mode, &flag| mode | Mode::from(flag));
    let has_width = [Mode::MODE_16, Mode::MODE_32, Mode::MODE_64]
        .iter()
        .any(|&width| mode.contains(width));
    if arch == Arch::X86 && !has_width {
        mode | Mode::MODE_32
    } else {
        mode
    }
}

/// Parse an address string (supports 0x prefix and decimal)
fn parse_address(s: &str) -> Result<u64, std::num::ParseIntError> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .replace("\\x", "")
        .replace("0x", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if digits.is_empty() {
        bail!("no machine code given");
    }
    hex::decode(&digits).with_context(|| format!("Invalid hex string {:?}", input))
}

fn print_detail(engine: &Engine, insn: &Insn) -> Result<()> {
    let names = |ids: &[u32]| -> Result<Vec<String>> {
        ids.iter()
            .map(|&id| -> Result<String> {
                Ok(engine.reg_name(id)?.unwrap_or_else(|| format!("r{id}")))
            })
            .collect()
    };

    if engine.diet() {
        println!("         {}", "(diet engine: no detail)".dimmed());
        return Ok(());
    }

    let read = names(insn.regs_read()?)?;
    let written = names(insn.regs_write()?)?;
    if !read.is_empty() {
        println!("         {} {}", "read:".yellow(), read.join(", "));
    }
    if !written.is_empty() {
        println!("         {} {}", "write:".yellow(), written.join(", "));
    }
    if !insn.groups()?.is_empty() {
        println!("         {} {:?}", "groups:".yellow(), insn.groups()?);
    }

    for (i, op) in insn.operands()?.iter().enumerate() {
        let value = match op.value {
            OperandValue::Reg(reg) => engine
                .reg_name(reg)
                .ok()
                .flatten()
                .unwrap_or_else(|| format!("reg {reg}")),
            OperandValue::Imm(imm) | OperandValue::CImm(imm) | OperandValue::PImm(imm) => {
                format!("{imm:#x}")
            }
            OperandValue::Fp(fp) => format!("{fp}"),
            OperandValue::Mem(mem) => format!(
                "[base {} index {} scale {} disp {:#x}]",
                mem.base, mem.index, mem.scale, mem.disp
            ),
            OperandValue::Invalid => "invalid".to_string(),
        };
        println!("         {} {:?} {}", format!("op[{i}]").as_str().green(), op.op_type(), value);
    }

    match insn.arch_detail()? {
        ArchDetail::X86(x86) => println!(
            "         {} opcode {} modrm {:#04x} sib {:#04x} disp {:#x}",
            "x86:".cyan(),
            hex::encode(x86.opcode),
            x86.modrm,
            x86.sib,
            x86.disp
        ),
        ArchDetail::Arm(arm) => println!(
            "         {} cc {} update_flags {} writeback {}",
            "arm:".cyan(),
            arm.cc,
            arm.update_flags,
            arm.writeback
        ),
        ArchDetail::Arm64(arm64) => println!(
            "         {} cc {} update_flags {} writeback {}",
            "arm64:".cyan(),
            arm64.cc,
            arm64.update_flags,
            arm64.writeback
        ),
        ArchDetail::Ppc(ppc) => println!(
            "         {} bc {} bh {} update_cr0 {}",
            "ppc:".cyan(),
            ppc.bc,
            ppc.bh,
            ppc.update_cr0
        ),
        ArchDetail::Mips(_) => {}
    }
    Ok(())
}
