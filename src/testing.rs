//! In-process stand-in for the native engine.
//!
//! Implements the 2.1 entry points as `extern "C"` functions over a small
//! table of known encodings. State is per thread, so parallel tests do not
//! see each other's handles or counters. Arrays handed out by the fake are
//! real heap allocations and must come back through `cs_free`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::ptr;

use crate::ffi::arch::*;
use crate::ffi::loader::NativeApi;
use crate::ffi::*;

pub(crate) static FAKE_API: NativeApi = NativeApi {
    library: None,
    cs_open: fake_open,
    cs_disasm_ex: fake_disasm_ex,
    cs_free: fake_free,
    cs_close: fake_close,
    cs_reg_name: fake_reg_name,
    cs_insn_name: fake_insn_name,
    cs_op_count: fake_op_count,
    cs_op_index: fake_op_index,
    cs_errno: fake_errno,
    cs_option: fake_option,
    cs_version: fake_version,
    cs_support: fake_support,
    cs_strerror: fake_strerror,
};

pub(crate) fn api() -> &'static NativeApi {
    &FAKE_API
}

#[derive(Debug, Clone)]
struct FakeHandle {
    arch: c_uint,
    mode: c_uint,
    syntax: usize,
    detail: bool,
    errno: c_int,
}

#[derive(Debug)]
pub(crate) struct FakeState {
    pub diet: bool,
    pub version: (c_int, c_int),
    /// Status `cs_errno` reports after a decode that produced nothing.
    pub empty_errno: c_int,
    pub reject_options: bool,
    pub fail_close: bool,
    pub opens: usize,
    pub closes: usize,
    pub option_calls: usize,
    pub disasm_calls: usize,
    pub frees: usize,
    /// Instructions handed out and not yet freed.
    pub outstanding: usize,
    handles: HashMap<Csh, FakeHandle>,
    next_handle: Csh,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            diet: false,
            version: (2, 1),
            empty_errno: CS_ERR_OK,
            reject_options: false,
            fail_close: false,
            opens: 0,
            closes: 0,
            option_calls: 0,
            disasm_calls: 0,
            frees: 0,
            outstanding: 0,
            handles: HashMap::new(),
            next_handle: 0x100,
        }
    }
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Fresh fake for the current thread.
pub(crate) fn reset() {
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
}

pub(crate) fn configure(f: impl FnOnce(&mut FakeState)) {
    STATE.with(|s| f(&mut s.borrow_mut()));
}

pub(crate) fn state<T>(f: impl FnOnce(&FakeState) -> T) -> T {
    STATE.with(|s| f(&s.borrow()))
}

pub(crate) fn open_handles() -> usize {
    state(|s| s.handles.len())
}

// Fake register ids, loosely following the 2.1 numbering.
pub(crate) const X86_REG_EAX: u8 = 19;
pub(crate) const X86_REG_EBP: u8 = 20;
pub(crate) const X86_REG_EBX: u8 = 21;
pub(crate) const X86_REG_ECX: u8 = 22;
pub(crate) const X86_REG_EDX: u8 = 24;
pub(crate) const X86_REG_EFLAGS: u8 = 25;
pub(crate) const X86_REG_ESI: u8 = 29;
pub(crate) const X86_REG_ESP: u8 = 30;
pub(crate) const ARM_REG_LR: u8 = 10;
pub(crate) const ARM_REG_PC: u8 = 11;
pub(crate) const ARM_REG_SP: u8 = 12;
pub(crate) const ARM64_REG_X1: u8 = 200;
pub(crate) const ARM64_REG_X2: u8 = 201;
pub(crate) const MIPS_REG_RA: u8 = 31;
pub(crate) const PPC_REG_R1: u8 = 45;

pub(crate) const GROUP_JUMP: u8 = 1;
pub(crate) const GROUP_CALL: u8 = 2;
pub(crate) const GROUP_RET: u8 = 3;
pub(crate) const GROUP_MODE32: u8 = 130;

const REG_NAMES: &[(c_uint, u8, &str)] = &[
    (CS_ARCH_X86, X86_REG_EAX, "eax"),
    (CS_ARCH_X86, X86_REG_EBP, "ebp"),
    (CS_ARCH_X86, X86_REG_EBX, "ebx"),
    (CS_ARCH_X86, X86_REG_ECX, "ecx"),
    (CS_ARCH_X86, X86_REG_EDX, "edx"),
    (CS_ARCH_X86, X86_REG_EFLAGS, "eflags"),
    (CS_ARCH_X86, X86_REG_ESI, "esi"),
    (CS_ARCH_X86, X86_REG_ESP, "esp"),
    (CS_ARCH_ARM, ARM_REG_LR, "lr"),
    (CS_ARCH_ARM, ARM_REG_PC, "pc"),
    (CS_ARCH_ARM, ARM_REG_SP, "sp"),
    (CS_ARCH_ARM64, ARM64_REG_X1, "x1"),
    (CS_ARCH_ARM64, ARM64_REG_X2, "x2"),
    (CS_ARCH_MIPS, MIPS_REG_RA, "ra"),
    (CS_ARCH_PPC, PPC_REG_R1, "r1"),
];

struct Encoding {
    arch: c_uint,
    /// Mode bits that must be set for this entry to match.
    needs: c_uint,
    /// Mode bits that must be clear for this entry to match.
    forbids: c_uint,
    bytes: &'static [u8],
    id: c_uint,
    mnemonic: &'static str,
    op_str: &'static str,
    /// Alternative `(syntax, mnemonic, op_str)` renderings.
    alt: &'static [(usize, &'static str, &'static str)],
    regs_read: &'static [u8],
    regs_write: &'static [u8],
    groups: &'static [u8],
    fill: fn(&mut CsArchDetail),
}

static ENCODINGS: &[Encoding] = &[
    Encoding {
        arch: CS_ARCH_X86,
        needs: 0,
        forbids: 0,
        bytes: &[0x8d, 0x4c, 0x32, 0x08],
        id: 322,
        mnemonic: "lea",
        op_str: "ecx, dword ptr [edx + esi + 8]",
        alt: &[(CS_OPT_SYNTAX_ATT, "leal", "8(%edx, %esi), %ecx")],
        regs_read: &[],
        regs_write: &[],
        groups: &[],
        fill: fill_x86_lea,
    },
    Encoding {
        arch: CS_ARCH_X86,
        needs: 0,
        forbids: 0,
        bytes: &[0x01, 0xd8],
        id: 8,
        mnemonic: "add",
        op_str: "eax, ebx",
        alt: &[(CS_OPT_SYNTAX_ATT, "addl", "%ebx, %eax")],
        regs_read: &[],
        regs_write: &[X86_REG_EFLAGS],
        groups: &[],
        fill: fill_x86_add_reg,
    },
    Encoding {
        arch: CS_ARCH_X86,
        needs: 0,
        forbids: 0,
        bytes: &[0x81, 0xc6, 0x34, 0x12, 0x00, 0x00],
        id: 8,
        mnemonic: "add",
        op_str: "esi, 0x1234",
        alt: &[(CS_OPT_SYNTAX_ATT, "addl", "$0x1234, %esi")],
        regs_read: &[],
        regs_write: &[X86_REG_EFLAGS],
        groups: &[],
        fill: fill_x86_add_imm,
    },
    Encoding {
        arch: CS_ARCH_X86,
        needs: 0,
        forbids: CS_MODE_64,
        bytes: &[0x55],
        id: 588,
        mnemonic: "push",
        op_str: "ebp",
        alt: &[(CS_OPT_SYNTAX_ATT, "pushl", "%ebp")],
        regs_read: &[X86_REG_ESP],
        regs_write: &[X86_REG_ESP],
        groups: &[GROUP_MODE32],
        fill: fill_x86_push,
    },
    Encoding {
        arch: CS_ARCH_ARM,
        needs: CS_MODE_THUMB,
        forbids: 0,
        bytes: &[0x70, 0x47],
        id: 16,
        mnemonic: "bx",
        op_str: "lr",
        alt: &[],
        regs_read: &[],
        regs_write: &[ARM_REG_PC],
        groups: &[GROUP_JUMP],
        fill: fill_arm_bx,
    },
    Encoding {
        arch: CS_ARCH_ARM,
        needs: 0,
        forbids: CS_MODE_THUMB,
        bytes: &[0x04, 0xe0, 0x2d, 0xe5],
        id: 215,
        mnemonic: "str",
        op_str: "lr, [sp, #-4]!",
        alt: &[],
        regs_read: &[],
        regs_write: &[],
        groups: &[],
        fill: fill_arm_str,
    },
    Encoding {
        arch: CS_ARCH_ARM64,
        needs: 0,
        forbids: 0,
        bytes: &[0x21, 0x7c, 0x02, 0x9b],
        id: 195,
        mnemonic: "mul",
        op_str: "x1, x1, x2",
        alt: &[],
        regs_read: &[],
        regs_write: &[],
        groups: &[],
        fill: fill_arm64_mul,
    },
    Encoding {
        arch: CS_ARCH_MIPS,
        needs: CS_MODE_BIG_ENDIAN,
        forbids: 0,
        bytes: &[0x0c, 0x10, 0x00, 0x97],
        id: 243,
        mnemonic: "jal",
        op_str: "0x40025c",
        alt: &[],
        regs_read: &[],
        regs_write: &[MIPS_REG_RA],
        groups: &[GROUP_CALL],
        fill: fill_mips_jal,
    },
    Encoding {
        arch: CS_ARCH_PPC,
        needs: CS_MODE_BIG_ENDIAN,
        forbids: 0,
        bytes: &[0x80, 0x20, 0x00, 0x00],
        id: 300,
        mnemonic: "lwz",
        op_str: "r1, 0(0)",
        alt: &[(CS_OPT_SYNTAX_NOREGNAME, "lwz", "1, 0(0)")],
        regs_read: &[],
        regs_write: &[],
        groups: &[],
        fill: fill_ppc_lwz,
    },
    Encoding {
        arch: CS_ARCH_PPC,
        needs: CS_MODE_BIG_ENDIAN,
        forbids: 0,
        bytes: &[0x4e, 0x80, 0x00, 0x20],
        id: 31,
        mnemonic: "blr",
        op_str: "",
        alt: &[],
        regs_read: &[],
        regs_write: &[],
        groups: &[GROUP_RET],
        fill: fill_ppc_blr,
    },
];

fn zeroed<T: Copy>() -> T {
    // only used for the plain-data engine records
    unsafe { std::mem::zeroed() }
}

fn x86_reg(reg: u8, size: u8) -> X86Op {
    let mut op: X86Op = zeroed();
    op.op_type = X86_OP_REG;
    op.value.reg = c_uint::from(reg);
    op.size = size;
    op
}

fn fill_x86_lea(arch: &mut CsArchDetail) {
    let mut x86: CsX86 = zeroed();
    x86.opcode = [0x8d, 0, 0];
    x86.addr_size = 4;
    x86.op_size = 4;
    x86.modrm = 0x4c;
    x86.sib = 0x32;
    x86.disp = 8;
    x86.disp_size = 1;
    x86.sib_base = c_uint::from(X86_REG_EDX);
    x86.sib_index = c_uint::from(X86_REG_ESI);
    x86.sib_scale = 1;
    x86.op_count = 2;
    x86.operands[0] = x86_reg(X86_REG_ECX, 4);
    x86.operands[1].op_type = X86_OP_MEM;
    x86.operands[1].value.mem = X86OpMem {
        base: c_uint::from(X86_REG_EDX),
        index: c_uint::from(X86_REG_ESI),
        scale: 1,
        disp: 8,
    };
    x86.operands[1].size = 4;
    arch.x86 = x86;
}

fn fill_x86_add_reg(arch: &mut CsArchDetail) {
    let mut x86: CsX86 = zeroed();
    x86.opcode = [0x01, 0, 0];
    x86.modrm = 0xd8;
    x86.op_count = 2;
    x86.operands[0] = x86_reg(X86_REG_EAX, 4);
    x86.operands[1] = x86_reg(X86_REG_EBX, 4);
    arch.x86 = x86;
}

fn fill_x86_add_imm(arch: &mut CsArchDetail) {
    let mut x86: CsX86 = zeroed();
    x86.opcode = [0x81, 0, 0];
    x86.modrm = 0xc6;
    x86.imm_size = 4;
    x86.op_count = 2;
    x86.operands[0] = x86_reg(X86_REG_ESI, 4);
    x86.operands[1].op_type = X86_OP_IMM;
    x86.operands[1].value.imm = 0x1234;
    x86.operands[1].size = 4;
    arch.x86 = x86;
}

fn fill_x86_push(arch: &mut CsArchDetail) {
    let mut x86: CsX86 = zeroed();
    x86.opcode = [0x55, 0, 0];
    x86.op_count = 1;
    x86.operands[0] = x86_reg(X86_REG_EBP, 4);
    arch.x86 = x86;
}

fn fill_arm_bx(arch: &mut CsArchDetail) {
    let mut arm: CsArm = zeroed();
    arm.cc = 15;
    arm.op_count = 1;
    arm.operands[0].op_type = ARM_OP_REG;
    arm.operands[0].value.reg = c_uint::from(ARM_REG_LR);
    arch.arm = arm;
}

fn fill_arm_str(arch: &mut CsArchDetail) {
    let mut arm: CsArm = zeroed();
    arm.cc = 15;
    arm.writeback = 1;
    arm.op_count = 2;
    arm.operands[0].op_type = ARM_OP_REG;
    arm.operands[0].value.reg = c_uint::from(ARM_REG_LR);
    arm.operands[1].op_type = ARM_OP_MEM;
    arm.operands[1].value.mem = ArmOpMem {
        base: c_uint::from(ARM_REG_SP),
        index: 0,
        scale: 1,
        disp: -4,
    };
    arch.arm = arm;
}

fn fill_arm64_mul(arch: &mut CsArchDetail) {
    let mut arm64: CsArm64 = zeroed();
    arm64.op_count = 3;
    for (op, reg) in arm64
        .operands
        .iter_mut()
        .zip([ARM64_REG_X1, ARM64_REG_X1, ARM64_REG_X2])
    {
        op.op_type = ARM64_OP_REG;
        op.value.reg = c_uint::from(reg);
    }
    arch.arm64 = arm64;
}

fn fill_mips_jal(arch: &mut CsArchDetail) {
    let mut mips: CsMips = zeroed();
    mips.op_count = 1;
    mips.operands[0].op_type = MIPS_OP_IMM;
    mips.operands[0].value.imm = 0x40025c;
    arch.mips = mips;
}

fn fill_ppc_lwz(arch: &mut CsArchDetail) {
    let mut ppc: CsPpc = zeroed();
    ppc.op_count = 2;
    ppc.operands[0].op_type = PPC_OP_REG;
    ppc.operands[0].value.reg = c_uint::from(PPC_REG_R1);
    ppc.operands[1].op_type = PPC_OP_MEM;
    ppc.operands[1].value.mem = PpcOpMem { base: 0, disp: 0 };
    arch.ppc = ppc;
}

fn fill_ppc_blr(arch: &mut CsArchDetail) {
    let mut ppc: CsPpc = zeroed();
    ppc.bc = 20;
    arch.ppc = ppc;
}

fn lookup(arch: c_uint, mode: c_uint, code: &[u8]) -> Option<&'static Encoding> {
    ENCODINGS.iter().find(|enc| {
        enc.arch == arch
            && mode & enc.needs == enc.needs
            && mode & enc.forbids == 0
            && code.starts_with(enc.bytes)
    })
}

fn text<const N: usize>(s: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let len = s.len().min(N - 1);
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}

fn build(enc: &Encoding, handle: &FakeHandle, address: u64, diet: bool) -> CsInsn {
    let (mnemonic, op_str) = enc
        .alt
        .iter()
        .find(|(syntax, _, _)| *syntax == handle.syntax)
        .map(|&(_, m, o)| (m, o))
        .unwrap_or((enc.mnemonic, enc.op_str));

    let mut insn: CsInsn = unsafe { std::mem::zeroed() };
    insn.id = enc.id;
    insn.address = address;
    insn.size = enc.bytes.len() as u16;
    insn.bytes[..enc.bytes.len()].copy_from_slice(enc.bytes);
    if !diet {
        insn.mnemonic = text(mnemonic);
        insn.op_str = text(op_str);
    }

    if handle.detail {
        let mut detail: CsDetail = zeroed();
        detail.regs_read[..enc.regs_read.len()].copy_from_slice(enc.regs_read);
        detail.regs_read_count = enc.regs_read.len() as u8;
        detail.regs_write[..enc.regs_write.len()].copy_from_slice(enc.regs_write);
        detail.regs_write_count = enc.regs_write.len() as u8;
        detail.groups[..enc.groups.len()].copy_from_slice(enc.groups);
        detail.groups_count = enc.groups.len() as u8;
        (enc.fill)(&mut detail.arch);
        insn.detail = Box::into_raw(Box::new(detail));
    }
    insn
}

unsafe extern "C" fn fake_open(arch: c_uint, mode: c_uint, handle: *mut Csh) -> c_int {
    if arch > CS_ARCH_PPC {
        return CS_ERR_ARCH;
    }
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.opens += 1;
        s.next_handle += 1;
        let id = s.next_handle;
        s.handles.insert(
            id,
            FakeHandle {
                arch,
                mode,
                syntax: if arch == CS_ARCH_X86 {
                    CS_OPT_SYNTAX_INTEL
                } else {
                    CS_OPT_SYNTAX_DEFAULT
                },
                detail: false,
                errno: CS_ERR_OK,
            },
        );
        *handle = id;
    });
    CS_ERR_OK
}

unsafe extern "C" fn fake_close(handle: *mut Csh) -> c_int {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.closes += 1;
        if s.fail_close {
            return CS_ERR_HANDLE;
        }
        match s.handles.remove(&*handle) {
            Some(_) => {
                *handle = 0;
                CS_ERR_OK
            }
            None => CS_ERR_CSH,
        }
    })
}

unsafe extern "C" fn fake_option(handle: Csh, opt_type: c_int, value: usize) -> c_int {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.option_calls += 1;
        let reject = s.reject_options;
        let Some(h) = s.handles.get_mut(&handle) else {
            return CS_ERR_CSH;
        };
        if reject {
            h.errno = CS_ERR_OPTION;
            return CS_ERR_OPTION;
        }
        match opt_type {
            CS_OPT_SYNTAX => h.syntax = value,
            CS_OPT_DETAIL => h.detail = value == CS_OPT_ON,
            CS_OPT_MODE => h.mode = value as c_uint,
            _ => {
                h.errno = CS_ERR_OPTION;
                return CS_ERR_OPTION;
            }
        }
        CS_ERR_OK
    })
}

unsafe extern "C" fn fake_disasm_ex(
    handle: Csh,
    code: *const u8,
    code_size: usize,
    address: u64,
    count: usize,
    insn: *mut *mut CsInsn,
) -> usize {
    let code = std::slice::from_raw_parts(code, code_size);
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.disasm_calls += 1;
        let diet = s.diet;
        let empty_errno = s.empty_errno;
        let Some(h) = s.handles.get_mut(&handle) else {
            return 0;
        };

        let mut out = Vec::new();
        let mut offset = 0;
        while count == 0 || out.len() < count {
            let Some(enc) = lookup(h.arch, h.mode, &code[offset..]) else {
                break;
            };
            out.push(build(enc, h, address + offset as u64, diet));
            offset += enc.bytes.len();
        }

        if out.is_empty() {
            h.errno = empty_errno;
            *insn = ptr::null_mut();
            return 0;
        }
        h.errno = CS_ERR_OK;
        let decoded = out.len();
        s.outstanding += decoded;
        *insn = Box::into_raw(out.into_boxed_slice()).cast::<CsInsn>();
        decoded
    })
}

unsafe extern "C" fn fake_free(insn: *mut c_void, count: usize) {
    let all = Box::from_raw(ptr::slice_from_raw_parts_mut(insn.cast::<CsInsn>(), count));
    for entry in all.iter() {
        if !entry.detail.is_null() {
            drop(Box::from_raw(entry.detail));
        }
    }
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.frees += 1;
        s.outstanding -= count;
    });
}

unsafe extern "C" fn fake_reg_name(handle: Csh, reg_id: c_uint) -> *const c_char {
    let Some(arch) = state(|s| s.handles.get(&handle).map(|h| h.arch)) else {
        return ptr::null();
    };
    REG_NAMES
        .iter()
        .find(|&&(a, id, _)| a == arch && c_uint::from(id) == reg_id)
        .map_or(ptr::null(), |&(_, _, name)| leak_c_str(name))
}

unsafe extern "C" fn fake_insn_name(handle: Csh, insn_id: c_uint) -> *const c_char {
    let Some(arch) = state(|s| s.handles.get(&handle).map(|h| h.arch)) else {
        return ptr::null();
    };
    ENCODINGS
        .iter()
        .find(|enc| enc.arch == arch && enc.id == insn_id)
        .map_or(ptr::null(), |enc| leak_c_str(enc.mnemonic))
}

unsafe extern "C" fn fake_op_count(_: Csh, _: *const CsInsn, _: c_uint) -> c_int {
    -1
}

unsafe extern "C" fn fake_op_index(_: Csh, _: *const CsInsn, _: c_uint, _: c_uint) -> c_int {
    -1
}

unsafe extern "C" fn fake_errno(handle: Csh) -> c_int {
    state(|s| s.handles.get(&handle).map_or(CS_ERR_CSH, |h| h.errno))
}

unsafe extern "C" fn fake_version(major: *mut c_int, minor: *mut c_int) -> c_int {
    let (maj, min) = state(|s| s.version);
    if !major.is_null() {
        *major = maj;
    }
    if !minor.is_null() {
        *minor = min;
    }
    (maj << 8) + min
}

unsafe extern "C" fn fake_support(query: c_int) -> bool {
    let diet = state(|s| s.diet);
    match query as c_uint {
        CS_SUPPORT_DIET => diet,
        CS_ARCH_ALL => true,
        arch => arch <= CS_ARCH_PPC,
    }
}

unsafe extern "C" fn fake_strerror(code: c_int) -> *const c_char {
    let msg: &[u8] = match code {
        CS_ERR_OK => b"OK (CS_ERR_OK)\0",
        CS_ERR_MEM => b"Out of memory (CS_ERR_MEM)\0",
        CS_ERR_ARCH => b"Invalid architecture (CS_ERR_ARCH)\0",
        CS_ERR_HANDLE => b"Invalid handle (CS_ERR_HANDLE)\0",
        CS_ERR_CSH => b"Invalid csh (CS_ERR_CSH)\0",
        CS_ERR_MODE => b"Invalid mode (CS_ERR_MODE)\0",
        CS_ERR_OPTION => b"Invalid option (CS_ERR_OPTION)\0",
        CS_ERR_DETAIL => b"Details are unavailable (CS_ERR_DETAIL)\0",
        CS_ERR_MEMSETUP => b"Dynamic memory management uninitialized (CS_ERR_MEMSETUP)\0",
        CS_ERR_VERSION => b"Different API version between core & binding (CS_ERR_VERSION)\0",
        CS_ERR_DIET => b"Information irrelevant in diet engine (CS_ERR_DIET)\0",
        _ => return ptr::null(),
    };
    msg.as_ptr().cast::<c_char>()
}

/// Names live for the whole test run, like the engine's static tables.
fn leak_c_str(name: &str) -> *const c_char {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    Box::leak(bytes.into_boxed_slice()).as_ptr().cast::<c_char>()
}
