//! Operation definitions and structural read/write sets.
//!
//! Every operation the machine understands is a `Slot`. The engine that
//! issues a slot is implied by its variant, and the scratch addresses it
//! touches are derived purely from its shape:
//!
//! - scalar operands touch one address
//! - vector operands touch `VLEN` consecutive addresses
//! - the address operand of a memory transfer is always a scalar read
//!
//! Schedulers rely on `Slot::access` alone, so a new opcode only has to be
//! described here.

use crate::machine::{Engine, Word, VLEN};
use smallvec::SmallVec;
use std::fmt;

// =============================================================================
// Scratch Address
// =============================================================================

/// An offset into a core's scratch memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScratchAddr(u32);

impl ScratchAddr {
    /// Create an address from a raw offset.
    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        ScratchAddr(index)
    }

    /// Raw offset.
    #[inline(always)]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Raw offset as a table index.
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Address `delta` words past this one (a lane of a vector block).
    #[inline(always)]
    pub const fn offset(self, delta: u32) -> Self {
        ScratchAddr(self.0 + delta)
    }
}

impl fmt::Display for ScratchAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

// =============================================================================
// ALU Opcodes
// =============================================================================

/// Binary opcodes shared by the scalar and vector arithmetic engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    /// Floor division.
    Div,
    /// Ceiling division.
    CDiv,
    Xor,
    And,
    Or,
    Shl,
    Shr,
    Mod,
    /// `1` if `a < b`, else `0`.
    Lt,
    /// `1` if `a == b`, else `0`.
    Eq,
}

impl AluOp {
    /// Source-level symbol of the opcode.
    pub const fn symbol(self) -> &'static str {
        match self {
            AluOp::Add => "+",
            AluOp::Sub => "-",
            AluOp::Mul => "*",
            AluOp::Div => "//",
            AluOp::CDiv => "cdiv",
            AluOp::Xor => "^",
            AluOp::And => "&",
            AluOp::Or => "|",
            AluOp::Shl => "<<",
            AluOp::Shr => ">>",
            AluOp::Mod => "%",
            AluOp::Lt => "<",
            AluOp::Eq => "==",
        }
    }

    /// Parse an opcode from its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => AluOp::Add,
            "-" => AluOp::Sub,
            "*" => AluOp::Mul,
            "//" => AluOp::Div,
            "cdiv" => AluOp::CDiv,
            "^" => AluOp::Xor,
            "&" => AluOp::And,
            "|" => AluOp::Or,
            "<<" => AluOp::Shl,
            ">>" => AluOp::Shr,
            "%" => AluOp::Mod,
            "<" => AluOp::Lt,
            "==" => AluOp::Eq,
            _ => return None,
        })
    }

    /// Evaluate on two words with the machine's wraparound rules.
    ///
    /// Returns `None` for division or remainder by zero. Shifts by 32 or
    /// more produce zero.
    #[inline]
    pub fn apply(self, a: Word, b: Word) -> Option<Word> {
        Some(match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::Div => a.checked_div(b)?,
            AluOp::CDiv => {
                let q = a.checked_div(b)?;
                if a % b == 0 {
                    q
                } else {
                    q + 1
                }
            }
            AluOp::Xor => a ^ b,
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Shl => a.checked_shl(b).unwrap_or(0),
            AluOp::Shr => a.checked_shr(b).unwrap_or(0),
            AluOp::Mod => a.checked_rem(b)?,
            AluOp::Lt => Word::from(a < b),
            AluOp::Eq => Word::from(a == b),
        })
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// Slot Variants
// =============================================================================

/// Scalar ALU operation: `dest = a OP b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AluSlot {
    pub op: AluOp,
    pub dest: ScratchAddr,
    pub a: ScratchAddr,
    pub b: ScratchAddr,
}

/// Vector ALU operations. All operands name vector blocks except the
/// broadcast source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuSlot {
    /// Copy one scalar into every lane of `dest`.
    Broadcast { dest: ScratchAddr, src: ScratchAddr },
    /// `dest = a * b + c` lane-wise.
    MultiplyAdd {
        dest: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
        c: ScratchAddr,
    },
    /// `dest = a OP b` lane-wise.
    Binary {
        op: AluOp,
        dest: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
    },
}

/// Load engine operations. `addr` operands hold memory addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    /// `dest = mem[scratch[addr]]`.
    Load {
        dest: ScratchAddr,
        addr: ScratchAddr,
    },
    /// `dest + offset = mem[scratch[addr + offset]]`.
    LoadOffset {
        dest: ScratchAddr,
        addr: ScratchAddr,
        offset: u32,
    },
    /// `VLEN` consecutive words starting at `mem[scratch[addr]]`.
    VLoad {
        dest: ScratchAddr,
        addr: ScratchAddr,
    },
    /// Immediate load.
    Const { dest: ScratchAddr, value: Word },
}

/// Store engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreSlot {
    /// `mem[scratch[addr]] = src`.
    Store { addr: ScratchAddr, src: ScratchAddr },
    /// `VLEN` consecutive words from the block at `src`.
    VStore { addr: ScratchAddr, src: ScratchAddr },
}

/// Control-flow engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowSlot {
    /// Scalar select: `dest = cond != 0 ? a : b`.
    Select {
        dest: ScratchAddr,
        cond: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
    },
    /// `dest = a + imm`.
    AddImm {
        dest: ScratchAddr,
        a: ScratchAddr,
        imm: Word,
    },
    /// Lane-wise select.
    VSelect {
        dest: ScratchAddr,
        cond: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
    },
    /// Stop the core.
    Halt,
    /// Pipeline barrier: the core pauses until the machine is resumed.
    Pause,
    /// Append a scratch word to the core's trace buffer.
    TraceWrite { src: ScratchAddr },
    /// Absolute jump if `cond != 0`.
    CondJump { cond: ScratchAddr, target: u32 },
    /// Relative jump if `cond != 0`.
    CondJumpRel { cond: ScratchAddr, offset: i32 },
    /// Absolute jump.
    Jump { target: u32 },
    /// Jump to the bundle index held in `addr`.
    JumpIndirect { addr: ScratchAddr },
    /// `dest = core id`.
    CoreId { dest: ScratchAddr },
}

/// Annotations with no architectural effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DebugSlot {
    Comment(String),
}

// =============================================================================
// Slot
// =============================================================================

/// One logical operation tagged with the engine that issues it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Alu(AluSlot),
    Valu(ValuSlot),
    Load(LoadSlot),
    Store(StoreSlot),
    Flow(FlowSlot),
    Debug(DebugSlot),
}

/// Inline set of scratch addresses. Sized for a three-operand vector op.
pub type AddrSet = SmallVec<[ScratchAddr; 32]>;

/// Scratch addresses read and written by one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Access {
    pub reads: AddrSet,
    pub writes: AddrSet,
}

impl Access {
    #[inline]
    fn scalar_read(&mut self, addr: ScratchAddr) {
        self.reads.push(addr);
    }

    #[inline]
    fn scalar_write(&mut self, addr: ScratchAddr) {
        self.writes.push(addr);
    }

    #[inline]
    fn vector_read(&mut self, base: ScratchAddr) {
        self.reads
            .extend((0..VLEN as u32).map(|lane| base.offset(lane)));
    }

    #[inline]
    fn vector_write(&mut self, base: ScratchAddr) {
        self.writes
            .extend((0..VLEN as u32).map(|lane| base.offset(lane)));
    }
}

impl Slot {
    /// Engine that issues this slot.
    #[inline]
    pub const fn engine(&self) -> Engine {
        match self {
            Slot::Alu(_) => Engine::Alu,
            Slot::Valu(_) => Engine::Valu,
            Slot::Load(_) => Engine::Load,
            Slot::Store(_) => Engine::Store,
            Slot::Flow(_) => Engine::Flow,
            Slot::Debug(_) => Engine::Debug,
        }
    }

    /// Structural read and write sets.
    pub fn access(&self) -> Access {
        let mut acc = Access::default();
        match *self {
            Slot::Alu(AluSlot { dest, a, b, .. }) => {
                acc.scalar_read(a);
                acc.scalar_read(b);
                acc.scalar_write(dest);
            }
            Slot::Valu(ValuSlot::Broadcast { dest, src }) => {
                acc.scalar_read(src);
                acc.vector_write(dest);
            }
            Slot::Valu(ValuSlot::MultiplyAdd { dest, a, b, c }) => {
                acc.vector_read(a);
                acc.vector_read(b);
                acc.vector_read(c);
                acc.vector_write(dest);
            }
            Slot::Valu(ValuSlot::Binary { dest, a, b, .. }) => {
                acc.vector_read(a);
                acc.vector_read(b);
                acc.vector_write(dest);
            }
            Slot::Load(LoadSlot::Load { dest, addr }) => {
                acc.scalar_read(addr);
                acc.scalar_write(dest);
            }
            Slot::Load(LoadSlot::LoadOffset { dest, addr, offset }) => {
                acc.scalar_read(addr.offset(offset));
                acc.scalar_write(dest.offset(offset));
            }
            Slot::Load(LoadSlot::VLoad { dest, addr }) => {
                acc.scalar_read(addr);
                acc.vector_write(dest);
            }
            Slot::Load(LoadSlot::Const { dest, .. }) => {
                acc.scalar_write(dest);
            }
            Slot::Store(StoreSlot::Store { addr, src }) => {
                acc.scalar_read(addr);
                acc.scalar_read(src);
            }
            Slot::Store(StoreSlot::VStore { addr, src }) => {
                acc.scalar_read(addr);
                acc.vector_read(src);
            }
            Slot::Flow(FlowSlot::Select { dest, cond, a, b }) => {
                acc.scalar_read(cond);
                acc.scalar_read(a);
                acc.scalar_read(b);
                acc.scalar_write(dest);
            }
            Slot::Flow(FlowSlot::AddImm { dest, a, .. }) => {
                acc.scalar_read(a);
                acc.scalar_write(dest);
            }
            Slot::Flow(FlowSlot::VSelect { dest, cond, a, b }) => {
                acc.vector_read(cond);
                acc.vector_read(a);
                acc.vector_read(b);
                acc.vector_write(dest);
            }
            Slot::Flow(FlowSlot::TraceWrite { src }) => acc.scalar_read(src),
            Slot::Flow(FlowSlot::CondJump { cond, .. })
            | Slot::Flow(FlowSlot::CondJumpRel { cond, .. }) => acc.scalar_read(cond),
            Slot::Flow(FlowSlot::JumpIndirect { addr }) => acc.scalar_read(addr),
            Slot::Flow(FlowSlot::CoreId { dest }) => acc.scalar_write(dest),
            Slot::Flow(FlowSlot::Halt | FlowSlot::Pause | FlowSlot::Jump { .. }) => {}
            Slot::Debug(_) => {}
        }
        acc
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    /// Scalar `dest = a OP b`.
    #[inline]
    pub const fn alu(op: AluOp, dest: ScratchAddr, a: ScratchAddr, b: ScratchAddr) -> Self {
        Slot::Alu(AluSlot { op, dest, a, b })
    }

    /// Vector `dest = a OP b`.
    #[inline]
    pub const fn valu(op: AluOp, dest: ScratchAddr, a: ScratchAddr, b: ScratchAddr) -> Self {
        Slot::Valu(ValuSlot::Binary { op, dest, a, b })
    }

    /// Vector `dest = a * b + c`.
    #[inline]
    pub const fn multiply_add(
        dest: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
        c: ScratchAddr,
    ) -> Self {
        Slot::Valu(ValuSlot::MultiplyAdd { dest, a, b, c })
    }

    /// Broadcast a scalar into a vector block.
    #[inline]
    pub const fn vbroadcast(dest: ScratchAddr, src: ScratchAddr) -> Self {
        Slot::Valu(ValuSlot::Broadcast { dest, src })
    }

    /// Scalar load through the address held in `addr`.
    #[inline]
    pub const fn load(dest: ScratchAddr, addr: ScratchAddr) -> Self {
        Slot::Load(LoadSlot::Load { dest, addr })
    }

    /// Vector load through the address held in `addr`.
    #[inline]
    pub const fn vload(dest: ScratchAddr, addr: ScratchAddr) -> Self {
        Slot::Load(LoadSlot::VLoad { dest, addr })
    }

    /// Immediate load.
    #[inline]
    pub const fn constant(dest: ScratchAddr, value: Word) -> Self {
        Slot::Load(LoadSlot::Const { dest, value })
    }

    /// Scalar store through the address held in `addr`.
    #[inline]
    pub const fn store(addr: ScratchAddr, src: ScratchAddr) -> Self {
        Slot::Store(StoreSlot::Store { addr, src })
    }

    /// Vector store through the address held in `addr`.
    #[inline]
    pub const fn vstore(addr: ScratchAddr, src: ScratchAddr) -> Self {
        Slot::Store(StoreSlot::VStore { addr, src })
    }

    /// Lane-wise select.
    #[inline]
    pub const fn vselect(
        dest: ScratchAddr,
        cond: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
    ) -> Self {
        Slot::Flow(FlowSlot::VSelect { dest, cond, a, b })
    }

    /// Pipeline barrier.
    #[inline]
    pub const fn pause() -> Self {
        Slot::Flow(FlowSlot::Pause)
    }

    /// Debug comment.
    pub fn comment(text: impl Into<String>) -> Self {
        Slot::Debug(DebugSlot::Comment(text.into()))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Alu(AluSlot { op, dest, a, b }) => write!(f, "{} {}, {}, {}", op, dest, a, b),
            Slot::Valu(ValuSlot::Broadcast { dest, src }) => {
                write!(f, "vbroadcast {}, {}", dest, src)
            }
            Slot::Valu(ValuSlot::MultiplyAdd { dest, a, b, c }) => {
                write!(f, "multiply_add {}, {}, {}, {}", dest, a, b, c)
            }
            Slot::Valu(ValuSlot::Binary { op, dest, a, b }) => {
                write!(f, "v{} {}, {}, {}", op, dest, a, b)
            }
            Slot::Load(LoadSlot::Load { dest, addr }) => write!(f, "load {}, [{}]", dest, addr),
            Slot::Load(LoadSlot::LoadOffset { dest, addr, offset }) => {
                write!(f, "load_offset {}, [{}], {}", dest, addr, offset)
            }
            Slot::Load(LoadSlot::VLoad { dest, addr }) => write!(f, "vload {}, [{}]", dest, addr),
            Slot::Load(LoadSlot::Const { dest, value }) => write!(f, "const {}, {}", dest, value),
            Slot::Store(StoreSlot::Store { addr, src }) => write!(f, "store [{}], {}", addr, src),
            Slot::Store(StoreSlot::VStore { addr, src }) => {
                write!(f, "vstore [{}], {}", addr, src)
            }
            Slot::Flow(flow) => match flow {
                FlowSlot::Select { dest, cond, a, b } => {
                    write!(f, "select {}, {}, {}, {}", dest, cond, a, b)
                }
                FlowSlot::AddImm { dest, a, imm } => write!(f, "add_imm {}, {}, {}", dest, a, imm),
                FlowSlot::VSelect { dest, cond, a, b } => {
                    write!(f, "vselect {}, {}, {}, {}", dest, cond, a, b)
                }
                FlowSlot::Halt => f.write_str("halt"),
                FlowSlot::Pause => f.write_str("pause"),
                FlowSlot::TraceWrite { src } => write!(f, "trace_write {}", src),
                FlowSlot::CondJump { cond, target } => write!(f, "cond_jump {}, @{}", cond, target),
                FlowSlot::CondJumpRel { cond, offset } => {
                    write!(f, "cond_jump_rel {}, {:+}", cond, offset)
                }
                FlowSlot::Jump { target } => write!(f, "jump @{}", target),
                FlowSlot::JumpIndirect { addr } => write!(f, "jump_indirect {}", addr),
                FlowSlot::CoreId { dest } => write!(f, "coreid {}", dest),
            },
            Slot::Debug(DebugSlot::Comment(text)) => write!(f, "# {}", text),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: u32) -> ScratchAddr {
        ScratchAddr::new(i)
    }

    fn block(base: u32) -> Vec<ScratchAddr> {
        (base..base + VLEN as u32).map(ScratchAddr::new).collect()
    }

    // -------------------------------------------------------------------------
    // ALU Semantics
    // -------------------------------------------------------------------------

    #[test]
    fn test_alu_wraps() {
        assert_eq!(AluOp::Add.apply(u32::MAX, 2), Some(1));
        assert_eq!(AluOp::Sub.apply(0, 1), Some(u32::MAX));
        assert_eq!(AluOp::Mul.apply(0x8000_0000, 2), Some(0));
    }

    #[test]
    fn test_alu_division() {
        assert_eq!(AluOp::Div.apply(7, 2), Some(3));
        assert_eq!(AluOp::CDiv.apply(7, 2), Some(4));
        assert_eq!(AluOp::CDiv.apply(8, 2), Some(4));
        assert_eq!(AluOp::Mod.apply(7, 3), Some(1));
        assert_eq!(AluOp::Div.apply(1, 0), None);
        assert_eq!(AluOp::CDiv.apply(1, 0), None);
        assert_eq!(AluOp::Mod.apply(1, 0), None);
    }

    #[test]
    fn test_alu_shifts_saturate_to_zero() {
        assert_eq!(AluOp::Shl.apply(1, 31), Some(0x8000_0000));
        assert_eq!(AluOp::Shl.apply(1, 32), Some(0));
        assert_eq!(AluOp::Shr.apply(u32::MAX, 40), Some(0));
    }

    #[test]
    fn test_alu_comparisons() {
        assert_eq!(AluOp::Lt.apply(1, 2), Some(1));
        assert_eq!(AluOp::Lt.apply(2, 2), Some(0));
        assert_eq!(AluOp::Eq.apply(5, 5), Some(1));
    }

    #[test]
    fn test_symbol_round_trip() {
        for op in [
            AluOp::Add,
            AluOp::Sub,
            AluOp::Mul,
            AluOp::Div,
            AluOp::CDiv,
            AluOp::Xor,
            AluOp::And,
            AluOp::Or,
            AluOp::Shl,
            AluOp::Shr,
            AluOp::Mod,
            AluOp::Lt,
            AluOp::Eq,
        ] {
            assert_eq!(AluOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(AluOp::from_symbol("**"), None);
    }

    // -------------------------------------------------------------------------
    // Read/Write Sets
    // -------------------------------------------------------------------------

    #[test]
    fn test_alu_access() {
        let acc = Slot::alu(AluOp::Add, s(3), s(1), s(2)).access();
        assert_eq!(acc.reads.as_slice(), &[s(1), s(2)]);
        assert_eq!(acc.writes.as_slice(), &[s(3)]);
    }

    #[test]
    fn test_valu_binary_touches_whole_blocks() {
        let acc = Slot::valu(AluOp::Xor, s(16), s(0), s(8)).access();
        let mut expected = block(0);
        expected.extend(block(8));
        assert_eq!(acc.reads.to_vec(), expected);
        assert_eq!(acc.writes.to_vec(), block(16));
    }

    #[test]
    fn test_multiply_add_reads_three_blocks() {
        let acc = Slot::multiply_add(s(24), s(0), s(8), s(16)).access();
        assert_eq!(acc.reads.len(), 3 * VLEN);
        assert!(!acc.reads.spilled());
        assert_eq!(acc.writes.to_vec(), block(24));
    }

    #[test]
    fn test_broadcast_reads_scalar() {
        let acc = Slot::vbroadcast(s(8), s(3)).access();
        assert_eq!(acc.reads.as_slice(), &[s(3)]);
        assert_eq!(acc.writes.to_vec(), block(8));
    }

    #[test]
    fn test_memory_address_operand_is_scalar() {
        let acc = Slot::vload(s(8), s(2)).access();
        assert_eq!(acc.reads.as_slice(), &[s(2)]);
        assert_eq!(acc.writes.len(), VLEN);

        let acc = Slot::vstore(s(2), s(8)).access();
        assert_eq!(acc.reads[0], s(2));
        assert_eq!(acc.reads.len(), 1 + VLEN);
        assert!(acc.writes.is_empty());

        let acc = Slot::store(s(1), s(5)).access();
        assert_eq!(acc.reads.as_slice(), &[s(1), s(5)]);
    }

    #[test]
    fn test_load_offset_shifts_both_operands() {
        let slot = Slot::Load(LoadSlot::LoadOffset {
            dest: s(8),
            addr: s(16),
            offset: 3,
        });
        let acc = slot.access();
        assert_eq!(acc.reads.as_slice(), &[s(19)]);
        assert_eq!(acc.writes.as_slice(), &[s(11)]);
    }

    #[test]
    fn test_const_and_pause_access() {
        let acc = Slot::constant(s(4), 99).access();
        assert!(acc.reads.is_empty());
        assert_eq!(acc.writes.as_slice(), &[s(4)]);

        let acc = Slot::pause().access();
        assert!(acc.reads.is_empty() && acc.writes.is_empty());
        assert!(Slot::comment("x").access().writes.is_empty());
    }

    #[test]
    fn test_vselect_access() {
        let acc = Slot::vselect(s(0), s(8), s(16), s(24)).access();
        assert_eq!(acc.reads.len(), 3 * VLEN);
        assert_eq!(acc.writes.to_vec(), block(0));
    }

    #[test]
    fn test_engine_tagging() {
        let add = Slot::alu(AluOp::Add, s(0), s(0), s(0));
        assert_eq!(add.engine(), Engine::Alu);
        assert_eq!(Slot::vbroadcast(s(0), s(0)).engine(), Engine::Valu);
        assert_eq!(Slot::constant(s(0), 1).engine(), Engine::Load);
        assert_eq!(Slot::vstore(s(0), s(0)).engine(), Engine::Store);
        assert_eq!(Slot::pause().engine(), Engine::Flow);
        assert_eq!(Slot::comment("c").engine(), Engine::Debug);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Slot::alu(AluOp::Add, s(3), s(1), s(2)).to_string(),
            "+ s3, s1, s2"
        );
        assert_eq!(Slot::constant(s(0), 7).to_string(), "const s0, 7");
        assert_eq!(Slot::pause().to_string(), "pause");
    }
}
