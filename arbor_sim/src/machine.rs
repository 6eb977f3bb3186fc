//! Cycle-stepped simulator for the Arbor VLIW machine.
//!
//! # Execution Model
//!
//! Every running core issues one bundle per step. All slots of a bundle read
//! scratch and memory as they were before the bundle; their writes are
//! buffered and committed together once every slot has executed. A step
//! costs one cycle when any core issued a non-debug slot.
//!
//! `pause` parks a core until the next call to `Machine::run`, which lets a
//! harness compare memory against a reference at well-defined points.

use crate::error::{SimError, SimResult};
use crate::frame::{Core, CoreState};
use arbor_core::{
    AluSlot, Bundle, DebugInfo, Engine, FlowSlot, LoadSlot, Program, ScratchAddr, Slot,
    SlotLimits, StoreSlot, ValuSlot, Word, N_CORES, SCRATCH_SIZE, VLEN,
};
use tracing::{debug, trace};

// =============================================================================
// Write Buffer
// =============================================================================

/// Writes produced by one bundle, committed after all its slots ran.
#[derive(Debug, Default)]
struct PendingWrites {
    scratch: Vec<(usize, Word)>,
    mem: Vec<(usize, Word)>,
}

/// Shared view used while executing one bundle on one core.
struct StepContext<'a> {
    core: &'a mut Core,
    mem: &'a [Word],
    pending: PendingWrites,
    pc: usize,
    enable_pause: bool,
}

impl StepContext<'_> {
    #[inline]
    fn read(&self, addr: ScratchAddr) -> SimResult<Word> {
        self.core.read(addr)
    }

    #[inline]
    fn load_mem(&self, addr: Word) -> SimResult<Word> {
        self.mem
            .get(addr as usize)
            .copied()
            .ok_or(SimError::MemoryOutOfBounds {
                addr: addr as usize,
                size: self.mem.len(),
            })
    }

    #[inline]
    fn write(&mut self, addr: ScratchAddr, value: Word) {
        self.pending.scratch.push((addr.as_usize(), value));
    }

    #[inline]
    fn write_mem(&mut self, addr: usize, value: Word) {
        self.pending.mem.push((addr, value));
    }

    fn binary(&self, op: arbor_core::AluOp, a: Word, b: Word) -> SimResult<Word> {
        op.apply(a, b)
            .ok_or(SimError::DivisionByZero { pc: self.pc })
    }

    fn jump_to(&mut self, target: i64) -> SimResult<()> {
        self.core.pc = usize::try_from(target).map_err(|_| SimError::InvalidJumpTarget {
            pc: self.pc,
            target,
        })?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Engines
    // -------------------------------------------------------------------------

    fn alu(&mut self, slot: &AluSlot) -> SimResult<()> {
        let a = self.read(slot.a)?;
        let b = self.read(slot.b)?;
        let value = self.binary(slot.op, a, b)?;
        self.write(slot.dest, value);
        Ok(())
    }

    fn valu(&mut self, slot: &ValuSlot) -> SimResult<()> {
        match *slot {
            ValuSlot::Broadcast { dest, src } => {
                let value = self.read(src)?;
                for lane in 0..VLEN as u32 {
                    self.write(dest.offset(lane), value);
                }
            }
            ValuSlot::MultiplyAdd { dest, a, b, c } => {
                let (a, b, c) = (
                    self.core.read_vector(a)?,
                    self.core.read_vector(b)?,
                    self.core.read_vector(c)?,
                );
                for lane in 0..VLEN {
                    let value = a[lane].wrapping_mul(b[lane]).wrapping_add(c[lane]);
                    self.write(dest.offset(lane as u32), value);
                }
            }
            ValuSlot::Binary { op, dest, a, b } => {
                let (a, b) = (self.core.read_vector(a)?, self.core.read_vector(b)?);
                for lane in 0..VLEN {
                    let value = self.binary(op, a[lane], b[lane])?;
                    self.write(dest.offset(lane as u32), value);
                }
            }
        }
        Ok(())
    }

    fn load(&mut self, slot: &LoadSlot) -> SimResult<()> {
        match *slot {
            LoadSlot::Load { dest, addr } => {
                let value = self.load_mem(self.read(addr)?)?;
                self.write(dest, value);
            }
            LoadSlot::LoadOffset { dest, addr, offset } => {
                let value = self.load_mem(self.read(addr.offset(offset))?)?;
                self.write(dest.offset(offset), value);
            }
            LoadSlot::VLoad { dest, addr } => {
                let base = self.read(addr)?;
                for lane in 0..VLEN as u32 {
                    let value = self.load_mem(base.wrapping_add(lane))?;
                    self.write(dest.offset(lane), value);
                }
            }
            LoadSlot::Const { dest, value } => self.write(dest, value),
        }
        Ok(())
    }

    fn store(&mut self, slot: &StoreSlot) -> SimResult<()> {
        let size = self.mem.len();
        let check = |addr: usize| {
            if addr < size {
                Ok(addr)
            } else {
                Err(SimError::MemoryOutOfBounds { addr, size })
            }
        };
        match *slot {
            StoreSlot::Store { addr, src } => {
                let target = check(self.read(addr)? as usize)?;
                let value = self.read(src)?;
                self.write_mem(target, value);
            }
            StoreSlot::VStore { addr, src } => {
                let base = self.read(addr)? as usize;
                let values = self.core.read_vector(src)?;
                for (lane, value) in values.into_iter().enumerate() {
                    let target = check(base + lane)?;
                    self.write_mem(target, value);
                }
            }
        }
        Ok(())
    }

    fn flow(&mut self, slot: &FlowSlot) -> SimResult<()> {
        match *slot {
            FlowSlot::Select { dest, cond, a, b } => {
                let pick = if self.read(cond)? != 0 { a } else { b };
                let value = self.read(pick)?;
                self.write(dest, value);
            }
            FlowSlot::AddImm { dest, a, imm } => {
                let value = self.read(a)?.wrapping_add(imm);
                self.write(dest, value);
            }
            FlowSlot::VSelect { dest, cond, a, b } => {
                let (cond, a, b) = (
                    self.core.read_vector(cond)?,
                    self.core.read_vector(a)?,
                    self.core.read_vector(b)?,
                );
                for lane in 0..VLEN {
                    let value = if cond[lane] != 0 { a[lane] } else { b[lane] };
                    self.write(dest.offset(lane as u32), value);
                }
            }
            FlowSlot::Halt => self.core.state = CoreState::Stopped,
            FlowSlot::Pause => {
                if self.enable_pause {
                    self.core.state = CoreState::Paused;
                }
            }
            FlowSlot::TraceWrite { src } => {
                let value = self.read(src)?;
                self.core.trace_buf.push(value);
            }
            FlowSlot::CondJump { cond, target } => {
                if self.read(cond)? != 0 {
                    self.jump_to(i64::from(target))?;
                }
            }
            FlowSlot::CondJumpRel { cond, offset } => {
                if self.read(cond)? != 0 {
                    self.jump_to(self.core.pc as i64 + i64::from(offset))?;
                }
            }
            FlowSlot::Jump { target } => self.jump_to(i64::from(target))?,
            FlowSlot::JumpIndirect { addr } => {
                let target = self.read(addr)?;
                self.jump_to(i64::from(target))?;
            }
            FlowSlot::CoreId { dest } => {
                let id = self.core.id as Word;
                self.write(dest, id);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Machine
// =============================================================================

/// A multi-core machine executing one shared program over shared memory.
#[derive(Debug, Clone)]
pub struct Machine {
    cores: Vec<Core>,
    mem: Vec<Word>,
    program: Program,
    debug_info: DebugInfo,
    limits: SlotLimits,
    cycle: u64,
    /// Honor `pause`. When false, `pause` is a no-op.
    pub enable_pause: bool,
}

impl Machine {
    /// Machine with the default core count, scratch size and widths.
    pub fn new(mem: Vec<Word>, program: Program, debug_info: DebugInfo) -> Self {
        Self::with_config(
            mem,
            program,
            debug_info,
            N_CORES,
            SCRATCH_SIZE,
            SlotLimits::DEFAULT,
        )
    }

    /// Machine with explicit core count, scratch size and widths.
    pub fn with_config(
        mem: Vec<Word>,
        program: Program,
        debug_info: DebugInfo,
        n_cores: usize,
        scratch_size: usize,
        limits: SlotLimits,
    ) -> Self {
        Machine {
            cores: (0..n_cores).map(|id| Core::new(id, scratch_size)).collect(),
            mem,
            program,
            debug_info,
            limits,
            cycle: 0,
            enable_pause: true,
        }
    }

    /// Cycles elapsed so far.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Shared main memory.
    #[inline]
    pub fn mem(&self) -> &[Word] {
        &self.mem
    }

    /// All cores.
    #[inline]
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Scratch names recorded by the kernel builder.
    #[inline]
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Whether every core has stopped.
    pub fn is_finished(&self) -> bool {
        self.cores.iter().all(|c| c.state == CoreState::Stopped)
    }

    /// Resume paused cores and run until every core is paused or stopped.
    pub fn run(&mut self) -> SimResult<()> {
        for core in &mut self.cores {
            if core.state == CoreState::Paused {
                core.state = CoreState::Running;
            }
        }

        let start = self.cycle;
        while self.cores.iter().any(|c| c.state == CoreState::Running) {
            let mut has_non_debug = false;
            for core in &mut self.cores {
                if core.state != CoreState::Running {
                    continue;
                }
                let Some(bundle) = self.program.get(core.pc) else {
                    core.state = CoreState::Stopped;
                    continue;
                };
                let pc = core.pc;
                core.pc += 1;
                trace!(core = core.id, pc, cycle = self.cycle, bundle = %bundle, "issue");
                step(
                    bundle,
                    core,
                    &mut self.mem,
                    &self.limits,
                    pc,
                    self.enable_pause,
                )?;
                has_non_debug |= bundle.has_non_debug();
            }
            if has_non_debug {
                self.cycle += 1;
            }
        }

        debug!(
            cycles = self.cycle - start,
            total = self.cycle,
            finished = self.is_finished(),
            "machine run returned"
        );
        Ok(())
    }
}

/// Execute one bundle on one core and commit its writes.
fn step(
    bundle: &Bundle,
    core: &mut Core,
    mem: &mut [Word],
    limits: &SlotLimits,
    pc: usize,
    enable_pause: bool,
) -> SimResult<()> {
    let mut ctx = StepContext {
        core,
        mem,
        pending: PendingWrites::default(),
        pc,
        enable_pause,
    };

    for engine in Engine::ALL {
        if engine.is_debug() {
            continue;
        }
        let slots = bundle.slots(engine);
        let limit = limits.width(engine);
        if slots.len() > limit {
            return Err(SimError::SlotLimitExceeded {
                pc,
                engine,
                count: slots.len(),
                limit,
            });
        }
        for slot in slots {
            match slot {
                Slot::Alu(s) => ctx.alu(s)?,
                Slot::Valu(s) => ctx.valu(s)?,
                Slot::Load(s) => ctx.load(s)?,
                Slot::Store(s) => ctx.store(s)?,
                Slot::Flow(s) => ctx.flow(s)?,
                Slot::Debug(_) => {}
            }
        }
    }

    let PendingWrites {
        scratch,
        mem: mem_writes,
    } = ctx.pending;
    let size = core.scratch.len();
    for (addr, value) in scratch {
        *core
            .scratch
            .get_mut(addr)
            .ok_or(SimError::ScratchOutOfBounds { addr, size })? = value;
    }
    for (addr, value) in mem_writes {
        mem[addr] = value;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::AluOp;

    fn s(i: u32) -> ScratchAddr {
        ScratchAddr::new(i)
    }

    fn program(bundles: Vec<Vec<Slot>>) -> Program {
        bundles
            .into_iter()
            .map(|slots| {
                let mut bundle = Bundle::new();
                for slot in slots {
                    bundle.push(slot);
                }
                bundle
            })
            .collect()
    }

    fn machine(mem: Vec<Word>, bundles: Vec<Vec<Slot>>) -> Machine {
        Machine::new(mem, program(bundles), DebugInfo::new())
    }

    // -------------------------------------------------------------------------
    // Bundle Semantics
    // -------------------------------------------------------------------------

    #[test]
    fn test_reads_see_values_before_bundle() {
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 5), Slot::constant(s(1), 7)],
                // s1 still holds 7 for the add even though the const rewrites it.
                vec![
                    Slot::alu(AluOp::Add, s(2), s(0), s(1)),
                    Slot::constant(s(1), 100),
                ],
            ],
        );
        m.run().unwrap();
        assert_eq!(m.cores()[0].scratch[2], 12);
        assert_eq!(m.cores()[0].scratch[1], 100);
        assert_eq!(m.cycle(), 2);
    }

    #[test]
    fn test_debug_only_bundle_costs_nothing() {
        let mut m = machine(
            vec![0; 4],
            vec![vec![Slot::comment("start")], vec![Slot::constant(s(0), 1)]],
        );
        m.run().unwrap();
        assert_eq!(m.cycle(), 1);
        assert!(m.is_finished());
    }

    #[test]
    fn test_pause_disabled_runs_through_and_traces() {
        let trace = |src| Slot::Flow(FlowSlot::TraceWrite { src });
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 3)],
                vec![trace(s(0))],
                vec![Slot::pause()],
                vec![Slot::constant(s(0), 4)],
                vec![trace(s(0))],
            ],
        );
        m.enable_pause = false;
        m.run().unwrap();
        assert!(m.is_finished());
        assert_eq!(m.cores()[0].trace_buf, vec![3, 4]);
        // The ignored pause still issues a flow slot.
        assert_eq!(m.cycle(), 5);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 1)],
                vec![Slot::pause()],
                vec![Slot::constant(s(0), 2)],
                vec![Slot::pause()],
            ],
        );
        m.run().unwrap();
        assert_eq!(m.cores()[0].state, CoreState::Paused);
        assert_eq!(m.cores()[0].scratch[0], 1);
        assert_eq!(m.cycle(), 2);

        m.run().unwrap();
        assert_eq!(m.cores()[0].scratch[0], 2);
        assert_eq!(m.cycle(), 4);

        m.run().unwrap();
        assert!(m.is_finished());
        assert_eq!(m.cycle(), 4);
    }

    #[test]
    fn test_vector_memory_round_trip() {
        let mut mem: Vec<Word> = (0..32).collect();
        mem[0] = 8;
        mem[1] = 20;
        let mut m = machine(
            mem,
            vec![
                vec![Slot::constant(s(0), 0), Slot::constant(s(1), 1)],
                vec![Slot::load(s(2), s(0)), Slot::load(s(3), s(1))],
                vec![Slot::vload(s(8), s(2))],
                vec![Slot::vstore(s(3), s(8))],
            ],
        );
        m.run().unwrap();
        assert_eq!(&m.mem()[20..28], &[8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_valu_ops() {
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 3), Slot::constant(s(1), 5)],
                vec![Slot::vbroadcast(s(8), s(0)), Slot::vbroadcast(s(16), s(1))],
                vec![
                    Slot::multiply_add(s(24), s(8), s(16), s(8)),
                    Slot::valu(AluOp::Lt, s(32), s(8), s(16)),
                ],
            ],
        );
        m.run().unwrap();
        let core = &m.cores()[0];
        assert_eq!(core.read_vector(s(24)).unwrap(), [18; VLEN]);
        assert_eq!(core.read_vector(s(32)).unwrap(), [1; VLEN]);
    }

    #[test]
    fn test_flow_select_and_jumps() {
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 1), Slot::constant(s(1), 10)],
                vec![Slot::Flow(FlowSlot::CondJump {
                    cond: s(0),
                    target: 3,
                })],
                vec![Slot::constant(s(1), 99)],
                vec![Slot::Flow(FlowSlot::AddImm {
                    dest: s(2),
                    a: s(1),
                    imm: 5,
                })],
                vec![Slot::Flow(FlowSlot::CoreId { dest: s(3) })],
                vec![Slot::Flow(FlowSlot::Halt)],
                vec![Slot::constant(s(1), 77)],
            ],
        );
        m.run().unwrap();
        let core = &m.cores()[0];
        assert_eq!(core.scratch[1], 10);
        assert_eq!(core.scratch[2], 15);
        assert_eq!(core.scratch[3], 0);
        assert!(m.is_finished());
    }

    // -------------------------------------------------------------------------
    // Faults
    // -------------------------------------------------------------------------

    #[test]
    fn test_slot_limit_enforced() {
        let mut m = machine(
            vec![0; 4],
            vec![vec![
                Slot::constant(s(0), 1),
                Slot::constant(s(1), 1),
                Slot::constant(s(2), 1),
            ]],
        );
        assert_eq!(
            m.run(),
            Err(SimError::SlotLimitExceeded {
                pc: 0,
                engine: Engine::Load,
                count: 3,
                limit: 2,
            })
        );
    }

    #[test]
    fn test_division_by_zero() {
        let mut m = machine(
            vec![0; 4],
            vec![vec![Slot::alu(AluOp::Div, s(0), s(1), s(2))]],
        );
        assert_eq!(m.run(), Err(SimError::DivisionByZero { pc: 0 }));
    }

    #[test]
    fn test_memory_bounds() {
        let mut m = machine(
            vec![0; 4],
            vec![
                vec![Slot::constant(s(0), 4)],
                vec![Slot::load(s(1), s(0))],
            ],
        );
        assert_eq!(
            m.run(),
            Err(SimError::MemoryOutOfBounds { addr: 4, size: 4 })
        );
    }
}
