//! Append-only buffer of logical operations.
//!
//! Kernel phases write into a `SlotBuffer` in program order; the bundler
//! later packs the buffer into cycles. Nothing here reorders or removes.

use arbor_core::{AluOp, Engine, ScratchAddr, Slot, Word};

/// Ordered list of operations awaiting bundling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotBuffer {
    slots: Vec<Slot>,
}

impl SlotBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one operation.
    #[inline]
    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    // =========================================================================
    // Scalar
    // =========================================================================

    /// `dest = a OP b`.
    #[inline]
    pub fn alu(&mut self, op: AluOp, dest: ScratchAddr, a: ScratchAddr, b: ScratchAddr) {
        self.push(Slot::alu(op, dest, a, b));
    }

    /// `dest = mem[addr]`.
    #[inline]
    pub fn load(&mut self, dest: ScratchAddr, addr: ScratchAddr) {
        self.push(Slot::load(dest, addr));
    }

    /// `dest = value`.
    #[inline]
    pub fn constant(&mut self, dest: ScratchAddr, value: Word) {
        self.push(Slot::constant(dest, value));
    }

    // =========================================================================
    // Vector
    // =========================================================================

    /// Lane-wise `dest = a OP b`.
    #[inline]
    pub fn valu(&mut self, op: AluOp, dest: ScratchAddr, a: ScratchAddr, b: ScratchAddr) {
        self.push(Slot::valu(op, dest, a, b));
    }

    /// Lane-wise `dest = a * b + c`.
    #[inline]
    pub fn multiply_add(
        &mut self,
        dest: ScratchAddr,
        a: ScratchAddr,
        b: ScratchAddr,
        c: ScratchAddr,
    ) {
        self.push(Slot::multiply_add(dest, a, b, c));
    }

    /// Splat a scalar across a vector block.
    #[inline]
    pub fn vbroadcast(&mut self, dest: ScratchAddr, src: ScratchAddr) {
        self.push(Slot::vbroadcast(dest, src));
    }

    /// Load a vector block from `mem[scratch[addr]..]`.
    #[inline]
    pub fn vload(&mut self, dest: ScratchAddr, addr: ScratchAddr) {
        self.push(Slot::vload(dest, addr));
    }

    /// Store a vector block to `mem[scratch[addr]..]`.
    #[inline]
    pub fn vstore(&mut self, addr: ScratchAddr, src: ScratchAddr) {
        self.push(Slot::vstore(addr, src));
    }

    // =========================================================================
    // Misc
    // =========================================================================

    /// Free annotation.
    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Slot::comment(text));
    }

    /// Number of buffered operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Buffered operations in program order.
    #[inline]
    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of buffered operations on `engine`.
    pub fn count(&self, engine: Engine) -> usize {
        self.slots.iter().filter(|s| s.engine() == engine).count()
    }

    /// Drain the buffer, leaving it empty.
    pub fn take(&mut self) -> Vec<Slot> {
        std::mem::take(&mut self.slots)
    }
}

impl From<SlotBuffer> for Vec<Slot> {
    fn from(buf: SlotBuffer) -> Self {
        buf.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: u32) -> ScratchAddr {
        ScratchAddr::new(i)
    }

    #[test]
    fn test_emission_order_preserved() {
        let mut buf = SlotBuffer::new();
        buf.constant(s(0), 4);
        buf.alu(AluOp::Add, s(1), s(0), s(0));
        buf.comment("done");
        assert_eq!(
            buf.as_slice(),
            &[
                Slot::constant(s(0), 4),
                Slot::alu(AluOp::Add, s(1), s(0), s(0)),
                Slot::comment("done"),
            ]
        );
    }

    #[test]
    fn test_engine_count() {
        let mut buf = SlotBuffer::new();
        buf.vbroadcast(s(8), s(0));
        buf.multiply_add(s(16), s(8), s(8), s(8));
        buf.load(s(1), s(0));
        assert_eq!(buf.count(Engine::Valu), 2);
        assert_eq!(buf.count(Engine::Load), 1);
        assert_eq!(buf.count(Engine::Store), 0);
    }

    #[test]
    fn test_take_empties() {
        let mut buf = SlotBuffer::new();
        buf.vload(s(8), s(0));
        buf.vstore(s(0), s(8));
        let taken = buf.take();
        assert_eq!(taken.len(), 2);
        assert!(buf.is_empty());
    }
}
