//! The append-only kernel builder.
//!
//! Owns the scratch allocator, the constant pools and the pending operation
//! buffer of one build. Phases borrow it to allocate and emit; nothing is
//! shared between builds.

use crate::emit::SlotBuffer;
use crate::error::KernelResult;
use crate::scratch::{ConstantPool, ScratchAllocator};
use arbor_core::{DebugInfo, ScratchAddr, Slot, Word, SCRATCH_SIZE, VLEN};

/// Build state for one kernel.
#[derive(Debug, Clone)]
pub struct KernelBuilder {
    alloc: ScratchAllocator,
    pool: ConstantPool,
    ops: SlotBuffer,
}

impl KernelBuilder {
    /// Builder over `capacity` words of scratch.
    pub fn new(capacity: usize) -> Self {
        KernelBuilder {
            alloc: ScratchAllocator::new(capacity),
            pool: ConstantPool::new(),
            ops: SlotBuffer::new(),
        }
    }

    /// Reserve a named scalar.
    #[inline]
    pub fn scalar(&mut self, name: &str) -> KernelResult<ScratchAddr> {
        self.alloc.named(name, 1)
    }

    /// Reserve a named vector block.
    #[inline]
    pub fn vector(&mut self, name: &str) -> KernelResult<ScratchAddr> {
        self.alloc.named(name, VLEN)
    }

    /// Reserve a named region of `length` words.
    #[inline]
    pub fn region(&mut self, name: &str, length: usize) -> KernelResult<ScratchAddr> {
        self.alloc.named(name, length)
    }

    /// Pooled scalar constant.
    pub fn constant(&mut self, value: Word) -> KernelResult<ScratchAddr> {
        self.pool.scalar(&mut self.alloc, &mut self.ops, value)
    }

    /// Pooled vector constant.
    pub fn vector_constant(&mut self, value: Word) -> KernelResult<ScratchAddr> {
        self.pool.vector(&mut self.alloc, &mut self.ops, value)
    }

    /// Pending operations.
    #[inline]
    pub fn ops_mut(&mut self) -> &mut SlotBuffer {
        &mut self.ops
    }

    /// Pending operations.
    #[inline]
    pub fn ops(&self) -> &SlotBuffer {
        &self.ops
    }

    /// Drain the pending operations of the current phase.
    pub fn take_ops(&mut self) -> Vec<Slot> {
        self.ops.take()
    }

    /// The constant pools.
    #[inline]
    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    /// Scratch words allocated so far.
    #[inline]
    pub fn scratch_used(&self) -> usize {
        self.alloc.used()
    }

    /// Consume the builder, keeping the scratch map.
    pub fn into_debug_info(self) -> DebugInfo {
        self.alloc.into_debug_info()
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new(SCRATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_emit_into_pending_ops() {
        let mut b = KernelBuilder::default();
        let v = b.vector_constant(3).unwrap();
        let c = b.constant(3).unwrap();
        assert_eq!(b.ops().len(), 2);
        assert_eq!(b.take_ops()[1], Slot::vbroadcast(v, c));
        assert!(b.ops().is_empty());
    }

    #[test]
    fn test_regions_are_named() {
        let mut b = KernelBuilder::default();
        let x = b.vector("x").unwrap();
        b.scalar("y").unwrap();
        let info = b.into_debug_info();
        assert_eq!(info.lookup(x.offset(7)), Some(("x", 7)));
        assert_eq!(info.lookup(ScratchAddr::new(8)), Some(("y", 0)));
    }
}
