//! Scratch allocation and the constant pools.
//!
//! # Design
//!
//! - Scratch is handed out by a bump pointer; nothing is ever freed within
//!   a build, so every address is stable for the life of the kernel
//! - Named regions are recorded in a `DebugInfo` for diagnostics
//! - Each distinct immediate is materialized at most once as a scalar and at
//!   most once as a broadcast vector block

use crate::emit::SlotBuffer;
use crate::error::{KernelError, KernelResult};
use arbor_core::{DebugInfo, ScratchAddr, Word, SCRATCH_SIZE, VLEN};
use rustc_hash::FxHashMap;

// =============================================================================
// Scratch Allocator
// =============================================================================

/// Bump allocator over one core's scratch.
#[derive(Debug, Clone)]
pub struct ScratchAllocator {
    next: usize,
    capacity: usize,
    debug_info: DebugInfo,
}

impl ScratchAllocator {
    /// Allocator over `capacity` words.
    pub fn new(capacity: usize) -> Self {
        ScratchAllocator {
            next: 0,
            capacity,
            debug_info: DebugInfo::new(),
        }
    }

    /// Reserve `length` consecutive words, optionally under a debug name.
    pub fn allocate(&mut self, name: Option<&str>, length: usize) -> KernelResult<ScratchAddr> {
        let end = self
            .next
            .checked_add(length)
            .filter(|&end| end <= self.capacity)
            .ok_or_else(|| KernelError::ScratchExhausted {
                name: name.map(str::to_owned),
                requested: length,
                in_use: self.next,
                capacity: self.capacity,
            })?;
        let addr = ScratchAddr::new(self.next as u32);
        if let Some(name) = name {
            self.debug_info.insert(addr, name, length);
        }
        self.next = end;
        Ok(addr)
    }

    /// Reserve a named region.
    #[inline]
    pub fn named(&mut self, name: &str, length: usize) -> KernelResult<ScratchAddr> {
        self.allocate(Some(name), length)
    }

    /// Words handed out so far.
    #[inline]
    pub fn used(&self) -> usize {
        self.next
    }

    /// Words still free.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.next
    }

    /// Named regions allocated so far.
    #[inline]
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Consume the allocator, keeping its region names.
    pub fn into_debug_info(self) -> DebugInfo {
        self.debug_info
    }
}

impl Default for ScratchAllocator {
    fn default() -> Self {
        Self::new(SCRATCH_SIZE)
    }
}

// =============================================================================
// Constant Pool
// =============================================================================

/// Deduplicated scalar and vector immediates.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    scalars: FxHashMap<Word, ScratchAddr>,
    vectors: FxHashMap<Word, ScratchAddr>,
}

impl ConstantPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar holding `value`, emitting one `const` load the first time.
    pub fn scalar(
        &mut self,
        alloc: &mut ScratchAllocator,
        ops: &mut SlotBuffer,
        value: Word,
    ) -> KernelResult<ScratchAddr> {
        if let Some(&addr) = self.scalars.get(&value) {
            return Ok(addr);
        }
        let addr = alloc.named(&format!("const_{}", value), 1)?;
        ops.constant(addr, value);
        self.scalars.insert(value, addr);
        Ok(addr)
    }

    /// Vector block holding `value` in every lane, emitting the scalar (if
    /// new) and one `vbroadcast` the first time.
    pub fn vector(
        &mut self,
        alloc: &mut ScratchAllocator,
        ops: &mut SlotBuffer,
        value: Word,
    ) -> KernelResult<ScratchAddr> {
        if let Some(&addr) = self.vectors.get(&value) {
            return Ok(addr);
        }
        let scalar = self.scalar(alloc, ops, value)?;
        let addr = alloc.named(&format!("vconst_{}", value), VLEN)?;
        ops.vbroadcast(addr, scalar);
        self.vectors.insert(value, addr);
        Ok(addr)
    }

    /// Number of distinct scalar immediates.
    #[inline]
    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    /// Number of distinct vector immediates.
    #[inline]
    pub fn vector_count(&self) -> usize {
        self.vectors.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
