//! Dependency-aware bundling.
//!
//! # Algorithm
//!
//! A single greedy pass over the operations in program order:
//!
//! 1. `debug` operations join the open bundle unconditionally
//! 2. Any other operation closes the open bundle when its engine is full,
//!    when it reads an address the bundle already writes (RAW), or when it
//!    writes an address the bundle already writes (WAW)
//! 3. Otherwise it joins the bundle and its writes are accumulated
//!
//! Writing an address that an earlier slot in the bundle reads is allowed:
//! every slot reads scratch as it was before the cycle. Operations are never
//! reordered, so the packed program computes exactly what the unpacked one
//! does.

use arbor_core::{Bundle, ScratchAddr, Slot, SlotLimits};
use rustc_hash::FxHashSet;
use tracing::trace;

/// How operations are grouped into bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleMode {
    /// Greedy packing into full-width bundles.
    #[default]
    Vliw,
    /// One operation per bundle. The cycle count of this mode is the
    /// unscheduled baseline.
    Unit,
}

/// Packs operation lists into bundles under per-engine widths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bundler {
    limits: SlotLimits,
    mode: BundleMode,
}

impl Bundler {
    /// Bundler with explicit widths and mode.
    pub fn new(limits: SlotLimits, mode: BundleMode) -> Self {
        Bundler { limits, mode }
    }

    /// Pack `ops` into bundles without reordering them.
    pub fn pack(&self, ops: Vec<Slot>) -> Vec<Bundle> {
        match self.mode {
            BundleMode::Unit => ops.into_iter().map(Bundle::single).collect(),
            BundleMode::Vliw => self.pack_vliw(ops),
        }
    }

    fn pack_vliw(&self, ops: Vec<Slot>) -> Vec<Bundle> {
        let mut bundles = Vec::new();
        let mut open = Bundle::new();
        let mut written: FxHashSet<ScratchAddr> = FxHashSet::default();

        for op in ops {
            let engine = op.engine();
            if engine.is_debug() {
                open.push(op);
                continue;
            }

            let access = op.access();
            let full = open.count(engine) >= self.limits.width(engine);
            let hazard = access
                .reads
                .iter()
                .chain(access.writes.iter())
                .any(|addr| written.contains(addr));
            if full || hazard {
                trace!(%engine, full, hazard, slots = open.len(), "close bundle");
                bundles.push(std::mem::take(&mut open));
                written.clear();
            }

            written.extend(access.writes.iter().copied());
            open.push(op);
        }

        if !open.is_empty() {
            bundles.push(open);
        }
        bundles
    }
}

// =============================================================================
// Tests
// =============================================================================
