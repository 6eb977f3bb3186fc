//! Core definitions for the Arbor VLIW+SIMD target.
//!
//! This crate is shared by the kernel generator and the machine simulator:
//!
//! - `machine`: engine kinds, issue widths and the fixed machine constants
//! - `slot`: the operation sum type and its structural read/write sets
//! - `bundle`: bundles, programs and the scratch debug map
//! - `hash`: the six-stage mixing function applied by the workload

pub mod bundle;
pub mod hash;
pub mod machine;
pub mod slot;

pub use bundle::{Bundle, DebugInfo, Program};
pub use hash::{hash_value, HashStage, MixOp, HASH_STAGES};
pub use machine::{Engine, SlotLimits, Word, N_CORES, SCRATCH_SIZE, VLEN};
pub use slot::{
    Access, AddrSet, AluOp, AluSlot, DebugSlot, FlowSlot, LoadSlot, ScratchAddr, Slot, StoreSlot,
    ValuSlot,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of header words at the start of memory read by every kernel.
pub const HEADER_WORDS: usize = 7;
