//! Code generator and scheduler for the Arbor VLIW+SIMD machine.
//!
//! Synthesizes a branch-free, vectorized, software-pipelined program for the
//! batched tree-walk hash and packs it into bundles:
//! - Bump scratch allocation with deduplicated constant pools
//! - Greedy hazard-aware bundling under per-engine widths
//! - Hash stage fusion into `multiply_add`
//! - Depth-specialized node selection for the top of the tree
//! - Group-wide prefetch of gathered node values during hashing

pub mod bundler;
pub mod emit;
pub mod error;
pub mod kernel;
pub mod scratch;

pub use bundler::{BundleMode, Bundler};
pub use emit::SlotBuffer;
pub use error::{KernelError, KernelResult};
pub use kernel::{
    build_kernel, build_kernel_with, Kernel, KernelBuilder, KernelConfig, KernelStats,
    PipelineConfig,
};
pub use scratch::{ConstantPool, ScratchAllocator};
