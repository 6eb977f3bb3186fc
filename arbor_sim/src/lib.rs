//! Execution environment for Arbor kernels.
//!
//! - `machine`: cycle-stepped multi-core simulator executing bundles
//! - `frame`: per-core execution state
//! - `problem`: tree/input generators and the memory image layout
//! - `reference`: scalar reference interpreters used as the correctness oracle

pub mod error;
pub mod frame;
pub mod machine;
pub mod problem;
pub mod reference;

pub use error::{SimError, SimResult};
pub use frame::{Core, CoreState};
pub use machine::Machine;
pub use problem::{build_mem_image, image_len, Input, MemLayout, Tree, VALUE_LIMIT};
pub use reference::{reference_kernel, walk_step, ReferenceRun};

/// Cycle count of the unoptimized scalar kernel on the production workload.
pub const BASELINE_CYCLES: u64 = 147_734;
