//! The tree-walk kernel compiler.
//!
//! # Architecture
//!
//! A build runs in two phases, each emitting into the builder's pending
//! operation list and then handed to the bundler:
//!
//! 1. **Setup**: header loads, constant pools, hash constants
//! 2. **Body**: shallow node preload, bulk load of the batch, the pipelined
//!    round loop, bulk store
//!
//! Each phase ends with a lone `pause` bundle so a harness can compare
//! memory against a reference after setup and after the body.
//!
//! - `builder`: owned allocation and emission state of one build
//! - `frame`: scratch layout and setup
//! - `hash`: hash stage forms and fusion
//! - `select`: node value selection by depth
//! - `index`: child index update
//! - `io`: bulk batch transfer
//! - `pipeline`: group-wide software pipelining

pub mod builder;
pub mod frame;
pub mod hash;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod select;

pub use builder::KernelBuilder;
pub use frame::{FrameShape, KernelFrame, PipelineBuffer};
pub use hash::{HashLowering, StageForm};
pub use pipeline::{IterationSpace, PipelineConfig};

use crate::bundler::{BundleMode, Bundler};
use crate::error::KernelResult;
use arbor_core::{Bundle, DebugInfo, Engine, Program, Slot, SlotLimits, SCRATCH_SIZE, VLEN};
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Knobs of a kernel build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Pipeline shape; `None` picks the widest one the batch supports.
    pub pipeline: Option<PipelineConfig>,
    /// Bundling mode.
    pub mode: BundleMode,
    /// Engine widths to bundle for.
    pub limits: SlotLimits,
    /// Scratch words available.
    pub scratch_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            pipeline: None,
            mode: BundleMode::Vliw,
            limits: SlotLimits::DEFAULT,
            scratch_capacity: SCRATCH_SIZE,
        }
    }
}

impl KernelConfig {
    /// Default configuration with one operation per bundle.
    pub fn unit() -> Self {
        KernelConfig {
            mode: BundleMode::Unit,
            ..Self::default()
        }
    }
}

// =============================================================================
// Kernel
// =============================================================================

/// Build statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    /// Operations emitted by the setup phase.
    pub setup_ops: usize,
    /// Operations emitted by the body phase.
    pub body_ops: usize,
    /// Bundles in the program, pause bundles included.
    pub bundles: usize,
    /// Scratch words allocated.
    pub scratch_used: usize,
    /// Pipeline shape used.
    pub pipeline: PipelineConfig,
}

/// A generated program and its scratch map.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub program: Program,
    pub debug_info: DebugInfo,
    pub stats: KernelStats,
}

/// Build the kernel with the default configuration.
pub fn build_kernel(
    forest_height: usize,
    n_nodes: usize,
    batch_size: usize,
    rounds: usize,
) -> KernelResult<Kernel> {
    build_kernel_with(
        &KernelConfig::default(),
        forest_height,
        n_nodes,
        batch_size,
        rounds,
    )
}

/// Build the kernel under `config`.
///
/// `batch_size` must be a multiple of `VLEN` and `n_nodes` must equal
/// `2^(forest_height + 1) - 1`; the node count itself is read from memory
/// at run time.
pub fn build_kernel_with(
    config: &KernelConfig,
    forest_height: usize,
    n_nodes: usize,
    batch_size: usize,
    rounds: usize,
) -> KernelResult<Kernel> {
    debug_assert_eq!(
        batch_size % VLEN,
        0,
        "batch size must be a multiple of VLEN"
    );
    debug_assert_eq!(n_nodes, (1 << (forest_height + 1)) - 1);

    let n_chunks = batch_size / VLEN;
    let pipeline = match config.pipeline {
        Some(p) => {
            p.validate(n_chunks)?;
            p
        }
        None => PipelineConfig::auto(n_chunks),
    };

    let mut builder = KernelBuilder::new(config.scratch_capacity);
    let shape = FrameShape {
        forest_height,
        batch_size,
        buffers: pipeline.buffer_count(),
    };
    let frame = KernelFrame::setup(&mut builder, &shape)?;
    let setup = builder.take_ops();

    let space = IterationSpace {
        n_chunks,
        rounds,
        forest_height,
    };
    let ops = builder.ops_mut();
    ops.comment("pipelined tree walk");
    select::emit_shallow_preload(ops, &frame);
    io::emit_bulk_load(ops, &frame);
    pipeline::emit_pipeline(ops, &frame, &pipeline, &space);
    io::emit_bulk_store(ops, &frame);
    let body = builder.take_ops();

    let (setup_ops, body_ops) = (setup.len(), body.len());
    let scratch_used = builder.scratch_used();
    let bundler = Bundler::new(config.limits, config.mode);
    let mut program = Program::new();
    program.extend(bundler.pack(setup));
    program.push(Bundle::single(Slot::pause()));
    program.extend(bundler.pack(body));
    program.push(Bundle::single(Slot::pause()));

    let stats = KernelStats {
        setup_ops,
        body_ops,
        bundles: program.len(),
        scratch_used,
        pipeline,
    };
    debug!(
        alu = program.slot_count(Engine::Alu),
        valu = program.slot_count(Engine::Valu),
        load = program.slot_count(Engine::Load),
        store = program.slot_count(Engine::Store),
        "kernel slot mix"
    );
    info!(
        forest_height,
        batch_size,
        rounds,
        bundles = stats.bundles,
        scratch = scratch_used,
        group_width = pipeline.group_width,
        prefetch_groups = pipeline.prefetch_groups,
        "kernel built"
    );

    Ok(Kernel {
        program,
        debug_info: builder.into_debug_info(),
        stats,
    })
}
