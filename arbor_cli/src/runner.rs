//! Build, simulate and check one kernel.
//!
//! The machine is advanced one pause at a time and the index and value
//! regions are compared against the reference snapshot for that pause.

use crate::config::RunConfig;
use crate::error::{CliError, MismatchError};
use arbor_core::{Word, VLEN};
use arbor_kernel::{build_kernel_with, Kernel, KernelStats};
use arbor_sim::{
    build_mem_image, image_len, Input, Machine, MemLayout, ReferenceRun, Tree, BASELINE_CYCLES,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use tracing::{debug, info};

/// Outcome of a checked run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub cycles: u64,
    pub stats: KernelStats,
    /// Pause points compared.
    pub pauses: usize,
}

impl RunReport {
    /// Speedup over the unoptimized baseline.
    pub fn speedup(&self) -> f64 {
        BASELINE_CYCLES as f64 / self.cycles.max(1) as f64
    }
}

/// Run the harness described by `config`, writing any requested dumps to `out`.
pub fn run(config: &RunConfig, out: &mut dyn Write) -> Result<RunReport, CliError> {
    if config.batch_size % VLEN != 0 {
        return Err(CliError::InvalidBatch {
            batch_size: config.batch_size,
        });
    }

    let invalid_height = CliError::InvalidHeight {
        forest_height: config.forest_height,
    };
    let addressable = Tree::node_count(config.forest_height)
        .and_then(|n_nodes| image_len(n_nodes, config.batch_size));
    if addressable.is_none() {
        return Err(invalid_height);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let tree = Tree::generate(config.forest_height, &mut rng).ok_or(invalid_height)?;
    let input = Input::generate(&tree, config.batch_size, config.rounds, &mut rng);
    let mem = build_mem_image(&tree, &input);
    debug!(words = mem.len(), seed = config.seed, "workload generated");

    let kernel = build_kernel_with(
        &config.kernel_config(),
        config.forest_height,
        tree.n_nodes(),
        config.batch_size,
        config.rounds,
    )?;
    if config.dump_scratch {
        dump_scratch(&kernel, out)?;
    }
    if config.dump_program {
        dump_program(&kernel, out)?;
    }

    let reference = ReferenceRun::new(mem.clone())?;
    let layout = *reference.layout();
    let mut machine = Machine::new(mem, kernel.program.clone(), kernel.debug_info.clone());

    let mut pauses = 0;
    for (pause, expected) in reference.enumerate() {
        machine.run()?;
        compare_pause(machine.mem(), &expected, &layout, pause)?;
        info!(
            pause,
            cycle = machine.cycle(),
            "pause point matches reference"
        );
        pauses += 1;
    }

    Ok(RunReport {
        cycles: machine.cycle(),
        stats: kernel.stats,
        pauses,
    })
}

/// Compare the index and value regions of `got` against `expected`.
pub fn compare_pause(
    got: &[Word],
    expected: &[Word],
    layout: &MemLayout,
    pause: usize,
) -> Result<(), MismatchError> {
    for (region, start) in [
        ("indices", layout.inp_indices_p),
        ("values", layout.inp_values_p),
    ] {
        let end = start + layout.batch_size;
        let lanes = got[start..end].iter().zip(&expected[start..end]);
        if let Some((lane, (&g, &e))) = lanes.enumerate().find(|(_, (g, e))| g != e) {
            return Err(MismatchError {
                pause,
                region,
                lane,
                got: g,
                expected: e,
            });
        }
    }
    Ok(())
}

/// Print the scratch map, one named region per line.
pub fn dump_scratch(kernel: &Kernel, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "# scratch ({} words)", kernel.stats.scratch_used)?;
    for (addr, name, len) in kernel.debug_info.regions() {
        writeln!(out, "{:>5} {:>4} {}", addr.index(), len, name)?;
    }
    Ok(())
}

/// Print the packed program, one bundle per line.
pub fn dump_program(kernel: &Kernel, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "# program ({} bundles)", kernel.program.len())?;
    for (pc, bundle) in kernel.program.bundles().iter().enumerate() {
        writeln!(out, "{:>6} {}", pc, bundle)?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
