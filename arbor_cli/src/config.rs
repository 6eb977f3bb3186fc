//! Run configuration aggregated from CLI flags and environment variables.
//!
//! Resolved once at startup. Precedence is command line, then `ARBOR_*`
//! variables (unless `-E`), then the production defaults.

use crate::args::ArborArgs;
use arbor_kernel::{BundleMode, KernelConfig};

/// Production forest height.
pub const DEFAULT_FOREST_HEIGHT: usize = 10;
/// Production round count.
pub const DEFAULT_ROUNDS: usize = 16;
/// Production batch size.
pub const DEFAULT_BATCH_SIZE: usize = 256;
/// Production workload seed.
pub const DEFAULT_SEED: u64 = 123;

// =============================================================================
// Run Configuration
// =============================================================================

/// Complete harness configuration resolved from CLI args and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub forest_height: usize,
    pub rounds: usize,
    pub batch_size: usize,
    pub seed: u64,
    /// Bundling mode (`--unit`, `ARBOR_UNIT`).
    pub mode: BundleMode,
    pub dump_program: bool,
    pub dump_scratch: bool,
    pub quiet: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            forest_height: DEFAULT_FOREST_HEIGHT,
            rounds: DEFAULT_ROUNDS,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
            mode: BundleMode::Vliw,
            dump_program: false,
            dump_scratch: false,
            quiet: false,
        }
    }
}

impl RunConfig {
    /// Resolve configuration from parsed CLI args and the process environment.
    ///
    /// Environment variables are only consulted if `-E` was NOT specified.
    pub fn from_args(args: &ArborArgs) -> Self {
        Self::from_args_with(args, |var| std::env::var(var).ok())
    }

    /// Resolve configuration with `lookup` standing in for the environment.
    pub fn from_args_with<F>(args: &ArborArgs, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |var: &str| {
            if args.ignore_environment {
                None
            } else {
                lookup(var)
            }
        };
        let env_number = |var: &str| env(var).and_then(|v| v.trim().parse::<u64>().ok());
        let defaults = Self::default();

        let unit = args.unit
            || env("ARBOR_UNIT")
                .map(|v| !v.is_empty() && v != "0")
                .unwrap_or(false);

        Self {
            forest_height: args
                .forest_height
                .or_else(|| env_number("ARBOR_HEIGHT").map(|v| v as usize))
                .unwrap_or(defaults.forest_height),
            rounds: args
                .rounds
                .or_else(|| env_number("ARBOR_ROUNDS").map(|v| v as usize))
                .unwrap_or(defaults.rounds),
            batch_size: args
                .batch_size
                .or_else(|| env_number("ARBOR_BATCH").map(|v| v as usize))
                .unwrap_or(defaults.batch_size),
            seed: args
                .seed
                .or_else(|| env_number("ARBOR_SEED"))
                .unwrap_or(defaults.seed),
            mode: if unit {
                BundleMode::Unit
            } else {
                BundleMode::Vliw
            },
            dump_program: args.dump_program,
            dump_scratch: args.dump_scratch,
            quiet: args.quiet,
        }
    }

    /// Kernel build configuration for this run.
    pub fn kernel_config(&self) -> KernelConfig {
        KernelConfig {
            mode: self.mode,
            ..KernelConfig::default()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
