//! Harness errors and exit code handling.

use crate::args::ArgError;
use arbor_core::{Word, VLEN};
use arbor_kernel::KernelError;
use arbor_sim::SimError;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Exit Codes
// =============================================================================

/// Kernel matched the reference at every pause.
pub const EXIT_SUCCESS: u8 = 0;
/// Kernel output differs from the reference.
pub const EXIT_MISMATCH: u8 = 1;
/// Command-line usage error (bad flags, unsupported workload).
pub const EXIT_USAGE_ERROR: u8 = 2;
/// Kernel build or simulation failure.
pub const EXIT_INTERNAL_ERROR: u8 = 120;

// =============================================================================
// Mismatch
// =============================================================================

/// First lane where the machine and the reference disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchError {
    /// Pause point, counted from zero.
    pub pause: usize,
    /// `"indices"` or `"values"`.
    pub region: &'static str,
    pub lane: usize,
    pub got: Word,
    pub expected: Word,
}

impl fmt::Display for MismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} differ at pause {} lane {}: got {}, expected {}",
            self.region, self.pause, self.lane, self.got, self.expected
        )
    }
}

impl std::error::Error for MismatchError {}

// =============================================================================
// CLI Error
// =============================================================================

/// Everything that can end a harness run early.
#[derive(Debug)]
pub enum CliError {
    Args(ArgError),
    /// Batch size the kernel cannot vectorize.
    InvalidBatch { batch_size: usize },
    /// Forest height whose memory image cannot be addressed by a `Word`.
    InvalidHeight { forest_height: usize },
    Kernel(KernelError),
    Sim(SimError),
    Mismatch(MismatchError),
    Io(std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn code(&self) -> u8 {
        match self {
            CliError::Args(_) | CliError::InvalidBatch { .. } | CliError::InvalidHeight { .. } => {
                EXIT_USAGE_ERROR
            }
            CliError::Mismatch(_) => EXIT_MISMATCH,
            CliError::Kernel(KernelError::ScratchExhausted { .. }) => EXIT_USAGE_ERROR,
            CliError::Kernel(_) | CliError::Sim(_) | CliError::Io(_) => EXIT_INTERNAL_ERROR,
        }
    }

    #[inline]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Args(e) => write!(f, "{}", e),
            CliError::InvalidBatch { batch_size } => {
                write!(f, "batch size {} is not a multiple of {}", batch_size, VLEN)
            }
            CliError::InvalidHeight { forest_height } => {
                write!(f, "forest height {} is too large to address", forest_height)
            }
            CliError::Kernel(e) => write!(f, "kernel build failed: {}", e),
            CliError::Sim(e) => write!(f, "simulation failed: {}", e),
            CliError::Mismatch(e) => write!(f, "incorrect output: {}", e),
            CliError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Args(e) => Some(e),
            CliError::Kernel(e) => Some(e),
            CliError::Sim(e) => Some(e),
            CliError::Mismatch(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidBatch { .. } | CliError::InvalidHeight { .. } => None,
        }
    }
}

impl From<ArgError> for CliError {
    fn from(e: ArgError) -> Self {
        CliError::Args(e)
    }
}

impl From<KernelError> for CliError {
    fn from(e: KernelError) -> Self {
        CliError::Kernel(e)
    }
}

impl From<SimError> for CliError {
    fn from(e: SimError) -> Self {
        CliError::Sim(e)
    }
}

impl From<MismatchError> for CliError {
    fn from(e: MismatchError) -> Self {
        CliError::Mismatch(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> MismatchError {
        MismatchError {
            pause: 1,
            region: "values",
            lane: 17,
            got: 4,
            expected: 5,
        }
    }

    #[test]
    fn test_exit_code_usage() {
        assert_eq!(
            CliError::Args(ArgError::MissingValue("--seed")).code(),
            EXIT_USAGE_ERROR
        );
        assert_eq!(
            CliError::InvalidBatch { batch_size: 10 }.code(),
            EXIT_USAGE_ERROR
        );
        assert_eq!(
            CliError::InvalidHeight { forest_height: 70 }.code(),
            EXIT_USAGE_ERROR
        );
    }

    #[test]
    fn test_exit_code_mismatch() {
        assert_eq!(CliError::from(mismatch()).code(), EXIT_MISMATCH);
    }

    #[test]
    fn test_exit_code_scratch_exhausted_is_usage() {
        let e = KernelError::ScratchExhausted {
            name: Some("s_idx".to_string()),
            requested: 2048,
            in_use: 7,
            capacity: 1536,
        };
        assert_eq!(CliError::from(e).code(), EXIT_USAGE_ERROR);
    }

    #[test]
    fn test_exit_code_sim_fault() {
        let e = SimError::DivisionByZero { pc: 3 };
        assert_eq!(CliError::from(e).code(), EXIT_INTERNAL_ERROR);
    }

    #[test]
    fn test_mismatch_display_names_location() {
        let text = CliError::from(mismatch()).to_string();
        assert!(text.contains("values"));
        assert!(text.contains("pause 1"));
        assert!(text.contains("lane 17"));
    }

    #[test]
    fn test_invalid_height_display() {
        assert_eq!(
            CliError::InvalidHeight { forest_height: 70 }.to_string(),
            "forest height 70 is too large to address"
        );
    }

    #[test]
    fn test_invalid_batch_display() {
        assert_eq!(
            CliError::InvalidBatch { batch_size: 10 }.to_string(),
            "batch size 10 is not a multiple of 8"
        );
    }
}
