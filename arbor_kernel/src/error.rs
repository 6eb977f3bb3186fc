//! Kernel build errors.

use std::fmt;

/// Result type for kernel construction.
pub type KernelResult<T> = Result<T, KernelError>;

/// Reasons a kernel build aborts. No partial kernel is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The scratch bump pointer would pass the scratch capacity.
    ScratchExhausted {
        /// Debug name of the failing allocation, if any.
        name: Option<String>,
        /// Words requested.
        requested: usize,
        /// Words already allocated.
        in_use: usize,
        /// Scratch capacity in words.
        capacity: usize,
    },
    /// A requested pipeline shape cannot cover the batch.
    InvalidPipeline {
        group_width: usize,
        prefetch_groups: usize,
        n_chunks: usize,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ScratchExhausted {
                name,
                requested,
                in_use,
                capacity,
            } => write!(
                f,
                "out of scratch space allocating {} word(s) for {} ({} of {} in use)",
                requested,
                name.as_deref().unwrap_or("<anonymous>"),
                in_use,
                capacity
            ),
            KernelError::InvalidPipeline {
                group_width,
                prefetch_groups,
                n_chunks,
            } => write!(
                f,
                "pipeline of group width {} with {} prefetch group(s) cannot run over {} chunk(s)",
                group_width, prefetch_groups, n_chunks
            ),
        }
    }
}

impl std::error::Error for KernelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_allocation() {
        let err = KernelError::ScratchExhausted {
            name: Some("s_idx".into()),
            requested: 256,
            in_use: 1400,
            capacity: 1536,
        };
        let msg = err.to_string();
        assert!(msg.contains("s_idx"));
        assert!(msg.contains("1400 of 1536"));
    }

    #[test]
    fn test_display_anonymous() {
        let err = KernelError::ScratchExhausted {
            name: None,
            requested: 8,
            in_use: 1536,
            capacity: 1536,
        };
        assert!(err.to_string().contains("<anonymous>"));
    }
}
