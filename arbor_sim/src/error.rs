//! Machine faults.

use arbor_core::Engine;
use std::fmt;

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;

/// A fault raised while executing a program or reading a memory image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Scratch access past the end of a core's scratch.
    ScratchOutOfBounds { addr: usize, size: usize },
    /// Memory access past the end of main memory.
    MemoryOutOfBounds { addr: usize, size: usize },
    /// Division or remainder by zero at bundle `pc`.
    DivisionByZero { pc: usize },
    /// A bundle issues more slots on an engine than the engine's width.
    SlotLimitExceeded {
        pc: usize,
        engine: Engine,
        count: usize,
        limit: usize,
    },
    /// A jump computed a negative or unrepresentable target.
    InvalidJumpTarget { pc: usize, target: i64 },
    /// The memory image header is inconsistent.
    MalformedImage(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::ScratchOutOfBounds { addr, size } => {
                write!(f, "scratch address {} out of bounds (size {})", addr, size)
            }
            SimError::MemoryOutOfBounds { addr, size } => {
                write!(f, "memory address {} out of bounds (size {})", addr, size)
            }
            SimError::DivisionByZero { pc } => write!(f, "division by zero at bundle {}", pc),
            SimError::SlotLimitExceeded {
                pc,
                engine,
                count,
                limit,
            } => write!(
                f,
                "bundle {} issues {} {} slots (limit {})",
                pc, count, engine, limit
            ),
            SimError::InvalidJumpTarget { pc, target } => {
                write!(f, "invalid jump target {} at bundle {}", target, pc)
            }
            SimError::MalformedImage(msg) => write!(f, "malformed memory image: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}
