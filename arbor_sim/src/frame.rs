//! Per-core execution state.
//!
//! Each core owns a private scratch file and a program counter. Main memory
//! is shared and lives on the `Machine`.

use crate::error::{SimError, SimResult};
use arbor_core::{ScratchAddr, Word, VLEN};

/// Run state of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// Issuing one bundle per cycle.
    Running,
    /// Stopped at a `pause`; resumed by the next `Machine::run`.
    Paused,
    /// Halted or ran off the end of the program.
    Stopped,
}

/// One core of the machine.
#[derive(Debug, Clone)]
pub struct Core {
    /// Core index, readable through `coreid`.
    pub id: usize,
    /// Private scratch memory.
    pub scratch: Vec<Word>,
    /// Index of the next bundle to issue.
    pub pc: usize,
    /// Current run state.
    pub state: CoreState,
    /// Words appended by `trace_write`.
    pub trace_buf: Vec<Word>,
}

impl Core {
    /// Create a running core with zeroed scratch.
    pub fn new(id: usize, scratch_size: usize) -> Self {
        Core {
            id,
            scratch: vec![0; scratch_size],
            pc: 0,
            state: CoreState::Running,
            trace_buf: Vec::new(),
        }
    }

    /// Read one scratch word.
    #[inline]
    pub fn read(&self, addr: ScratchAddr) -> SimResult<Word> {
        self.scratch
            .get(addr.as_usize())
            .copied()
            .ok_or(SimError::ScratchOutOfBounds {
                addr: addr.as_usize(),
                size: self.scratch.len(),
            })
    }

    /// Read the vector block starting at `base`.
    #[inline]
    pub fn read_vector(&self, base: ScratchAddr) -> SimResult<[Word; VLEN]> {
        let start = base.as_usize();
        let block = self
            .scratch
            .get(start..start + VLEN)
            .ok_or(SimError::ScratchOutOfBounds {
                addr: start + VLEN - 1,
                size: self.scratch.len(),
            })?;
        let mut out = [0; VLEN];
        out.copy_from_slice(block);
        Ok(out)
    }

    /// Scratch words `[base, base + len)`.
    pub fn scratch_slice(&self, base: ScratchAddr, len: usize) -> SimResult<&[Word]> {
        let start = base.as_usize();
        self.scratch
            .get(start..start + len)
            .ok_or(SimError::ScratchOutOfBounds {
                addr: start + len,
                size: self.scratch.len(),
            })
    }
}
