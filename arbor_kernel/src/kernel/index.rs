//! Branch-free child index update.
//!
//! ```text
//! step = 1 + (val & 1)
//! idx  = idx * 2 + step
//! idx  = idx * (idx < n_nodes)
//! ```

use crate::emit::SlotBuffer;
use crate::kernel::frame::{KernelFrame, PipelineBuffer};
use arbor_core::{AluOp, Word};

/// Advance the indices of `chunk` from its freshly hashed values.
pub fn emit_index_update(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    buf: &PipelineBuffer,
    chunk: usize,
) {
    let c = &frame.consts;
    let (idx, val, t) = (frame.idx(chunk), frame.val(chunk), buf.tmp1);
    ops.valu(AluOp::And, t, val, c.one);
    ops.valu(AluOp::Add, t, t, c.one);
    ops.valu(AluOp::Mul, idx, idx, c.two);
    ops.valu(AluOp::Add, idx, idx, t);
    ops.valu(AluOp::Lt, t, idx, c.n_nodes);
    ops.valu(AluOp::Mul, idx, idx, t);
}

/// Scalar model of the emitted sequence.
pub fn next_index(idx: Word, val: Word, n_nodes: Word) -> Word {
    let step = (val & 1) + 1;
    let next = idx.wrapping_mul(2).wrapping_add(step);
    next.wrapping_mul(Word::from(next < n_nodes))
}
