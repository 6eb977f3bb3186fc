//! Bulk transfer of the batch between memory and `s_idx`/`s_val`.
//!
//! All address adds are emitted before any transfer so the bundler can pack
//! the adds into a few wide ALU bundles and keep both load (or store) ports
//! busy afterwards.

use crate::emit::SlotBuffer;
use crate::kernel::frame::KernelFrame;
use arbor_core::{AluOp, ScratchAddr};

/// Memory address scalars for index chunk `chunk` and value chunk `chunk`.
fn io_addrs(frame: &KernelFrame, chunk: usize) -> (ScratchAddr, ScratchAddr) {
    (
        frame.io_addrs.offset(chunk as u32),
        frame.io_addrs.offset((frame.n_chunks + chunk) as u32),
    )
}

fn emit_addresses(ops: &mut SlotBuffer, frame: &KernelFrame) {
    let header = &frame.header;
    for (chunk, &offset) in frame.chunk_offsets.iter().enumerate() {
        let (idx_addr, val_addr) = io_addrs(frame, chunk);
        ops.alu(AluOp::Add, idx_addr, header.inp_indices_p(), offset);
        ops.alu(AluOp::Add, val_addr, header.inp_values_p(), offset);
    }
}

/// Load every index and value chunk into scratch.
pub fn emit_bulk_load(ops: &mut SlotBuffer, frame: &KernelFrame) {
    emit_addresses(ops, frame);
    for chunk in 0..frame.n_chunks {
        let (idx_addr, val_addr) = io_addrs(frame, chunk);
        ops.vload(frame.idx(chunk), idx_addr);
        ops.vload(frame.val(chunk), val_addr);
    }
}

/// Store every index and value chunk back to memory.
pub fn emit_bulk_store(ops: &mut SlotBuffer, frame: &KernelFrame) {
    emit_addresses(ops, frame);
    for chunk in 0..frame.n_chunks {
        let (idx_addr, val_addr) = io_addrs(frame, chunk);
        ops.vstore(idx_addr, frame.idx(chunk));
        ops.vstore(val_addr, frame.val(chunk));
    }
}
