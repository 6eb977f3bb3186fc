//! Node value selection: branch-free blends for shallow depths and
//! per-lane gathers below them.
//!
//! Every lane of a chunk sits at the same depth in a given round, so the
//! depth is known when the code is generated.
//!
//! - depth 0: all lanes at the root, one broadcast
//! - depth 1: `idx ∈ {1, 2}`, blend on `idx & 1`
//! - depth 2: `idx ∈ {3..=6}`, blend pairwise on bit 0 of `idx - 3`, then
//!   across on bit 1
//! - deeper: `forest_values_p + idx` per lane and eight scalar loads

use crate::emit::SlotBuffer;
use crate::kernel::frame::{KernelFrame, PipelineBuffer};
use arbor_core::{AluOp, ScratchAddr, VLEN};
use std::ops::Range;

/// Emit the full node value computation for `chunk` at `depth`.
pub fn emit_node_values(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    buf: &PipelineBuffer,
    chunk: usize,
    depth: usize,
) {
    match (depth, frame.shallow.d1, frame.shallow.d2) {
        (0, _, _) => emit_root(ops, frame, buf),
        (1, Some(d1), _) => emit_depth1(ops, frame, buf, chunk, d1),
        (2, _, Some(d2)) => emit_depth2(ops, frame, buf, chunk, d2),
        _ => {
            emit_gather_addrs(ops, frame, buf, chunk);
            emit_gather_loads(ops, buf, 0..VLEN);
        }
    }
}

/// Depth 0: splat the root.
pub fn emit_root(ops: &mut SlotBuffer, frame: &KernelFrame, buf: &PipelineBuffer) {
    ops.vbroadcast(buf.node_val, frame.shallow.node(0));
}

/// Depth 1: `b = idx & 1; node = b * tree[1] + (1 - b) * tree[2]`.
pub fn emit_depth1(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    buf: &PipelineBuffer,
    chunk: usize,
    [n1, n2]: [ScratchAddr; 2],
) {
    let one = frame.consts.one;
    let idx = frame.idx(chunk);
    ops.valu(AluOp::And, buf.tmp1, idx, one);
    ops.valu(AluOp::Mul, buf.node_val, buf.tmp1, n1);
    ops.valu(AluOp::Sub, buf.tmp2, one, buf.tmp1);
    ops.multiply_add(buf.node_val, buf.tmp2, n2, buf.node_val);
}

/// Depth 2: four-way blend over `tree[3..7]`.
pub fn emit_depth2(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    buf: &PipelineBuffer,
    chunk: usize,
    d2: [ScratchAddr; 4],
) {
    let one = frame.consts.one;
    let idx = frame.idx(chunk);
    let (node, t1, t2, t3) = (buf.node_val, buf.tmp1, buf.tmp2, buf.tmp3);

    // t1 = idx - 3; t2 = bit 0; t1 = bit 1
    ops.valu(AluOp::Sub, t1, idx, frame.consts.three);
    ops.valu(AluOp::And, t2, t1, one);
    ops.valu(AluOp::Shr, t1, t1, one);

    // node = (1 - b0) * tree[3] + b0 * tree[4]
    ops.valu(AluOp::Sub, node, one, t2);
    ops.valu(AluOp::Mul, node, node, d2[0]);
    ops.multiply_add(node, t2, d2[1], node);

    // t3 = (1 - b0) * tree[5] + b0 * tree[6]
    ops.valu(AluOp::Sub, t3, one, t2);
    ops.valu(AluOp::Mul, t3, t3, d2[2]);
    ops.multiply_add(t3, t2, d2[3], t3);

    // node = (1 - b1) * node + b1 * t3
    ops.valu(AluOp::Sub, t2, one, t1);
    ops.valu(AluOp::Mul, node, node, t2);
    ops.multiply_add(node, t1, t3, node);
}

/// Per-lane gather addresses `forest_values_p + idx[lane]`.
pub fn emit_gather_addrs(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    buf: &PipelineBuffer,
    chunk: usize,
) {
    let base = frame.header.forest_values_p();
    let idx = frame.idx(chunk);
    for lane in 0..VLEN as u32 {
        let dest = buf.gather_addr.offset(lane);
        ops.alu(AluOp::Add, dest, base, idx.offset(lane));
    }
}

/// Scalar loads of node values for `lanes`.
pub fn emit_gather_loads(ops: &mut SlotBuffer, buf: &PipelineBuffer, lanes: Range<usize>) {
    for lane in lanes {
        let lane = lane as u32;
        ops.load(buf.node_val.offset(lane), buf.gather_addr.offset(lane));
    }
}

/// Load the shallow node values and broadcast the ones blends read.
pub fn emit_shallow_preload(ops: &mut SlotBuffer, frame: &KernelFrame) {
    let shallow = &frame.shallow;
    let base = frame.header.forest_values_p();
    for (i, &offset) in frame.shallow_offsets.iter().enumerate() {
        ops.alu(AluOp::Add, shallow.addrs.offset(i as u32), base, offset);
    }
    for i in 0..shallow.count as u32 {
        ops.load(shallow.scalars.offset(i), shallow.addrs.offset(i));
    }
    if let Some(d1) = shallow.d1 {
        for (i, block) in d1.into_iter().enumerate() {
            ops.vbroadcast(block, shallow.node(1 + i));
        }
    }
    if let Some(d2) = shallow.d2 {
        for (i, block) in d2.into_iter().enumerate() {
            ops.vbroadcast(block, shallow.node(3 + i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::builder::KernelBuilder;
    use crate::kernel::frame::FrameShape;
    use arbor_core::{Engine, Slot};

    fn frame(forest_height: usize) -> KernelFrame {
        let mut b = KernelBuilder::default();
        let shape = FrameShape {
            forest_height,
            batch_size: 16,
            buffers: 2,
        };
        KernelFrame::setup(&mut b, &shape).unwrap()
    }

    #[test]
    fn test_op_counts_per_depth() {
        let f = frame(10);
        let buf = f.buffers[0];
        for (depth, valu, alu, load) in [(0, 1, 0, 0), (1, 4, 0, 0), (2, 12, 0, 0), (3, 0, 8, 8)] {
            let mut ops = SlotBuffer::new();
            emit_node_values(&mut ops, &f, &buf, 1, depth);
            assert_eq!(ops.count(Engine::Valu), valu, "depth {}", depth);
            assert_eq!(ops.count(Engine::Alu), alu, "depth {}", depth);
            assert_eq!(ops.count(Engine::Load), load, "depth {}", depth);
        }
    }

    #[test]
    fn test_uncovered_depth_gathers() {
        // A height-1 tree has no depth-2 registers.
        let f = frame(1);
        let mut ops = SlotBuffer::new();
        emit_node_values(&mut ops, &f, &f.buffers[0], 0, 2);
        assert_eq!(ops.count(Engine::Load), VLEN);
    }

    #[test]
    fn test_gather_addrs_index_lanes() {
        let f = frame(10);
        let buf = f.buffers[1];
        let mut ops = SlotBuffer::new();
        emit_gather_addrs(&mut ops, &f, &buf, 1);
        assert_eq!(
            ops.as_slice()[3],
            Slot::alu(
                AluOp::Add,
                buf.gather_addr.offset(3),
                f.header.forest_values_p(),
                f.s_idx.offset(11)
            )
        );
    }

    #[test]
    fn test_partial_gather_loads() {
        let f = frame(10);
        let buf = f.buffers[0];
        let mut ops = SlotBuffer::new();
        emit_gather_loads(&mut ops, &buf, 2..4);
        assert_eq!(
            ops.as_slice(),
            &[
                Slot::load(buf.node_val.offset(2), buf.gather_addr.offset(2)),
                Slot::load(buf.node_val.offset(3), buf.gather_addr.offset(3)),
            ]
        );
    }

    #[test]
    fn test_shallow_preload() {
        let f = frame(10);
        let mut ops = SlotBuffer::new();
        emit_shallow_preload(&mut ops, &f);
        assert_eq!(ops.count(Engine::Alu), 7);
        assert_eq!(ops.count(Engine::Load), 7);
        assert_eq!(ops.count(Engine::Valu), 6);

        let f = frame(0);
        let mut ops = SlotBuffer::new();
        emit_shallow_preload(&mut ops, &f);
        assert_eq!(ops.len(), 2);
    }
}
