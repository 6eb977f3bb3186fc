//! Group-wide software pipelining of the round loop.
//!
//! # Iteration Space
//!
//! Iteration `i` processes chunk `i % n_chunks` in round `i / n_chunks`.
//! Every lane starts at the root, so all lanes of an iteration sit at depth
//! `(i / n_chunks) % (forest_height + 1)`.
//!
//! # Schedule
//!
//! Iterations run in groups of `group_width` chunks. With prefetching, while
//! group `g` hashes, the node values of group `g + 1` are fetched into the
//! other buffer set:
//!
//! ```text
//! xor        all members of g
//! stage s    parallel ops of g | prefetch ops due at s | combine ops of g
//! tail       prefetch loads due past the last stage
//! shallow    depth 0..2 node values of g + 1
//! index      index updates of g
//! ```
//!
//! Next-group member `m` computes its gather addresses at stage `m` and
//! issues lanes `2p, 2p + 1` at stage `m + 1 + p`.
//!
//! A next-group chunk must not be touched by the current group, and its
//! index must already be final; both hold when `n_chunks >= 2 * group_width`.

use crate::emit::SlotBuffer;
use crate::error::{KernelError, KernelResult};
use crate::kernel::frame::{KernelFrame, PipelineBuffer};
use crate::kernel::index::emit_index_update;
use crate::kernel::select::{emit_gather_addrs, emit_gather_loads, emit_node_values};
use arbor_core::{AluOp, VLEN};
use smallvec::SmallVec;
use tracing::debug;

/// Gather lanes issued per hash stage; the load engine width.
pub const GATHER_LANES_PER_STAGE: usize = 2;

/// Widest group the automatic choice uses.
pub const MAX_AUTO_GROUP_WIDTH: usize = 3;

// =============================================================================
// Configuration
// =============================================================================

/// Shape of the software pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Chunks processed together per step.
    pub group_width: usize,
    /// Groups fetched ahead of the one being hashed (0 or 1).
    pub prefetch_groups: usize,
}

impl PipelineConfig {
    /// Three-wide groups with one group of prefetch.
    pub const PRODUCTION: PipelineConfig = PipelineConfig {
        group_width: MAX_AUTO_GROUP_WIDTH,
        prefetch_groups: 1,
    };

    /// The widest prefetching pipeline `n_chunks` supports, or a single
    /// unpipelined chunk when it supports none.
    pub fn auto(n_chunks: usize) -> Self {
        if n_chunks >= 2 {
            PipelineConfig {
                group_width: MAX_AUTO_GROUP_WIDTH.min(n_chunks / 2),
                prefetch_groups: 1,
            }
        } else {
            PipelineConfig {
                group_width: 1,
                prefetch_groups: 0,
            }
        }
    }

    /// Check this shape against a batch of `n_chunks`.
    pub fn validate(&self, n_chunks: usize) -> KernelResult<()> {
        let needed = self.group_width * (1 + self.prefetch_groups);
        let invalid = self.group_width == 0
            || self.prefetch_groups > 1
            || (n_chunks > 0 && n_chunks < needed);
        if invalid {
            return Err(KernelError::InvalidPipeline {
                group_width: self.group_width,
                prefetch_groups: self.prefetch_groups,
                n_chunks,
            });
        }
        Ok(())
    }

    /// Pipeline buffers needed.
    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.group_width * (1 + self.prefetch_groups)
    }

    #[inline]
    pub fn prefetches(&self) -> bool {
        self.prefetch_groups > 0
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// Stage during which next-group member `member` computes gather addresses.
#[inline]
pub const fn address_stage(member: usize) -> usize {
    member
}

/// Stage during which next-group member `member` issues gather pair `pair`.
#[inline]
pub const fn load_stage(member: usize, pair: usize) -> usize {
    member + 1 + pair
}

// =============================================================================
// Iteration Space
// =============================================================================

/// Static description of the rounds × chunks iteration space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationSpace {
    pub n_chunks: usize,
    pub rounds: usize,
    pub forest_height: usize,
}

impl IterationSpace {
    /// Total iterations.
    #[inline]
    pub fn len(&self) -> usize {
        self.rounds * self.n_chunks
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk processed by iteration `iter`.
    #[inline]
    pub fn chunk(&self, iter: usize) -> usize {
        iter % self.n_chunks
    }

    /// Tree depth of every lane in iteration `iter`.
    #[inline]
    pub fn depth(&self, iter: usize) -> usize {
        (iter / self.n_chunks) % (self.forest_height + 1)
    }
}

/// One chunk in flight.
#[derive(Debug, Clone, Copy)]
struct Member<'a> {
    buf: &'a PipelineBuffer,
    chunk: usize,
    depth: usize,
}

type Group<'a> = SmallVec<[Member<'a>; 4]>;

fn group<'a>(
    frame: &'a KernelFrame,
    space: &IterationSpace,
    buffer_base: usize,
    start: usize,
    count: usize,
) -> Group<'a> {
    (0..count)
        .map(|m| Member {
            buf: &frame.buffers[buffer_base + m],
            chunk: space.chunk(start + m),
            depth: space.depth(start + m),
        })
        .collect()
}

// =============================================================================
// Emission
// =============================================================================

/// Emit the whole round loop, fully unrolled.
pub fn emit_pipeline(
    ops: &mut SlotBuffer,
    frame: &KernelFrame,
    config: &PipelineConfig,
    space: &IterationSpace,
) {
    let total = space.len();
    if total == 0 {
        return;
    }
    let width = config.group_width;
    let prefetch = config.prefetches();
    let pairs = VLEN / GATHER_LANES_PER_STAGE;
    let n_stages = frame.hash.len();

    if prefetch {
        for member in group(frame, space, 0, 0, width.min(total)) {
            emit_node_values(ops, frame, member.buf, member.chunk, member.depth);
        }
    }

    let mut start = 0;
    let mut step = 0;
    while start < total {
        let count = width.min(total - start);
        let next_start = start + count;
        let (current_set, next_set) = if prefetch {
            ((step % 2) * width, ((step + 1) % 2) * width)
        } else {
            (0, 0)
        };
        let current = group(frame, space, current_set, start, count);
        let next = if prefetch {
            let next_count = width.min(total - next_start);
            group(frame, space, next_set, next_start, next_count)
        } else {
            Group::new()
        };

        if !prefetch {
            for m in &current {
                emit_node_values(ops, frame, m.buf, m.chunk, m.depth);
            }
        }

        for m in &current {
            let val = frame.val(m.chunk);
            ops.valu(AluOp::Xor, val, val, m.buf.node_val);
        }

        for (stage, lowering) in frame.hash.iter().enumerate() {
            for m in &current {
                lowering.emit_parallel(ops, frame.val(m.chunk), m.buf.tmp1, m.buf.tmp2);
            }
            for (member, n) in next.iter().enumerate() {
                if frame.shallow.covers(n.depth) {
                    continue;
                }
                if address_stage(member) == stage {
                    emit_gather_addrs(ops, frame, n.buf, n.chunk);
                }
                for pair in 0..pairs {
                    if load_stage(member, pair) == stage {
                        emit_gather_loads(ops, n.buf, lanes(pair));
                    }
                }
            }
            for m in &current {
                lowering.emit_combine(ops, frame.val(m.chunk), m.buf.tmp1, m.buf.tmp2);
            }
        }

        for (member, n) in next.iter().enumerate() {
            if frame.shallow.covers(n.depth) {
                continue;
            }
            if address_stage(member) >= n_stages {
                emit_gather_addrs(ops, frame, n.buf, n.chunk);
            }
            for pair in 0..pairs {
                if load_stage(member, pair) >= n_stages {
                    emit_gather_loads(ops, n.buf, lanes(pair));
                }
            }
        }

        for n in next.iter().filter(|n| frame.shallow.covers(n.depth)) {
            emit_node_values(ops, frame, n.buf, n.chunk, n.depth);
        }

        for m in &current {
            emit_index_update(ops, frame, m.buf, m.chunk);
        }

        start = next_start;
        step += 1;
    }

    debug!(
        iterations = total,
        steps = step,
        group_width = width,
        prefetch,
        "pipeline emitted"
    );
}

#[inline]
fn lanes(pair: usize) -> std::ops::Range<usize> {
    pair * GATHER_LANES_PER_STAGE..(pair + 1) * GATHER_LANES_PER_STAGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::builder::KernelBuilder;
    use crate::kernel::frame::FrameShape;
    use arbor_core::{Engine, Slot};

    fn setup(forest_height: usize, batch_size: usize, config: &PipelineConfig) -> KernelFrame {
        let mut b = KernelBuilder::default();
        let shape = FrameShape {
            forest_height,
            batch_size,
            buffers: config.buffer_count(),
        };
        KernelFrame::setup(&mut b, &shape).unwrap()
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    #[test]
    fn test_auto_config() {
        assert_eq!(PipelineConfig::auto(32), PipelineConfig::PRODUCTION);
        assert_eq!(
            PipelineConfig::auto(4),
            PipelineConfig {
                group_width: 2,
                prefetch_groups: 1
            }
        );
        assert_eq!(
            PipelineConfig::auto(1),
            PipelineConfig {
                group_width: 1,
                prefetch_groups: 0
            }
        );
        for n in 1..40 {
            let config = PipelineConfig::auto(n);
            assert!(config.validate(n).is_ok(), "n_chunks {}", n);
        }
    }

    #[test]
    fn test_validate_rejects_overlap() {
        assert!(PipelineConfig::PRODUCTION.validate(5).is_err());
        assert!(PipelineConfig::PRODUCTION.validate(6).is_ok());
        let bad = PipelineConfig {
            group_width: 0,
            prefetch_groups: 0,
        };
        assert!(bad.validate(4).is_err());
        let deep = PipelineConfig {
            group_width: 1,
            prefetch_groups: 2,
        };
        assert!(deep.validate(8).is_err());
    }

    #[test]
    fn test_documented_schedule() {
        assert_eq!(address_stage(0), 0);
        assert_eq!(load_stage(0, 0), 1);
        assert_eq!(load_stage(0, 3), 4);
        assert_eq!(load_stage(2, 3), 6);
    }

    #[test]
    fn test_iteration_space() {
        let space = IterationSpace {
            n_chunks: 4,
            rounds: 10,
            forest_height: 2,
        };
        assert_eq!(space.len(), 40);
        assert_eq!(space.chunk(9), 1);
        assert_eq!(space.depth(3), 0);
        assert_eq!(space.depth(4), 1);
        assert_eq!(space.depth(11), 2);
        assert_eq!(space.depth(12), 0);
    }

    // -------------------------------------------------------------------------
    // Emission
    // -------------------------------------------------------------------------

    #[test]
    fn test_every_gather_lane_loaded_once() {
        let config = PipelineConfig::PRODUCTION;
        let frame = setup(10, 64, &config);
        let space = IterationSpace {
            n_chunks: 8,
            rounds: 16,
            forest_height: 10,
        };
        let mut ops = SlotBuffer::new();
        emit_pipeline(&mut ops, &frame, &config, &space);

        // Only iterations below the shallow levels gather.
        let gathered_iters = (0..space.len())
            .filter(|&i| space.depth(i) > 2)
            .count();
        let gather_loads = ops
            .as_slice()
            .iter()
            .filter(|s| matches!(s, Slot::Load(_)))
            .count();
        assert_eq!(gather_loads, gathered_iters * VLEN);
    }

    #[test]
    fn test_hash_and_index_ops_per_iteration() {
        let config = PipelineConfig {
            group_width: 1,
            prefetch_groups: 0,
        };
        let frame = setup(0, 8, &config);
        let space = IterationSpace {
            n_chunks: 1,
            rounds: 3,
            forest_height: 0,
        };
        let mut ops = SlotBuffer::new();
        emit_pipeline(&mut ops, &frame, &config, &space);
        // Per iteration: broadcast root, xor, 3 fused + 3 * 3 split, 6 index.
        assert_eq!(ops.count(Engine::Valu), 3 * (1 + 1 + 3 + 9 + 6));
        assert_eq!(ops.count(Engine::Load), 0);
    }

    #[test]
    fn test_empty_space_emits_nothing() {
        let config = PipelineConfig::PRODUCTION;
        let frame = setup(3, 48, &config);
        let space = IterationSpace {
            n_chunks: 6,
            rounds: 0,
            forest_height: 3,
        };
        let mut ops = SlotBuffer::new();
        emit_pipeline(&mut ops, &frame, &config, &space);
        assert!(ops.is_empty());
    }
}
