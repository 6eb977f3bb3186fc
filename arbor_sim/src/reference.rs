//! Scalar reference interpreters for the tree walk.
//!
//! `reference_kernel` works on the structured `Tree`/`Input` pair;
//! `ReferenceRun` works on a memory image and yields a snapshot at each
//! point where a kernel pauses. Both advance lanes with `walk_step`.

use crate::error::{SimError, SimResult};
use crate::problem::{Input, MemLayout, Tree};
use arbor_core::{hash_value, Word};
use tracing::debug;

/// One round for one lane: mix the node into the value, then move to a
/// child, wrapping to the root past the last node.
#[inline]
pub fn walk_step(node: Word, idx: Word, val: Word, n_nodes: usize) -> (Word, Word) {
    let val = hash_value(val ^ node);
    let next = idx
        .wrapping_mul(2)
        .wrapping_add(if val % 2 == 0 { 1 } else { 2 });
    let idx = if (next as usize) >= n_nodes { 0 } else { next };
    (idx, val)
}

/// Run every round of `input` over `tree` in place.
pub fn reference_kernel(tree: &Tree, input: &mut Input) {
    let n_nodes = tree.n_nodes();
    for _ in 0..input.rounds {
        for (idx, val) in input.indices.iter_mut().zip(input.values.iter_mut()) {
            let node = tree.values[*idx as usize];
            (*idx, *val) = walk_step(node, *idx, *val, n_nodes);
        }
    }
}

/// Where a `ReferenceRun` stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Final,
    Done,
}

/// Memory-image interpreter.
///
/// Iterating yields the image as the kernel should see it at each `pause`:
/// first untouched (after setup), then after all rounds.
#[derive(Debug, Clone)]
pub struct ReferenceRun {
    mem: Vec<Word>,
    layout: MemLayout,
    phase: Phase,
}

impl ReferenceRun {
    /// Validate `mem` and prepare to interpret it.
    pub fn new(mem: Vec<Word>) -> SimResult<Self> {
        let layout = MemLayout::from_image(&mem)?;
        let indices = &mem[layout.inp_indices_p..layout.inp_indices_p + layout.batch_size];
        if let Some(lane) = indices.iter().position(|&i| i as usize >= layout.n_nodes) {
            return Err(SimError::MalformedImage(format!(
                "lane {} starts at index {} outside a tree of {} nodes",
                lane, indices[lane], layout.n_nodes
            )));
        }
        Ok(ReferenceRun {
            mem,
            layout,
            phase: Phase::Initial,
        })
    }

    /// Decoded header.
    #[inline]
    pub fn layout(&self) -> &MemLayout {
        &self.layout
    }

    /// Current memory image.
    #[inline]
    pub fn mem(&self) -> &[Word] {
        &self.mem
    }

    /// Advance every lane by one round.
    pub fn run_round(&mut self) {
        let MemLayout {
            n_nodes,
            batch_size,
            forest_values_p,
            inp_indices_p,
            inp_values_p,
            ..
        } = self.layout;
        for lane in 0..batch_size {
            let idx = self.mem[inp_indices_p + lane];
            let val = self.mem[inp_values_p + lane];
            let node = self.mem[forest_values_p + idx as usize];
            let (idx, val) = walk_step(node, idx, val, n_nodes);
            self.mem[inp_indices_p + lane] = idx;
            self.mem[inp_values_p + lane] = val;
        }
    }
}

impl Iterator for ReferenceRun {
    type Item = Vec<Word>;

    fn next(&mut self) -> Option<Vec<Word>> {
        match self.phase {
            Phase::Initial => {
                self.phase = Phase::Final;
                debug!(pause = 0, "reference snapshot");
                Some(self.mem.clone())
            }
            Phase::Final => {
                for _ in 0..self.layout.rounds {
                    self.run_round();
                }
                self.phase = Phase::Done;
                debug!(pause = 1, rounds = self.layout.rounds, "reference snapshot");
                Some(self.mem.clone())
            }
            Phase::Done => None,
        }
    }
}
