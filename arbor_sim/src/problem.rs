//! Workload definition: the tree, the batch input and the memory image.
//!
//! # Memory Image
//!
//! ```text
//! [0] rounds            [4] forest_values_p
//! [1] n_nodes           [5] inp_indices_p
//! [2] batch_size        [6] inp_values_p
//! [3] forest_height     [7] extra_room_p
//! [8..]  tree values | indices | values | extra room
//! ```

use crate::error::{SimError, SimResult};
use arbor_core::{Word, VLEN};
use rand::Rng;

/// Exclusive upper bound of generated tree and input values.
pub const VALUE_LIMIT: Word = 1 << 30;

/// Words in the memory image header.
pub const IMAGE_HEADER_LEN: usize = 8;

/// Words of scratch room appended after the input beyond the data itself.
const EXTRA_ROOM_SLACK: usize = 32;

// =============================================================================
// Tree
// =============================================================================

/// A complete binary tree stored in level order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub height: usize,
    pub values: Vec<Word>,
}

impl Tree {
    /// Number of nodes in a complete tree of `height`, or `None` when the
    /// count does not fit a `Word`.
    #[inline]
    pub fn node_count(height: usize) -> Option<usize> {
        let bits = u32::try_from(height).ok()?.checked_add(1)?;
        let count = 1usize.checked_shl(bits)? - 1;
        (count <= Word::MAX as usize).then_some(count)
    }

    /// Random tree of `height` with values below `VALUE_LIMIT`. `None` when
    /// the tree is too tall to address.
    pub fn generate<R: Rng + ?Sized>(height: usize, rng: &mut R) -> Option<Self> {
        let values = (0..Self::node_count(height)?)
            .map(|_| rng.gen_range(0..VALUE_LIMIT))
            .collect();
        Some(Tree { height, values })
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.values.len()
    }
}

// =============================================================================
// Input
// =============================================================================

/// Per-lane walk state plus the round count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub indices: Vec<Word>,
    pub values: Vec<Word>,
    pub rounds: usize,
}

impl Input {
    /// All lanes start at the root with random values below `VALUE_LIMIT`.
    pub fn generate<R: Rng + ?Sized>(
        _tree: &Tree,
        batch_size: usize,
        rounds: usize,
        rng: &mut R,
    ) -> Self {
        let values = (0..batch_size)
            .map(|_| rng.gen_range(0..VALUE_LIMIT))
            .collect();
        Input {
            indices: vec![0; batch_size],
            values,
            rounds,
        }
    }

    /// Number of lanes.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.indices.len()
    }
}

// =============================================================================
// Memory Image
// =============================================================================

/// Decoded header of a memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemLayout {
    pub rounds: usize,
    pub n_nodes: usize,
    pub batch_size: usize,
    pub forest_height: usize,
    pub forest_values_p: usize,
    pub inp_indices_p: usize,
    pub inp_values_p: usize,
    pub extra_room_p: usize,
}

impl MemLayout {
    /// Decode and bounds-check the header of `mem`.
    pub fn from_image(mem: &[Word]) -> SimResult<Self> {
        if mem.len() < IMAGE_HEADER_LEN {
            return Err(SimError::MalformedImage(format!(
                "image has {} words, header needs {}",
                mem.len(),
                IMAGE_HEADER_LEN
            )));
        }
        let w = |i: usize| mem[i] as usize;
        let layout = MemLayout {
            rounds: w(0),
            n_nodes: w(1),
            batch_size: w(2),
            forest_height: w(3),
            forest_values_p: w(4),
            inp_indices_p: w(5),
            inp_values_p: w(6),
            extra_room_p: w(7),
        };

        let regions = [
            ("forest values", layout.forest_values_p, layout.n_nodes),
            ("indices", layout.inp_indices_p, layout.batch_size),
            ("values", layout.inp_values_p, layout.batch_size),
        ];
        for (name, start, len) in regions {
            if start.checked_add(len).map_or(true, |end| end > mem.len()) {
                return Err(SimError::MalformedImage(format!(
                    "{} region [{}, +{}) exceeds image of {} words",
                    name,
                    start,
                    len,
                    mem.len()
                )));
            }
        }
        if Tree::node_count(layout.forest_height) != Some(layout.n_nodes) {
            return Err(SimError::MalformedImage(format!(
                "{} nodes do not form a complete tree of height {}",
                layout.n_nodes, layout.forest_height
            )));
        }
        Ok(layout)
    }
}

/// Words in the memory image of a tree of `n_nodes` and a batch of
/// `batch_size`, or `None` when the image cannot be addressed by a `Word`.
pub fn image_len(n_nodes: usize, batch_size: usize) -> Option<usize> {
    let data = n_nodes.checked_add(batch_size.checked_mul(2)?)?;
    let extra_room = data.checked_add(2 * VLEN + EXTRA_ROOM_SLACK)?;
    let len = IMAGE_HEADER_LEN.checked_add(data)?.checked_add(extra_room)?;
    (len <= Word::MAX as usize).then_some(len)
}

/// Lay out `tree` and `input` as a machine memory image.
///
/// Header pointers are truncated to `Word` when `image_len` is `None`;
/// callers check it first.
pub fn build_mem_image(tree: &Tree, input: &Input) -> Vec<Word> {
    let batch_size = input.batch_size();
    let n_nodes = tree.n_nodes();
    let forest_values_p = IMAGE_HEADER_LEN;
    let inp_indices_p = forest_values_p + n_nodes;
    let inp_values_p = inp_indices_p + batch_size;
    let extra_room_p = inp_values_p + batch_size;
    let extra_room = n_nodes + 2 * batch_size + 2 * VLEN + EXTRA_ROOM_SLACK;

    let mut mem = Vec::with_capacity(extra_room_p + extra_room);
    mem.extend_from_slice(&[
        input.rounds as Word,
        n_nodes as Word,
        batch_size as Word,
        tree.height as Word,
        forest_values_p as Word,
        inp_indices_p as Word,
        inp_values_p as Word,
        extra_room_p as Word,
    ]);
    mem.extend_from_slice(&tree.values);
    mem.extend_from_slice(&input.indices);
    mem.extend_from_slice(&input.values);
    mem.resize(extra_room_p + extra_room, 0);
    mem
}
