//! Scratch layout of the kernel and the setup phase that fills it.
//!
//! # Layout
//!
//! ```text
//! header scalars | constants (scalar + vector) | hash constants |
//! s_idx[batch] | s_val[batch] | pipeline buffers | shallow nodes | io addrs
//! ```
//!
//! Constants are interleaved with the regions that first need them because
//! the pool allocates on first use.

use crate::error::KernelResult;
use crate::kernel::builder::KernelBuilder;
use crate::kernel::hash::{HashLowering, StageForm};
use arbor_core::{ScratchAddr, Word, HASH_STAGES, HEADER_WORDS, VLEN};
use tracing::debug;

/// Names of the header words, in memory order.
pub const HEADER_NAMES: [&str; HEADER_WORDS] = [
    "rounds",
    "n_nodes",
    "batch_size",
    "forest_height",
    "forest_values_p",
    "inp_indices_p",
    "inp_values_p",
];

/// Deepest level whose node values are held in registers.
pub const MAX_SHALLOW_DEPTH: usize = 2;

// =============================================================================
// Header
// =============================================================================

/// Scalars holding the memory image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    words: [ScratchAddr; HEADER_WORDS],
}

impl Header {
    /// Allocate the header scalars and load each word by constant address.
    pub fn load(builder: &mut KernelBuilder) -> KernelResult<Self> {
        let mut words = [ScratchAddr::new(0); HEADER_WORDS];
        for (slot, name) in words.iter_mut().zip(HEADER_NAMES) {
            *slot = builder.scalar(name)?;
        }
        for (i, &dest) in words.iter().enumerate() {
            let addr = builder.constant(i as Word)?;
            builder.ops_mut().load(dest, addr);
        }
        Ok(Header { words })
    }

    #[inline]
    pub fn n_nodes(&self) -> ScratchAddr {
        self.words[1]
    }

    #[inline]
    pub fn forest_values_p(&self) -> ScratchAddr {
        self.words[4]
    }

    #[inline]
    pub fn inp_indices_p(&self) -> ScratchAddr {
        self.words[5]
    }

    #[inline]
    pub fn inp_values_p(&self) -> ScratchAddr {
        self.words[6]
    }
}

// =============================================================================
// Pipeline Buffer
// =============================================================================

/// Working set of one in-flight chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineBuffer {
    /// Node values for the chunk's eight lanes.
    pub node_val: ScratchAddr,
    pub tmp1: ScratchAddr,
    pub tmp2: ScratchAddr,
    /// Eight scalar gather addresses.
    pub gather_addr: ScratchAddr,
    /// Extra temporary for depth-2 selection.
    pub tmp3: ScratchAddr,
}

impl PipelineBuffer {
    fn allocate(builder: &mut KernelBuilder, index: usize) -> KernelResult<Self> {
        Ok(PipelineBuffer {
            node_val: builder.vector(&format!("node_val_{}", index))?,
            tmp1: builder.vector(&format!("tmp1_{}", index))?,
            tmp2: builder.vector(&format!("tmp2_{}", index))?,
            gather_addr: builder.region(&format!("gather_addr_{}", index), VLEN)?,
            tmp3: builder.vector(&format!("tmp3_{}", index))?,
        })
    }
}

// =============================================================================
// Shallow Nodes
// =============================================================================

/// Registers holding the top of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShallowNodes {
    /// Scalar node values `tree[0..count]`.
    pub scalars: ScratchAddr,
    /// Scalar load addresses, one per node.
    pub addrs: ScratchAddr,
    /// Nodes preloaded.
    pub count: usize,
    /// Deepest level covered.
    pub depth: usize,
    /// Broadcasts of `tree[1]`, `tree[2]`.
    pub d1: Option<[ScratchAddr; 2]>,
    /// Broadcasts of `tree[3..7]`.
    pub d2: Option<[ScratchAddr; 4]>,
}

impl ShallowNodes {
    /// Levels `0..=depth` of a tree of `forest_height`.
    pub fn depth_for(forest_height: usize) -> usize {
        forest_height.min(MAX_SHALLOW_DEPTH)
    }

    fn allocate(builder: &mut KernelBuilder, forest_height: usize) -> KernelResult<Self> {
        let depth = Self::depth_for(forest_height);
        let count = (1 << (depth + 1)) - 1;
        let scalars = builder.region("shallow_node", count)?;
        let addrs = builder.region("shallow_addr", count)?;
        let d1 = if depth >= 1 {
            Some([
                builder.vector("v_node_d1_1")?,
                builder.vector("v_node_d1_2")?,
            ])
        } else {
            None
        };
        let d2 = if depth >= 2 {
            let mut blocks = [ScratchAddr::new(0); 4];
            for (i, block) in blocks.iter_mut().enumerate() {
                *block = builder.vector(&format!("v_node_d2_{}", i))?;
            }
            Some(blocks)
        } else {
            None
        };
        Ok(ShallowNodes {
            scalars,
            addrs,
            count,
            depth,
            d1,
            d2,
        })
    }

    /// Whether lanes at `depth` select from registers instead of gathering.
    #[inline]
    pub fn covers(&self, depth: usize) -> bool {
        depth <= self.depth
    }

    /// Scalar holding `tree[i]`.
    #[inline]
    pub fn node(&self, i: usize) -> ScratchAddr {
        self.scalars.offset(i as u32)
    }
}

// =============================================================================
// Kernel Frame
// =============================================================================

/// Vector constants shared by every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorConsts {
    pub one: ScratchAddr,
    pub two: ScratchAddr,
    pub three: ScratchAddr,
    /// Broadcast of the runtime node count.
    pub n_nodes: ScratchAddr,
}

/// Static parameters the layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub forest_height: usize,
    pub batch_size: usize,
    /// Pipeline buffers to allocate.
    pub buffers: usize,
}

impl FrameShape {
    #[inline]
    pub fn n_chunks(&self) -> usize {
        self.batch_size / VLEN
    }
}

/// Every scratch address the kernel body refers to.
#[derive(Debug, Clone)]
pub struct KernelFrame {
    pub header: Header,
    pub consts: VectorConsts,
    pub hash: Vec<HashLowering>,
    /// Scalar `chunk * VLEN` per chunk.
    pub chunk_offsets: Vec<ScratchAddr>,
    pub s_idx: ScratchAddr,
    pub s_val: ScratchAddr,
    pub buffers: Vec<PipelineBuffer>,
    pub shallow: ShallowNodes,
    /// Scalar `i` per shallow node, for its load address.
    pub shallow_offsets: Vec<ScratchAddr>,
    /// `2 * n_chunks` scalar memory addresses for the bulk I/O phases:
    /// index chunks first, then value chunks.
    pub io_addrs: ScratchAddr,
    pub n_chunks: usize,
}

impl KernelFrame {
    /// Allocate the layout, emitting the setup operations into `builder`.
    pub fn setup(builder: &mut KernelBuilder, shape: &FrameShape) -> KernelResult<Self> {
        let n_chunks = shape.n_chunks();
        let header = Header::load(builder)?;

        for value in 0..=3 {
            builder.constant(value)?;
        }
        let one = builder.vector_constant(1)?;
        let two = builder.vector_constant(2)?;
        let three = builder.vector_constant(3)?;
        let n_nodes = builder.vector("v_n_nodes")?;
        builder.ops_mut().vbroadcast(n_nodes, header.n_nodes());

        let hash = HASH_STAGES
            .iter()
            .map(StageForm::of)
            .map(|form| HashLowering::resolve(builder, &form))
            .collect::<KernelResult<Vec<_>>>()?;

        let chunk_offsets = (0..n_chunks)
            .map(|chunk| builder.constant((chunk * VLEN) as Word))
            .collect::<KernelResult<Vec<_>>>()?;

        let shallow_count = (1 << (ShallowNodes::depth_for(shape.forest_height) + 1)) - 1;
        let shallow_offsets = (0..shallow_count)
            .map(|i| builder.constant(i as Word))
            .collect::<KernelResult<Vec<_>>>()?;

        let s_idx = builder.region("s_idx", shape.batch_size)?;
        let s_val = builder.region("s_val", shape.batch_size)?;
        let buffers = (0..shape.buffers)
            .map(|i| PipelineBuffer::allocate(builder, i))
            .collect::<KernelResult<Vec<_>>>()?;
        let shallow = ShallowNodes::allocate(builder, shape.forest_height)?;
        let io_addrs = builder.region("io_addr", 2 * n_chunks)?;

        debug!(
            scratch = builder.scratch_used(),
            setup_ops = builder.ops().len(),
            buffers = shape.buffers,
            "kernel frame allocated"
        );

        Ok(KernelFrame {
            header,
            consts: VectorConsts {
                one,
                two,
                three,
                n_nodes,
            },
            hash,
            chunk_offsets,
            s_idx,
            s_val,
            buffers,
            shallow,
            shallow_offsets,
            io_addrs,
            n_chunks,
        })
    }

    /// First index lane of `chunk` in `s_idx`.
    #[inline]
    pub fn idx(&self, chunk: usize) -> ScratchAddr {
        self.s_idx.offset((chunk * VLEN) as u32)
    }

    /// First value lane of `chunk` in `s_val`.
    #[inline]
    pub fn val(&self, chunk: usize) -> ScratchAddr {
        self.s_val.offset((chunk * VLEN) as u32)
    }
}
