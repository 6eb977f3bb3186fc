//! Machine constants and engine definitions.
//!
//! The target issues one bundle per cycle. Each engine has its own issue
//! width; operations of different engines in a bundle run in parallel.

use std::fmt;

/// A machine word. All arithmetic wraps modulo 2^32.
pub type Word = u32;

/// Number of lanes in a vector block.
pub const VLEN: usize = 8;

/// Number of cores executing the same program.
pub const N_CORES: usize = 1;

/// Scratch words available to each core.
pub const SCRATCH_SIZE: usize = 1536;

// =============================================================================
// Engine
// =============================================================================

/// A functional unit category with its own per-cycle issue width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Engine {
    /// Scalar arithmetic and bitwise operations.
    Alu = 0,
    /// Lane-wise vector arithmetic, multiply-add and broadcast.
    Valu = 1,
    /// Scalar/vector loads and immediate loads.
    Load = 2,
    /// Scalar/vector stores.
    Store = 3,
    /// Selects, jumps and pipeline barriers.
    Flow = 4,
    /// Annotations with no architectural effect.
    Debug = 5,
}

impl Engine {
    /// Number of engines.
    pub const COUNT: usize = 6;

    /// All engines in bundle print order.
    pub const ALL: [Engine; Engine::COUNT] = [
        Engine::Alu,
        Engine::Valu,
        Engine::Load,
        Engine::Store,
        Engine::Flow,
        Engine::Debug,
    ];

    /// Dense index for per-engine tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Engine::Alu => "alu",
            Engine::Valu => "valu",
            Engine::Load => "load",
            Engine::Store => "store",
            Engine::Flow => "flow",
            Engine::Debug => "debug",
        }
    }

    /// Debug slots never consume issue width and never cost a cycle.
    #[inline(always)]
    pub const fn is_debug(self) -> bool {
        matches!(self, Engine::Debug)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Slot Limits
// =============================================================================

/// Per-engine issue widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLimits {
    widths: [usize; Engine::COUNT],
}

impl SlotLimits {
    /// Widths of the reference machine.
    pub const DEFAULT: SlotLimits = SlotLimits {
        widths: [12, 6, 2, 2, 1, 64],
    };

    /// Issue width of `engine`.
    #[inline(always)]
    pub const fn width(&self, engine: Engine) -> usize {
        self.widths[engine.index()]
    }

    /// Copy of these limits with one engine's width replaced.
    pub fn with_width(mut self, engine: Engine, width: usize) -> Self {
        self.widths[engine.index()] = width;
        self
    }
}

impl Default for SlotLimits {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}
