//! The workload's integer mixing function.
//!
//! Each stage computes `t1 = a OP1 C1`, `t2 = a OP3 C3`, `a' = t1 OP2 t2`
//! with every intermediate reduced modulo 2^32.

use crate::machine::Word;
use crate::slot::AluOp;

/// Operators that appear in hash stages. All are total on machine words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixOp {
    Add,
    Xor,
    Shl,
    Shr,
}

impl MixOp {
    /// Evaluate with wraparound. Shifts by 32 or more produce zero.
    #[inline]
    pub fn apply(self, a: Word, b: Word) -> Word {
        match self {
            MixOp::Add => a.wrapping_add(b),
            MixOp::Xor => a ^ b,
            MixOp::Shl => a.checked_shl(b).unwrap_or(0),
            MixOp::Shr => a.checked_shr(b).unwrap_or(0),
        }
    }

    /// The machine opcode implementing this operator.
    #[inline]
    pub const fn alu_op(self) -> AluOp {
        match self {
            MixOp::Add => AluOp::Add,
            MixOp::Xor => AluOp::Xor,
            MixOp::Shl => AluOp::Shl,
            MixOp::Shr => AluOp::Shr,
        }
    }
}

/// One stage of the mixing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashStage {
    pub op1: MixOp,
    pub val1: Word,
    pub op2: MixOp,
    pub op3: MixOp,
    pub val3: Word,
}

impl HashStage {
    const fn new(op1: MixOp, val1: Word, op2: MixOp, op3: MixOp, val3: Word) -> Self {
        Self {
            op1,
            val1,
            op2,
            op3,
            val3,
        }
    }

    /// Apply this stage to one word.
    #[inline]
    pub fn apply(&self, a: Word) -> Word {
        let t1 = self.op1.apply(a, self.val1);
        let t2 = self.op3.apply(a, self.val3);
        self.op2.apply(t1, t2)
    }
}

/// The six stages of the workload hash.
pub const HASH_STAGES: [HashStage; 6] = [
    HashStage::new(MixOp::Add, 0x7ED5_5D16, MixOp::Add, MixOp::Shl, 12),
    HashStage::new(MixOp::Xor, 0xC761_C23C, MixOp::Xor, MixOp::Shr, 19),
    HashStage::new(MixOp::Add, 0x1656_67B1, MixOp::Add, MixOp::Shl, 5),
    HashStage::new(MixOp::Add, 0xD3A2_646C, MixOp::Xor, MixOp::Shl, 9),
    HashStage::new(MixOp::Add, 0xFD70_46C5, MixOp::Add, MixOp::Shl, 3),
    HashStage::new(MixOp::Xor, 0xB55A_4F09, MixOp::Xor, MixOp::Shr, 16),
];

/// Run `a` through every stage of `HASH_STAGES`.
#[inline]
pub fn hash_value(a: Word) -> Word {
    HASH_STAGES.iter().fold(a, |acc, stage| stage.apply(acc))
}
