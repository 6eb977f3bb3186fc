//! Hash stage lowering and strength reduction.
//!
//! A stage of the shape `(a + C) + (a << k)` equals `a * (1 + 2^k) + C`
//! modulo 2^32, so it lowers to a single `multiply_add`. Every other stage
//! lowers to two independent vector ops followed by a combine.

use crate::emit::SlotBuffer;
use crate::error::KernelResult;
use crate::kernel::builder::KernelBuilder;
use arbor_core::{AluOp, HashStage, MixOp, ScratchAddr, Word};

// =============================================================================
// Stage Forms
// =============================================================================

/// How one stage is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageForm {
    /// `a' = a * multiplier + addend`.
    Fused { multiplier: Word, addend: Word },
    /// `t1 = a op1 val1; t2 = a op3 val3; a' = t1 combine t2`.
    Split {
        op1: AluOp,
        val1: Word,
        combine: AluOp,
        op3: AluOp,
        val3: Word,
    },
}

impl StageForm {
    /// Pick the cheapest form for `stage`.
    pub fn of(stage: &HashStage) -> Self {
        match *stage {
            HashStage {
                op1: MixOp::Add,
                val1,
                op2: MixOp::Add,
                op3: MixOp::Shl,
                val3,
            } if val3 < Word::BITS => StageForm::Fused {
                multiplier: 1u32.wrapping_add(1 << val3),
                addend: val1,
            },
            HashStage {
                op1,
                val1,
                op2,
                op3,
                val3,
            } => StageForm::Split {
                op1: op1.alu_op(),
                val1,
                combine: op2.alu_op(),
                op3: op3.alu_op(),
                val3,
            },
        }
    }

    /// Whether this form needs a single operation.
    #[inline]
    pub fn is_fused(&self) -> bool {
        matches!(self, StageForm::Fused { .. })
    }

    /// Evaluate on one word, the way the emitted code does.
    pub fn apply(&self, a: Word) -> Word {
        match *self {
            StageForm::Fused { multiplier, addend } => {
                a.wrapping_mul(multiplier).wrapping_add(addend)
            }
            StageForm::Split {
                op1,
                val1,
                combine,
                op3,
                val3,
            } => {
                let eval = |op: AluOp, x, y| op.apply(x, y).unwrap_or(0);
                eval(combine, eval(op1, a, val1), eval(op3, a, val3))
            }
        }
    }

    /// Immediates the form reads, in materialization order.
    fn immediates(&self) -> [Word; 2] {
        match *self {
            StageForm::Fused { multiplier, addend } => [addend, multiplier],
            StageForm::Split { val1, val3, .. } => [val1, val3],
        }
    }
}

// =============================================================================
// Resolved Stages
// =============================================================================

/// A stage form with its immediates bound to vector constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashLowering {
    Fused {
        multiplier: ScratchAddr,
        addend: ScratchAddr,
    },
    Split {
        op1: AluOp,
        val1: ScratchAddr,
        combine: AluOp,
        op3: AluOp,
        val3: ScratchAddr,
    },
}

impl HashLowering {
    /// Materialize the vector constants `form` reads.
    pub fn resolve(builder: &mut KernelBuilder, form: &StageForm) -> KernelResult<Self> {
        let [first, second] = form.immediates();
        let first = builder.vector_constant(first)?;
        let second = builder.vector_constant(second)?;
        Ok(match *form {
            StageForm::Fused { .. } => HashLowering::Fused {
                addend: first,
                multiplier: second,
            },
            StageForm::Split {
                op1, combine, op3, ..
            } => HashLowering::Split {
                op1,
                val1: first,
                combine,
                op3,
                val3: second,
            },
        })
    }

    /// The independent part of the stage. Fused stages finish here.
    pub fn emit_parallel(
        &self,
        ops: &mut SlotBuffer,
        val: ScratchAddr,
        tmp1: ScratchAddr,
        tmp2: ScratchAddr,
    ) {
        match *self {
            HashLowering::Fused { multiplier, addend } => {
                ops.multiply_add(val, val, multiplier, addend)
            }
            HashLowering::Split {
                op1,
                val1,
                op3,
                val3,
                ..
            } => {
                ops.valu(op1, tmp1, val, val1);
                ops.valu(op3, tmp2, val, val3);
            }
        }
    }

    /// The combine step of a split stage; nothing for fused stages.
    pub fn emit_combine(
        &self,
        ops: &mut SlotBuffer,
        val: ScratchAddr,
        tmp1: ScratchAddr,
        tmp2: ScratchAddr,
    ) {
        if let HashLowering::Split { combine, .. } = *self {
            ops.valu(combine, val, tmp1, tmp2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{hash_value, HASH_STAGES};

    #[test]
    fn test_standard_table_fusion() {
        let fused: Vec<_> = HASH_STAGES
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match StageForm::of(s) {
                StageForm::Fused { multiplier, .. } => Some((i, multiplier)),
                StageForm::Split { .. } => None,
            })
            .collect();
        assert_eq!(fused, vec![(0, 4097), (2, 33), (4, 9)]);
    }

    #[test]
    fn test_xor_combine_not_fused() {
        // Stage 3 adds C but combines with xor.
        assert!(!StageForm::of(&HASH_STAGES[3]).is_fused());
    }

    #[test]
    fn test_oversized_shift_not_fused() {
        let stage = HashStage {
            op1: MixOp::Add,
            val1: 1,
            op2: MixOp::Add,
            op3: MixOp::Shl,
            val3: 40,
        };
        let form = StageForm::of(&stage);
        assert!(!form.is_fused());
        assert_eq!(form.apply(7), stage.apply(7));
    }

    #[test]
    fn test_forms_compose_to_hash() {
        let forms: Vec<_> = HASH_STAGES.iter().map(StageForm::of).collect();
        for a in [0, 1, 0xFFFF_FFFF, 0x1234_5678, 987_654_321] {
            let b = forms.iter().fold(a, |acc, f| f.apply(acc));
            assert_eq!(b, hash_value(a));
        }
    }

    #[test]
    fn test_split_emits_three_ops() {
        let mut builder = KernelBuilder::default();
        let lowering =
            HashLowering::resolve(&mut builder, &StageForm::of(&HASH_STAGES[1])).unwrap();
        builder.ops_mut().take();

        let (val, t1, t2) = (
            ScratchAddr::new(100),
            ScratchAddr::new(108),
            ScratchAddr::new(116),
        );
        let mut ops = SlotBuffer::new();
        lowering.emit_parallel(&mut ops, val, t1, t2);
        lowering.emit_combine(&mut ops, val, t1, t2);
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn test_fused_emits_one_op() {
        let mut builder = KernelBuilder::default();
        let lowering =
            HashLowering::resolve(&mut builder, &StageForm::of(&HASH_STAGES[0])).unwrap();
        let mut ops = SlotBuffer::new();
        let val = ScratchAddr::new(200);
        lowering.emit_parallel(&mut ops, val, val, val);
        lowering.emit_combine(&mut ops, val, val, val);
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn test_shared_immediates_materialized_once() {
        // Stage 3 shifts by 9 and stage 4 multiplies by 9.
        let mut builder = KernelBuilder::default();
        for stage in &HASH_STAGES {
            HashLowering::resolve(&mut builder, &StageForm::of(stage)).unwrap();
        }
        assert_eq!(builder.pool().vector_count(), 11);
    }
}
