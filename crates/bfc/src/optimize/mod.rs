//! Optimization pipeline.
//!
//! Five passes run in a fixed order, each consuming the previous pass's
//! output by value:
//!
//! 1. [`combine_increments`] fuses runs of `AddData`.
//! 2. [`combine_pointer_moves`] fuses runs of `MovePointer`.
//! 3. [`mark_known_zero`] computes where the active cell is provably 0.
//! 4. [`simplify_zeroing_loops`] turns `[-]`-shaped loops into `SetData(0)`.
//! 5. [`combine_set_and_increments`] folds adds into sets and known zeros.
//!
//! Passes 3 and 4 carry the known-zero side map alongside the program in a
//! [`Marked`]; pass 5 consumes it, so it never outlives a pipeline run.
//!
//! Every pass expects options that passed [`CompileOptions::validate`];
//! [`crate::compile`] and the backends check this, direct callers must.

mod combine;
mod known_zero;
mod set_fold;
mod zeroing_loop;

use std::fmt;

pub use combine::{combine_increments, combine_pointer_moves};
pub use known_zero::{KnownZero, Marked, mark_known_zero};
pub use set_fold::combine_set_and_increments;
pub use zeroing_loop::simplify_zeroing_loops;

use crate::CompileOptions;
use crate::ir::Program;

/// Pipeline passes in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    CombineIncrements,
    CombinePointerMoves,
    MarkKnownZero,
    SimplifyZeroingLoops,
    CombineSetAndIncrements,
}

impl Pass {
    pub const ALL: [Pass; 5] = [
        Pass::CombineIncrements,
        Pass::CombinePointerMoves,
        Pass::MarkKnownZero,
        Pass::SimplifyZeroingLoops,
        Pass::CombineSetAndIncrements,
    ];
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::CombineIncrements => "combine_increments",
            Pass::CombinePointerMoves => "combine_pointer_moves",
            Pass::MarkKnownZero => "mark_known_zero",
            Pass::SimplifyZeroingLoops => "simplify_zeroing_loops",
            Pass::CombineSetAndIncrements => "combine_set_and_increments",
        };
        f.write_str(name)
    }
}

/// Run the full pipeline.
pub fn optimize(program: Program, options: &CompileOptions) -> Program {
    optimize_until(program, options, Pass::CombineSetAndIncrements)
}

/// Run the pipeline up to and including `last`.
pub fn optimize_until(program: Program, options: &CompileOptions, last: Pass) -> Program {
    debug_assert!(
        options.validate().is_ok(),
        "optimizer called with invalid options: {options:?}"
    );
    let input_ops = program.op_count();

    let program = combine_increments(program, options);
    log_pass(Pass::CombineIncrements, &program);
    if last == Pass::CombineIncrements {
        return program;
    }

    let program = combine_pointer_moves(program, options);
    log_pass(Pass::CombinePointerMoves, &program);
    if last == Pass::CombinePointerMoves {
        return program;
    }

    let marked = mark_known_zero(program, options);
    tracing::trace!(
        pass = %Pass::MarkKnownZero,
        known_zero = marked.known_zero.count(),
        "pass finished"
    );
    if last == Pass::MarkKnownZero {
        return marked.program;
    }

    let marked = simplify_zeroing_loops(marked, options);
    log_pass(Pass::SimplifyZeroingLoops, &marked.program);
    if last == Pass::SimplifyZeroingLoops {
        return marked.program;
    }

    let program = combine_set_and_increments(marked, options);
    log_pass(Pass::CombineSetAndIncrements, &program);

    tracing::debug!(
        input_ops,
        output_ops = program.op_count(),
        "optimization pipeline finished"
    );
    program
}

fn log_pass(pass: Pass, program: &Program) {
    tracing::trace!(pass = %pass, ops = program.op_count(), "pass finished");
}
