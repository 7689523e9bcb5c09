// Fusion of consecutive same-kind operations.
//
// Both passes work as a stack peephole over the output: an incoming operation
// is merged into the top of the output when they fuse, and a merge that sums
// to zero pops the top. Popping can expose a new fusible pair, which the
// next incoming operation then merges with.

use crate::CompileOptions;
use crate::ir::walk::rebuild;
use crate::ir::{Operation, Program};

/// Merge runs of `AddData` into one `AddData` with delta in `1..cell_modulus`.
/// Runs summing to 0 modulo the cell modulus disappear.
pub fn combine_increments(program: Program, options: &CompileOptions) -> Program {
    rebuild(program, (), |(), _| (), |ops, ()| {
        let mut out: Vec<Operation> = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Operation::AddData(delta) => push_add(&mut out, delta, options),
                other => out.push(other),
            }
        }
        Program::new(out)
    })
}

/// Merge runs of `MovePointer`; runs moving a multiple of the tape size disappear.
///
/// Deleting a move can leave two `AddData` on the same cell side by side
/// (`+><+`), so those are re-fused here as well. This keeps the output free of
/// fusible pairs for the rest of the pipeline.
pub fn combine_pointer_moves(program: Program, options: &CompileOptions) -> Program {
    rebuild(program, (), |(), _| (), |ops, ()| {
        let mut out: Vec<Operation> = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Operation::MovePointer(delta) => push_move(&mut out, delta, options),
                Operation::AddData(delta) => push_add(&mut out, delta, options),
                other => out.push(other),
            }
        }
        Program::new(out)
    })
}

fn push_add(out: &mut Vec<Operation>, delta: i32, options: &CompileOptions) {
    let (pending, pop) = match out.last() {
        Some(Operation::AddData(prev)) => (i64::from(*prev) + i64::from(delta), true),
        _ => (i64::from(delta), false),
    };
    if pop {
        out.pop();
    }
    let wrapped = options.wrap_data(pending);
    if wrapped != 0 {
        out.push(Operation::AddData(wrapped as i32));
    }
}

fn push_move(out: &mut Vec<Operation>, delta: i32, options: &CompileOptions) {
    let (pending, pop) = match out.last() {
        Some(Operation::MovePointer(prev)) => (i64::from(*prev) + i64::from(delta), true),
        _ => (i64::from(delta), false),
    };
    if pop {
        out.pop();
    }
    let wrapped = options.wrap_pointer(pending);
    if wrapped != 0 {
        out.push(Operation::MovePointer(wrapped));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use Operation::{AddData, Input, Loop, MovePointer, Output};

    fn options() -> CompileOptions {
        CompileOptions::default()
    }

    #[test]
    fn fuses_increment_runs() {
        let program = combine_increments(parse("+++.--").unwrap(), &options());
        assert_eq!(program.ops(), &[AddData(3), Output, AddData(254)]);
    }

    #[test]
    fn drops_zero_sum_runs() {
        let program = combine_increments(parse("+-.++--").unwrap(), &options());
        assert_eq!(program.ops(), &[Output]);

        let wraps = combine_increments(parse(&"+".repeat(256)).unwrap(), &options());
        assert!(wraps.is_empty());
    }

    #[test]
    fn single_decrement_is_normalized() {
        let program = combine_increments(parse("-").unwrap(), &options());
        assert_eq!(program.ops(), &[AddData(255)]);
    }

    #[test]
    fn pointer_moves_block_increment_fusion() {
        let program = combine_increments(parse("+>+").unwrap(), &options());
        assert_eq!(program.ops(), &[AddData(1), MovePointer(1), AddData(1)]);
    }

    #[test]
    fn recurses_into_loops() {
        let program = combine_increments(parse("[--[++]]").unwrap(), &options());
        assert_eq!(
            program.ops(),
            &[Loop(Program::new(vec![
                AddData(254),
                Loop(Program::new(vec![AddData(2)])),
            ]))]
        );
    }

    #[test]
    fn fuses_pointer_runs_keeping_sign() {
        let program = combine_pointer_moves(parse(">>><<<<<,").unwrap(), &options());
        assert_eq!(program.ops(), &[MovePointer(-2), Input]);
    }

    #[test]
    fn drops_moves_that_cancel() {
        let program = combine_pointer_moves(parse("><.<>").unwrap(), &options());
        assert_eq!(program.ops(), &[Output]);
    }

    #[test]
    fn pointer_moves_wrap_at_tape_size() {
        let options = CompileOptions {
            tape_size: 4,
            ..CompileOptions::default()
        };
        let full_turn = combine_pointer_moves(parse(">>>>.").unwrap(), &options);
        assert_eq!(full_turn.ops(), &[Output]);

        let past = combine_pointer_moves(parse(">>>>>>.").unwrap(), &options);
        assert_eq!(past.ops(), &[MovePointer(2), Output]);
    }

    #[test]
    fn refuses_adds_exposed_by_cancelled_moves() {
        let program = combine_increments(parse(",+><+").unwrap(), &options());
        let program = combine_pointer_moves(program, &options());
        assert_eq!(program.ops(), &[Input, AddData(2)]);

        let program = combine_increments(parse(">+<>-<.").unwrap(), &options());
        let program = combine_pointer_moves(program, &options());
        assert_eq!(program.ops(), &[Output]);
    }

    #[test]
    fn pointer_fusion_recurses_into_loops() {
        let program = combine_pointer_moves(parse("[>>[<<]]").unwrap(), &options());
        assert_eq!(
            program.ops(),
            &[Loop(Program::new(vec![
                MovePointer(2),
                Loop(Program::new(vec![MovePointer(-2)])),
            ]))]
        );
    }
}
