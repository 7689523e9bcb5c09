use super::known_zero::Marked;
use crate::CompileOptions;
use crate::ir::walk::rebuild;
use crate::ir::{Operation, Program};

/// Rewrite loops that can only end with the active cell at 0 into `SetData(0)`.
///
/// A loop qualifies when its body is exactly one `AddData(d)` with `d` coprime
/// to the cell modulus (odd, for 8-bit cells): repeatedly adding such a `d`
/// reaches 0 from every starting value, and the pointer never moves. Anything
/// else is left alone. The rewrite replaces one operation with one operation,
/// so the known-zero facts stay aligned with the program.
pub fn simplify_zeroing_loops(marked: Marked, options: &CompileOptions) -> Marked {
    Marked {
        program: rewrite(marked.program, options),
        known_zero: marked.known_zero,
    }
}

fn rewrite(program: Program, options: &CompileOptions) -> Program {
    rebuild(program, (), |(), _| (), |ops, ()| {
        ops.into_iter()
            .map(|op| match op {
                Operation::Loop(body) if is_zeroing_loop(&body, options) => Operation::SetData(0),
                other => other,
            })
            .collect()
    })
}

pub(super) fn is_zeroing_loop(body: &Program, options: &CompileOptions) -> bool {
    match body.ops() {
        [Operation::AddData(delta)] => {
            let step = options.wrap_data(i64::from(*delta));
            gcd(step, options.cell_modulus) == 1
        }
        _ => false,
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
