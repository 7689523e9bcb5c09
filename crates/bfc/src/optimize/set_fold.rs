use super::known_zero::{KnownZero, Marked};
use crate::CompileOptions;
use crate::ir::walk::rebuild;
use crate::ir::{Operation, Program};

/// Fold `AddData` into the assignment that precedes it.
///
/// - `SetData(v)` followed by `AddData` operations on the same cell becomes
///   `SetData(v + sum)`.
/// - `AddData` at a position known to start from 0 becomes `SetData(sum)`.
///
/// Consumes the known-zero facts; the returned program carries none.
pub fn combine_set_and_increments(marked: Marked, options: &CompileOptions) -> Program {
    let Marked {
        program,
        known_zero,
    } = marked;
    rebuild(
        program,
        Some(&known_zero),
        |facts, index| facts.and_then(|facts| facts.body(index)),
        |ops, facts| {
            // A missing map means nothing is known; it only arises when the
            // facts were computed for a different program.
            let fallback = KnownZero::default();
            fold_scope(ops, facts.unwrap_or(&fallback), options)
        },
    )
}

fn fold_scope(ops: Vec<Operation>, facts: &KnownZero, options: &CompileOptions) -> Program {
    debug_assert_eq!(
        facts.len(),
        ops.len(),
        "known-zero facts out of step with the program"
    );

    let mut out: Vec<Operation> = Vec::with_capacity(ops.len());
    for (index, op) in ops.into_iter().enumerate() {
        match op {
            Operation::AddData(delta) => {
                // Only absorbed adds are dropped from `out`, so a trailing
                // `SetData` is always on the same cell.
                if let Some(Operation::SetData(value)) = out.last_mut() {
                    *value = options.wrap_data(i64::from(*value) + i64::from(delta));
                } else if facts.at(index) {
                    out.push(Operation::SetData(options.wrap_data(i64::from(delta))));
                } else {
                    out.push(Operation::AddData(delta));
                }
            }
            other => out.push(other),
        }
    }
    Program::new(out)
}
