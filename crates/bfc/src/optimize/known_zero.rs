// Known-zero analysis: a forward dataflow pass over each scope recording,
// for every operation, whether the active cell holds 0 on entry to it.

use std::collections::{BTreeMap, HashMap};

use super::zeroing_loop::is_zeroing_loop;
use crate::CompileOptions;
use crate::ir::walk::fold_scopes;
use crate::ir::{Operation, Program};

/// Side map of known-zero facts, shaped like the program it describes.
///
/// `at(i)` is true when the active cell is provably 0 on entry to operation
/// `i` of the scope; loop bodies have their own nested map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownZero {
    entry: Vec<bool>,
    bodies: BTreeMap<usize, KnownZero>,
}

impl KnownZero {
    #[must_use]
    pub fn at(&self, index: usize) -> bool {
        self.entry.get(index).copied().unwrap_or(false)
    }

    /// Facts for the body of the loop at `index`.
    #[must_use]
    pub fn body(&self, index: usize) -> Option<&KnownZero> {
        self.bodies.get(&index)
    }

    /// Number of positions in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    /// Number of known-zero positions, including nested scopes.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![self];
        while let Some(facts) = pending.pop() {
            total += facts.entry.iter().filter(|&&known| known).count();
            pending.extend(facts.bodies.values());
        }
        total
    }
}

impl Drop for KnownZero {
    fn drop(&mut self) {
        let mut pending: Vec<KnownZero> =
            std::mem::take(&mut self.bodies).into_values().collect();
        while let Some(mut facts) = pending.pop() {
            pending.extend(std::mem::take(&mut facts.bodies).into_values());
        }
    }
}

/// A program paired with the known-zero facts computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marked {
    pub program: Program,
    pub known_zero: KnownZero,
}

/// Compute known-zero facts for `program`.
///
/// The active cell is known to be 0 at the start of the program, after a loop
/// exits, and after `SetData(0)`; `Output` does not disturb the fact.
///
/// The dataflow itself tracks the constant value of the active cell where one
/// is known, so `SetData(3)` followed by `AddData(253)` is also a zero. Until
/// the first loop that may move the pointer, the outermost scope also tracks
/// the pointer offset from the start of the tape: every cell starts at 0, so
/// a cell nothing has written yet is known to be 0 too. Loops that
/// [`simplify_zeroing_loops`](super::simplify_zeroing_loops) will rewrite are
/// tracked as if they were already `SetData(0)`, which makes the facts
/// identical before and after that rewrite.
pub fn mark_known_zero(program: Program, options: &CompileOptions) -> Marked {
    let known_zero = fold_scopes(&program, |scope, depth, bodies: Vec<(usize, KnownZero)>| {
        // Loop bodies may be entered with any cell active.
        let (value, prefix) = if depth == 0 {
            (Some(0), Some(Prefix::default()))
        } else {
            (None, None)
        };
        let mut facts = scope_facts(scope, value, prefix, options);
        facts.bodies = bodies.into_iter().collect();
        facts
    });
    Marked {
        program,
        known_zero,
    }
}

/// Straight-line state of the outermost scope.
#[derive(Debug, Default)]
struct Prefix {
    offset: usize,
    /// Cells written so far, mapped to their value when it is known.
    written: HashMap<usize, Option<u32>>,
}

impl Prefix {
    fn current(&self) -> Option<u32> {
        self.written.get(&self.offset).copied().unwrap_or(Some(0))
    }

    fn shift(&mut self, delta: i32, tape_size: usize) {
        let moved = self.offset as i64 + i64::from(delta);
        self.offset = moved.rem_euclid(tape_size as i64) as usize;
    }
}

/// `value` is the known value of the active cell on entry to the scope.
/// Facts for loop bodies are left for the caller to attach.
fn scope_facts(
    program: &Program,
    mut value: Option<u32>,
    mut prefix: Option<Prefix>,
    options: &CompileOptions,
) -> KnownZero {
    let mut facts = KnownZero::default();

    for op in program {
        facts.entry.push(value == Some(0));

        value = match op {
            Operation::MovePointer(delta) => prefix.as_mut().and_then(|prefix| {
                prefix.shift(*delta, options.tape_size);
                prefix.current()
            }),
            Operation::AddData(delta) => {
                value.map(|v| options.wrap_data(i64::from(v) + i64::from(*delta)))
            }
            Operation::SetData(v) => Some(options.wrap_data(i64::from(*v))),
            Operation::Output => value,
            Operation::Input => None,
            Operation::Loop(body) => {
                if !is_zeroing_loop(body, options) {
                    prefix = None;
                }
                Some(0)
            }
        };

        if let Some(prefix) = prefix.as_mut()
            && !matches!(op, Operation::MovePointer(_) | Operation::Output)
        {
            prefix.written.insert(prefix.offset, value);
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn facts(source: &str) -> KnownZero {
        mark_known_zero(parse(source).unwrap(), &CompileOptions::default()).known_zero
    }

    #[test]
    fn start_of_program_is_zero() {
        let facts = facts(",+");
        assert!(facts.at(0));
        assert!(!facts.at(1));
    }

    #[test]
    fn loop_exit_is_zero() {
        let facts = facts(",[>]+.");
        assert!(!facts.at(1));
        assert!(facts.at(2));
        assert!(!facts.at(3));
    }

    #[test]
    fn set_zero_is_zero_and_survives_output() {
        let program = Program::new(vec![
            Operation::Input,
            Operation::SetData(0),
            Operation::Output,
            Operation::AddData(1),
            Operation::SetData(7),
            Operation::Output,
        ]);
        let facts = mark_known_zero(program, &CompileOptions::default()).known_zero;
        assert_eq!(
            (0..6).map(|i| facts.at(i)).collect::<Vec<_>>(),
            vec![true, false, true, true, false, false]
        );
    }

    #[test]
    fn tracks_constants_through_adds() {
        let program = Program::new(vec![
            Operation::Input,
            Operation::SetData(3),
            Operation::AddData(253),
            Operation::Output,
        ]);
        let facts = mark_known_zero(program, &CompileOptions::default()).known_zero;
        assert!(!facts.at(2));
        assert!(facts.at(3));
    }

    #[test]
    fn untouched_cells_are_zero_before_first_loop() {
        // + > + < .
        let facts = facts("+>+<.");
        assert!(facts.at(2));
        assert!(!facts.at(4));
    }

    #[test]
    fn pointer_offsets_wrap() {
        let options = CompileOptions {
            tape_size: 3,
            ..CompileOptions::default()
        };
        let program = parse(",>>>+").unwrap();
        let facts = mark_known_zero(program, &options).known_zero;
        assert!(!facts.at(4));
    }

    #[test]
    fn zeroing_loops_keep_tracking() {
        let facts = facts(",[-]>+");
        assert!(facts.at(3));
    }

    #[test]
    fn other_loops_end_tracking() {
        let facts = facts("[>]>+");
        assert!(facts.at(1));
        assert!(!facts.at(2));
    }

    #[test]
    fn loop_bodies_start_unknown() {
        let facts = facts("+[+[-]+]");
        let body = facts.body(1).unwrap();
        assert!(!body.at(0));
        assert!(body.at(2));
        assert_eq!(body.len(), 3);
        assert_eq!(body.body(1).unwrap().len(), 1);
    }

    #[test]
    fn marking_leaves_program_untouched() {
        let program = parse("+[-]>.").unwrap();
        let marked = mark_known_zero(program.clone(), &CompileOptions::default());
        assert_eq!(marked.program, program);
        assert_eq!(marked.known_zero.len(), program.len());
    }
}
