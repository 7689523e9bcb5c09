// Scope-by-scope traversal of the loop tree using explicit stacks.
//
// Loops nest as deep as the source does, so nothing that walks a `Program`
// may recurse on the call stack.

use super::{Operation, Program};

struct RebuildFrame<C> {
    pending: std::iter::Enumerate<std::vec::IntoIter<Operation>>,
    done: Vec<Operation>,
    ctx: C,
}

/// Rebuild `program` innermost scope first.
///
/// `enter` derives the context of the loop body at `index` from its parent
/// scope's context. `finish` receives a scope's operations, with every loop
/// body already rebuilt and every operation at its original index, and
/// returns the new scope.
pub(crate) fn rebuild<C>(
    program: Program,
    root: C,
    mut enter: impl FnMut(&C, usize) -> C,
    mut finish: impl FnMut(Vec<Operation>, &C) -> Program,
) -> Program {
    let mut current = RebuildFrame {
        pending: program.into_ops().into_iter().enumerate(),
        done: Vec::new(),
        ctx: root,
    };
    let mut parents: Vec<RebuildFrame<C>> = Vec::new();

    loop {
        match current.pending.next() {
            Some((index, Operation::Loop(body))) => {
                let ctx = enter(&current.ctx, index);
                let ops = body.into_ops();
                let child = RebuildFrame {
                    done: Vec::with_capacity(ops.len()),
                    pending: ops.into_iter().enumerate(),
                    ctx,
                };
                parents.push(std::mem::replace(&mut current, child));
            }
            Some((_, op)) => current.done.push(op),
            None => {
                let Some(parent) = parents.pop() else {
                    return finish(current.done, &current.ctx);
                };
                let frame = std::mem::replace(&mut current, parent);
                let scope = finish(frame.done, &frame.ctx);
                current.done.push(Operation::Loop(scope));
            }
        }
    }
}

struct FoldFrame<'p, T> {
    scope: &'p Program,
    /// Index of this scope's loop in its parent.
    index: usize,
    pending: std::iter::Enumerate<std::slice::Iter<'p, Operation>>,
    children: Vec<(usize, T)>,
}

impl<'p, T> FoldFrame<'p, T> {
    fn new(scope: &'p Program, index: usize) -> Self {
        Self {
            scope,
            index,
            pending: scope.iter().enumerate(),
            children: Vec::new(),
        }
    }
}

/// Fold every scope of `program` into a value, innermost scope first.
///
/// `finish` receives the scope, its nesting depth (0 for the program itself)
/// and the values already computed for its loop bodies, keyed by index and
/// in program order.
pub(crate) fn fold_scopes<'p, T>(
    program: &'p Program,
    mut finish: impl FnMut(&'p Program, usize, Vec<(usize, T)>) -> T,
) -> T {
    let mut current = FoldFrame::new(program, 0);
    let mut parents: Vec<FoldFrame<'p, T>> = Vec::new();

    loop {
        let next_loop = current
            .pending
            .find_map(|(index, op)| op.body().map(|body| (index, body)));
        match next_loop {
            Some((index, body)) => {
                parents.push(std::mem::replace(&mut current, FoldFrame::new(body, index)));
            }
            None => {
                let depth = parents.len();
                let Some(parent) = parents.pop() else {
                    return finish(current.scope, depth, current.children);
                };
                let frame = std::mem::replace(&mut current, parent);
                let value = finish(frame.scope, depth, frame.children);
                current.children.push((frame.index, value));
            }
        }
    }
}
