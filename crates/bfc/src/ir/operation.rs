use super::walk::fold_scopes;

/// IR node set: a closed vocabulary every pass and backend operates on.
///
/// Loops own their bodies, so a `Program` is a tree. Zero-delta
/// `AddData`/`MovePointer` may appear in hand-built programs but are never
/// produced by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    MovePointer(i32),
    AddData(i32),
    SetData(u32),
    Output,
    Input,
    Loop(Program),
}

impl Operation {
    /// The loop body, if this is a loop.
    #[must_use]
    pub fn body(&self) -> Option<&Program> {
        match self {
            Operation::Loop(body) => Some(body),
            _ => None,
        }
    }
}

/// An ordered sequence of operations; the unit every pass consumes and produces.
///
/// Nesting depth is unbounded, so cloning, comparing and dropping walk the
/// tree with an explicit stack.
#[derive(Debug, Default)]
pub struct Program(Vec<Operation>);

impl Program {
    #[must_use]
    pub fn new(ops: Vec<Operation>) -> Self {
        Self(ops)
    }

    #[must_use]
    pub fn ops(&self) -> &[Operation] {
        &self.0
    }

    #[must_use]
    pub fn into_ops(mut self) -> Vec<Operation> {
        std::mem::take(&mut self.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, op: Operation) {
        self.0.push(op);
    }

    /// Total number of operations, including those in loop bodies.
    #[must_use]
    pub fn op_count(&self) -> usize {
        fold_scopes(self, |scope, _, bodies: Vec<(usize, usize)>| {
            scope.len() + bodies.iter().map(|&(_, count)| count).sum::<usize>()
        })
    }

    /// Deepest loop nesting level (0 for straight-line code).
    #[must_use]
    pub fn depth(&self) -> usize {
        fold_scopes(self, |_, _, bodies: Vec<(usize, usize)>| {
            bodies.iter().map(|&(_, depth)| depth + 1).max().unwrap_or(0)
        })
    }
}

impl Clone for Program {
    fn clone(&self) -> Self {
        fold_scopes(self, |scope, _, bodies: Vec<(usize, Program)>| {
            let mut bodies = bodies.into_iter().map(|(_, body)| body);
            scope
                .iter()
                .map(|op| match op {
                    Operation::Loop(_) => Operation::Loop(bodies.next().unwrap_or_default()),
                    other => other.clone(),
                })
                .collect()
        })
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.len() != right.len() {
                return false;
            }
            for pair in left.iter().zip(right) {
                match pair {
                    (Operation::Loop(left), Operation::Loop(right)) => {
                        pending.push((left, right));
                    }
                    (left, right) if left != right => return false,
                    _ => {}
                }
            }
        }
        true
    }
}

impl Eq for Program {}

impl Drop for Program {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.0);
        while let Some(op) = pending.pop() {
            if let Operation::Loop(mut body) = op {
                pending.append(&mut body.0);
            }
        }
    }
}

impl From<Vec<Operation>> for Program {
    fn from(ops: Vec<Operation>) -> Self {
        Self(ops)
    }
}

impl FromIterator<Operation> for Program {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Program {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_ops().into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
