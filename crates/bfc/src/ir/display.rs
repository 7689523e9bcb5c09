use std::fmt;

use super::{Operation, Program};

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::MovePointer(delta) => write!(f, "move {delta}"),
            Operation::AddData(delta) => write!(f, "add {delta}"),
            Operation::SetData(value) => write!(f, "set {value}"),
            Operation::Output => write!(f, "output"),
            Operation::Input => write!(f, "input"),
            Operation::Loop(body) => write!(f, "loop ({} ops)", body.len()),
        }
    }
}

/// One operation per line, loop bodies indented by two spaces and closed with `end`.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // One iterator per open scope, innermost last.
        let mut scopes = vec![self.iter()];
        loop {
            let indent = scopes.len().saturating_sub(1);
            let Some(scope) = scopes.last_mut() else {
                break;
            };
            let Some(op) = scope.next() else {
                scopes.pop();
                if let Some(outer) = scopes.len().checked_sub(1) {
                    writeln!(f, "{}end", "  ".repeat(outer))?;
                }
                continue;
            };
            let pad = "  ".repeat(indent);
            match op {
                Operation::Loop(body) => {
                    writeln!(f, "{pad}loop")?;
                    scopes.push(body.iter());
                }
                other => writeln!(f, "{pad}{other}")?,
            }
        }
        Ok(())
    }
}
