use crate::SyntaxError;
use crate::ir::{Operation, Program};

/// Parse source text into a tree-shaped `Program`.
///
/// Emits one primitive operation per instruction character; fusion is left to
/// the optimizer. Characters outside `+-<>.,[]` are comments.
pub fn parse(source: &str) -> std::result::Result<Program, SyntaxError> {
    let mut current = Program::default();
    // Enclosing scopes, each paired with the offset of the `[` that opened
    // the scope nested inside it.
    let mut stack: Vec<(Program, usize)> = Vec::new();

    for (offset, byte) in source.bytes().enumerate() {
        let op = match byte {
            b'+' => Operation::AddData(1),
            b'-' => Operation::AddData(-1),
            b'>' => Operation::MovePointer(1),
            b'<' => Operation::MovePointer(-1),
            b'.' => Operation::Output,
            b',' => Operation::Input,
            b'[' => {
                stack.push((std::mem::take(&mut current), offset));
                continue;
            }
            b']' => {
                let Some((parent, _)) = stack.pop() else {
                    return Err(SyntaxError::UnmatchedClose { offset });
                };
                let body = std::mem::replace(&mut current, parent);
                Operation::Loop(body)
            }
            _ => continue,
        };
        current.push(op);
    }

    if let Some(&(_, offset)) = stack.last() {
        return Err(SyntaxError::Unclosed { offset });
    }

    tracing::debug!(
        ops = current.op_count(),
        depth = current.depth(),
        "parsed program"
    );
    Ok(current)
}
