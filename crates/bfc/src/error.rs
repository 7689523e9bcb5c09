#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Invalid compile options: {0}")]
    InvalidOptions(String),

    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structural error in the source: brackets that do not pair up.
///
/// Offsets are byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Syntax error: `]` at offset {offset} has no matching `[`")]
    UnmatchedClose { offset: usize },

    #[error("Syntax error: `[` at offset {offset} is never closed")]
    Unclosed { offset: usize },
}

impl SyntaxError {
    /// Byte offset of the offending bracket.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnmatchedClose { offset } | Self::Unclosed { offset } => *offset,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
