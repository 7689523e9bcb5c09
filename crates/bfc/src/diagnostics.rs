//! Human-readable rendering of syntax errors.
//!
//! ```text
//! hello.bf:2:5: error: `[` is never closed
//! +++[>+
//!     ^
//! ```
//!
//! With [`Diagnostic::color`] set, the location and message are bold, the
//! level and caret are red for errors and purple for warnings. `colored`
//! still drops the escapes when its own terminal detection says so.

use std::fmt;

use colored::{Color, Colorize};

use crate::SyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

impl Level {
    fn color(self) -> Color {
        match self {
            Level::Warning => Color::Magenta,
            Level::Error => Color::Red,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// A message tied to a byte range of a named source.
#[derive(Debug, Clone)]
pub struct Diagnostic<'src> {
    pub level: Level,
    pub filename: String,
    pub message: String,
    pub span: Option<std::ops::Range<usize>>,
    pub source: Option<&'src str>,
    pub color: bool,
}

impl<'src> Diagnostic<'src> {
    #[must_use]
    pub fn from_syntax_error(error: &SyntaxError, filename: &str, source: &'src str) -> Self {
        let message = match error {
            SyntaxError::UnmatchedClose { .. } => "`]` has no matching `[`",
            SyntaxError::Unclosed { .. } => "`[` is never closed",
        };
        let offset = error.offset();
        Self {
            level: Level::Error,
            filename: filename.to_string(),
            message: message.to_string(),
            span: Some(offset..offset + 1),
            source: Some(source),
            color: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Zero-based line and column (in characters) of a byte offset.
fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count())
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let located = match (&self.span, self.source) {
            (Some(span), Some(source)) if source.is_char_boundary(span.start.min(source.len())) => {
                Some((span, source))
            }
            _ => None,
        };

        let mut header = self.filename.clone();
        let mut excerpt = None;
        if let Some((span, source)) = located {
            let (line, column) = line_and_column(source, span.start);
            header = format!("{header}:{}:{}", line + 1, column + 1);
            let text = source.split('\n').nth(line).unwrap_or_default();
            let caret = format!("{}^{}", " ".repeat(column), "~".repeat(span.len().max(1) - 1));
            excerpt = Some((text, caret));
        }

        if !self.color {
            write!(f, "{header}: {}: {}", self.level, self.message)?;
            if let Some((text, caret)) = excerpt {
                write!(f, "\n{text}\n{caret}")?;
            }
            return Ok(());
        }

        let color = self.level.color();
        write!(
            f,
            "{}: {}: {}",
            header.bold(),
            self.level.to_string().color(color).bold(),
            self.message.bold()
        )?;
        if let Some((text, caret)) = excerpt {
            write!(f, "\n{text}\n{}", caret.color(color).bold())?;
        }
        Ok(())
    }
}
