//! Tape geometry and I/O policy shared by the optimizer and the backends.
//!
//! The optimizer only needs the cell modulus (for folding arithmetic) and the
//! tape size (for reducing pointer movement). Backends additionally need the
//! end-of-input policy.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Default number of cells on the tape.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Default cell modulus (8-bit cells).
pub const DEFAULT_CELL_MODULUS: u32 = 256;

/// Largest supported cell modulus: every reduced delta (`0..cell_modulus`)
/// must fit in the `i32` payload of `AddData`.
pub const MAX_CELL_MODULUS: u32 = 1 << 31;

/// What `Input` does to the active cell once the input stream is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EofPolicy {
    /// Leave the cell as it was.
    #[default]
    Unchanged,
    /// Store 0.
    Zero,
    /// Store `cell_modulus - 1` (255 for 8-bit cells).
    Max,
}

impl FromStr for EofPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unchanged" => Ok(Self::Unchanged),
            "zero" => Ok(Self::Zero),
            "max" => Ok(Self::Max),
            other => Err(Error::InvalidOptions(format!(
                "unknown EOF policy '{other}', expected 'unchanged', 'zero', or 'max'"
            ))),
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Zero => write!(f, "zero"),
            Self::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Number of cells; the data pointer wraps modulo this.
    pub tape_size: usize,
    /// Cell values are reduced modulo this.
    pub cell_modulus: u32,
    pub eof: EofPolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            cell_modulus: DEFAULT_CELL_MODULUS,
            eof: EofPolicy::default(),
        }
    }
}

impl CompileOptions {
    pub fn validate(&self) -> Result<()> {
        if self.tape_size == 0 {
            return Err(Error::InvalidOptions("tape size must be at least 1".into()));
        }
        if i32::try_from(self.tape_size).is_err() {
            return Err(Error::InvalidOptions(format!(
                "tape size {} does not fit in a 32-bit pointer delta",
                self.tape_size
            )));
        }
        if self.cell_modulus < 2 {
            return Err(Error::InvalidOptions(
                "cell modulus must be at least 2".into(),
            ));
        }
        if self.cell_modulus > MAX_CELL_MODULUS {
            return Err(Error::InvalidOptions(format!(
                "cell modulus {} exceeds the maximum of {MAX_CELL_MODULUS}",
                self.cell_modulus
            )));
        }
        Ok(())
    }

    /// Reduce an arbitrary data delta into `0..cell_modulus`.
    #[must_use]
    pub fn wrap_data(&self, delta: i64) -> u32 {
        delta.rem_euclid(i64::from(self.cell_modulus)) as u32
    }

    /// Reduce an arbitrary pointer delta into `(-tape_size, tape_size)`,
    /// keeping its sign so that short moves stay readable.
    #[must_use]
    pub fn wrap_pointer(&self, delta: i64) -> i32 {
        (delta % self.tape_size as i64) as i32
    }

    /// Value `Input` stores at end of input, or `None` to leave the cell.
    #[must_use]
    pub fn eof_value(&self) -> Option<u32> {
        match self.eof {
            EofPolicy::Unchanged => None,
            EofPolicy::Zero => Some(0),
            EofPolicy::Max => Some(self.cell_modulus - 1),
        }
    }
}
