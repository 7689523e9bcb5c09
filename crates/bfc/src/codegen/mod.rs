//! Boundary between the optimizer and code generation.
//!
//! A [`Backend`] takes ownership of an optimized [`Program`] and lowers it to
//! some artifact. The optimizer guarantees the program is fused and simplified
//! (no zero deltas, no `[-]`-shaped loops, adds folded into known values), so
//! a backend can translate structurally: one control-flow construct per
//! `Loop`, one arithmetic or memory operation per `AddData`, `MovePointer`
//! and `SetData`, one I/O call per `Input`/`Output`. Tape allocation, pointer
//! wraparound and the I/O calling convention are the backend's business.

mod interpreter;
#[cfg(feature = "llvm")]
mod llvm;

pub use interpreter::{Executable, Execution, Interpreter};
#[cfg(feature = "llvm")]
pub use llvm::LlvmBackend;

use crate::Result;
use crate::ir::Program;

pub trait Backend {
    type Artifact;

    /// Lower an optimized program. The program is consumed.
    fn lower(&self, program: Program) -> Result<Self::Artifact>;
}
