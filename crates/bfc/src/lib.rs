#![allow(
    clippy::cast_possible_truncation, // validated tape sizes and cell moduli keep reduced deltas within i32
    clippy::cast_possible_wrap, // tape sizes fit in i32 for any tape the backends can allocate
    clippy::cast_sign_loss, // rem_euclid results are non-negative
    clippy::missing_errors_doc
)]

pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod optimize;
pub mod parser;

pub use codegen::{Backend, Execution, Executable, Interpreter};
pub use config::{CompileOptions, EofPolicy};
pub use diagnostics::Diagnostic;
pub use error::{Error, Result, SyntaxError};
pub use ir::{Operation, Program};
pub use optimize::optimize;
pub use parser::parse;

/// Parse `source` and run the full optimization pipeline over it.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Program> {
    options.validate()?;
    let program = parse(source)?;
    Ok(optimize(program, options))
}
