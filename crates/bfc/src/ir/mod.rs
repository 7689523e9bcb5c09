mod display;
mod operation;
pub(crate) mod walk;

pub use operation::{Operation, Program};
