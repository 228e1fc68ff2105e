//! Ready-made filters.

mod newline;
mod uppercase;

pub use newline::{Newline, NewlineStyle};
pub use uppercase::Uppercase;
