//! Template evaluation

mod environment;
mod error;
mod interpreter;

pub use environment::{Environment, Scope};
pub use error::EvalError;
pub use interpreter::{Block, Branch, Interpreter};
