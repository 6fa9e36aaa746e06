pub mod bridge;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use environment::{Environment, ScopeId};
pub use error::RuntimeError;
pub use evaluator::{parse_and_run, parse_and_run_with_diagnostics, Interpreter};
pub use parser::{ParseError, TreeParser};
