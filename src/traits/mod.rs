pub mod executor;

pub use executor::{ExecutionOutcome, ExecutionRequest, SnippetExecutor};
