//! Query engine interface and Qubole implementation.

mod qubole;
mod types;

pub use qubole::QuboleEngine;
pub use types::{EngineError, JobHandle, JobStatus, QueryEngine, QueryResult, ResultDecodeError};
