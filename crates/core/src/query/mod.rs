//! Query construction and execution for reporting units.

mod runner;
mod template;

pub use runner::QueryRunner;
pub use template::weekly_query;
