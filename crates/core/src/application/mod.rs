// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod outcome;
pub mod plan_builder;
pub mod quote;
pub mod shell;

// Re-exports
pub use plan_builder::PlanBuilder;
pub use quote::{quote, strip_unsafe};
pub use shell::Shell;
