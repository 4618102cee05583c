// Privexec Core - Domain Logic & Ports
// NO infrastructure dependencies (ADR-001: Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{quote, strip_unsafe, Shell};
pub use domain::{CommandFailure, PlanDefaults, ShellSettings};
pub use error::{Result, ShellError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
