// Domain Layer - Pure types describing a command execution

pub mod credentials;
pub mod error;
pub mod failure;
pub mod plan;
pub mod settings;

// Re-exports
pub use credentials::Credentials;
pub use error::CredentialError;
pub use failure::{CommandFailure, DEADLINE_EXCEEDED_MESSAGE, DEADLINE_EXIT_CODE};
pub use plan::{DeadlineEnforcement, ExecutionPlan, ExitKind, PlanDefaults, ProcessOutput, Sink};
pub use settings::ShellSettings;
