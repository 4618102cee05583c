// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod credential_resolver;
pub mod time_provider; // For duration tracking

// Re-exports
pub use command_runner::CommandRunner;
pub use credential_resolver::CredentialResolver;
pub use time_provider::TimeProvider;
