// Execution constants (ADR: No magic values)
use std::time::Duration;

/// Shell used for sub-shell composition
pub const DEFAULT_SHELL_BINARY: &str = "bash";

/// Login profile sourced before a sub-shell command
pub const DEFAULT_PROFILE_PATH: &str = "/etc/profile";

/// External deadline-enforcing program
pub const DEFAULT_TIMEOUT_BINARY: &str = "timeout";

/// Deadline used when the caller requests 0 (30 minutes)
pub const DEFAULT_DEADLINE_SECS: u64 = 1800;

/// Upper deadline bound unless explicitly disabled (1 hour)
pub const DEADLINE_HARD_CAP_SECS: u64 = 3600;

/// Environment marker disabling interactive package-manager prompts
pub const NONINTERACTIVE_ENV: &str = "DEBIAN_FRONTEND=noninteractive";

/// Exit code reported for a child terminated by a signal (no exit status)
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Time between SIGTERM and SIGKILL for the in-process deadline enforcer
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);
