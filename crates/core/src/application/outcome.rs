// Outcome classification
// Maps a raw ProcessOutput onto trimmed stdout or a structured failure

use crate::application::constants::SIGNALED_EXIT_CODE;
use crate::domain::{CommandFailure, ExitKind, ProcessOutput};
use crate::error::Result;

/// Classify a finished process
///
/// - exit 0 → trimmed stdout
/// - any other exit code → `CommandFailure` with captured stderr (124 → deadline sentinel)
/// - signal without exit code → `CommandFailure` with code -1
/// - in-process deadline kill → `CommandFailure` with code 124
pub fn classify(output: ProcessOutput) -> Result<String> {
    let failure = match output.exit {
        ExitKind::Exited(0) => {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        ExitKind::Exited(code) => CommandFailure::new(code, lossy(&output.stderr)),
        ExitKind::Signaled(_) => CommandFailure::new(SIGNALED_EXIT_CODE, lossy(&output.stderr)),
        ExitKind::DeadlineExceeded => CommandFailure::deadline_exceeded(),
    };

    Err(failure.into())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
