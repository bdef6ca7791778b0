//! Run the external CF conformance checker.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::error::{NetCdfError, NetCdfResult};

/// Checker invoked when none is configured.
pub const DEFAULT_CHECKER: &str = "cfchecks";

/// Exit status and captured output of one checker run.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Process exit code; 1 when the checker was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CheckOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `checker <path>` and capture its output.
///
/// A checker that runs but reports problems is not an error here; the
/// caller decides what to do with a non-zero [`CheckOutcome::code`].
pub fn run_checker(checker: &str, path: impl AsRef<Path>) -> NetCdfResult<CheckOutcome> {
    let path = path.as_ref();
    let output = Command::new(checker)
        .arg(path)
        .output()
        .map_err(|e| NetCdfError::CommandError(format!("Failed to run {}: {}", checker, e)))?;

    let code = output.status.code().unwrap_or_else(|| {
        warn!(checker, "Checker terminated by a signal");
        1
    });
    let outcome = CheckOutcome {
        code,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if outcome.success() {
        info!(checker, path = %path.display(), "Checker passed");
    } else {
        warn!(checker, path = %path.display(), code, "Checker reported problems");
    }
    Ok(outcome)
}
