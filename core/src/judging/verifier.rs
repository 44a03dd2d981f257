use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::Context as _;
use tokio::process::Command;

use crate::package::Test;

/// Decides whether a produced output is correct for a test.
#[derive(Debug, Clone)]
pub enum OutputVerifier {
    /// Per-line comparison ignoring leading/trailing whitespace.
    TrimDiff,
    /// External checker invoked as `checker <input> <produced> <expected>`.
    /// Exit status zero means correct; the checker's own output is discarded.
    Checker(PathBuf),
}

impl OutputVerifier {
    /// A spawn failure is a configuration error, not a wrong answer; it
    /// aborts judging for the package.
    pub async fn verify(&self, test: &Test, produced_output: &Path) -> anyhow::Result<bool> {
        match self {
            Self::TrimDiff => {
                let produced = fsutil::read(produced_output)?;
                let expected = fsutil::read(&test.output_path)?;
                Ok(outputs_match(
                    &String::from_utf8_lossy(&produced),
                    &String::from_utf8_lossy(&expected),
                ))
            }

            Self::Checker(exec_path) => {
                // No time limit is applied here; a checker that never
                // terminates hangs the whole run (matches the observed
                // contract of the original tool).
                let status = Command::new(exec_path)
                    .arg(&test.input_path)
                    .arg(produced_output)
                    .arg(&test.output_path)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .with_context(|| {
                        format!("Failed to invoke checker '{}'", exec_path.to_string_lossy())
                    })?;
                Ok(status.success())
            }
        }
    }
}

/// Line-wise comparison, trimming surrounding whitespace of every line and
/// ignoring trailing blank lines. Any other byte difference is a mismatch.
pub fn outputs_match(produced: &str, expected: &str) -> bool {
    let normalize = |s: &str| -> Vec<&str> {
        let mut lines: Vec<&str> = s.lines().map(str::trim).collect();
        while lines.last() == Some(&"") {
            lines.pop();
        }
        lines
    };
    normalize(produced) == normalize(expected)
}
