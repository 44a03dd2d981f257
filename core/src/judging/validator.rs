use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::Context as _;
use tokio::process::Command;

/// External input validator, run per test as
/// `validator <subtask_id> <input_path>` with the input also on stdin.
#[derive(Debug, Clone)]
pub struct InputValidator {
    exec_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub passed: bool,
    /// The validator's stdout, shown to the problem-setter on failure.
    pub message: String,
}

impl InputValidator {
    pub fn new(exec_path: impl Into<PathBuf>) -> Self {
        Self {
            exec_path: exec_path.into(),
        }
    }

    pub async fn validate(
        &self,
        subtask_id: u32,
        input_path: &Path,
    ) -> anyhow::Result<ValidationOutcome> {
        let stdin = std::fs::File::open(input_path)
            .with_context(|| format!("Failed to open input file {:?}", input_path))?;

        let out = Command::new(&self.exec_path)
            .arg(subtask_id.to_string())
            .arg(input_path)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .with_context(|| {
                format!(
                    "Failed to invoke input validator '{}'",
                    self.exec_path.to_string_lossy()
                )
            })?;

        Ok(ValidationOutcome {
            passed: out.status.success(),
            message: String::from_utf8_lossy(&out.stdout).into_owned(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn validator_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("validator.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perm = std::fs::metadata(&path).unwrap().permissions();
        perm.set_mode(0o755);
        std::fs::set_permissions(&path, perm).unwrap();
        path
    }

    #[tokio::test]
    async fn validator_receives_subtask_id_and_reads_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sub2_01.inp");
        std::fs::write(&input, "42\n").unwrap();

        // Passes only for subtask 2 with the input value on stdin.
        let exe = validator_script(
            dir.path(),
            r#"read n; test "$1" = 2 && test "$n" = 42 && exit 0; echo "bad n=$n"; exit 1"#,
        );
        let v = InputValidator::new(exe);

        let ok = v.validate(2, &input).await.unwrap();
        assert!(ok.passed);

        let ng = v.validate(3, &input).await.unwrap();
        assert!(!ng.passed);
        assert_eq!(ng.message, "bad n=42\n");
    }

    #[tokio::test]
    async fn missing_validator_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("01.inp");
        std::fs::write(&input, "").unwrap();

        let v = InputValidator::new(dir.path().join("no_such_validator"));
        assert!(v.validate(1, &input).await.is_err());
    }
}
