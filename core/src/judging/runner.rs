use std::{path::Path, process::Stdio, time::Duration};

use anyhow::Context as _;
use nix::sys::resource::{getrusage, UsageWho};
use nix::sys::time::TimeVal;
use tokio::process::Command;

/// Raw classification of one run, before output verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutcome {
    /// Exited zero; correctness is not known yet.
    Completed { cpu_time: Duration },
    RuntimeFailure { cpu_time: Duration },
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    time_limit: Duration,
}

impl ProcessRunner {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Run `exec_path` with `input_path` on stdin, enforcing the wall-clock
    /// time limit. Captured stdout is written to `output_path` on both
    /// non-timeout outcomes so failure artifacts stay inspectable; after a
    /// timeout the file's contents are unspecified.
    pub async fn run(
        &self,
        exec_path: &Path,
        input_path: &Path,
        output_path: &Path,
    ) -> anyhow::Result<RawOutcome> {
        let stdin = std::fs::File::open(input_path)
            .with_context(|| format!("Failed to open input file {:?}", input_path))?;

        // The counter is cumulative over all children of this process, so
        // the delta is only attributable while runs stay strictly sequential.
        let cpu_before = children_cpu_time()?;

        let mut proc = Command::new(exec_path)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", exec_path.to_string_lossy()))?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;

        let mut stdout_buf = Vec::new();
        let res = tokio::time::timeout(self.time_limit, async {
            let fut_stdout = tokio::io::copy(&mut stdout, &mut stdout_buf);
            let fut_exit_status = proc.wait();
            tokio::try_join!(fut_stdout, fut_exit_status)
                .context("Failed to communicate with subprocess")
        })
        .await;

        match res {
            Err(_) => {
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill TLE process: {:#}", e));
                Ok(RawOutcome::TimedOut)
            }

            Ok(Err(e)) => Err(e),

            Ok(Ok((_, exit_status))) => {
                let cpu_time = children_cpu_time()?.saturating_sub(cpu_before);
                fsutil::write(output_path, &stdout_buf)?;
                if exit_status.success() {
                    Ok(RawOutcome::Completed { cpu_time })
                } else {
                    Ok(RawOutcome::RuntimeFailure { cpu_time })
                }
            }
        }
    }
}

/// Total CPU time (user + sys) consumed by terminated children so far.
/// Monotonically non-decreasing.
fn children_cpu_time() -> anyhow::Result<Duration> {
    let usage =
        getrusage(UsageWho::RUSAGE_CHILDREN).context("getrusage(RUSAGE_CHILDREN) failed")?;
    Ok(timeval_to_duration(usage.user_time()) + timeval_to_duration(usage.system_time()))
}

fn timeval_to_duration(tv: TimeVal) -> Duration {
    Duration::new(tv.tv_sec().max(0) as u64, (tv.tv_usec().max(0) as u32) * 1000)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("prog.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perm = std::fs::metadata(&path).unwrap().permissions();
        perm.set_mode(0o755);
        std::fs::set_permissions(&path, perm).unwrap();
        path
    }

    #[tokio::test]
    async fn completed_run_writes_captured_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "cat");
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "hello\n").unwrap();
        let output = dir.path().join("out.txt");

        let runner = ProcessRunner::new(Duration::from_secs(5));
        let outcome = runner.run(&exe, &input, &output).await.unwrap();

        assert!(matches!(outcome, RawOutcome::Completed { .. }));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_runtime_failure_with_inspectable_output() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo partial; exit 42");
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "").unwrap();
        let output = dir.path().join("out.txt");

        let runner = ProcessRunner::new(Duration::from_secs(5));
        let outcome = runner.run(&exe, &input, &output).await.unwrap();

        assert!(matches!(outcome, RawOutcome::RuntimeFailure { .. }));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "partial\n");
    }

    #[tokio::test]
    async fn run_over_the_limit_is_timed_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "sleep 5");
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "").unwrap();
        let output = dir.path().join("out.txt");

        let runner = ProcessRunner::new(Duration::from_millis(200));
        let outcome = runner.run(&exe, &input, &output).await.unwrap();

        assert_eq!(outcome, RawOutcome::TimedOut);
    }

    #[tokio::test]
    async fn missing_executable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "").unwrap();

        let runner = ProcessRunner::new(Duration::from_secs(1));
        let res = runner
            .run(
                &dir.path().join("no_such_exe"),
                &input,
                &dir.path().join("out.txt"),
            )
            .await;
        assert!(res.is_err());
    }
}
