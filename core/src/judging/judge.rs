use std::path::{Path, PathBuf};

use super::runner::{ProcessRunner, RawOutcome};
use super::verdict::{ProblemVerdict, SubtaskVerdict, TestVerdict, Verdict};
use super::verifier::OutputVerifier;
use crate::package::{Subtask, Test};

/// Judges one executable against the discovered subtasks.
///
/// Stateless per invocation: judging the same executable against the same
/// package twice yields identical verdicts and scores. The scratch output
/// path is overwritten on every run; per-test outputs are not retained.
#[derive(Debug)]
pub struct Judge<'a> {
    runner: &'a ProcessRunner,
    verifier: &'a OutputVerifier,
    scratch_output: PathBuf,
}

impl<'a> Judge<'a> {
    pub fn new(
        runner: &'a ProcessRunner,
        verifier: &'a OutputVerifier,
        scratch_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            verifier,
            scratch_output: scratch_output.into(),
        }
    }

    pub async fn judge(
        &self,
        exec_path: &Path,
        subtasks: &[Subtask],
    ) -> anyhow::Result<ProblemVerdict> {
        let mut problem_verdict = ProblemVerdict::default();
        for subtask in subtasks {
            // Empty subtasks are a package error, flagged during package
            // checks; nothing to run here.
            if subtask.tests.is_empty() {
                continue;
            }
            problem_verdict.push(self.judge_subtask(exec_path, subtask).await?);
        }
        Ok(problem_verdict)
    }

    pub async fn judge_subtask(
        &self,
        exec_path: &Path,
        subtask: &Subtask,
    ) -> anyhow::Result<SubtaskVerdict> {
        let mut subtask_verdict = SubtaskVerdict::new(subtask.id);
        for test in &subtask.tests {
            let test_verdict = self.judge_test(exec_path, test).await?;
            subtask_verdict.test_verdicts.push(test_verdict);
        }

        // Partial credit: the accepted fraction of the subtask's points.
        let num_accepted = subtask_verdict.num_accepted();
        subtask_verdict.score =
            num_accepted as f64 / subtask.tests.len() as f64 * subtask.score as f64;
        Ok(subtask_verdict)
    }

    pub async fn judge_test(&self, exec_path: &Path, test: &Test) -> anyhow::Result<TestVerdict> {
        let outcome = self
            .runner
            .run(exec_path, &test.input_path, &self.scratch_output)
            .await?;

        let (verdict, cpu_time) = match outcome {
            RawOutcome::TimedOut => (Verdict::TLE, None),
            RawOutcome::RuntimeFailure { cpu_time } => (Verdict::RE, Some(cpu_time)),
            RawOutcome::Completed { cpu_time } => {
                let correct = self.verifier.verify(test, &self.scratch_output).await?;
                let verdict = if correct { Verdict::AC } else { Verdict::WA };
                (verdict, Some(cpu_time))
            }
        };

        Ok(TestVerdict {
            verdict,
            test_name: test.name.clone(),
            cpu_time,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::judging::verdict::SCORE_EPS;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perm = std::fs::metadata(&path).unwrap().permissions();
        perm.set_mode(0o755);
        std::fs::set_permissions(&path, perm).unwrap();
        path
    }

    /// Subtask whose tests expect the input number doubled.
    fn doubling_subtask(dir: &Path, id: u32, score: u32, cases: &[(&str, i64, &str)]) -> Subtask {
        let mut tests = Vec::new();
        for (name, n, expected) in cases {
            let input_path = dir.join(format!("{}.inp", name));
            let output_path = dir.join(format!("{}.out", name));
            std::fs::write(&input_path, format!("{}\n", n)).unwrap();
            std::fs::write(&output_path, format!("{}\n", expected)).unwrap();
            tests.push(Test {
                name: name.to_string(),
                input_path,
                output_path,
                subtask_id: id,
            });
        }
        Subtask { id, score, tests }
    }

    const DOUBLER: &str = "read n; echo $((n * 2))";

    #[tokio::test]
    async fn three_of_four_tests_on_twenty_points_score_fifteen() {
        let dir = tempfile::tempdir().unwrap();
        // Fourth expected output is wrong on purpose.
        let subtask = doubling_subtask(
            dir.path(),
            1,
            20,
            &[("t1", 1, "2"), ("t2", 2, "4"), ("t3", 3, "6"), ("t4", 4, "999")],
        );
        let exe = script(dir.path(), "sol.sh", DOUBLER);

        let runner = ProcessRunner::new(Duration::from_secs(5));
        let verifier = OutputVerifier::TrimDiff;
        let judge = Judge::new(&runner, &verifier, dir.path().join("out"));

        let sv = judge.judge_subtask(&exe, &subtask).await.unwrap();
        assert!((sv.score - 15.0).abs() < SCORE_EPS);
        assert_eq!(sv.num_accepted(), 3);
        assert_eq!(sv.test_verdicts[3].verdict, Verdict::WA);
    }

    #[tokio::test]
    async fn all_accepted_yields_full_subtask_score() {
        let dir = tempfile::tempdir().unwrap();
        let subtasks = vec![
            doubling_subtask(dir.path(), 1, 20, &[("a1", 1, "2"), ("a2", 5, "10")]),
            doubling_subtask(dir.path(), 2, 30, &[("b1", 7, "14")]),
        ];
        let exe = script(dir.path(), "sol.sh", DOUBLER);

        let runner = ProcessRunner::new(Duration::from_secs(5));
        let verifier = OutputVerifier::TrimDiff;
        let judge = Judge::new(&runner, &verifier, dir.path().join("out"));

        let pv = judge.judge(&exe, &subtasks).await.unwrap();
        assert!((pv.total_score - 50.0).abs() < SCORE_EPS);
        assert!(pv
            .subtask_verdicts
            .iter()
            .all(|sv| sv.rejected_verdicts().is_empty()));
    }

    #[tokio::test]
    async fn timed_out_test_scores_nothing_and_has_no_cpu_time() {
        let dir = tempfile::tempdir().unwrap();
        let subtask =
            doubling_subtask(dir.path(), 1, 30, &[("t1", 1, "2"), ("t2", 3, "6"), ("t3", 4, "8")]);
        // Hangs on the second test only.
        let exe = script(
            dir.path(),
            "sol.sh",
            r#"read n; if [ "$n" = 3 ]; then sleep 5; fi; echo $((n * 2))"#,
        );

        let runner = ProcessRunner::new(Duration::from_millis(300));
        let verifier = OutputVerifier::TrimDiff;
        let judge = Judge::new(&runner, &verifier, dir.path().join("out"));

        let sv = judge.judge_subtask(&exe, &subtask).await.unwrap();
        assert_eq!(sv.test_verdicts[1].verdict, Verdict::TLE);
        assert_eq!(sv.test_verdicts[1].cpu_time, None);
        assert!(sv.test_verdicts[0].cpu_time.is_some());
        assert!((sv.score - 20.0).abs() < SCORE_EPS);
    }

    #[tokio::test]
    async fn judging_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let subtasks = vec![doubling_subtask(
            dir.path(),
            1,
            40,
            &[("t1", 1, "2"), ("t2", 2, "5")],
        )];
        let exe = script(dir.path(), "sol.sh", DOUBLER);

        let runner = ProcessRunner::new(Duration::from_secs(5));
        let verifier = OutputVerifier::TrimDiff;
        let judge = Judge::new(&runner, &verifier, dir.path().join("out"));

        let first = judge.judge(&exe, &subtasks).await.unwrap();
        let second = judge.judge(&exe, &subtasks).await.unwrap();

        assert_eq!(first.total_score, second.total_score);
        let verdicts = |pv: &ProblemVerdict| -> Vec<Verdict> {
            pv.subtask_verdicts
                .iter()
                .flat_map(|sv| sv.test_verdicts.iter().map(|tv| tv.verdict))
                .collect()
        };
        assert_eq!(verdicts(&first), verdicts(&second));
    }
}
