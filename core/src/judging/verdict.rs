use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Tolerance for score comparisons, absorbing float rounding.
pub const SCORE_EPS: f64 = 1e-6;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Verdict {
    AC,
    WA,
    TLE,
    RE,
}

/// Verdict for a single test, with the CPU time the run consumed.
/// `cpu_time` is `None` when the process was killed by the time limit;
/// elapsed time of a killed process is not comparable to a real measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVerdict {
    pub verdict: Verdict,
    pub test_name: String,
    pub cpu_time: Option<Duration>,
}

impl fmt::Display for TestVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cpu_time {
            Some(t) => write!(f, "{} {:.2}s", self.verdict, t.as_secs_f64()),
            None => write!(f, "{} -----", self.verdict),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskVerdict {
    pub subtask_id: u32,
    pub score: f64,
    pub test_verdicts: Vec<TestVerdict>,
}

impl SubtaskVerdict {
    pub fn new(subtask_id: u32) -> Self {
        Self {
            subtask_id,
            score: 0.0,
            test_verdicts: Vec::new(),
        }
    }

    pub fn num_accepted(&self) -> usize {
        self.test_verdicts
            .iter()
            .filter(|t| t.verdict == Verdict::AC)
            .count()
    }

    /// The distinct non-AC verdicts, e.g. `{WA, TLE}`.
    pub fn rejected_verdicts(&self) -> BTreeSet<Verdict> {
        self.test_verdicts
            .iter()
            .map(|t| t.verdict)
            .filter(|&v| v != Verdict::AC)
            .collect()
    }

    /// Measured CPU times in ascending order; timed-out tests are absent.
    pub fn sorted_cpu_times(&self) -> Vec<Duration> {
        let mut times: Vec<_> = self
            .test_verdicts
            .iter()
            .filter_map(|t| t.cpu_time)
            .collect();
        times.sort();
        times
    }
}

impl fmt::Display for SubtaskVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rejected = self.rejected_verdicts();
        if rejected.is_empty() {
            write!(f, "AC")?;
        } else {
            let names: Vec<_> = rejected.iter().map(Verdict::to_string).collect();
            write!(f, "{{{}}}", names.join(", "))?;
        }
        write!(f, ", score = {:.2}", self.score)
    }
}

/// Verdict of one submission for the whole problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemVerdict {
    pub total_score: f64,
    pub subtask_verdicts: Vec<SubtaskVerdict>,
}

impl ProblemVerdict {
    pub fn push(&mut self, verdict: SubtaskVerdict) {
        self.total_score += verdict.score;
        self.subtask_verdicts.push(verdict);
    }

    pub fn is_in_range(&self, min_score: f64, max_score: f64) -> bool {
        self.total_score >= min_score - SCORE_EPS && self.total_score <= max_score + SCORE_EPS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tv(verdict: Verdict, cpu_ms: Option<u64>) -> TestVerdict {
        TestVerdict {
            verdict,
            test_name: "t".to_owned(),
            cpu_time: cpu_ms.map(Duration::from_millis),
        }
    }

    #[test]
    fn test_verdict_display_uses_dashes_for_timeout() {
        assert_eq!(tv(Verdict::AC, Some(520)).to_string(), "AC 0.52s");
        assert_eq!(tv(Verdict::TLE, None).to_string(), "TLE -----");
    }

    #[test]
    fn subtask_display_shows_rejected_verdict_set() {
        let mut sv = SubtaskVerdict::new(1);
        sv.test_verdicts = vec![
            tv(Verdict::AC, Some(10)),
            tv(Verdict::WA, Some(20)),
            tv(Verdict::TLE, None),
            tv(Verdict::WA, Some(15)),
        ];
        sv.score = 5.0;
        assert_eq!(sv.to_string(), "{WA, TLE}, score = 5.00");
        assert_eq!(sv.num_accepted(), 1);

        let all_ac = SubtaskVerdict {
            subtask_id: 2,
            score: 20.0,
            test_verdicts: vec![tv(Verdict::AC, Some(10))],
        };
        assert_eq!(all_ac.to_string(), "AC, score = 20.00");
    }

    #[test]
    fn sorted_cpu_times_skip_timeouts() {
        let mut sv = SubtaskVerdict::new(1);
        sv.test_verdicts = vec![
            tv(Verdict::AC, Some(30)),
            tv(Verdict::TLE, None),
            tv(Verdict::AC, Some(10)),
        ];
        assert_eq!(
            sv.sorted_cpu_times(),
            vec![Duration::from_millis(10), Duration::from_millis(30)]
        );
    }

    #[test]
    fn problem_verdict_accumulates_subtask_scores() {
        let mut pv = ProblemVerdict::default();
        for (id, score) in [(0, 0.0), (1, 15.0), (2, 60.0)] {
            let mut sv = SubtaskVerdict::new(id);
            sv.score = score;
            pv.push(sv);
        }
        assert!((pv.total_score - 75.0).abs() < SCORE_EPS);
        assert_eq!(pv.subtask_verdicts.len(), 3);
    }

    #[test]
    fn range_check_tolerates_eps() {
        let pv = ProblemVerdict {
            total_score: 100.0 - 1e-9,
            subtask_verdicts: vec![],
        };
        assert!(pv.is_in_range(100.0, 100.0));
        assert!(!pv.is_in_range(100.1, 100.2));

        let partial = ProblemVerdict {
            total_score: 40.0,
            subtask_verdicts: vec![],
        };
        assert!(partial.is_in_range(40.0, 40.0));
        assert!(!partial.is_in_range(50.0, 100.0));
    }
}
