use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::judging::verdict::ProblemVerdict;

/// Render the durable judge log: per-subtask summary plus the full
/// per-test trace, for every judged submission.
pub fn render_judge_log(entries: &[(String, ProblemVerdict)]) -> String {
    let mut out = String::new();
    for (submission, problem_verdict) in entries {
        out += &format!("Judge verdict for {}\n", submission);
        for sv in &problem_verdict.subtask_verdicts {
            out += &format!("- Subtask {}: {}\n", sv.subtask_id, sv);
            for tv in &sv.test_verdicts {
                out += &format!("    {} {}\n", tv, tv.test_name);
            }
        }
        out += &format!("Total score = {:.2}\n\n", problem_verdict.total_score);
    }
    out
}

pub fn judge_log_filename(now: DateTime<Local>) -> String {
    format!("{}.log", now.format("%Y%m%d_%H%M%S"))
}

pub fn write_judge_log(
    log_dir: &Path,
    entries: &[(String, ProblemVerdict)],
    now: DateTime<Local>,
) -> fsutil::Result<PathBuf> {
    let path = log_dir.join(judge_log_filename(now));
    fsutil::write_with_mkdir(&path, render_judge_log(entries))?;
    Ok(path)
}

pub fn write_json_report(path: &Path, verdict: &ProblemVerdict) -> fsutil::Result<()> {
    fsutil::write_json_with_mkdir(path, verdict)
}
