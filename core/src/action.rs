pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use error::*;
use indicatif::ProgressBar;
use tempfile::TempDir;

use crate::compile::Compiler;
use crate::config::Config;
use crate::judging::{
    InputValidator, Judge, OutputVerifier, ProblemVerdict, ProcessRunner, SCORE_EPS,
};
use crate::package::{self, PackageLayout, Subtask};
use crate::report;
use crate::style;

pub struct LoadedPackage {
    pub layout: PackageLayout,
    pub config: Config,
    pub subtasks: Vec<Subtask>,
    pub inputs_missing_output: Vec<PathBuf>,
}

/// Tally of failed package checks. Status lines are printed as checks run;
/// the final count decides the process exit status.
#[derive(Debug, Default)]
pub struct Findings {
    num_failed: usize,
}

impl Findings {
    pub fn fail(&mut self, message: &str) {
        style::verification_failed(message);
        self.num_failed += 1;
    }

    pub fn pass(&self, message: &str) {
        style::verification_success(message);
    }

    pub fn num_failed(&self) -> usize {
        self.num_failed
    }

    pub fn is_clean(&self) -> bool {
        self.num_failed == 0
    }
}

/// Per-run scratch dir holding compiled executables and the single reused
/// output file. Removed on drop.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn create() -> Result<Self> {
        let dir = tempfile::tempdir().context("Failed to create scratch dir")?;
        Ok(Self { dir })
    }

    pub fn output_file(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn exec_path(&self, source_name: &str) -> PathBuf {
        let stem = Path::new(source_name)
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        self.dir.path().join(stem)
    }
}

pub fn load_package(dir: impl AsRef<Path>) -> Result<LoadedPackage> {
    let dir = dir.as_ref();
    ensure!(dir.is_dir(), "Problem dir does not exist: {:?}", dir);

    let layout = PackageLayout::new(dir);
    let config = Config::from_toml_file(layout.config_filepath())?;
    style::verification_success(&format!("Problem dir found at {}", dir.to_string_lossy()));

    let tests_dir = layout.tests_dir();
    ensure!(
        tests_dir.is_dir(),
        "Test directory not found. Please rename test dir to '{}'",
        PackageLayout::TESTS_DIR_NAME
    );

    let discovery = package::discover_subtasks(&config, &tests_dir)?;
    let scores: Vec<u32> = discovery.subtasks.iter().map(|s| s.score).collect();
    style::verification_success(&format!(
        "{} subtasks, scores = {:?}",
        discovery.subtasks.len(),
        scores
    ));

    ensure!(
        layout.submissions_dir().is_dir(),
        "Submission dir not found. Please name it '{}'",
        PackageLayout::SUBMISSIONS_DIR_NAME
    );
    style::verification_success("Submission dir found.");

    Ok(LoadedPackage {
        layout,
        config,
        subtasks: discovery.subtasks,
        inputs_missing_output: discovery.inputs_missing_output,
    })
}

/// Run every package check: test pairing, score sums, input validation,
/// and the score-range audit of all configured solutions.
pub async fn verify_package(dir: impl AsRef<Path>) -> Result<Findings> {
    let pkg = load_package(dir)?;
    let mut findings = Findings::default();

    for input in &pkg.inputs_missing_output {
        findings.fail(&format!(
            "Output not found for input {}",
            input.to_string_lossy()
        ));
    }

    let scratch = Scratch::create()?;
    let compiler = Compiler::new(&pkg.config.compile);

    verify_subtasks(&pkg, &compiler, &scratch, &mut findings).await?;
    verify_submissions(&pkg, &compiler, &scratch, &mut findings).await?;
    Ok(findings)
}

/// Score-sum and test-presence checks, then the input validator over every
/// non-sample test.
pub async fn verify_subtasks(
    pkg: &LoadedPackage,
    compiler: &Compiler<'_>,
    scratch: &Scratch,
    findings: &mut Findings,
) -> Result<()> {
    let declared = pkg.config.problem.score;
    let sum = pkg.config.subtask_score_sum();
    if sum != declared {
        findings.fail(&format!(
            "Total score of all subtasks = {}, NOT matching problem config's total score = {}",
            sum, declared
        ));
    }

    for subtask in &pkg.subtasks {
        if subtask.tests.is_empty() {
            findings.fail(&format!("Subtask {} has 0 tests", subtask.id));
        } else {
            findings.pass(&format!(
                "Subtask {} has {} tests",
                subtask.id,
                subtask.tests.len()
            ));
        }
    }

    let Some(validator_name) = &pkg.config.problem.input_validator else {
        findings.pass("No input validator configured. Skipping input validation.");
        return Ok(());
    };
    let source = pkg.layout.validator_filepath(validator_name);
    ensure!(source.is_file(), "Input validator not found: {:?}", source);

    let exec_path = scratch.exec_path("input_validator");
    compiler
        .compile(&source, &exec_path)
        .await
        .context("Failed to compile input validator")?;
    findings.pass(&format!(
        "Found and compiled input validator {}",
        validator_name
    ));
    let validator = InputValidator::new(&exec_path);

    for subtask in &pkg.subtasks {
        if subtask.id == 0 {
            // Sample data is not constrained by the validator.
            continue;
        }

        let mut subtask_passed = true;
        for test in &subtask.tests {
            // Normalize line endings in place so the validator's text
            // parsing behaves the same on every platform.
            fsutil::convert_crlf_to_lf(&test.input_path)?;

            let outcome = validator.validate(subtask.id, &test.input_path).await?;
            if !outcome.passed {
                subtask_passed = false;
                findings.fail(&format!(
                    "Test {} failed input validator",
                    test.input_path.to_string_lossy()
                ));
                if !outcome.message.is_empty() {
                    print!("{}", outcome.message);
                }
            }
        }
        if subtask_passed {
            findings.pass(&format!("Subtask {} passed input validator.", subtask.id));
        }
    }
    Ok(())
}

/// Judge every configured solution and check its total score against the
/// declared `[min_score, max_score]` range.
pub async fn verify_submissions(
    pkg: &LoadedPackage,
    compiler: &Compiler<'_>,
    scratch: &Scratch,
    findings: &mut Findings,
) -> Result<()> {
    let config = &pkg.config;

    let present: BTreeSet<String> = fsutil::regular_files_sorted(&pkg.layout.submissions_dir())?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    let declared: BTreeSet<String> = config.solutions.iter().map(|s| s.name.clone()).collect();
    let extra: Vec<&String> = present.difference(&declared).collect();
    if !extra.is_empty() {
        findings.fail(&format!(
            "Found extra submissions (NOT in {}): {:?}",
            Config::FILENAME,
            extra
        ));
    }

    if config.solutions.is_empty() {
        findings.fail("No solutions configured");
        return Ok(());
    }

    let verifier = make_output_verifier(pkg, compiler, scratch).await?;
    let runner = ProcessRunner::new(Duration::from_secs(config.limits.time_secs));
    let judge = Judge::new(&runner, &verifier, scratch.output_file());

    let mut log_entries = Vec::new();
    let mut num_intended_ac = 0usize;

    for solution in &config.solutions {
        println!("Running {}", solution.name);
        let source = pkg.layout.submissions_dir().join(&solution.name);
        if !source.is_file() {
            findings.fail(&format!(
                "Submission not found: {}",
                source.to_string_lossy()
            ));
            continue;
        }

        let exec_path = scratch.exec_path(&solution.name);
        if let Err(e) = compiler.compile(&source, &exec_path).await {
            findings.fail(&format!("Compile error for {}: {:#}", solution.name, e));
            continue;
        }

        if solution.min_score > config.problem.score as f64 - SCORE_EPS {
            num_intended_ac += 1;
        }

        let verdict = judge_with_progress(&judge, &exec_path, &pkg.subtasks).await?;
        let score = verdict.total_score;

        if score < solution.min_score - SCORE_EPS {
            findings.fail(&format!(
                "{} received {:.1}, min_score = {:.1}",
                solution.name, score, solution.min_score
            ));
        } else if score > solution.max_score + SCORE_EPS {
            findings.fail(&format!(
                "{} received {:.1}, max_score = {:.1}",
                solution.name, score, solution.max_score
            ));
        } else {
            findings.pass(&format!(
                "{} received {:.1}, in range [{:.1}, {:.1}]",
                solution.name, score, solution.min_score, solution.max_score
            ));
        }

        log_entries.push((solution.name.clone(), verdict));
    }

    if num_intended_ac <= 1 {
        findings.fail("Only 0 or 1 AC solution");
    }

    let log_path = report::write_judge_log(&pkg.layout.log_dir(), &log_entries, Local::now())?;
    findings.pass(&format!(
        "Printed judge log to {}",
        log_path.to_string_lossy()
    ));
    Ok(())
}

/// Compile and judge a single solution source; prints per-subtask summaries
/// and the total, without the range audit.
pub async fn do_judge(
    package_dir: impl AsRef<Path>,
    source_file: impl AsRef<Path>,
    json_report: Option<&Path>,
) -> Result<ProblemVerdict> {
    let pkg = load_package(package_dir)?;
    let source_file = source_file.as_ref();

    let scratch = Scratch::create()?;
    let compiler = Compiler::new(&pkg.config.compile);
    let verifier = make_output_verifier(&pkg, &compiler, &scratch).await?;
    let runner = ProcessRunner::new(Duration::from_secs(pkg.config.limits.time_secs));
    let judge = Judge::new(&runner, &verifier, scratch.output_file());

    let filename = source_file
        .file_name()
        .with_context(|| format!("Not a file path: {:?}", source_file))?
        .to_string_lossy()
        .into_owned();
    let exec_path = scratch.exec_path(&filename);
    compiler.compile(source_file, &exec_path).await?;

    println!("Running {}", filename);
    let verdict = judge_with_progress(&judge, &exec_path, &pkg.subtasks).await?;
    style::print_problem_total(&filename, &verdict);

    if let Some(path) = json_report {
        report::write_json_report(path, &verdict)?;
        style::verification_success(&format!("Wrote JSON report to {}", path.to_string_lossy()));
    }
    Ok(verdict)
}

async fn make_output_verifier(
    pkg: &LoadedPackage,
    compiler: &Compiler<'_>,
    scratch: &Scratch,
) -> Result<OutputVerifier> {
    match &pkg.config.problem.checker {
        Some(checker_name) => {
            let source = pkg.layout.checker_filepath(checker_name);
            ensure!(source.is_file(), "Output checker not found: {:?}", source);

            let exec_path = scratch.exec_path("checker");
            compiler
                .compile(&source, &exec_path)
                .await
                .context("Failed to compile checker")?;
            style::verification_success(&format!("Found and compiled checker {}", checker_name));
            Ok(OutputVerifier::Checker(exec_path))
        }
        None => {
            style::verification_success("No checker required. Using whitespace-insensitive diff");
            Ok(OutputVerifier::TrimDiff)
        }
    }
}

async fn judge_with_progress(
    judge: &Judge<'_>,
    exec_path: &Path,
    subtasks: &[Subtask],
) -> Result<ProblemVerdict> {
    let mut problem_verdict = ProblemVerdict::default();
    for subtask in subtasks {
        if subtask.tests.is_empty() {
            continue;
        }

        let bar = ProgressBar::new_spinner().with_message(format!(
            "Running Subtask {} ({} tests)",
            subtask.id,
            subtask.tests.len()
        ));
        bar.enable_steady_tick(Duration::from_millis(50));
        let subtask_verdict = judge.judge_subtask(exec_path, subtask).await?;
        bar.finish_and_clear();

        style::print_subtask_summary(&subtask_verdict);
        for tv in &subtask_verdict.test_verdicts {
            if tv.verdict != crate::judging::Verdict::AC {
                style::print_test_verdict_line(tv);
            }
        }
        problem_verdict.push(subtask_verdict);
    }
    Ok(problem_verdict)
}
