use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::config::Config;

/// Directory layout of a problem package rooted at `root`.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub const TESTS_DIR_NAME: &str = "tests";
    pub const SUBMISSIONS_DIR_NAME: &str = "submissions";
    pub const VALIDATOR_DIR_NAME: &str = "input_validator";
    pub const CHECKER_DIR_NAME: &str = "output_checker";
    pub const LOG_DIR_NAME: &str = "logs";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_filepath(&self) -> PathBuf {
        self.root.join(Config::FILENAME)
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.root.join(Self::TESTS_DIR_NAME)
    }

    pub fn submissions_dir(&self) -> PathBuf {
        self.root.join(Self::SUBMISSIONS_DIR_NAME)
    }

    pub fn validator_filepath(&self, name: &str) -> PathBuf {
        self.root.join(Self::VALIDATOR_DIR_NAME).join(name)
    }

    pub fn checker_filepath(&self, name: &str) -> PathBuf {
        self.root.join(Self::CHECKER_DIR_NAME).join(name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(Self::LOG_DIR_NAME)
    }
}

/// One discovered input/expected-output pair. Both files exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    pub name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub subtask_id: u32,
}

#[derive(Debug, Clone)]
pub struct Subtask {
    pub id: u32,
    pub score: u32,
    pub tests: Vec<Test>,
}

#[derive(Debug, Clone, Default)]
pub struct TestDiscovery {
    pub subtasks: Vec<Subtask>,
    /// Inputs that matched a subtask rule but have no expected-output file.
    pub inputs_missing_output: Vec<PathBuf>,
}

/// Discover every subtask's tests under `tests_dir`.
///
/// A file belongs to a subtask when its name matches the subtask's regex and
/// its extension equals the configured input suffix. The expected output is
/// the same file name with the output suffix; inputs lacking it are excluded
/// and reported via `inputs_missing_output`.
pub fn discover_subtasks(cfg: &Config, tests_dir: &Path) -> fsutil::Result<TestDiscovery> {
    let mut files = Vec::new();
    walk_sorted(tests_dir, &mut files)?;

    let mut discovery = TestDiscovery::default();
    for sub_cfg in &cfg.subtasks {
        let mut tests = Vec::new();
        for path in &files {
            let Some(filename) = path.file_name().and_then(OsStr::to_str) else {
                continue;
            };
            if !sub_cfg.regex.matches(filename) {
                continue;
            }
            if path.extension().and_then(OsStr::to_str) != Some(cfg.problem.input_suffix.as_str())
            {
                continue;
            }

            let name = path
                .file_stem()
                .unwrap_or(OsStr::new(""))
                .to_string_lossy()
                .into_owned();
            let output_path =
                path.with_file_name(format!("{}.{}", name, cfg.problem.output_suffix));
            if output_path.is_file() {
                tests.push(Test {
                    name,
                    input_path: path.clone(),
                    output_path,
                    subtask_id: sub_cfg.id,
                });
            } else {
                discovery.inputs_missing_output.push(path.clone());
            }
        }
        discovery.subtasks.push(Subtask {
            id: sub_cfg.id,
            score: sub_cfg.score,
            tests,
        });
    }

    discovery.inputs_missing_output.sort();
    discovery.inputs_missing_output.dedup();
    Ok(discovery)
}

/// Depth-first walk with entries sorted by name, so discovery order is
/// stable across runs.
fn walk_sorted(dir: &Path, files: &mut Vec<PathBuf>) -> fsutil::Result<()> {
    let mut entries: Vec<_> = fsutil::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let Ok(ft) = entry.file_type() else {
            continue;
        };
        if ft.is_dir() {
            walk_sorted(&entry.path(), files)?;
        } else {
            files.push(entry.path());
        }
    }
    Ok(())
}
