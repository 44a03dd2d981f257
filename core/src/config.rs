use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::serdable::{GlobPattern, RegexPattern};

pub const DEFAULT_INPUT_SUFFIX: &str = "inp";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "out";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub problem: ProblemConfig,
    pub limits: LimitsConfig,
    pub compile: CompileConfig,
    pub subtasks: Vec<SubtaskConfig>,
    #[serde(default)]
    pub solutions: Vec<SolutionConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProblemConfig {
    pub score: u32,
    #[serde(default = "default_input_suffix")]
    pub input_suffix: String,
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    pub checker: Option<String>,
    pub input_validator: Option<String>,
}

fn default_input_suffix() -> String {
    DEFAULT_INPUT_SUFFIX.to_owned()
}

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    pub time_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileConfig {
    pub shell: PathBuf,
    pub command: Vec<CompileCommandConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileCommandConfig {
    pub pattern: GlobPattern,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubtaskConfig {
    pub id: u32,
    pub regex: RegexPattern,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolutionConfig {
    pub name: String,
    pub min_score: f64,
    pub max_score: f64,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "problem.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let filepath = filepath.into();
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Not in a problem package dir: Cannot find '{}'",
                    Self::FILENAME
                )
            })
    }

    /// Sum of the declared subtask scores; must equal `problem.score`.
    pub fn subtask_score_sum(&self) -> u32 {
        self.subtasks.iter().map(|s| s.score).sum()
    }
}

impl CompileConfig {
    pub fn find_command_for_filename(&self, filename: impl AsRef<str>) -> Option<&str> {
        self.command
            .iter()
            .find(|entry| entry.pattern.matches(filename.as_ref()))
            .map(|entry| entry.command.as_str())
    }
}
