//! Serde-able wrappers for pattern types used in `problem.toml`.

use std::fmt;

use serde::{de, Deserialize, Deserializer};

/// Glob pattern matched against a file name (e.g. `"*.cpp"`).
#[derive(Debug, Clone)]
pub struct GlobPattern(glob::Pattern);

impl GlobPattern {
    pub fn parse(s: &str) -> Result<Self, glob::PatternError> {
        glob::Pattern::new(s).map(Self)
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.0.matches(filename)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for GlobPattern {}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GlobPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(|e| de::Error::custom(format!("Invalid glob pattern '{}': {}", s, e)))
    }
}

/// Regex matched against the start of a file name, like the subtask
/// selection rules in `problem.toml` (`regex = "^sub1"`).
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    anchored: regex::Regex,
}

impl RegexPattern {
    pub fn parse(s: &str) -> Result<Self, regex::Error> {
        // Match from the beginning of the name, not anywhere inside it.
        let anchored = regex::Regex::new(&format!("^(?:{})", s))?;
        Ok(Self {
            source: s.to_owned(),
            anchored,
        })
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.anchored.is_match(filename)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
impl Eq for RegexPattern {}

impl fmt::Display for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for RegexPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(|e| de::Error::custom(format!("Invalid regex '{}': {}", s, e)))
    }
}
