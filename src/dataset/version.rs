//! Version directory discovery and selection.

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use std::cmp::Ordering;

/// A top-level version directory of a dataset (`v1`, `v2`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetVersion {
    pub name: String,
}

impl DatasetVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The last run of ASCII digits in the name, without leading zeros
    fn digit_run(&self) -> Option<&str> {
        let end = self.name.rfind(|c: char| c.is_ascii_digit())? + 1;
        let start = self.name[..end]
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |pos| pos + 1);
        let digits = self.name[start..end].trim_start_matches('0');
        Some(if digits.is_empty() { "0" } else { digits })
    }

    /// Sort key of the digit run: longer runs are larger numbers, equal
    /// lengths compare digit by digit. Runs of any length are supported.
    fn ordinal(&self) -> Option<(usize, &str)> {
        self.digit_run().map(|digits| (digits.len(), digits))
    }
}

impl Ord for DatasetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal()
            .cmp(&other.ordinal())
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for DatasetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Which versions to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    /// The newest `n` versions
    Latest(usize),
    /// Exactly the named version
    Exact(String),
}

/// Recognises version directories by a full-match regex
#[derive(Debug, Clone)]
pub struct VersionSelector {
    pattern: Regex,
}

impl VersionSelector {
    pub fn new(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let pattern = Regex::new(&anchored)
            .with_context(|| format!("Invalid version regex '{}'", pattern))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Keep the directories that look like versions, oldest first
    pub fn select<I, S>(&self, directories: I) -> Vec<DatasetVersion>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut versions: Vec<DatasetVersion> = directories
            .into_iter()
            .filter(|dir| self.matches(dir.as_ref()))
            .map(|dir| DatasetVersion::new(dir.as_ref()))
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

/// Resolve a request against the available versions (sorted oldest first)
/// Returns the chosen versions, oldest first
pub fn pick_versions(
    available: &[DatasetVersion],
    request: &VersionRequest,
) -> Result<Vec<DatasetVersion>> {
    match request {
        VersionRequest::Latest(0) => bail!("Number of versions to publish must be at least 1"),
        VersionRequest::Latest(count) => {
            if available.is_empty() {
                bail!("No dataset versions available");
            }
            let skip = available.len().saturating_sub(*count);
            Ok(available[skip..].to_vec())
        }
        VersionRequest::Exact(name) => available
            .iter()
            .find(|version| &version.name == name)
            .cloned()
            .map(|version| vec![version])
            .ok_or_else(|| {
                anyhow!(
                    "Version '{}' not found. Available versions: {}",
                    name,
                    describe(available)
                )
            }),
    }
}

fn describe(versions: &[DatasetVersion]) -> String {
    if versions.is_empty() {
        "(none)".to_string()
    } else {
        versions
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
