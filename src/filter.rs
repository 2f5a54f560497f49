//! Manifest line selection.
//!
//! Exactly one [`FilterSpec`] is active per run. [`select`] keeps the lines it
//! matches in manifest order, without deduplication.

use crate::errors::{AppError, AppResult};
use crate::models::{FilterSpec, ManifestLine, SelectedEntry};
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::debug;

impl FilterSpec {
    /// Builds the active filter from the three mutually exclusive options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilterType` when none of the options, or more than one,
    /// is supplied.
    pub fn resolve(
        regex: Option<&str>,
        fixed: Option<&str>,
        string: Option<&str>,
    ) -> AppResult<Self> {
        let mut supplied: Vec<FilterSpec> = [
            regex.map(|p| FilterSpec::Regex(p.to_string())),
            fixed.map(|p| FilterSpec::Fixed(p.to_string())),
            string.map(|p| FilterSpec::Literal(p.to_string())),
        ]
        .into_iter()
        .flatten()
        .collect();

        match supplied.len() {
            1 => Ok(supplied.remove(0)),
            0 => Err(AppError::InvalidFilterType(
                "one of --filter-regex, --filter-fixed or --filter-string is required".into(),
            )),
            n => Err(AppError::InvalidFilterType(format!(
                "only one filter option may be supplied, got {n}"
            ))),
        }
    }
}

/// A filter ready to be applied line by line.
enum Matcher<'a> {
    Regex(Regex),
    Substring(&'a str),
}

impl<'a> Matcher<'a> {
    fn compile(spec: &'a FilterSpec) -> AppResult<Self> {
        match spec {
            FilterSpec::Regex(pattern) => Ok(Self::Regex(Regex::new(pattern)?)),
            FilterSpec::Fixed(pattern) | FilterSpec::Literal(pattern) => {
                Ok(Self::Substring(pattern))
            }
        }
    }

    fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(line),
            Self::Substring(needle) => line.contains(needle),
        }
    }
}

/// Returns the manifest lines matching `spec`, in manifest order.
///
/// An empty result is not an error.
///
/// # Errors
///
/// Returns `InvalidFilterType` if a regex pattern does not compile.
pub fn select(lines: &[ManifestLine], spec: &FilterSpec) -> AppResult<Vec<SelectedEntry>> {
    let matcher = Matcher::compile(spec)?;
    let selected: Vec<SelectedEntry> = lines
        .iter()
        .filter(|line| matcher.is_match(line.as_str()))
        .cloned()
        .collect();

    debug!(
        mode = spec.display_name(),
        pattern = spec.pattern(),
        total = lines.len(),
        selected = selected.len(),
        "Manifest filtered"
    );
    Ok(selected)
}

/// Writes the selected lines to `path`, one per line.
pub async fn write_selection(path: &Path, selected: &[SelectedEntry]) -> AppResult<()> {
    let mut contents = String::with_capacity(selected.iter().map(|l| l.as_str().len() + 1).sum());
    for line in selected {
        contents.push_str(line.as_str());
        contents.push('\n');
    }
    fs::write(path, contents).await?;
    Ok(())
}
