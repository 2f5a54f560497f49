use crate::constants::*;
use crate::date_validator::validate_date;
use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// Dump date requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    /// The archive's moving `latest` directory
    Latest,
    /// A dated dump directory
    Day(NaiveDate),
}

impl DateSpec {
    /// Returns the directory component used both remotely and locally
    /// (`latest` or `YYYYMMDD`).
    pub fn as_path_component(&self) -> String {
        match self {
            Self::Latest => LATEST.to_string(),
            Self::Day(date) => date.format("%Y%m%d").to_string(),
        }
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path_component())
    }
}

/// The single selection rule applied to manifest lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// Extended regular expression matched anywhere in the line
    Regex(String),
    /// Fixed string, never interpreted as a pattern
    Fixed(String),
    /// Plain substring search
    Literal(String),
}

impl FilterSpec {
    /// Returns a human-readable name for the filter mode.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Regex(_) => "regex",
            Self::Fixed(_) => "fixed",
            Self::Literal(_) => "string",
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Self::Regex(p) | Self::Fixed(p) | Self::Literal(p) => p,
        }
    }
}

/// Checksum naming scheme of the manifest file. Checksums are never verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha1,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
        }
    }
}

impl TryFrom<&str> for ChecksumAlgorithm {
    type Error = AppError;

    fn try_from(value: &str) -> AppResult<Self> {
        let lower = value.trim().to_lowercase();

        if MD5_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Md5)
        } else if SHA1_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Sha1)
        } else {
            Err(AppError::InvalidInput(format!(
                "Unknown checksum algorithm '{value}' (expected md5 or sha1)"
            )))
        }
    }
}

/// A validated download request. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub project: String,
    pub date: DateSpec,
    pub filter: FilterSpec,
    pub algorithm: ChecksumAlgorithm,
    pub output_base: PathBuf,
}

impl RunRequest {
    /// Validates the project token and date before anything touches the
    /// network or the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty project or one containing
    /// whitespace or path separators, and `InvalidDateFormat` for a bad date.
    pub fn new(
        project: &str,
        date: &str,
        filter: FilterSpec,
        algorithm: ChecksumAlgorithm,
        output_base: impl Into<PathBuf>,
    ) -> AppResult<Self> {
        let date = validate_date(date)?;
        if project.is_empty()
            || project
                .chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '\\')
            || project == "."
            || project == ".."
        {
            return Err(AppError::InvalidInput(format!(
                "Project must be a single non-empty token, got: '{project}'"
            )));
        }

        Ok(Self {
            project: project.to_string(),
            date,
            filter,
            algorithm,
            output_base: output_base.into(),
        })
    }

    /// Directory receiving the manifest and the downloaded files:
    /// `OUTPUT_BASE/PROJECT/DATE`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_base
            .join(&self.project)
            .join(self.date.as_path_component())
    }
}

/// One line of a checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    raw: String,
}

impl ManifestLine {
    /// Wraps a manifest line, returning `None` when it has no filename field.
    ///
    /// Fields are separated by single spaces and the filename is the third
    /// one, so the `hash  filename` layout (two spaces) yields `filename`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.split(' ').nth(2) {
            Some(name) if !name.is_empty() => Some(Self {
                raw: line.to_string(),
            }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn filename(&self) -> &str {
        self.raw.split(' ').nth(2).unwrap_or_default()
    }
}

/// A manifest line that matched the active filter.
pub type SelectedEntry = ManifestLine;

/// A single file to retrieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination_dir: PathBuf,
}
