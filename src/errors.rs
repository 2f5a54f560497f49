use thiserror::Error;

/// Process exit code for usage and validation failures.
pub const EXIT_USAGE: i32 = 1;
/// Process exit code after an interrupting signal (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    /// Date token is neither `latest` nor a real `YYYYMMDD` date
    #[error("Invalid date format: '{0}' (expected YYYYMMDD or 'latest')")]
    InvalidDateFormat(String),
    /// No filter, more than one filter, or an unusable filter pattern
    #[error("Invalid filter type: {0}")]
    InvalidFilterType(String),
    /// The manifest could not be retrieved
    #[error("Manifest fetch failed: {message}")]
    ManifestFetch {
        message: String,
        exit_code: Option<i32>,
    },
    /// The batch download failed
    #[error("Download failed: {message}")]
    Download {
        message: String,
        exit_code: Option<i32>,
    },
    /// The external downloader binary is not installed
    #[error("Downloader '{0}' not found. Please install it and ensure it's in your PATH.")]
    DownloaderNotFound(String),
    /// The run was cancelled by a signal
    #[error("Interrupted by signal")]
    Interrupted,
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Configuration file could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Exit status the binary reports for this error.
    ///
    /// Failures of the downloader propagate the tool's own status when it
    /// reported one.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ManifestFetch { exit_code, .. } | AppError::Download { exit_code, .. } => {
                match exit_code {
                    Some(code) if *code != 0 => *code,
                    _ => EXIT_USAGE,
                }
            }
            AppError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_USAGE,
        }
    }

    /// Short name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::InvalidDateFormat(_)
            | AppError::InvalidFilterType(_)
            | AppError::InvalidInput(_) => "validation",
            AppError::Config(_) => "configuration",
            AppError::ManifestFetch { .. } => "manifest fetch",
            AppError::Download { .. } | AppError::DownloaderNotFound(_) => "download",
            AppError::Interrupted => "interrupted",
            AppError::Io(_) => "filesystem",
            AppError::Network(_) | AppError::Url(_) => "network",
        }
    }

    /// One-line diagnostic for stderr.
    pub fn diagnostic(&self) -> String {
        match self {
            AppError::Interrupted => format!("{}: {self}", env!("CARGO_PKG_NAME")),
            _ => format!("{}: {} failed: {self}", env!("CARGO_PKG_NAME"), self.stage()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::InvalidFilterType(format!("regex does not compile: {err}"))
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_display() {
        let err = AppError::InvalidDateFormat("20201332".to_string());
        assert!(err.to_string().contains("20201332"));
        assert!(err.to_string().contains("YYYYMMDD"));
    }

    #[test]
    fn test_validation_errors_exit_with_one() {
        assert_eq!(AppError::InvalidDateFormat("x".into()).exit_code(), 1);
        assert_eq!(AppError::InvalidFilterType("none".into()).exit_code(), 1);
        assert_eq!(AppError::InvalidInput("bad".into()).exit_code(), 1);
    }

    #[test]
    fn test_downloader_status_is_propagated() {
        let err = AppError::Download {
            message: "aria2c exited".into(),
            exit_code: Some(7),
        };
        assert_eq!(err.exit_code(), 7);

        let err = AppError::ManifestFetch {
            message: "missing file".into(),
            exit_code: None,
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_interrupted_exit_code() {
        assert_eq!(AppError::Interrupted.exit_code(), EXIT_INTERRUPTED);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(
            AppError::ManifestFetch {
                message: String::new(),
                exit_code: None
            }
            .stage(),
            "manifest fetch"
        );
        assert_eq!(AppError::InvalidDateFormat(String::new()).stage(), "validation");
    }

    #[test]
    fn test_diagnostic_lines() {
        assert_eq!(
            AppError::Interrupted.diagnostic(),
            "dump-fetch: Interrupted by signal"
        );
        assert_eq!(
            AppError::InvalidFilterType("no filter given".into()).diagnostic(),
            "dump-fetch: validation failed: Invalid filter type: no filter given"
        );
    }

    #[test]
    fn test_regex_error_converts_to_invalid_filter() {
        let err: AppError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, AppError::InvalidFilterType(_)));
    }

    #[test]
    fn test_app_error_implements_error_trait() {
        use std::error::Error;
        let err: Box<dyn Error> = Box::new(AppError::Network("test".to_string()));
        assert!(!err.to_string().is_empty());
    }
}
