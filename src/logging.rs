use tracing_subscriber::{fmt, EnvFilter};

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Warnings and errors only
    #[default]
    Quiet,
    /// `--verbose`
    Info,
    /// `--debug`
    Debug,
}

impl LogLevel {
    /// Picks the most verbose level requested.
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if verbose {
            Self::Info
        } else {
            Self::Quiet
        }
    }

    /// Filter directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. Calling this twice is
/// harmless; the first subscriber stays installed.
pub fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(level == LogLevel::Debug)
        .try_init();
}
