use crate::config::{DownloaderKind, ResolvedConfig};
use crate::downloader;
use crate::errors::AppResult;
use crate::logging::{init_logging, LogLevel};
use crate::models::{ChecksumAlgorithm, FilterSpec, RunRequest};
use crate::orchestrator::{self, RunSummary};
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::debug;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Everything a run needs, resolved from the command line and config file.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request: RunRequest,
    pub config: ResolvedConfig,
    pub log_level: LogLevel,
}

/// Builds the command-line definition.
pub fn command() -> Command<'static> {
    Command::new("dump-fetch")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .after_help(
            "Exactly one of --filter-regex, --filter-fixed or --filter-string is required.\n\
             Example:\n  dump-fetch enwiki 20200101 --filter-string pages-meta-history",
        )
        .arg(
            Arg::new("project")
                .help("Project name, e.g. 'enwiki'")
                .required(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("date")
                .help("Dump date (YYYYMMDD) or 'latest'")
                .required(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output_base")
                .short('o')
                .long("output-base")
                .help("Base output directory; files go to OUTPUT_BASE/PROJECT/DATE [default: dumps]")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("filter_regex")
                .short('r')
                .long("filter-regex")
                .help("Select manifest lines matching an extended regular expression")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("filter_fixed")
                .short('f')
                .long("filter-fixed")
                .help("Select manifest lines containing a fixed string")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("filter_string")
                .short('s')
                .long("filter-string")
                .help("Select manifest lines containing a substring")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .help("Checksum manifest to read the file list from")
                .value_parser(PossibleValuesParser::new(["md5", "sha1", "alg1", "alg2"]))
                .default_value("md5")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("concurrency")
                .short('j')
                .long("concurrency")
                .help("Maximum number of files downloaded at once [default: 1]")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Dump archive host [default: https://dumps.wikimedia.org]")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("downloader")
                .long("downloader")
                .help("Transfer backend [default: aria2c]")
                .value_parser(PossibleValuesParser::new(["aria2c", "native"]))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log progress information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Log debugging information")
                .action(ArgAction::SetTrue),
        )
}

/// Turns parsed arguments into a validated [`Invocation`].
///
/// Filter, date and project are validated here, before anything touches the
/// network. Flags override values from the config file.
///
/// # Errors
///
/// Returns `InvalidFilterType` when no filter or several filters are given,
/// `InvalidDateFormat` for a bad date, `InvalidInput` for a bad project and
/// `Config` when the config file or the resulting values are invalid.
pub fn parse_invocation(matches: &ArgMatches) -> AppResult<Invocation> {
    let log_level = LogLevel::from_flags(flag(matches, "verbose"), flag(matches, "debug"));

    let filter = FilterSpec::resolve(
        matches.get_one::<String>("filter_regex").map(String::as_str),
        matches.get_one::<String>("filter_fixed").map(String::as_str),
        matches.get_one::<String>("filter_string").map(String::as_str),
    )?;

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ResolvedConfig::from_toml_file(path)?,
        None => ResolvedConfig::default(),
    };
    if let Some(base) = matches.get_one::<PathBuf>("output_base") {
        config.output_base = base.clone();
    }
    if let Some(&concurrency) = matches.get_one::<usize>("concurrency") {
        config.concurrency = concurrency;
    }
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(kind) = matches.get_one::<String>("downloader") {
        config.downloader = DownloaderKind::try_from(kind.as_str())?;
    }
    config.validate()?;

    let algorithm = ChecksumAlgorithm::try_from(
        matches
            .get_one::<String>("algorithm")
            .map(String::as_str)
            .unwrap_or("md5"),
    )?;

    let request = RunRequest::new(
        matches
            .get_one::<String>("project")
            .map(String::as_str)
            .unwrap_or_default(),
        matches
            .get_one::<String>("date")
            .map(String::as_str)
            .unwrap_or_default(),
        filter,
        algorithm,
        config.output_base.clone(),
    )?;

    Ok(Invocation {
        request,
        config,
        log_level,
    })
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.get_one::<bool>(id).copied().unwrap_or(false)
}

/// Parses the process arguments and runs the download.
///
/// `--help` and `--version` are handled by clap, which exits the process.
pub async fn cli() -> AppResult<RunSummary> {
    let matches = command().get_matches();
    let invocation = parse_invocation(&matches)?;
    init_logging(invocation.log_level);
    debug!(config = ?invocation.config, "Resolved configuration");

    let downloader = downloader::from_config(&invocation.config)?;
    orchestrator::run(
        &invocation.request,
        &invocation.config,
        downloader.as_ref(),
        orchestrator::shutdown_signal(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::DateSpec;

    fn parse(args: &[&str]) -> AppResult<Invocation> {
        let mut argv = vec!["dump-fetch"];
        argv.extend_from_slice(args);
        let matches = command().try_get_matches_from(argv).unwrap();
        parse_invocation(&matches)
    }

    #[test]
    fn defaults_are_applied() {
        let inv = parse(&["samplewiki", "20200101", "-s", "pages-meta-history"]).unwrap();
        assert_eq!(inv.request.project, "samplewiki");
        assert_eq!(
            inv.request.filter,
            FilterSpec::Literal("pages-meta-history".into())
        );
        assert_eq!(inv.request.algorithm, ChecksumAlgorithm::Md5);
        assert_eq!(inv.request.output_base, PathBuf::from("dumps"));
        assert_eq!(inv.config.concurrency, 1);
        assert_eq!(inv.log_level, LogLevel::Quiet);
    }

    #[test]
    fn flags_override_config() {
        let inv = parse(&[
            "samplewiki",
            "latest",
            "--filter-regex",
            "bz2$",
            "--output-base",
            "/data",
            "--algorithm",
            "sha1",
            "-j",
            "3",
            "--host",
            "https://mirror.example.org",
            "--downloader",
            "native",
            "--debug",
        ])
        .unwrap();
        assert_eq!(inv.request.date, DateSpec::Latest);
        assert_eq!(inv.request.filter, FilterSpec::Regex("bz2$".into()));
        assert_eq!(inv.request.output_base, PathBuf::from("/data"));
        assert_eq!(inv.request.algorithm, ChecksumAlgorithm::Sha1);
        assert_eq!(inv.config.concurrency, 3);
        assert_eq!(inv.config.host, "https://mirror.example.org");
        assert_eq!(inv.config.downloader, DownloaderKind::Native);
        assert_eq!(inv.log_level, LogLevel::Debug);
    }

    #[test]
    fn missing_filter_is_invalid_filter_type() {
        let err = parse(&["samplewiki", "20200101"]).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilterType(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn multiple_filters_are_rejected() {
        let err = parse(&["samplewiki", "20200101", "-s", "a", "-f", "b"]).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilterType(_)));
    }

    #[test]
    fn invalid_date_is_rejected() {
        let err = parse(&["samplewiki", "20201332", "-s", "a"]).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateFormat(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = parse(&["samplewiki", "latest", "-s", "a", "-j", "0"]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn unknown_algorithm_is_a_usage_error() {
        let result =
            command().try_get_matches_from(["dump-fetch", "p", "latest", "-s", "a", "-a", "sha256"]);
        assert!(result.is_err());
    }

    #[test]
    fn project_and_date_are_required() {
        assert!(command()
            .try_get_matches_from(["dump-fetch", "samplewiki"])
            .is_err());
    }

    #[test]
    fn config_file_values_are_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dump-fetch.toml");
        std::fs::write(&path, "output_base = \"mirror\"\nconcurrency = 2\n").unwrap();

        let inv = parse(&["p", "latest", "-f", "x", "--config", path.to_str().unwrap()]).unwrap();
        assert_eq!(inv.request.output_base, PathBuf::from("mirror"));
        assert_eq!(inv.config.concurrency, 2);
    }
}
