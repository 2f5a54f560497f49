//! dump-fetch library
//!
//! This crate provides the core functionality for the `dump-fetch` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! A run downloads the subset of a dated dump that matches one filter:
//!
//! - [`date_validator`] - Accepts `latest` or a real `YYYYMMDD` date
//! - [`manifest`] - Fetches and parses the `{project}-{date}-{algorithm}sums.txt` manifest
//! - [`filter`] - Selects manifest lines with a regex, fixed-string or substring rule
//! - [`download_list`] - Turns selected lines into absolute download URLs
//! - [`workspace`] - Scratch directory for intermediate files, removed on every exit path
//! - [`orchestrator`] - Runs the pipeline and hands the URL list to a downloader
//! - [`downloader`] - `aria2c` and native HTTP transfer backends
//! - [`cli`] - Command-line interface
//! - [`config`] - TOML configuration with defaults
//! - [`errors`] - Error types and exit codes
//!
//! ## Example Usage
//!
//! ```no_run
//! use dump_fetch::config::ResolvedConfig;
//! use dump_fetch::models::{ChecksumAlgorithm, FilterSpec, RunRequest};
//! use dump_fetch::{downloader, errors::AppResult, orchestrator};
//!
//! # async fn example() -> AppResult<()> {
//! let config = ResolvedConfig::default();
//! let request = RunRequest::new(
//!     "enwiki",
//!     "20200101",
//!     FilterSpec::Literal("pages-meta-history".into()),
//!     ChecksumAlgorithm::Md5,
//!     &config.output_base,
//! )?;
//! let backend = downloader::from_config(&config)?;
//! let summary =
//!     orchestrator::run(&request, &config, backend.as_ref(), orchestrator::shutdown_signal())
//!         .await?;
//! println!("{} files in {}", summary.urls.len(), summary.output_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod date_validator;
pub mod download_list;
pub mod downloader;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod orchestrator;
pub mod ui;
pub mod utils;
pub mod workspace;
