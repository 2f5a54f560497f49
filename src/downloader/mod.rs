//! Transfer backends.
//!
//! The pipeline never talks to the network itself; it hands URLs to a
//! [`Downloader`]. [`Aria2Downloader`] delegates to the external `aria2c`
//! tool and [`HttpDownloader`] is a native reqwest implementation. Use
//! [`from_config`] to pick one from the resolved configuration.

mod aria2;
mod http_downloader;

use crate::config::{DownloaderKind, ResolvedConfig};
use crate::errors::AppResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// Re-export public API
pub use aria2::Aria2Downloader;
pub use http_downloader::HttpDownloader;

/// A capability that retrieves files into a local directory.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Backend name used in log events.
    fn name(&self) -> &'static str;

    /// Downloads a single `url` into `dest_dir` under `file_name` and returns
    /// the path of the written file.
    ///
    /// Failures are reported as `ManifestFetch` since a single-file fetch is
    /// only used for manifests.
    async fn fetch_file(&self, url: &str, dest_dir: &Path, file_name: &str)
        -> AppResult<PathBuf>;

    /// Downloads every URL listed in `url_list` (one absolute URL per line)
    /// into `dest_dir`, with at most `concurrency` transfers in flight.
    ///
    /// Failures are reported as `Download`.
    async fn fetch_batch(&self, url_list: &Path, dest_dir: &Path, concurrency: usize)
        -> AppResult<()>;
}

/// Builds the backend selected in `config`.
pub fn from_config(config: &ResolvedConfig) -> AppResult<Box<dyn Downloader>> {
    match config.downloader {
        DownloaderKind::Aria2c => Ok(Box::new(Aria2Downloader::new(
            config.aria2c_path.clone(),
            config.connections_per_server,
        ))),
        DownloaderKind::Native => Ok(Box::new(HttpDownloader::new(config)?)),
    }
}
