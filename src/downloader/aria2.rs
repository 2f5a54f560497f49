use super::Downloader;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// Drives the external `aria2c` download utility.
///
/// The whole URL list is handed to a single `aria2c` process so that it can
/// queue and resume transfers itself. Child processes are killed when the
/// future awaiting them is dropped, which is what happens on interrupt.
#[derive(Debug, Clone)]
pub struct Aria2Downloader {
    program: PathBuf,
    connections_per_server: u32,
}

impl Aria2Downloader {
    pub fn new(program: impl Into<PathBuf>, connections_per_server: u32) -> Self {
        Self {
            program: program.into(),
            connections_per_server: connections_per_server.max(1),
        }
    }

    /// Arguments for retrieving one file.
    pub fn file_args(&self, url: &str, dest_dir: &Path, file_name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--dir".into(), dest_dir.into()];
        args.push("--out".into());
        args.push(file_name.into());
        args.push("--allow-overwrite=true".into());
        args.push("--auto-file-renaming=false".into());
        args.push(url.into());
        args
    }

    /// Arguments for a batch run driven by an input file.
    pub fn batch_args(&self, url_list: &Path, dest_dir: &Path, concurrency: usize) -> Vec<OsString> {
        let connections = self.connections_per_server.to_string();
        let mut args: Vec<OsString> = vec!["--dir".into(), dest_dir.into()];
        args.push("--input-file".into());
        args.push(url_list.into());
        args.push(format!("--max-concurrent-downloads={}", concurrency.max(1)).into());
        args.push("--deferred-input=true".into());
        args.push("--continue=true".into());
        args.push(format!("--max-connection-per-server={connections}").into());
        args.push(format!("--split={connections}").into());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> AppResult<ExitStatus> {
        debug!(program = %self.program.display(), args = ?args, "Spawning downloader");
        Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AppError::DownloaderNotFound(self.program.display().to_string())
                } else {
                    AppError::Io(e)
                }
            })
    }
}

#[async_trait]
impl Downloader for Aria2Downloader {
    fn name(&self) -> &'static str {
        "aria2c"
    }

    async fn fetch_file(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        let status = self.run(self.file_args(url, dest_dir, file_name)).await?;
        if !status.success() {
            return Err(AppError::ManifestFetch {
                message: format!("aria2c exited with status {status} while fetching {url}"),
                exit_code: status.code(),
            });
        }

        let path = dest_dir.join(file_name);
        if !path.is_file() {
            return Err(AppError::ManifestFetch {
                message: format!("aria2c reported success but {} is missing", path.display()),
                exit_code: None,
            });
        }
        info!(url = url, path = %path.display(), "Fetched file");
        Ok(path)
    }

    async fn fetch_batch(
        &self,
        url_list: &Path,
        dest_dir: &Path,
        concurrency: usize,
    ) -> AppResult<()> {
        let status = self
            .run(self.batch_args(url_list, dest_dir, concurrency))
            .await?;
        if !status.success() {
            return Err(AppError::Download {
                message: format!("aria2c exited with status {status}"),
                exit_code: status.code(),
            });
        }
        Ok(())
    }
}
