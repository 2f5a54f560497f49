//! Checksum manifest retrieval and parsing.

use crate::downloader::Downloader;
use crate::errors::{AppError, AppResult};
use crate::models::{ManifestLine, RunRequest};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Name of the manifest file: `{project}-{date}-{algorithm}sums.txt`.
pub fn manifest_filename(request: &RunRequest) -> String {
    format!(
        "{}-{}-{}sums.txt",
        request.project,
        request.date.as_path_component(),
        request.algorithm.as_str()
    )
}

/// Remote directory holding the dump files: `{host}/{project}/{date}`.
pub fn base_url(host: &str, request: &RunRequest) -> String {
    format!(
        "{}/{}/{}",
        host.trim_end_matches('/'),
        request.project,
        request.date.as_path_component()
    )
}

/// Splits manifest text into lines that carry a filename.
///
/// Blank lines are skipped silently; lines without a third field are skipped
/// with a warning so that every returned line maps to exactly one file.
pub fn parse_manifest(text: &str) -> Vec<ManifestLine> {
    let mut lines = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match ManifestLine::parse(raw) {
            Some(line) => lines.push(line),
            None => warn!(line = number + 1, content = raw, "Skipping malformed manifest line"),
        }
    }
    lines
}

/// Fetches the manifest for `request` into `dest_dir` and returns its lines.
///
/// The manifest file is kept in `dest_dir` after the run.
///
/// # Errors
///
/// Returns `ManifestFetch` if the downloader fails or the file cannot be read
/// back. Nothing is retried here.
pub async fn fetch_manifest(
    downloader: &dyn Downloader,
    request: &RunRequest,
    host: &str,
    dest_dir: &Path,
) -> AppResult<(PathBuf, Vec<ManifestLine>)> {
    let file_name = manifest_filename(request);
    let url = format!("{}/{}", base_url(host, request), file_name);

    fs::create_dir_all(dest_dir).await?;
    info!(url = %url, downloader = downloader.name(), "Fetching manifest");

    let path = downloader
        .fetch_file(&url, dest_dir, &file_name)
        .await
        .map_err(|e| match e {
            AppError::Download { message, exit_code } => {
                AppError::ManifestFetch { message, exit_code }
            }
            not_found @ AppError::DownloaderNotFound(_) => AppError::ManifestFetch {
                message: not_found.to_string(),
                exit_code: None,
            },
            other => other,
        })?;

    let text = fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::ManifestFetch {
            message: format!("Failed to read manifest {}: {e}", path.display()),
            exit_code: None,
        })?;
    let lines = parse_manifest(&text);
    info!(
        manifest = %path.display(),
        entries = lines.len(),
        "Manifest fetched"
    );
    Ok((path, lines))
}
