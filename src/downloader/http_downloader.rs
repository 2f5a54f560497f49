use super::Downloader;
use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::ui;
use crate::utils::format_megabytes;
use async_trait::async_trait;
use reqwest::header::RANGE;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

/// Result type for parallel download tasks.
/// Returns (filename, bytes written, optional error message)
type DownloadTaskResult = (String, u64, Option<String>);

/// Determines if an error should trigger a retry attempt.
///
/// Network errors and 5xx statuses are retried; 4xx statuses and local
/// failures are not.
fn should_retry(error: &FetchError) -> bool {
    match error {
        FetchError::Status(status) => status.is_server_error(),
        FetchError::Network(_) => true,
        FetchError::Io(_) => false,
    }
}

/// Failure of a single HTTP transfer.
#[derive(Debug)]
enum FetchError {
    Status(StatusCode),
    Network(String),
    Io(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status(status) => write!(f, "HTTP {status}"),
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryConfig {
    max_retries: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
        }
    }
}

/// Calculates exponential backoff delay in milliseconds.
///
/// Formula: `min(initial_delay * 2^attempt, max_delay)`
fn calculate_backoff(attempt: u32, config: &RetryConfig) -> u64 {
    let delay = config
        .initial_delay_ms
        .saturating_mul(2_u64.saturating_pow(attempt));
    delay.min(config.max_delay_ms)
}

/// Native HTTP backend.
///
/// Files are written to `<name>.part` and renamed when complete. An existing
/// `.part` file is resumed with a `Range` request, and files that already
/// exist in the destination are skipped.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpDownloader {
    pub fn new(config: &ResolvedConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            retry: RetryConfig {
                max_retries: config.max_retries,
                initial_delay_ms: config.retry_initial_delay_ms,
                max_delay_ms: config.retry_max_delay_ms,
            },
        })
    }
}

/// Returns the last path segment of `url`, which names the local file.
fn file_name_from_url(url: &str) -> AppResult<String> {
    let parsed = Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput(format!("URL has no file name: {url}")))
}

fn part_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Retries `download_single_file` with exponential backoff.
async fn download_with_retry(
    client: &reqwest::Client,
    url: &str,
    file_path: &Path,
    retry_config: &RetryConfig,
) -> Result<u64, FetchError> {
    let mut attempt = 0;
    loop {
        match download_single_file(client, url, file_path).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < retry_config.max_retries && should_retry(&e) => {
                let delay_ms = calculate_backoff(attempt, retry_config);
                warn!(
                    url = url,
                    attempt = attempt + 1,
                    max_retries = retry_config.max_retries + 1,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying download after error"
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Downloads one file, resuming a previous `.part` file when the server
/// honours range requests.
async fn download_single_file(
    client: &reqwest::Client,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let tmp_path = part_path(file_path);
    let resume_from = match fs::metadata(&tmp_path).await {
        Ok(meta) => meta.len(),
        Err(_) => 0,
    };

    let mut request = client.get(url);
    if resume_from > 0 {
        request = request.header(RANGE, format!("bytes={resume_from}-"));
    }
    let mut response = request
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::RANGE_NOT_SATISFIABLE && resume_from > 0 {
        // Stale partial file; drop it so the next attempt starts from zero
        let _ = fs::remove_file(&tmp_path).await;
        return Err(FetchError::Network(format!(
            "server rejected resume at byte {resume_from}"
        )));
    }
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    // A plain 200 means the server ignored the range; start over
    let append = resume_from > 0 && status == StatusCode::PARTIAL_CONTENT;
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&tmp_path)
        .await
        .map_err(|e| FetchError::Io(format!("{}: {e}", tmp_path.display())))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {e}", tmp_path.display())))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| FetchError::Io(format!("{}: {e}", tmp_path.display())))?;
    drop(file);

    fs::rename(&tmp_path, file_path).await.map_err(|e| {
        FetchError::Io(format!(
            "rename {} to {}: {e}",
            tmp_path.display(),
            file_path.display()
        ))
    })?;

    Ok(written)
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn fetch_file(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        fs::create_dir_all(dest_dir).await?;
        let file_path = dest_dir.join(file_name);
        // Manifests for `latest` change between runs, never resume them
        let _ = fs::remove_file(part_path(&file_path)).await;

        download_with_retry(&self.client, url, &file_path, &self.retry)
            .await
            .map_err(|e| AppError::ManifestFetch {
                message: format!("{url}: {e}"),
                exit_code: None,
            })?;
        Ok(file_path)
    }

    async fn fetch_batch(
        &self,
        url_list: &Path,
        dest_dir: &Path,
        concurrency: usize,
    ) -> AppResult<()> {
        let list = fs::read_to_string(url_list).await?;
        fs::create_dir_all(dest_dir).await?;

        let mut files_to_download: Vec<(String, PathBuf)> = Vec::new();
        let mut skipped_count = 0usize;
        for url in list.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let file_path = dest_dir.join(file_name_from_url(url)?);
            if file_path.exists() {
                skipped_count += 1;
                continue;
            }
            files_to_download.push((url.to_string(), file_path));
        }

        let total_files = files_to_download.len();
        if total_files == 0 {
            info!(skipped = skipped_count, "All files already exist, skipping downloads");
            return Ok(());
        }

        let pb = Arc::new(ui::create_progress_bar(total_files as u64)?);
        info!(
            total = total_files,
            skipped = skipped_count,
            concurrency = concurrency,
            "Starting download"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        // Dropping the set aborts every transfer still in flight
        let mut transfers: JoinSet<DownloadTaskResult> = JoinSet::new();

        for (url, file_path) in files_to_download {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let pb = pb.clone();
            let retry = self.retry;

            transfers.spawn(async move {
                let filename = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return (filename, 0, Some(format!("semaphore closed: {e}"))),
                };
                pb.set_message(format!("Downloading {filename}..."));

                match download_with_retry(&client, &url, &file_path, &retry).await {
                    Ok(bytes) => {
                        pb.set_message(format!("Completed {filename}"));
                        (filename, bytes, None)
                    }
                    Err(e) => {
                        warn!(filename = filename, error = %e, "Failed to download file");
                        pb.set_message(format!("Failed {filename}"));
                        let msg = format!("{filename}: {e}");
                        (filename, 0, Some(msg))
                    }
                }
            });
        }

        let mut errors = Vec::new();
        let mut success_count = 0usize;
        let mut total_bytes = 0u64;
        while let Some(joined) = transfers.join_next().await {
            match joined {
                Ok((_filename, bytes, None)) => {
                    success_count += 1;
                    total_bytes += bytes;
                }
                Ok((_filename, _, Some(msg))) => errors.push(msg),
                Err(e) => errors.push(format!("Task join error: {e}")),
            }
            pb.inc(1);
        }

        pb.finish_with_message(format!(
            "Downloaded {success_count} file(s), {} failed",
            errors.len()
        ));
        info!(
            downloaded = success_count,
            failed = errors.len(),
            skipped = skipped_count,
            size = %format_megabytes(total_bytes),
            "Download completed"
        );

        if !errors.is_empty() {
            debug!(errors = ?errors, "Failed transfers");
            return Err(AppError::Download {
                message: format!(
                    "Failed to download {} file(s): {}",
                    errors.len(),
                    errors.join("; ")
                ),
                exit_code: None,
            });
        }

        Ok(())
    }
}
