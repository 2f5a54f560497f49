//! Run orchestration.
//!
//! [`run`] drives a single request through the pipeline:
//! workspace → manifest → filter → URL list → batch download → release.
//! The workspace is released on every exit path, including interruption.

use crate::config::ResolvedConfig;
use crate::download_list::{build, write_url_list};
use crate::downloader::Downloader;
use crate::errors::{AppError, AppResult};
use crate::filter::{select, write_selection};
use crate::manifest::{base_url, fetch_manifest};
use crate::models::{DownloadTask, RunRequest};
use crate::utils::format_elapsed;
use crate::workspace::Workspace;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, warn};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Manifest file kept in the output directory
    pub manifest_path: PathBuf,
    /// Directory receiving the downloaded files
    pub output_dir: PathBuf,
    /// Lines in the manifest
    pub manifest_entries: usize,
    /// URLs handed to the downloader, in submission order
    pub urls: Vec<String>,
}

/// Hands the task list to the downloader in one invocation.
///
/// The destination is created first. With no tasks the downloader is not
/// invoked at all. Failures are returned as-is; nothing is retried here.
pub async fn run_downloads(
    downloader: &dyn Downloader,
    tasks: &[DownloadTask],
    url_list: &Path,
    destination_dir: &Path,
    concurrency: usize,
) -> AppResult<()> {
    fs::create_dir_all(destination_dir).await?;

    if tasks.is_empty() {
        info!("No manifest entries matched the filter, nothing to download");
        return Ok(());
    }

    info!(
        files = tasks.len(),
        concurrency = concurrency,
        downloader = downloader.name(),
        destination = %destination_dir.display(),
        "Starting batch download"
    );
    downloader
        .fetch_batch(url_list, destination_dir, concurrency)
        .await
}

/// Runs `request` to completion, or until `shutdown` resolves.
///
/// # Errors
///
/// Returns the first failing stage's error, or `Interrupted` if `shutdown`
/// fired first. In every case the workspace no longer exists when this
/// returns.
pub async fn run<F>(
    request: &RunRequest,
    config: &ResolvedConfig,
    downloader: &dyn Downloader,
    shutdown: F,
) -> AppResult<RunSummary>
where
    F: Future<Output = ()>,
{
    let started = Instant::now();
    let workspace = Workspace::acquire(config.scratch_dir.as_deref())?;

    let outcome = tokio::select! {
        biased;
        _ = shutdown => {
            warn!("Interrupted, cleaning up");
            Err(AppError::Interrupted)
        }
        result = execute(request, config, downloader, &workspace) => result,
    };

    // The pipeline future is dropped by now, so no child process holds the workspace
    match (outcome, workspace.release()) {
        (Ok(summary), Ok(())) => {
            info!(
                project = %request.project,
                date = %request.date,
                files = summary.urls.len(),
                output_dir = %summary.output_dir.display(),
                elapsed = %format_elapsed(started.elapsed()),
                "All operations completed successfully"
            );
            Ok(summary)
        }
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!(error = %release_err, "Failed to release workspace");
            Err(e)
        }
    }
}

async fn execute(
    request: &RunRequest,
    config: &ResolvedConfig,
    downloader: &dyn Downloader,
    workspace: &Workspace,
) -> AppResult<RunSummary> {
    let output_dir = request.output_dir();
    info!(
        project = %request.project,
        date = %request.date,
        filter = request.filter.display_name(),
        pattern = request.filter.pattern(),
        algorithm = request.algorithm.as_str(),
        "Starting run"
    );

    let (manifest_path, lines) =
        fetch_manifest(downloader, request, config.host(), &output_dir).await?;

    let selected = select(&lines, &request.filter)?;
    write_selection(&workspace.filtered_manifest_path(), &selected).await?;
    info!(
        selected = selected.len(),
        total = lines.len(),
        "Manifest entries selected"
    );

    let tasks = build(&selected, &base_url(config.host(), request), &output_dir);
    let url_list = workspace.url_list_path();
    write_url_list(&url_list, &tasks).await?;

    run_downloads(downloader, &tasks, &url_list, &output_dir, config.concurrency).await?;

    Ok(RunSummary {
        manifest_path,
        output_dir,
        manifest_entries: lines.len(),
        urls: tasks.into_iter().map(|t| t.url).collect(),
    })
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix.
///
/// A listener that cannot be installed never resolves, so the other one
/// still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received Ctrl-C"),
        _ = terminate => debug!("Received SIGTERM"),
    }
}
