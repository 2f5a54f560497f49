use crate::errors::AppResult;
use crate::models::{DownloadTask, SelectedEntry};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Maps each selected manifest line to `base_url/filename`.
///
/// One task per entry, in the same order. URLs are not validated; a bad
/// filename only surfaces when the downloader tries it.
pub fn build(selected: &[SelectedEntry], base_url: &str, destination_dir: &Path) -> Vec<DownloadTask> {
    let base_url = base_url.trim_end_matches('/');
    selected
        .iter()
        .map(|entry| DownloadTask {
            url: format!("{base_url}/{}", entry.filename()),
            destination_dir: destination_dir.to_path_buf(),
        })
        .collect()
}

/// Writes one URL per line for the downloader's input file.
pub async fn write_url_list(path: &Path, tasks: &[DownloadTask]) -> AppResult<()> {
    let file = fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    for task in tasks {
        writer.write_all(task.url.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}
