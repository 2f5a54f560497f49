use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar with the standard application styling.
///
/// Used by the native downloader; `aria2c` draws its own progress.
///
/// # Example
///
/// ```no_run
/// use dump_fetch::ui;
///
/// # fn main() -> Result<(), dump_fetch::errors::AppError> {
/// let pb = ui::create_progress_bar(3)?;
/// pb.inc(1);
/// pb.finish_with_message("Done");
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total: u64) -> AppResult<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files {msg}",
            )
            .map_err(|e| AppError::InvalidInput(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
