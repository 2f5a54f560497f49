use std::time::Duration;

/// Formats an elapsed time as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Formats a byte count as megabytes with two decimals, e.g. `"12.50 MB"`.
pub fn format_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / 1_048_576.0;
    format!("{:.2} MB", (mb * 100.0).round() / 100.0)
}
