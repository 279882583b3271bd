use indicatif::{ProgressBar, ProgressStyle};
use ldaviz_workspace::ProgressSink;
use std::sync::Arc;

/// Bar resolution; task progress arrives as a fraction
const BAR_LENGTH: u64 = 1000;

/// Create a progress bar for a task's fractional progress
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(BAR_LENGTH);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg}\n[{bar:40.cyan/blue}] {percent}% ETA: {eta}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Sink that moves `bar` with task progress
pub fn bar_sink(bar: ProgressBar) -> Arc<dyn ProgressSink> {
    Arc::new(move |fraction: f64| bar.set_position((fraction * BAR_LENGTH as f64).round() as u64))
}
