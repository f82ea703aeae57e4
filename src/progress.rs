use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Checkpoints reported while a page is downloaded.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PageFetched { url: String, bytes: usize },
    AssetsFound { count: usize },
    AssetDone { url: String, saved: bool },
    PageSaved { path: PathBuf },
}

/// Receives [`ProgressEvent`]s. Observers only watch; they never steer the
/// download.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressObserver {
    fn notify(&self, event: ProgressEvent);
}

/// Observer that ignores everything.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn notify(&self, _event: ProgressEvent) {}
}

/// Terminal spinner driven by download checkpoints. Cleared on drop, so it
/// stops even when the download fails half way.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for SpinnerProgress {
    fn notify(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PageFetched { url, bytes } => {
                self.bar.set_message(format!("Fetched {} ({} bytes)", url, bytes));
            }
            ProgressEvent::AssetsFound { count } => {
                self.bar.set_length(count as u64);
                self.bar.set_message(format!("Found {} assets", count));
            }
            ProgressEvent::AssetDone { url, .. } => {
                self.bar.inc(1);
                self.bar.set_message(format!("Downloading: {}", url));
            }
            ProgressEvent::PageSaved { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
