// src/progress.rs

//! Download progress display
//!
//! Wraps indicatif's MultiProgress: one aggregate bar for the whole fetch
//! wave plus a per-artifact bar or spinner. Commands construct this; the
//! install engine only hands bars to fetchers, so quiet runs pass `None`.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Create a styled progress bar for one artifact download
fn create_progress_bar(name: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb
}

/// Multi-progress manager for the parallel fetch wave
pub struct DownloadProgress {
    multi: MultiProgress,
    overall: ProgressBar,
}

impl DownloadProgress {
    /// Create a manager tracking `artifact_count` downloads
    pub fn new(artifact_count: usize) -> Self {
        let multi = MultiProgress::new();

        let overall = ProgressBar::new(artifact_count as u64);
        overall.set_style(
            ProgressStyle::default_bar()
                .template("Fetching: [{bar:40.green/dim}] {pos}/{len} artifacts {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("=>-"),
        );
        let overall = multi.add(overall);

        Self { multi, overall }
    }

    /// Add a per-artifact bar to the display
    pub fn add_download(&self, name: &str) -> ProgressBar {
        self.multi.add(create_progress_bar(name))
    }

    /// Mark one artifact complete
    pub fn finish_download(&self, pb: &ProgressBar, name: &str) {
        pb.finish_and_clear();
        self.overall.inc(1);
        self.overall.set_message(name.to_string());
    }

    /// Mark one artifact failed
    pub fn fail_download(&self, pb: &ProgressBar, name: &str, error: &str) {
        pb.abandon_with_message(format!("{name} [FAILED: {error}]"));
        self.overall.inc(1);
    }

    /// Finish the aggregate bar
    pub fn finish_all(&self, succeeded: usize, failed: usize) {
        if failed > 0 {
            self.overall
                .abandon_with_message(format!("{succeeded} succeeded, {failed} failed"));
        } else {
            self.overall.finish_with_message("done");
        }
    }
}
