//! Drives every variant of a font through a capture session, one at a time.

use std::{
    fmt,
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::{
    browser::Browser,
    capture::{CaptureSession, DownloadOutcome},
    enumerate::VariantSource,
    error::FontError,
    fetch::AssetFetcher,
    naming::FontIdentity,
};

/// Tally of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub skipped: usize,
    pub not_found: usize,
    /// Variants whose asset transfer failed.
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Fetched => self.fetched += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::NotFound => self.not_found += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fetched + self.skipped + self.not_found + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} skipped, {} not found",
            self.fetched, self.skipped, self.not_found
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " in {:.1}s", self.elapsed.as_secs_f64())
    }
}

/// Owns the progress counters of a run; everything else is borrowed.
pub struct Downloader<'a> {
    browser: &'a dyn Browser,
    fetcher: &'a dyn AssetFetcher,
    source: &'a dyn VariantSource,
    page_timeout: Option<Duration>,
    show_progress: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(
        browser: &'a dyn Browser,
        fetcher: &'a dyn AssetFetcher,
        source: &'a dyn VariantSource,
    ) -> Self {
        Self {
            browser,
            fetcher,
            source,
            page_timeout: None,
            show_progress: true,
        }
    }

    pub fn with_page_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Resolves `font_name`, then captures each variant in enumeration order.
    ///
    /// Fails with [`FontError::Resolution`] before touching any variant when
    /// nothing can be resolved.
    pub async fn run(&self, font_name: &str, filters: &[String]) -> Result<RunSummary, FontError> {
        let started = Instant::now();
        let font = FontIdentity::new(font_name)
            .ok_or_else(|| FontError::Resolution("empty font name".to_string()))?;

        let targets = self
            .source
            .resolve(self.browser, &font, filters, self.page_timeout)
            .await?;
        if targets.is_empty() {
            return Err(FontError::Resolution(font.display_name()));
        }
        info!("{} variants to capture for {font}", targets.len());

        let progress = self.progress_bar(targets.len());
        let session =
            CaptureSession::new(self.browser, self.fetcher).with_page_timeout(self.page_timeout);
        let mut summary = RunSummary::default();

        for target in &targets {
            let name = format!("{font} {}", target.spec.display_name());
            status(&progress, format!("\n📥 Starting font download: {name}"));

            let downloading = |_: &str| status(&progress, format!("⬇️  Downloading: {name}"));
            match session.capture_with(target, &downloading).await {
                Ok(outcome) => {
                    let line = match outcome {
                        DownloadOutcome::Fetched => format!("✅ Downloaded: {name}"),
                        DownloadOutcome::Skipped => {
                            format!("⏭️  Skipping (already exists): {name}")
                        }
                        DownloadOutcome::NotFound => format!("❌ No font file found: {name}"),
                    };
                    status(&progress, line);
                    info!(outcome = ?outcome, dest = %target.dest.display(), "{name}");
                    summary.record(outcome);
                }
                Err(e) => {
                    error!("download of {name} failed: {e}");
                    status(&progress, format!("❌ Download error: {name}: {e}"));
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish();
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        let bar = if self.show_progress {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(" {bar:40} {percent}% | ETA: {eta} | {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░ "),
        );
        bar
    }
}

/// Prints above the progress bar.
fn status(progress: &ProgressBar, line: String) {
    progress.suspend(|| println!("{line}"));
}
