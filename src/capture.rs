//! One variant, one tab: render the page and keep the first font request.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    browser::{Browser, Page, navigate_within},
    classify::is_asset_request,
    error::FetchError,
    fetch::AssetFetcher,
    naming::VariantTarget,
};

/// What happened to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadOutcome {
    Fetched,
    /// The destination already existed.
    Skipped,
    /// The page never requested an asset, was unreachable, or broke.
    NotFound,
}

/// Runs capture sessions against a shared browser.
pub struct CaptureSession<'a> {
    browser: &'a dyn Browser,
    fetcher: &'a dyn AssetFetcher,
    page_timeout: Option<Duration>,
}

impl<'a> CaptureSession<'a> {
    pub fn new(browser: &'a dyn Browser, fetcher: &'a dyn AssetFetcher) -> Self {
        Self {
            browser,
            fetcher,
            page_timeout: None,
        }
    }

    /// Bounds each navigation; the default waits indefinitely.
    pub fn with_page_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Captures `target`'s asset into `target.dest`.
    ///
    /// Browser faults are logged and reported as [`DownloadOutcome::NotFound`];
    /// only a failed asset transfer is an error.
    pub async fn capture(&self, target: &VariantTarget) -> Result<DownloadOutcome, FetchError> {
        self.capture_with(target, &|_| {}).await
    }

    /// Like [`CaptureSession::capture`], calling `on_match` with the asset URL
    /// just before its transfer starts.
    pub async fn capture_with(
        &self,
        target: &VariantTarget,
        on_match: &(dyn Fn(&str) + Sync),
    ) -> Result<DownloadOutcome, FetchError> {
        if tokio::fs::try_exists(&target.dest).await? {
            return Ok(DownloadOutcome::Skipped);
        }

        if target.probe && !self.reachable(&target.page_url).await {
            debug!("{} is unreachable", target.page_url);
            return Ok(DownloadOutcome::NotFound);
        }

        let mut page = match self.browser.open_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("could not open a tab for {}: {e}", target.page_url);
                return Ok(DownloadOutcome::NotFound);
            }
        };

        let result = self.capture_on(page.as_mut(), target, on_match).await;

        if let Err(e) = page.close().await {
            warn!("closing tab for {} failed: {e}", target.page_url);
        }
        result
    }

    /// The probe shares the navigation bound.
    async fn reachable(&self, url: &str) -> bool {
        match self.page_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.is_reachable(url))
                .await
                .unwrap_or(false),
            None => self.fetcher.is_reachable(url).await,
        }
    }

    async fn capture_on(
        &self,
        page: &mut dyn Page,
        target: &VariantTarget,
        on_match: &(dyn Fn(&str) + Sync),
    ) -> Result<DownloadOutcome, FetchError> {
        let subscription = page.on_request(is_asset_request);
        let navigation = navigate_within(page, &target.page_url, self.page_timeout);
        let download = async {
            let asset = subscription.first_match().await?;
            info!("downloading {asset}");
            on_match(&asset);
            Some(self.fetcher.fetch(&asset, &target.dest).await)
        };

        let (navigated, downloaded) = tokio::join!(navigation, download);

        if let Err(e) = navigated {
            warn!("session error on {}: {e}", target.page_url);
        }
        match downloaded {
            Some(Ok(())) => Ok(DownloadOutcome::Fetched),
            Some(Err(e)) => Err(e),
            None => Ok(DownloadOutcome::NotFound),
        }
    }
}
