//! # WOFF2 Capture
//!
//! A library for retrieving web font files from a JavaScript-rendered font
//! catalog.
//!
//! Font binaries are never linked from the catalog's markup; a family page
//! fetches them while it renders. This crate drives a real browser through
//! WebDriver, watches the requests each variant page makes, and keeps the one
//! that is the font:
//!
//! 1. **Enumerate** - resolve a font name to its variant pages, either by
//!    searching the catalog ([`Discovery`]) or by templating URLs over the
//!    width and weight axes ([`Templating`]).
//!
//! 2. **Capture** - render each page in its own tab and stream the first
//!    `/<id>/<name>.woff2` request it issues to `fonts/<Family>/...`.
//!    Files already on disk are skipped, so runs can be repeated.
//!
//! ## Example
//!
//! ```no_run
//! use woff2_capture::{Config, Downloader, HttpFetcher, WebDriverBrowser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let browser =
//!         WebDriverBrowser::connect(&config.webdriver_url, true, config.quiescence()).await?;
//!     let fetcher = HttpFetcher::default();
//!     let source = config.discovery()?;
//!
//!     let summary = Downloader::new(&browser, &fetcher, &source)
//!         .run("Acme Sans", &["Bold".to_string()])
//!         .await;
//!     browser.quit().await?;
//!     println!("{}", summary?);
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod capture;
pub mod classify;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod naming;
pub mod orchestrator;

pub use browser::{Browser, Page, RequestSubscription, WebDriverBrowser};
pub use capture::{CaptureSession, DownloadOutcome};
pub use classify::is_asset_request;
pub use config::{Config, Strategy};
pub use enumerate::{Discovery, Templating, TieBreak, VariantSource};
pub use error::{FetchError, FontError, SessionError};
pub use fetch::{AssetFetcher, HttpFetcher};
pub use naming::{FontIdentity, VariantSpec, VariantTarget};
pub use orchestrator::{Downloader, RunSummary};
