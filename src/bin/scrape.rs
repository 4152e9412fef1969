//! Downloads the WOFF2 files of a catalog font family.
//!
//! Requires geckodriver to be running on port 4444.
//!
//! # Usage
//!
//! ```bash
//! geckodriver &
//! cargo run --bin scrape -- "Acme Sans" Bold Regular
//! cargo run --bin scrape -- --strategy template "Acme Sans" condensed '*'
//! ```

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::warn;
use woff2_capture::{
    Config, Downloader, FontError, HttpFetcher, Strategy, TieBreak, VariantSource,
    WebDriverBrowser, logging,
};

/// Captures WOFF2 font files from a JavaScript-rendered font catalog.
#[derive(Debug, Parser)]
#[command(name = "scrape", version, long_about = None)]
struct Args {
    /// Font family name, e.g. "Acme Sans".
    font: String,

    /// Discover: weight labels to keep. Template: [WIDTH [WEIGHT]]. `*` selects all.
    filters: Vec<String>,

    /// How variants are enumerated.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Root directory for downloaded fonts.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// WebDriver server URL.
    #[arg(long, value_name = "URL")]
    webdriver: Option<String>,

    /// Foundry namespace used by the template strategy.
    #[arg(long)]
    foundry: Option<String>,

    /// Prefer the search result whose family matches the name exactly.
    #[arg(long)]
    prefer_exact: bool,

    /// Give up on a variant page after this many seconds.
    #[arg(long, value_name = "SECS")]
    page_timeout: Option<u64>,

    /// Render templated pages without probing them first.
    #[arg(long)]
    no_probe: bool,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Discover,
    Template,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                StrategyArg::Discover => Strategy::Discover,
                StrategyArg::Template => Strategy::Template,
            };
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(webdriver) = &self.webdriver {
            config.webdriver_url = webdriver.clone();
        }
        if let Some(foundry) = &self.foundry {
            config.template.foundry = foundry.clone();
        }
        if self.prefer_exact {
            config.tie_break = TieBreak::Exact;
        }
        if self.page_timeout.is_some() {
            config.page_timeout_secs = self.page_timeout;
        }
        if self.no_probe {
            config.probe_pages = false;
        }
        if self.headed {
            config.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("\n❌ {err:#}");
            let code = err.downcast_ref::<FontError>().map_or(2, FontError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let source: Box<dyn VariantSource> = match config.strategy {
        Strategy::Discover => Box::new(config.discovery()?),
        Strategy::Template => Box::new(config.templating()?),
    };

    let browser = WebDriverBrowser::connect(&config.webdriver_url, config.headless, config.quiescence())
        .await
        .with_context(|| format!("connecting to webdriver at {}", config.webdriver_url))?;
    let fetcher = HttpFetcher::default();
    let downloader = Downloader::new(&browser, &fetcher, source.as_ref())
        .with_page_timeout(config.page_timeout());

    let outcome = tokio::select! {
        result = downloader.run(&args.font, &args.filters) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    // Single teardown path: quitting the session closes any tab still open.
    if let Err(e) = browser.quit().await {
        warn!("closing the browser failed: {e}");
    }

    match outcome {
        None => {
            println!("\n⛔ Interrupted");
            Ok(ExitCode::from(130))
        }
        Some(Ok(summary)) => {
            println!("\n✅ Download completed: {summary}");
            Ok(if summary.failed > 0 {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(Err(e)) => Err(e.into()),
    }
}
