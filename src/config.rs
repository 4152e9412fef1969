//! Run configuration, optionally read from a TOML file.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    browser::Quiescence,
    enumerate::{Discovery, Templating, TieBreak},
    error::FontError,
};

/// How variants are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Search the catalog and scrape the family page.
    #[default]
    Discover,
    /// Build URLs for every width and weight in a fixed foundry.
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub search_url: String,
    pub store_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_url: "https://typenetwork.com/search".to_string(),
            store_url: "https://store.typenetwork.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Foundry namespace every templated URL lives under.
    pub foundry: String,
    pub url: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            foundry: "typenetwork".to_string(),
            url: "{store}/foundry/{foundry}/fonts/{family}/{variant}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webdriver_url: String,
    pub headless: bool,
    pub output_dir: PathBuf,
    pub strategy: Strategy,
    pub tie_break: TieBreak,
    pub catalog: CatalogConfig,
    pub template: TemplateConfig,
    /// Milliseconds without new requests before a page counts as loaded.
    pub idle_ms: u64,
    pub poll_ms: u64,
    /// Upper bound on one navigation; unset waits forever.
    pub page_timeout_secs: Option<u64>,
    /// HEAD-probe templated pages before opening a tab.
    pub probe_pages: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:4444".to_string(),
            headless: true,
            output_dir: PathBuf::from("fonts"),
            strategy: Strategy::default(),
            tie_break: TieBreak::default(),
            catalog: CatalogConfig::default(),
            template: TemplateConfig::default(),
            idle_ms: 500,
            poll_ms: 250,
            page_timeout_secs: None,
            probe_pages: true,
        }
    }
}

impl Config {
    /// Reads `path`, or returns the defaults when no path is given.
    ///
    /// # Arguments
    ///
    /// * `path` - TOML file; keys it omits keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Config`] when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, FontError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .map_err(|e| FontError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&data).map_err(|e| FontError::Config(format!("{}: {e}", path.display())))
    }

    pub fn quiescence(&self) -> Quiescence {
        Quiescence {
            idle: Duration::from_millis(self.idle_ms),
            poll: Duration::from_millis(self.poll_ms),
        }
    }

    pub fn page_timeout(&self) -> Option<Duration> {
        self.page_timeout_secs.map(Duration::from_secs)
    }

    pub fn discovery(&self) -> Result<Discovery, FontError> {
        Ok(Discovery {
            search_url: parse_url("catalog.search_url", &self.catalog.search_url)?,
            store_url: parse_url("catalog.store_url", &self.catalog.store_url)?,
            root: self.output_dir.clone(),
            tie_break: self.tie_break,
        })
    }

    pub fn templating(&self) -> Result<Templating, FontError> {
        if self.template.foundry.trim().is_empty() {
            return Err(FontError::Config("template.foundry is empty".to_string()));
        }
        Ok(Templating {
            store_url: parse_url("catalog.store_url", &self.catalog.store_url)?,
            foundry: self.template.foundry.clone(),
            url_template: self.template.url.clone(),
            root: self.output_dir.clone(),
            probe: self.probe_pages,
        })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, FontError> {
    Url::parse(value).map_err(|e| FontError::Config(format!("{field} `{value}`: {e}")))
}
