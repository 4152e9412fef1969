//! Turns a font name and filters into the list of variants to capture.
//!
//! [`Discovery`] searches the catalog and scrapes the family page for variant
//! links. [`Templating`] builds one URL per (width, weight) in a fixed foundry
//! namespace without rendering anything up front.

use std::{collections::HashSet, path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    browser::{Browser, navigate_within},
    error::{FontError, SessionError},
    naming::{
        FontIdentity, VariantSpec, VariantTarget, WILDCARD, Weight, WeightClass, Width, deslugify,
        slugify,
    },
};

/// Produces the capture targets for one run.
///
/// An unknown font yields `Ok` with no targets; malformed filters are an error.
/// `page_timeout` bounds every page the source renders itself.
#[async_trait]
pub trait VariantSource: Send + Sync {
    async fn resolve(
        &self,
        browser: &dyn Browser,
        font: &FontIdentity,
        filters: &[String],
        page_timeout: Option<Duration>,
    ) -> Result<Vec<VariantTarget>, FontError>;
}

/// Which search result becomes the canonical family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// The first result whose family slug starts with the requested name.
    #[default]
    First,
    /// Prefer a result whose family slug equals the requested name.
    Exact,
}

/// A `/foundry/<foundry>/fonts/<family>[/<variant>]` link on the store host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLink {
    pub href: String,
    pub foundry: String,
    pub family: String,
    pub variant: Option<String>,
}

impl CatalogLink {
    pub fn parse(href: &str, store: &Url) -> Option<Self> {
        let url = Url::parse(href).ok()?;
        if url.scheme() != store.scheme() || url.host_str() != store.host_str() {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["foundry", foundry, "fonts", family, rest @ ..] => Some(Self {
                href: href.to_string(),
                foundry: foundry.to_string(),
                family: family.to_string(),
                variant: match rest {
                    [variant] => Some(variant.to_string()),
                    _ => None,
                },
            }),
            _ => None,
        }
    }

    fn family_url(&self, store: &Url) -> String {
        format!(
            "{}/foundry/{}/fonts/{}",
            store.as_str().trim_end_matches('/'),
            self.foundry,
            self.family
        )
    }
}

/// Search-driven enumeration.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub search_url: Url,
    pub store_url: Url,
    pub root: PathBuf,
    pub tie_break: TieBreak,
}

impl Discovery {
    /// `<search>?searchQuery=<name>`.
    pub fn search_url_for(&self, name: &str) -> String {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("searchQuery", name);
        url.to_string()
    }

    /// Picks the canonical family among rendered search result links.
    pub fn pick_family(&self, font: &FontIdentity, hrefs: &[String]) -> Option<CatalogLink> {
        let slug = font.slug();
        let candidates: Vec<CatalogLink> = hrefs
            .iter()
            .filter_map(|href| CatalogLink::parse(href, &self.store_url))
            .filter(|link| link.family.starts_with(&slug))
            .collect();

        let exact = match self.tie_break {
            TieBreak::Exact => candidates.iter().find(|link| link.family == slug),
            TieBreak::First => None,
        };
        exact.or_else(|| candidates.first()).cloned()
    }

    /// Variant links of `family`, first occurrence order, filtered by label.
    ///
    /// Links that would land on the same file keep only their first occurrence.
    pub fn variants(
        &self,
        font: &FontIdentity,
        family: &CatalogLink,
        hrefs: &[String],
        weights: &[String],
    ) -> Vec<VariantTarget> {
        let wanted: Vec<String> = weights.iter().map(|w| normalize_label(w)).collect();
        let all = wanted.is_empty() || wanted.iter().any(|w| w == WILDCARD);
        let font = font.clone().with_namespace(family.foundry.clone());

        let mut seen = HashSet::new();
        hrefs
            .iter()
            .filter_map(|href| CatalogLink::parse(href, &self.store_url))
            .filter(|link| link.foundry == family.foundry && link.family == family.family)
            .filter_map(|link| {
                let slug = link.variant.clone()?;
                Some((link, slug))
            })
            .filter(|(_, slug)| all || wanted.contains(&normalize_label(&deslugify(slug))))
            .map(|(link, slug)| {
                VariantTarget::new(
                    &self.root,
                    &font,
                    VariantSpec::weight_only(deslugify(&slug)),
                    link.href,
                )
            })
            .filter(|target| seen.insert(target.dest.clone()))
            .collect()
    }
}

#[async_trait]
impl VariantSource for Discovery {
    async fn resolve(
        &self,
        browser: &dyn Browser,
        font: &FontIdentity,
        filters: &[String],
        page_timeout: Option<Duration>,
    ) -> Result<Vec<VariantTarget>, FontError> {
        println!("🔎 Searching for your font: {font}");
        let search = self.search_url_for(&font.display_name());
        let results = match rendered_links(browser, &search, page_timeout).await {
            Ok(links) => links,
            Err(e) => {
                warn!("search for {font} failed: {e}");
                return Ok(Vec::new());
            }
        };

        let Some(family) = self.pick_family(font, &results) else {
            println!("❌ Font not found");
            return Ok(Vec::new());
        };
        info!(
            "resolved {font} to {}/{} ({} search links)",
            family.foundry,
            family.family,
            results.len()
        );
        println!("✅ Font found\n🔎 Searching for available weights");

        let family_url = family.family_url(&self.store_url);
        let links = match rendered_links(browser, &family_url, page_timeout).await {
            Ok(links) => links,
            Err(e) => {
                warn!("family page {family_url} failed: {e}");
                return Ok(Vec::new());
            }
        };

        let targets = self.variants(font, &family, &links, filters);
        if targets.is_empty() {
            println!("❌ Font weights not found");
        } else {
            println!("✅ Found {} weights", targets.len());
        }
        Ok(targets)
    }
}

/// Deterministic enumeration over the closed width and weight sets.
#[derive(Debug, Clone)]
pub struct Templating {
    pub store_url: Url,
    pub foundry: String,
    /// Placeholders: `{store}`, `{foundry}`, `{family}`, `{width}`,
    /// `{weight}`, `{variant}`.
    pub url_template: String,
    pub root: PathBuf,
    pub probe: bool,
}

impl Templating {
    /// Reads `[WIDTH [WEIGHT]]`, each possibly `*`.
    pub fn selection(filters: &[String]) -> Result<(Vec<Width>, Vec<Weight>), FontError> {
        if filters.len() > 2 {
            return Err(FontError::Filter(format!(
                "expected at most a width and a weight, got {}",
                filters.join(" ")
            )));
        }
        let widths = match filters.first().map(String::as_str) {
            None | Some(WILDCARD) => Width::ALL.to_vec(),
            Some(width) => vec![width.parse().map_err(FontError::Filter)?],
        };
        let weights = match filters.get(1).map(String::as_str) {
            None | Some(WILDCARD) => Weight::ALL.to_vec(),
            Some(weight) => vec![weight.parse().map_err(FontError::Filter)?],
        };
        Ok((widths, weights))
    }

    pub fn page_url(&self, font: &FontIdentity, spec: &VariantSpec) -> String {
        let width = spec.width.map(|w| w.label()).unwrap_or_default();
        let weight = match &spec.weight {
            WeightClass::Named(w) => w.label().to_string(),
            WeightClass::Label(l) => l.clone(),
        };
        self.url_template
            .replace("{store}", self.store_url.as_str().trim_end_matches('/'))
            .replace("{foundry}", &self.foundry)
            .replace("{family}", &font.slug())
            .replace("{width}", &slugify(width))
            .replace("{weight}", &slugify(&weight))
            .replace("{variant}", &spec.slug())
    }
}

#[async_trait]
impl VariantSource for Templating {
    async fn resolve(
        &self,
        _browser: &dyn Browser,
        font: &FontIdentity,
        filters: &[String],
        _page_timeout: Option<Duration>,
    ) -> Result<Vec<VariantTarget>, FontError> {
        let (widths, weights) = Self::selection(filters)?;
        let font = font.clone().with_namespace(self.foundry.clone());

        let targets: Vec<VariantTarget> = widths
            .iter()
            .flat_map(|&width| weights.iter().map(move |&weight| VariantSpec::grid(width, weight)))
            .map(|spec| {
                let url = self.page_url(&font, &spec);
                VariantTarget::new(&self.root, &font, spec, url).probed(self.probe)
            })
            .collect();
        debug!("templated {} targets for {font}", targets.len());
        Ok(targets)
    }
}

/// Renders `url` in a fresh tab and returns its anchors.
async fn rendered_links(
    browser: &dyn Browser,
    url: &str,
    timeout: Option<Duration>,
) -> Result<Vec<String>, SessionError> {
    let mut page = browser.open_page().await?;
    let links = async {
        navigate_within(page.as_mut(), url, timeout).await?;
        page.links().await
    }
    .await;
    if let Err(e) = page.close().await {
        warn!("closing tab for {url} failed: {e}");
    }
    links
}

fn normalize_label(label: &str) -> String {
    deslugify(label)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
