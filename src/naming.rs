//! Font identities, variant specs and the on-disk layout derived from them.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::classify::ASSET_EXTENSION;

/// Token selecting every known value of an axis.
pub const WILDCARD: &str = "*";

/// Normalized font name plus the foundry namespace it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontIdentity {
    key: String,
    namespace: Option<String>,
}

impl FontIdentity {
    /// Normalizes user input. Returns `None` for a blank name.
    pub fn new(raw: &str) -> Option<Self> {
        let key = raw
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        (!key.is_empty()).then_some(Self {
            key,
            namespace: None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Lowercase, single-spaced identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Catalog slug, e.g. `acme-sans`.
    pub fn slug(&self) -> String {
        self.key.replace(' ', "-")
    }

    /// e.g. `Acme Sans`.
    pub fn display_name(&self) -> String {
        capitalize_words(&self.key)
    }

    /// Directory holding this family's files, e.g. `Acme-Sans`.
    pub fn dir_name(&self) -> String {
        self.display_name().replace(' ', "-")
    }
}

impl fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Width class used by the templating strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    UltraCondensed,
    Condensed,
    Default,
    Extended,
    UltraExtended,
}

impl Width {
    pub const ALL: [Width; 5] = [
        Width::UltraCondensed,
        Width::Condensed,
        Width::Default,
        Width::Extended,
        Width::UltraExtended,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Width::UltraCondensed => "Ultra Condensed",
            Width::Condensed => "Condensed",
            Width::Default => "Default",
            Width::Extended => "Extended",
            Width::UltraExtended => "Ultra Extended",
        }
    }
}

impl FromStr for Width {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Width::ALL
            .into_iter()
            .find(|w| squash(w.label()) == wanted)
            .ok_or_else(|| format!("unknown width `{s}`"))
    }
}

/// Weight class used by the templating strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    Thin,
    Light,
    Book,
    Regular,
    Medium,
    SemiBold,
    Bold,
    Black,
}

impl Weight {
    pub const ALL: [Weight; 8] = [
        Weight::Thin,
        Weight::Light,
        Weight::Book,
        Weight::Regular,
        Weight::Medium,
        Weight::SemiBold,
        Weight::Bold,
        Weight::Black,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Weight::Thin => "Thin",
            Weight::Light => "Light",
            Weight::Book => "Book",
            Weight::Regular => "Regular",
            Weight::Medium => "Medium",
            Weight::SemiBold => "Semi Bold",
            Weight::Bold => "Bold",
            Weight::Black => "Black",
        }
    }
}

impl FromStr for Weight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Weight::ALL
            .into_iter()
            .find(|w| squash(w.label()) == wanted)
            .ok_or_else(|| format!("unknown weight `{s}`"))
    }
}

/// A weight from the closed set, or a label scraped from a family page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeightClass {
    Named(Weight),
    Label(String),
}

impl WeightClass {
    fn words(&self) -> String {
        match self {
            WeightClass::Named(w) => w.label().to_lowercase(),
            WeightClass::Label(l) => l.to_lowercase(),
        }
    }
}

/// One (width, weight) combination of a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub width: Option<Width>,
    pub weight: WeightClass,
}

impl VariantSpec {
    pub fn weight_only(label: impl Into<String>) -> Self {
        Self {
            width: None,
            weight: WeightClass::Label(label.into()),
        }
    }

    pub fn grid(width: Width, weight: Weight) -> Self {
        Self {
            width: Some(width),
            weight: WeightClass::Named(weight),
        }
    }

    /// Width words that belong in names; the default width contributes none.
    fn width_words(&self) -> Option<&'static str> {
        self.width
            .filter(|w| *w != Width::Default)
            .map(|w| w.label())
    }

    /// Human-readable variant name, e.g. `Condensed Semi Bold`.
    pub fn display_name(&self) -> String {
        let words = match self.width_words() {
            Some(width) => format!("{} {}", width, self.weight.words()),
            None => self.weight.words(),
        };
        capitalize_words(&words.replace('-', " "))
    }

    /// Slug of the variant alone, e.g. `condensed-semi-bold`.
    pub fn slug(&self) -> String {
        slugify(&self.display_name())
    }

    /// Collision-safe file key, e.g. `acme-sans-condensed-bold`.
    pub fn file_key(&self, font: &FontIdentity) -> String {
        slugify(&format!("{} {}", font.key(), self.display_name()))
    }
}

/// A variant bound to the page that should serve it and where it lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTarget {
    pub spec: VariantSpec,
    pub page_url: String,
    pub dest: PathBuf,
    /// Check the page is reachable before rendering it.
    pub probe: bool,
}

impl VariantTarget {
    pub fn new(root: &Path, font: &FontIdentity, spec: VariantSpec, page_url: String) -> Self {
        let dest = destination_path(root, font, &spec);
        Self {
            spec,
            page_url,
            dest,
            probe: false,
        }
    }

    pub fn probed(mut self, probe: bool) -> Self {
        self.probe = probe;
        self
    }
}

/// `<root>/<Family>[/<Width>]/<family-variant>.woff2`.
pub fn destination_path(root: &Path, font: &FontIdentity, spec: &VariantSpec) -> PathBuf {
    let mut path = root.join(font.dir_name());
    if let Some(width) = spec.width {
        path.push(width.label().replace(' ', "-"));
    }
    path.push(format!("{}.{ASSET_EXTENSION}", spec.file_key(font)));
    path
}

/// Uppercases the first character of each space-separated word.
pub fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase, hyphen-joined, no empty runs.
pub fn slugify(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Turns a catalog slug like `semi-bold` back into `semi bold`.
pub fn deslugify(slug: &str) -> String {
    slug.replace('-', " ")
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> FontIdentity {
        FontIdentity::new("Acme Sans").unwrap()
    }

    #[test]
    fn identity_ignores_case_and_whitespace() {
        let a = FontIdentity::new("  acme   SANS ").unwrap();
        let b = FontIdentity::new("Acme-Sans").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.slug(), "acme-sans");
        assert_eq!(a.dir_name(), "Acme-Sans");
    }

    #[test]
    fn blank_identity_is_rejected() {
        assert!(FontIdentity::new("   ").is_none());
    }

    #[test]
    fn weight_only_destination() {
        let path = destination_path(Path::new("fonts"), &acme(), &VariantSpec::weight_only("Bold"));
        assert_eq!(path, Path::new("fonts/Acme-Sans/acme-sans-bold.woff2"));
    }

    #[test]
    fn discovered_labels_keep_their_words() {
        let spec = VariantSpec::weight_only("semi bold italic");
        assert_eq!(spec.display_name(), "Semi Bold Italic");
        assert_eq!(spec.file_key(&acme()), "acme-sans-semi-bold-italic");
    }

    #[test]
    fn grid_destination_nests_by_width() {
        let spec = VariantSpec::grid(Width::UltraCondensed, Weight::SemiBold);
        let path = destination_path(Path::new("fonts"), &acme(), &spec);
        assert_eq!(
            path,
            Path::new("fonts/Acme-Sans/Ultra-Condensed/acme-sans-ultra-condensed-semi-bold.woff2")
        );
    }

    #[test]
    fn default_width_adds_no_words() {
        let spec = VariantSpec::grid(Width::Default, Weight::Bold);
        assert_eq!(spec.display_name(), "Bold");
        let path = destination_path(Path::new("fonts"), &acme(), &spec);
        assert_eq!(path, Path::new("fonts/Acme-Sans/Default/acme-sans-bold.woff2"));
    }

    #[test]
    fn paths_are_deterministic() {
        let spec = VariantSpec::weight_only("Regular");
        let first = destination_path(Path::new("out"), &FontIdentity::new("acme sans").unwrap(), &spec);
        let second = destination_path(Path::new("out"), &FontIdentity::new("ACME Sans").unwrap(), &spec);
        assert_eq!(first, second);
    }

    #[test]
    fn parses_axes_loosely() {
        assert_eq!("semibold".parse::<Weight>(), Ok(Weight::SemiBold));
        assert_eq!("Semi-Bold".parse::<Weight>(), Ok(Weight::SemiBold));
        assert_eq!("ultra condensed".parse::<Width>(), Ok(Width::UltraCondensed));
        assert!("wide".parse::<Width>().is_err());
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("acme sans bold"), "Acme Sans Bold");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme  Sans -- Bold"), "acme-sans-bold");
        assert_eq!(deslugify("extra-bold"), "extra bold");
    }

    #[test]
    fn slugify_keeps_underscores() {
        assert_eq!(slugify("Bold_Italic"), "bold_italic");
        assert_ne!(slugify("bold_italic"), slugify("bold italic"));
    }
}
