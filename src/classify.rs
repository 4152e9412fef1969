//! Recognizes the outbound request that carries the font binary.

use url::Url;

/// File extension of the asset being captured.
pub const ASSET_EXTENSION: &str = "woff2";

/// Returns true when `url` ends in `/<digits>/<name>.woff2`.
///
/// The numeric segment is the catalog's versioned asset id; requests that only
/// mention the extension (trackers, preload hints) don't have it. Never panics,
/// whatever the input.
pub fn is_asset_request(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(segments) = parsed.path_segments() else {
        return false;
    };

    let segments: Vec<&str> = segments.collect();
    let [.., id, file] = segments.as_slice() else {
        return false;
    };

    let Some((stem, ext)) = file.rsplit_once('.') else {
        return false;
    };

    !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && !stem.is_empty()
        && ext.eq_ignore_ascii_case(ASSET_EXTENSION)
}
