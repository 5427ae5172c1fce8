//! Item identifier extraction from link hrefs.

use regex::Regex;
use std::sync::OnceLock;

fn item_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)/song/([a-f0-9-]{36})").expect("item path pattern is valid")
    })
}

/// Extracts the item identifier from an href such as `/song/<id>` or
/// `https://host/song/<id>?sh=...`.
///
/// Relative hrefs are matched as-is; absolute ones are parsed first so that
/// only the path participates in the match.
pub fn item_id_from_href(href: &str) -> Option<String> {
    let path = match url::Url::parse(href) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let caps = item_path_pattern().captures(&path)?;
    caps.get(1).map(|m| m.as_str().to_string())
}
