//! DOM heuristics over parsed HTML: item extraction, scroll region
//! location and the expected item count.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

use super::page::{RegionStrategy, ScrollRegion};
use crate::catalog::Sighting;
use crate::url_model::{item_id_from_href, sanitize_title};

/// Titles shorter than this (in chars) are treated as missing.
pub const MIN_TITLE_CHARS: usize = 2;

const ITEM_LINK: &str = r#"a[href*="/song/"]"#;
const VIRTUAL_SCROLLER: &str = r#"[data-virtuoso-scroller="true"]"#;
const ROW_GROUP: &str = r#"div[role="rowgroup"]"#;
const ROW_MARKERS: [&str; 3] = ["row", "clip", "item"];
const TITLE_FIELD: &str = r#"[class*="title"], [class*="name"]"#;

fn selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector is valid"))
}

fn item_link() -> &'static Selector {
    static CELL: OnceLock<Selector> = OnceLock::new();
    selector(&CELL, ITEM_LINK)
}

fn title_field() -> &'static Selector {
    static CELL: OnceLock<Selector> = OnceLock::new();
    selector(&CELL, TITLE_FIELD)
}

fn duration_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\s*(?:\d{1,2}:)?\d{1,2}:\d{2}\s*$").expect("duration pattern is valid")
    })
}

fn count_phrase() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*(songs?|เพลง)").expect("count pattern is valid")
    })
}

fn scrollable_style() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)overflow(?:-y)?\s*:\s*(?:auto|scroll)").expect("overflow pattern is valid")
    })
}

fn bounded_height() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[;\s])(?:max-)?height\s*:").expect("height pattern is valid")
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_class_marker(el: ElementRef<'_>, markers: &[&str]) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|class| markers.iter().any(|m| class.contains(m)))
}

fn is_scrollable(el: ElementRef<'_>) -> bool {
    el.value()
        .attr("style")
        .is_some_and(|style| scrollable_style().is_match(style))
}

/// Strips a trailing `M:SS` / `H:MM:SS` duration from link text.
pub fn strip_duration(text: &str) -> String {
    duration_suffix().replace(text.trim(), "").trim().to_string()
}

fn usable(title: String) -> Option<String> {
    (title.chars().count() >= MIN_TITLE_CHARS).then_some(title)
}

/// Title from the enclosing row: nearest element (the link included) whose
/// class marks a row, then its first title-like descendant.
fn row_title(link: ElementRef<'_>) -> Option<String> {
    let row = std::iter::once(link)
        .chain(link.ancestors().filter_map(ElementRef::wrap))
        .find(|el| has_class_marker(*el, &ROW_MARKERS))?;
    let field = row.select(title_field()).next()?;
    usable(collapse_ws(&text_of(field)))
}

fn sighting_for(link: ElementRef<'_>) -> Option<Sighting> {
    let href = link.value().attr("href")?;
    let id = item_id_from_href(href)?;
    let title = usable(strip_duration(&collapse_ws(&text_of(link))))
        .or_else(|| row_title(link))
        .map(|t| sanitize_title(&t));
    Some(Sighting::new(id, title, href))
}

/// Every item link in document order, first occurrence per id.
/// A `None` title means the catalog should synthesize one.
pub fn extract_sightings(doc: &Html) -> Vec<Sighting> {
    let mut seen = HashSet::new();
    doc.select(item_link())
        .filter_map(sighting_for)
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

/// `tag#id.class1.class2` for log lines and region handles.
pub fn element_label(el: ElementRef<'_>) -> String {
    let v = el.value();
    let mut label = v.name().to_string();
    if let Some(id) = v.id() {
        label.push('#');
        label.push_str(id);
    }
    for class in v.classes() {
        label.push('.');
        label.push_str(class);
    }
    label
}

fn region(strategy: RegionStrategy, el: ElementRef<'_>) -> ScrollRegion {
    ScrollRegion {
        strategy,
        handle: element_label(el),
    }
}

/// Finds the list's scroll container, most specific strategy first.
///
/// Static markup has no layout, so "overflows its own height" is read from
/// the inline style: a scrollable overflow plus a declared height.
pub fn locate_region(doc: &Html) -> ScrollRegion {
    static SCROLLER: OnceLock<Selector> = OnceLock::new();
    static ROWS: OnceLock<Selector> = OnceLock::new();
    static DIVS: OnceLock<Selector> = OnceLock::new();

    if let Some(el) = doc.select(selector(&SCROLLER, VIRTUAL_SCROLLER)).next() {
        return region(RegionStrategy::VirtualScroller, el);
    }

    if let Some(rows) = doc.select(selector(&ROWS, ROW_GROUP)).next() {
        let scrollable = rows
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|el| el.value().name() != "body")
            .find(|el| is_scrollable(*el));
        if let Some(el) = scrollable {
            return region(RegionStrategy::RowGroupAncestor, el);
        }
    }

    let overflowing = doc.select(selector(&DIVS, "div")).find(|el| {
        is_scrollable(*el)
            && el
                .value()
                .attr("style")
                .is_some_and(|s| bounded_height().is_match(s))
            && el.select(item_link()).next().is_some()
    });
    if let Some(el) = overflowing {
        return region(RegionStrategy::OverflowingContainer, el);
    }

    ScrollRegion::document_root()
}

/// All text nodes of the document, space separated.
pub fn page_text(doc: &Html) -> String {
    text_of(doc.root_element())
}

/// First "<n> songs" phrase in `text`. Advisory only.
pub fn expected_count(text: &str) -> Option<u32> {
    count_phrase()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
