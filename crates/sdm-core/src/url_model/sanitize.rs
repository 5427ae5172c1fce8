//! Filesystem-safe title sanitization.

/// Upper bound on a sanitized title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// Name used when nothing usable survives sanitization.
pub const PLACEHOLDER_TITLE: &str = "untitled";

/// Sanitizes a human-readable title for use as a filename stem.
///
/// - Replaces `/ \ : * ? " < > |` with `-`
/// - Turns control characters (newlines, tabs, NUL, ...) into spaces
/// - Collapses whitespace runs into a single space and trims both ends
/// - Caps the result at [`TITLE_MAX_CHARS`] characters
/// - Never returns an empty string; falls back to [`PLACEHOLDER_TITLE`]
pub fn sanitize_title(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        let mapped = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() || c.is_whitespace() => ' ',
            c => c,
        };

        if mapped == ' ' {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(mapped);
    }

    let capped: String = out.chars().take(TITLE_MAX_CHARS).collect();
    let trimmed = capped.trim_end();
    if trimmed.is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
