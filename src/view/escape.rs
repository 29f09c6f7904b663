//! HTML escaping with media-tag protection.
//!
//! The pipeline escapes untrusted text only after the media converters have run, so the escaper
//! has to leave a whitelisted set of media tags alone. Anything matching [`PROTECTED_TAG_RE`] is
//! copied through verbatim and everything around it has `& < > ' "` replaced by entities.
//!
//! This is not a sanitizer: a raw `<iframe ...>` opening tag in the input is protected exactly
//! like a generated one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::pipeline::{Fragment, Fragments};

/// Self-closing/opening media tags (at least one whitespace after the name) and the closing tags
/// of elements that have a body.
static PROTECTED_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:img|video|audio|iframe)\s[^>]*/?>|</(?:video|audio|iframe)>")
        .expect("protected media tag regex")
});

/// Escape the five HTML-sensitive characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape a string for use inside a single-quoted JavaScript literal.
///
/// The result still needs [`html_escape`] when it is placed in an attribute.
pub fn js_string_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Escape `text` while keeping protected media tags byte-identical and in place.
///
/// Not idempotent: escaping already-escaped text escapes the entities again.
pub fn escape_html(text: &str) -> String {
    escape_fragments(Fragments::from_text(text)).render()
}

/// Escape every text fragment; protected tags found inside text become markup fragments.
pub(crate) fn escape_fragments(fragments: Fragments) -> Fragments {
    let mut out = Fragments::default();
    for fragment in fragments {
        match fragment {
            Fragment::Markup(markup) => out.push_markup(markup),
            Fragment::Text(text) => {
                let mut last = 0;
                for tag in PROTECTED_TAG_RE.find_iter(&text) {
                    out.push_text(&html_escape(&text[last..tag.start()]));
                    out.push_markup(tag.as_str().to_string());
                    last = tag.end();
                }
                out.push_text(&html_escape(&text[last..]));
            }
        }
    }
    out
}
