//! Key-value panel rendering.
//!
//! A message's structured fields render as a `table.msg-kvps`, one row per key in insertion
//! order. String values carrying a media scheme (`img://`, `video://`, ...) become media
//! elements pointed at the host's fetch endpoints; everything else goes through the conversion
//! pipeline into a copyable text block.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::escape::html_escape;
use super::host::{Endpoints, RenderContext};
use super::media::IFRAME_SANDBOX;
use super::pipeline::{Converter, value_to_text};

/// Ordered key-value fields attached to a message.
pub type Kvps = Map<String, Value>;

/// Keys whose rows get the `msg-thoughts` marker.
const THOUGHT_KEYS: [&str; 2] = ["thoughts", "reflection"];

pub(crate) const COPY_BUTTON: &str = r#"<button class="copy-button" type="button">Copy</button>"#;

/// Media scheme prefix on a key-value string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaScheme {
    Image,
    Video,
    Audio,
    Iframe,
    Embed,
    Pdf,
}

impl MediaScheme {
    pub const ALL: [MediaScheme; 6] = [
        MediaScheme::Image,
        MediaScheme::Video,
        MediaScheme::Audio,
        MediaScheme::Iframe,
        MediaScheme::Embed,
        MediaScheme::Pdf,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            MediaScheme::Image => "img://",
            MediaScheme::Video => "video://",
            MediaScheme::Audio => "audio://",
            MediaScheme::Iframe => "iframe://",
            MediaScheme::Embed => "embed://",
            MediaScheme::Pdf => "pdf://",
        }
    }

    /// Scheme of `value` and the remainder after the prefix.
    pub fn detect(value: &str) -> Option<(Self, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|scheme| value.strip_prefix(scheme.prefix()).map(|rest| (scheme, rest)))
    }

    /// Source URL for the remainder of a scheme-prefixed value.
    pub fn resolve(self, rest: &str, endpoints: &Endpoints) -> String {
        match self {
            MediaScheme::Image => format!("{}{}", endpoints.image, rest),
            MediaScheme::Video | MediaScheme::Audio => format!("{}{}", endpoints.media, rest),
            MediaScheme::Iframe | MediaScheme::Embed => rest.to_string(),
            MediaScheme::Pdf => format!("{}{}", endpoints.pdf, rest),
        }
    }
}

/// Display label for a key: `_` to space, lower-cased, each ASCII word capitalized.
pub fn title_case_key(key: &str) -> String {
    let lowered = key.replace('_', " ").to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_word = false;
    for c in lowered.chars() {
        let word_char = c.is_ascii_alphanumeric() || c == '_';
        if word_char && !in_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        in_word = word_char;
    }
    out
}

fn render_media(scheme: MediaScheme, rest: &str, ctx: &RenderContext) -> String {
    let src = html_escape(&scheme.resolve(rest, &ctx.endpoints));
    match scheme {
        MediaScheme::Image => format!(
            r#"<img class="kvps-img" src="{src}" alt="Image Attachment" style="cursor: pointer;" onclick="{}" />"#,
            html_escape(&ctx.host.open_media_call("this.src"))
        ),
        MediaScheme::Video => format!(
            r#"<video class="kvps-video" src="{src}" controls style="max-width: 100%; height: auto;"></video>"#
        ),
        MediaScheme::Audio => format!(
            r#"<audio class="kvps-audio" src="{src}" controls style="width: 100%;"></audio>"#
        ),
        MediaScheme::Iframe | MediaScheme::Embed => format!(
            r#"<iframe class="kvps-iframe" src="{src}" style="width: 100%; height: 300px; border: 1px solid #ccc; border-radius: 4px;" sandbox="{IFRAME_SANDBOX}" loading="lazy"></iframe>"#
        ),
        MediaScheme::Pdf => format!(
            r#"<iframe class="kvps-pdf" src="{src}" style="width: 100%; height: 400px; border: 1px solid #ccc; border-radius: 4px;"></iframe>"#
        ),
    }
}

fn render_text(value: &Value, math: bool, converter: &Converter<'_>) -> String {
    let math_attr = if math { r#" data-math="true""# } else { "" };
    format!(
        r#"<pre class="kvps-val"><span data-copy="text"{math_attr}>{}</span></pre>"#,
        converter.convert(&value_to_text(value))
    )
}

/// Render one value entry. Returns whether it was a text block.
fn render_entry(cell: &mut String, value: &Value, math: bool, ctx: &RenderContext) -> bool {
    if let Value::String(s) = value
        && let Some((scheme, rest)) = MediaScheme::detect(s)
    {
        trace!(component = "kvps", operation = "render_media", scheme = scheme.prefix());
        cell.push_str(&render_media(scheme, rest, ctx));
        return false;
    }
    cell.push_str(&render_text(value, math, &Converter::new(&ctx.host)));
    true
}

/// Append the key-value table for `kvps` to `out`. Nothing is appended when `kvps` is `None`.
///
/// Arrays render one entry per element. Rows holding at least one text block get a copy button
/// at the end of the value cell. `math` marks text blocks for the host math renderer, if there
/// is one.
pub fn render_panel(out: &mut String, kvps: Option<&Kvps>, math: bool, ctx: &RenderContext) {
    let Some(kvps) = kvps else { return };
    let math = ctx.math_available(math);

    out.push_str(r#"<table class="msg-kvps">"#);
    for (key, value) in kvps {
        let row_class = if THOUGHT_KEYS.contains(&key.as_str()) {
            "kvps-row msg-thoughts"
        } else {
            "kvps-row"
        };

        let mut cell = String::new();
        let mut has_text = false;
        match value {
            Value::Array(items) => {
                for item in items {
                    has_text |= render_entry(&mut cell, item, math, ctx);
                }
            }
            other => has_text |= render_entry(&mut cell, other, math, ctx),
        }
        if has_text {
            cell.push_str(COPY_BUTTON);
        }

        out.push_str(&format!(
            r#"<tr class="{row_class}"><td class="kvps-key">{}</td><td>{cell}</td></tr>"#,
            html_escape(&title_case_key(key))
        ));
    }
    out.push_str("</table>");

    debug!(
        component = "kvps",
        operation = "render_panel",
        rows = kvps.len(),
        math,
        "Key-value panel rendered"
    );
}
