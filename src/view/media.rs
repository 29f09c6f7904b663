//! Media pseudo-tag converters.
//!
//! Each pass recognizes one textual notation and replaces it with fully styled markup. The
//! patterns are deliberately loose (no real tag parser, lazy bodies that stop at the first closing
//! tag on the same line) and a notation that does not match exactly is left as text for the
//! escaper.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{trace, warn};

use super::escape::{html_escape, js_string_escape};
use super::host::HostBindings;
use super::pipeline::Fragments;

static IMAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<image(?:\s+alt="([^"]*)")?(?:\s+width="([^"]*)")?(?:\s+height="([^"]*)")?>(.*?)</image>"#,
    )
    .expect("image pseudo-tag regex")
});

static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(https?://[^\s<>"]+\.(jpg|jpeg|png|gif|bmp|webp|svg))(?:\s|$|[<>"'])"#)
        .expect("image url regex")
});

static VIDEO_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<video(?:\s+src="([^"]*)")?(?:\s+width="([^"]*)")?(?:\s+height="([^"]*)")?>(.*?)</video>"#,
    )
    .expect("video pseudo-tag regex")
});

static AUDIO_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<audio(?:\s+src="([^"]*)")?>(.*?)</audio>"#).expect("audio pseudo-tag regex")
});

static IFRAME_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<iframe(?:\s+src="([^"]*)")?(?:\s+width="([^"]*)")?(?:\s+height="([^"]*)")?[^>]*>(.*?)</iframe>"#,
    )
    .expect("iframe pseudo-tag regex")
});

static IMG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\s+([^>]*?)>").expect("img tag regex"));

static SRC_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)src\s*=\s*["']([^"']*?)["']"#).expect("src attribute regex")
});
static ALT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)alt\s*=\s*["']([^"']*?)["']"#).expect("alt attribute regex")
});
static WIDTH_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)width\s*=\s*["']([^"']*?)["']"#).expect("width attribute regex")
});

/// Base64 payloads are accepted with or without trailing padding and with non-zero trailing bits,
/// as browsers decode them.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode check on the payload with ASCII whitespace removed.
fn validate_payload(payload: &str) -> Result<(), base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    PAYLOAD_ENGINE.decode(compact).map(|_| ())
}

const IMAGE_STYLE_TAIL: &str = "border-radius: 4px; cursor: pointer; display: block; margin: 8px 0;";

/// Inline marker for an `<image>` payload that cannot be decoded.
pub const INVALID_IMAGE_MARKER: &str = r#"<div class="media-error">Invalid image data</div>"#;

/// Iframe sandbox permissions for embedded content.
pub const IFRAME_SANDBOX: &str = "allow-scripts allow-same-origin allow-forms";

/// Capture group as `&str`, treating an empty capture like a missing one.
fn non_empty<'t>(caps: &Captures<'t>, group: usize) -> Option<&'t str> {
    caps.get(group).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

/// `onerror` handler that hides the image and inserts a visible placeholder after it.
fn error_fallback_handler(message: &str) -> String {
    let placeholder = format!(r#"<div class="media-error">{}</div>"#, html_escape(message));
    format!(
        "this.style.display='none'; this.insertAdjacentHTML('afterend', '{}')",
        js_string_escape(&placeholder)
    )
}

/// Interactive `<img>` element shared by every image-producing pass.
fn image_markup(src: &str, alt: &str, size_style: &str, onclick: &str, error_message: &str) -> String {
    format!(
        r#"<img src="{src}" alt="{alt}" style="{style}" onclick="{onclick}" onerror="{onerror}" />"#,
        src = html_escape(src),
        alt = html_escape(alt),
        style = html_escape(&format!("{size_style} {IMAGE_STYLE_TAIL}")),
        onclick = html_escape(onclick),
        onerror = html_escape(&error_fallback_handler(error_message)),
    )
}

fn open_url_call(host: &HostBindings, url: &str) -> String {
    host.open_media_call(&format!("'{}'", js_string_escape(url)))
}

/// `<image alt? width? height?>BASE64</image>` to an inline data-URL image.
pub(crate) fn convert_image_tags(fragments: Fragments, host: &HostBindings) -> Fragments {
    fragments.rewrite_text(&IMAGE_TAG_RE, |caps, out| {
        let payload = caps.get(4).map_or("", |m| m.as_str()).trim();
        if let Err(err) = validate_payload(payload) {
            warn!(
                component = "media",
                operation = "convert_image_tag",
                payload_len = payload.len(),
                error = %err,
                "Invalid image payload"
            );
            out.push_markup(INVALID_IMAGE_MARKER.to_string());
            return true;
        }

        let alt = non_empty(caps, 1).unwrap_or("Image Attachment");
        let width = non_empty(caps, 2).map_or_else(|| "max-width: 400px;".to_string(), |w| format!("width: {w};"));
        let height = non_empty(caps, 3).map_or_else(|| "height: auto;".to_string(), |h| format!("height: {h};"));
        trace!(component = "media", operation = "convert_image_tag", payload_len = payload.len());

        out.push_markup(image_markup(
            &format!("data:image/jpeg;base64,{payload}"),
            alt,
            &format!("{width} {height}"),
            &host.open_media_call("this.src"),
            "Failed to load image",
        ));
        true
    })
}

/// Bare image URLs to `<img>`. The terminator after the URL is consumed and a single space
/// follows the generated tag.
pub(crate) fn convert_image_urls(fragments: Fragments, host: &HostBindings) -> Fragments {
    fragments.rewrite_text(&IMAGE_URL_RE, |caps, out| {
        let Some(url) = caps.get(1).map(|m| m.as_str()) else {
            return false;
        };
        out.push_markup(image_markup(
            url,
            &format!("Image from {url}"),
            "max-width: 400px; height: auto;",
            &open_url_call(host, url),
            &format!("Failed to load image from {url}"),
        ));
        out.push_text(" ");
        true
    })
}

/// `<video src? width? height?>URL?</video>`; the source comes from `src`, else the body.
pub(crate) fn convert_video_tags(fragments: Fragments) -> Fragments {
    fragments.rewrite_text(&VIDEO_TAG_RE, |caps, out| {
        let Some(src) = non_empty(caps, 1).or_else(|| non_empty(caps, 4)) else {
            return false;
        };
        let width = non_empty(caps, 2).map_or_else(|| "max-width: 100%;".to_string(), |w| format!("width: {w};"));
        let height = non_empty(caps, 3).map_or_else(|| "height: auto;".to_string(), |h| format!("height: {h};"));
        out.push_markup(format!(
            r#"<video controls style="{style}"><source src="{src}" type="video/mp4">Your browser does not support the video tag.</video>"#,
            style = html_escape(&format!("{width} {height} border-radius: 4px; margin: 8px 0;")),
            src = html_escape(src),
        ));
        true
    })
}

/// `<audio src?>URL?</audio>`; the source comes from `src`, else the body.
pub(crate) fn convert_audio_tags(fragments: Fragments) -> Fragments {
    fragments.rewrite_text(&AUDIO_TAG_RE, |caps, out| {
        let Some(src) = non_empty(caps, 1).or_else(|| non_empty(caps, 2)) else {
            return false;
        };
        out.push_markup(format!(
            r#"<audio controls style="width: 100%; margin: 8px 0;"><source src="{}" type="audio/mpeg">Your browser does not support the audio tag.</audio>"#,
            html_escape(src),
        ));
        true
    })
}

/// `<iframe src width? height? ...>...</iframe>` to a sandboxed, lazily loaded iframe.
pub(crate) fn convert_iframe_tags(fragments: Fragments) -> Fragments {
    fragments.rewrite_text(&IFRAME_TAG_RE, |caps, out| {
        let Some(src) = non_empty(caps, 1) else {
            return false;
        };
        out.push_markup(format!(
            r#"<iframe src="{src}" width="{width}" height="{height}" style="border: 1px solid #ccc; border-radius: 4px; margin: 8px 0;" sandbox="{IFRAME_SANDBOX}" loading="lazy"></iframe>"#,
            src = html_escape(src),
            width = html_escape(non_empty(caps, 2).unwrap_or("100%")),
            height = html_escape(non_empty(caps, 3).unwrap_or("400px")),
        ));
        true
    })
}

/// Normalize `<img>` tags from the input to the interactive image contract.
pub(crate) fn convert_existing_img_tags(fragments: Fragments, host: &HostBindings) -> Fragments {
    fragments.rewrite_text(&IMG_TAG_RE, |caps, out| {
        let attributes = caps.get(1).map_or("", |m| m.as_str());
        let Some(src) = SRC_ATTR_RE
            .captures(attributes)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            return false;
        };
        let alt = ALT_ATTR_RE
            .captures(attributes)
            .and_then(|c| c.get(1))
            .map_or_else(|| format!("Image from {src}"), |m| m.as_str().to_string());
        let width = WIDTH_ATTR_RE
            .captures(attributes)
            .and_then(|c| c.get(1))
            .map_or("400px", |m| m.as_str());

        out.push_markup(image_markup(
            src,
            &alt,
            &format!("max-width: {width}; height: auto;"),
            &open_url_call(host, src),
            &format!("Failed to load image from {src}"),
        ));
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::pipeline::Fragment;

    fn host() -> HostBindings {
        HostBindings::default()
    }

    fn markup_of(fragments: &Fragments) -> Vec<&str> {
        fragments
            .as_slice()
            .iter()
            .filter_map(|f| match f {
                Fragment::Markup(m) => Some(m.as_str()),
                Fragment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_image_tag_with_alt() {
        let out = convert_image_tags(Fragments::from_text(r#"<image alt="cat">QUJD</image>"#), &host());
        let markup = markup_of(&out);
        assert_eq!(markup.len(), 1);
        assert!(markup[0].contains(r#"src="data:image/jpeg;base64,QUJD""#));
        assert!(markup[0].contains(r#"alt="cat""#));
        assert!(markup[0].contains("max-width: 400px; height: auto;"));
        assert!(markup[0].contains(r#"onclick="openImageModal(this.src, 1000)""#));
        assert!(markup[0].contains("Failed to load image"));
    }

    #[test]
    fn test_image_tag_defaults_and_sizes() {
        let out = convert_image_tags(
            Fragments::from_text(r#"<image width="120px" height="80px">QUJD</image>"#),
            &host(),
        );
        let html = out.render();
        assert!(html.contains(r#"alt="Image Attachment""#));
        assert!(html.contains("width: 120px; height: 80px;"));
    }

    #[test]
    fn test_image_tag_invalid_payload_becomes_marker() {
        let out = convert_image_tags(Fragments::from_text("a <image>not base64!</image> b"), &host());
        assert_eq!(out.render(), format!("a {INVALID_IMAGE_MARKER} b"));
    }

    #[test]
    fn test_image_tag_accepts_browser_decodable_payloads() {
        // Non-zero trailing bits, then inner whitespace.
        for payload in ["QUJDRB", "QUJD RUZH", "QUJD  RUZH"] {
            let input = format!("<image>{payload}</image>");
            let html = convert_image_tags(Fragments::from_text(&input), &host()).render();
            assert!(!html.contains(INVALID_IMAGE_MARKER), "{payload:?} rejected");
            assert!(html.starts_with(&format!(r#"<img src="data:image/jpeg;base64,{}""#, html_escape(payload))));
        }
    }

    #[test]
    fn test_image_tag_attribute_order_is_strict() {
        // alt must come before width; any other order is not recognized.
        let input = r#"<image width="1" alt="x">QUJD</image>"#;
        let out = convert_image_tags(Fragments::from_text(input), &host());
        assert_eq!(out.render(), input);
    }

    #[test]
    fn test_generated_markup_has_no_raw_angle_brackets_in_attributes() {
        let out = convert_image_tags(Fragments::from_text("<image>QUJD</image>"), &host());
        let html = out.render();
        // Only the tag's own opening '<' and closing '>'.
        assert_eq!(html.matches('<').count(), 1);
        assert_eq!(html.matches('>').count(), 1);
    }

    #[test]
    fn test_image_url_consumes_terminator_and_adds_space() {
        let out = convert_image_urls(Fragments::from_text("look https://x.io/a.PNG\"rest"), &host());
        let html = out.render();
        assert!(html.starts_with(r#"look <img src="https://x.io/a.PNG""#));
        assert!(html.ends_with("/> rest"));
        assert!(html.contains("openImageModal(&#39;https://x.io/a.PNG&#39;, 1000)"));
    }

    #[test]
    fn test_image_url_at_end_of_input() {
        let out = convert_image_urls(Fragments::from_text("https://x.io/a.webp"), &host());
        assert_eq!(markup_of(&out).len(), 1);
        assert!(out.render().ends_with(' '));
    }

    #[test]
    fn test_image_url_needs_terminator() {
        let input = "https://x.io/a.png, then text";
        let out = convert_image_urls(Fragments::from_text(input), &host());
        assert_eq!(out.render(), input);
    }

    #[test]
    fn test_video_src_from_attribute_or_body() {
        let out = convert_video_tags(Fragments::from_text(r#"<video src="a.mp4"></video>"#));
        assert!(out.render().contains(r#"<source src="a.mp4" type="video/mp4">"#));

        let out = convert_video_tags(Fragments::from_text("<video>b.mp4</video>"));
        assert!(out.render().contains(r#"<source src="b.mp4" type="video/mp4">"#));
        assert!(out.render().contains("max-width: 100%; height: auto;"));
    }

    #[test]
    fn test_video_without_source_is_unchanged() {
        let input = "<video></video>";
        let out = convert_video_tags(Fragments::from_text(input));
        assert_eq!(out.render(), input);
        assert!(markup_of(&out).is_empty());
    }

    #[test]
    fn test_audio_tags() {
        let out = convert_audio_tags(Fragments::from_text(r#"<audio src="s.mp3"></audio>"#));
        let html = out.render();
        assert!(html.starts_with(r#"<audio controls style="width: 100%; margin: 8px 0;">"#));
        assert!(html.contains(r#"<source src="s.mp3" type="audio/mpeg">"#));
    }

    #[test]
    fn test_iframe_requires_src() {
        let out = convert_iframe_tags(Fragments::from_text(
            r#"<iframe src="https://e.com" height="200px"></iframe>"#,
        ));
        let html = out.render();
        assert!(html.contains(r#"width="100%""#));
        assert!(html.contains(r#"height="200px""#));
        assert!(html.contains(r#"sandbox="allow-scripts allow-same-origin allow-forms""#));
        assert!(html.contains(r#"loading="lazy""#));

        let input = r#"<iframe width="1"></iframe>"#;
        let out = convert_iframe_tags(Fragments::from_text(input));
        assert_eq!(out.render(), input);
    }

    #[test]
    fn test_existing_img_is_normalized() {
        let out = convert_existing_img_tags(
            Fragments::from_text(r#"<img src='/a/b.png' width="50px">"#),
            &host(),
        );
        let html = out.render();
        assert!(html.contains(r#"src="/a/b.png""#));
        assert!(html.contains(r#"alt="Image from /a/b.png""#));
        assert!(html.contains("max-width: 50px; height: auto;"));
    }

    #[test]
    fn test_existing_img_without_src_is_unchanged() {
        let input = r#"<img alt="x">"#;
        let out = convert_existing_img_tags(Fragments::from_text(input), &host());
        assert_eq!(out.render(), input);
    }

    #[test]
    fn test_existing_img_drops_foreign_handlers() {
        let out = convert_existing_img_tags(
            Fragments::from_text(r#"<img src="x.png" onerror="alert(1)">"#),
            &host(),
        );
        assert!(!out.render().contains("alert(1)"));
    }
}
