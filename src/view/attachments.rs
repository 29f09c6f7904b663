//! User message attachments.
//!
//! The `attachments` key-value entry of a user message is a list whose items are either a bare
//! filename or a media record `{type, url, name, extension}`. Each item renders as an
//! `attachment-item` preview with a filename/extension caption.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::escape::{html_escape, js_string_escape};
use super::host::HostBindings;
use super::media::IFRAME_SANDBOX;

/// Preview kind of a media attachment record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Iframe,
    Embed,
    Pdf,
    /// Anything else renders as a generic file.
    #[default]
    #[serde(other)]
    File,
}

/// A media attachment record. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaAttachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
    pub name: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attachment {
    /// Plain filename without metadata.
    File(String),
    Media(MediaAttachment),
}

/// Parse the `attachments` value of a user message.
///
/// Items that are neither a string nor a well-formed record are skipped with a warning.
pub fn parse_attachments(value: Option<&Value>) -> Vec<Attachment> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(
                component = "attachments",
                operation = "parse_attachments",
                found = json_type(other),
                "Ignoring attachments value that is not a list"
            );
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            match serde_json::from_value::<Attachment>(item.clone()) {
                Ok(attachment) => Some(attachment),
                Err(err) => {
                    warn!(
                        component = "attachments",
                        operation = "parse_attachments",
                        index,
                        error = %err,
                        "Skipping malformed attachment record"
                    );
                    None
                }
            }
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extension of a bare filename: the last `.`-separated component, or the whole name.
fn filename_extension(filename: &str) -> &str {
    filename.rsplit('.').next().unwrap_or(filename)
}

fn file_info(name: &str, extension: &str) -> String {
    format!(
        r#"<div class="file-info"><span class="filename">{}</span><span class="extension">{}</span></div>"#,
        html_escape(name),
        html_escape(extension)
    )
}

fn file_preview(name: &str, extension: &str) -> String {
    format!(
        r#"<div class="attachment-item file-type"><div class="file-preview"><span class="filename">{}</span><span class="extension">{}</span></div></div>"#,
        html_escape(name),
        html_escape(&extension.to_uppercase())
    )
}

fn media_item(wrapper_class: &str, preview: String, caption: String) -> String {
    format!(
        r#"<div class="attachment-item"><div class="{wrapper_class}">{preview}</div>{caption}</div>"#
    )
}

/// Markup for one attachment.
pub fn render_attachment(attachment: &Attachment, host: &HostBindings) -> String {
    let media = match attachment {
        Attachment::File(filename) => {
            return file_preview(filename, filename_extension(filename));
        }
        Attachment::Media(media) => media,
    };
    let url = html_escape(&media.url);
    let caption = file_info(&media.name, &media.extension.to_uppercase());

    match media.kind {
        AttachmentKind::Image => {
            let onclick = host.open_media_call(&format!("'{}'", js_string_escape(&media.url)));
            media_item(
                "image-wrapper",
                format!(
                    r#"<img src="{url}" alt="{}" class="attachment-preview" style="cursor: pointer;" onclick="{}" />"#,
                    html_escape(&media.name),
                    html_escape(&onclick)
                ),
                caption,
            )
        }
        AttachmentKind::Video => media_item(
            "video-wrapper",
            format!(
                r#"<video src="{url}" controls class="attachment-preview video-preview" style="max-width: 100%; height: auto;"></video>"#
            ),
            caption,
        ),
        AttachmentKind::Audio => media_item(
            "audio-wrapper",
            format!(
                r#"<audio src="{url}" controls class="attachment-preview audio-preview" style="width: 100%;"></audio>"#
            ),
            caption,
        ),
        AttachmentKind::Iframe | AttachmentKind::Embed => media_item(
            "iframe-wrapper",
            format!(
                r#"<iframe src="{url}" class="attachment-preview iframe-preview" style="width: 100%; height: 400px; border: 1px solid #ccc; border-radius: 4px;" sandbox="{IFRAME_SANDBOX}" loading="lazy"></iframe>"#
            ),
            file_info(&media.name, "EMBED"),
        ),
        AttachmentKind::Pdf => media_item(
            "pdf-wrapper",
            format!(
                r#"<iframe src="{url}" class="attachment-preview pdf-preview" style="width: 100%; height: 500px; border: 1px solid #ccc; border-radius: 4px;"></iframe>"#
            ),
            file_info(&media.name, "PDF"),
        ),
        AttachmentKind::File => file_preview(&media.name, &media.extension),
    }
}

/// Append an `attachments-container` with every attachment, or nothing for an empty list.
pub fn render_attachments(out: &mut String, attachments: &[Attachment], host: &HostBindings) {
    if attachments.is_empty() {
        return;
    }
    out.push_str(r#"<div class="attachments-container">"#);
    for attachment in attachments {
        out.push_str(&render_attachment(attachment, host));
    }
    out.push_str("</div>");
    debug!(
        component = "attachments",
        operation = "render_attachments",
        count = attachments.len(),
        "Attachments rendered"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host() -> HostBindings {
        HostBindings::default()
    }

    #[test]
    fn test_parse_mixed_list() {
        let value = json!([
            "notes.md",
            {"type": "image", "url": "/u/a.png", "name": "a.png", "extension": "png"},
            {"type": "spreadsheet", "name": "b.xlsx", "extension": "xlsx"},
        ]);
        let parsed = parse_attachments(Some(&value));
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], Attachment::File("notes.md".to_string()));
        match &parsed[1] {
            Attachment::Media(m) => assert_eq!(m.kind, AttachmentKind::Image),
            other => panic!("expected media, got {other:?}"),
        }
        match &parsed[2] {
            Attachment::Media(m) => {
                assert_eq!(m.kind, AttachmentKind::File);
                assert!(m.url.is_empty());
            }
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_skips_malformed_records() {
        let value = json!([42, "ok.txt", {"type": "video", "url": 7}]);
        let parsed = parse_attachments(Some(&value));
        assert_eq!(parsed, vec![Attachment::File("ok.txt".to_string())]);
    }

    #[test]
    fn test_parse_non_list_is_empty() {
        assert!(parse_attachments(None).is_empty());
        assert!(parse_attachments(Some(&json!(null))).is_empty());
        assert!(parse_attachments(Some(&json!("a.txt"))).is_empty());
    }

    #[test]
    fn test_bare_filename_preview() {
        let html = render_attachment(&Attachment::File("report.final.PDF".to_string()), &host());
        assert!(html.contains(r#"class="attachment-item file-type""#));
        assert!(html.contains(r#"<span class="filename">report.final.PDF</span>"#));
        assert!(html.contains(r#"<span class="extension">PDF</span>"#));

        let html = render_attachment(&Attachment::File("Makefile".to_string()), &host());
        assert!(html.contains(r#"<span class="extension">MAKEFILE</span>"#));
    }

    fn media(kind: AttachmentKind) -> Attachment {
        Attachment::Media(MediaAttachment {
            kind,
            url: "/files/x".to_string(),
            name: "x".to_string(),
            extension: "mp4".to_string(),
        })
    }

    #[test]
    fn test_media_kinds() {
        let html = render_attachment(&media(AttachmentKind::Image), &host());
        assert!(html.contains(r#"<div class="image-wrapper"><img src="/files/x""#));
        assert!(html.contains("openImageModal(&#39;/files/x&#39;, 1000)"));
        assert!(html.contains(r#"<span class="extension">MP4</span>"#));

        let html = render_attachment(&media(AttachmentKind::Video), &host());
        assert!(html.contains("video-wrapper"));
        assert!(html.contains("video-preview"));

        let html = render_attachment(&media(AttachmentKind::Audio), &host());
        assert!(html.contains("audio-preview"));

        let html = render_attachment(&media(AttachmentKind::Embed), &host());
        assert!(html.contains("iframe-preview"));
        assert!(html.contains(r#"<span class="extension">EMBED</span>"#));

        let html = render_attachment(&media(AttachmentKind::Pdf), &host());
        assert!(html.contains("height: 500px;"));
        assert!(html.contains(r#"<span class="extension">PDF</span>"#));

        let html = render_attachment(&media(AttachmentKind::File), &host());
        assert!(html.contains("file-type"));
        assert!(!html.contains("/files/x"));
    }

    #[test]
    fn test_names_are_escaped() {
        let html = render_attachment(&Attachment::File("<b>.txt".to_string()), &host());
        assert!(html.contains("&lt;b&gt;.txt"));
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let mut out = String::new();
        render_attachments(&mut out, &[], &host());
        assert!(out.is_empty());

        render_attachments(&mut out, &[media(AttachmentKind::Audio)], &host());
        assert!(out.starts_with(r#"<div class="attachments-container">"#));
    }
}
