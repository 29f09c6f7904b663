//! CSS for rendered messages.
//!
//! Covers every class the renderers emit: message containers and per-type messages, key-value
//! panels, content blocks, copy buttons, media errors, path links and attachment previews.

use tracing::debug;

use super::colors;

/// Bundle of CSS styles for the template.
pub struct StyleBundle {
    /// Critical CSS inlined in the document
    pub critical_css: String,

    /// Print-specific CSS
    pub print_css: String,
}

/// Generate all CSS styles for the page.
pub fn generate_styles() -> StyleBundle {
    let critical_css = format!(
        "{}\n{}\n{}\n{}",
        generate_palette(),
        MESSAGE_STYLES,
        KVPS_STYLES,
        ATTACHMENT_STYLES
    );
    let print_css = PRINT_STYLES.to_string();
    debug!(
        component = "styles",
        operation = "generate",
        critical_bytes = critical_css.len(),
        print_bytes = print_css.len(),
        "Generated CSS styles"
    );
    StyleBundle {
        critical_css,
        print_css,
    }
}

fn generate_palette() -> String {
    format!(
        r#":root {{
  --bg-page: {bg_page};
  --bg-message: {bg_message};
  --bg-user: {bg_user};
  --border: {border};
  --text-primary: {text_primary};
  --text-muted: {text_muted};
  --accent: {accent};
  --tool: {tool};
  --info: {info};
  --warning: {warning};
  --error: {error};
}}"#,
        bg_page = colors::BG_PAGE,
        bg_message = colors::BG_MESSAGE,
        bg_user = colors::BG_USER,
        border = colors::BORDER,
        text_primary = colors::TEXT_PRIMARY,
        text_muted = colors::TEXT_MUTED,
        accent = colors::ACCENT,
        tool = colors::TOOL,
        info = colors::STATUS_INFO,
        warning = colors::STATUS_WARNING,
        error = colors::STATUS_ERROR,
    )
}

const MESSAGE_STYLES: &str = r#"
body {
  margin: 0;
  padding: 1rem;
  background: var(--bg-page);
  color: var(--text-primary);
  font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
  line-height: 1.5;
}

.message-container {
  display: flex;
  flex-direction: column;
  margin: 0.75rem 0;
}

.message-container.message-followup {
  margin-top: -0.5rem;
}

.message-container.center-container {
  align-items: center;
}

.message {
  position: relative;
  max-width: 90%;
  padding: 0.75rem 1rem;
  border: 1px solid var(--border);
  border-radius: 8px;
  background: var(--bg-message);
}

.message h4 {
  margin: 0 0 0.5rem;
  font-size: 0.85rem;
  color: var(--text-muted);
}

.message-user {
  align-self: flex-end;
  background: var(--bg-user);
}

.message-agent { border-left: 3px solid var(--accent); }
.message-agent-response { border-left: 3px solid var(--accent); }
.message-agent-delegation { border-style: dashed; }
.message-tool,
.message-code-exe,
.message-browser { border-left: 3px solid var(--tool); }
.message-info { border-color: var(--info); }
.message-warning { border-color: var(--warning); }
.message-error { border-color: var(--error); }
.message-util { opacity: 0.8; font-size: 0.85rem; }

.msg-content {
  position: relative;
  margin: 0;
  font-family: inherit;
}

.msg-json,
.msg-output {
  font-family: ui-monospace, 'JetBrains Mono', monospace;
  font-size: 0.85rem;
}

.message-text { position: relative; cursor: pointer; }

.copy-button {
  position: absolute;
  top: 0.25rem;
  right: 0.25rem;
  padding: 0.1rem 0.5rem;
  border: 1px solid var(--border);
  border-radius: 4px;
  background: var(--bg-page);
  color: var(--text-muted);
  font-size: 0.75rem;
  cursor: pointer;
  opacity: 0;
  transition: opacity 0.2s;
}

.msg-content:hover .copy-button,
.kvps-row:hover .copy-button,
.message-text:hover .copy-button,
.copy-button.copied {
  opacity: 1;
}

.copied { outline: 1px solid var(--accent); }

.media-error {
  padding: 0.5rem;
  border: 1px dashed var(--error);
  border-radius: 4px;
  color: var(--error);
  font-size: 0.85rem;
}

.path-link {
  color: var(--accent);
  text-decoration: none;
}

.path-link:hover { text-decoration: underline; }
"#;

const KVPS_STYLES: &str = r#"
.msg-kvps {
  width: 100%;
  margin-bottom: 0.5rem;
  border-collapse: collapse;
}

.kvps-row td {
  padding: 0.25rem 0.5rem;
  vertical-align: top;
  border-bottom: 1px solid var(--border);
}

.kvps-row td:last-child { position: relative; }

.kvps-key {
  width: 1%;
  white-space: nowrap;
  color: var(--text-muted);
  font-weight: 600;
}

.kvps-val {
  margin: 0;
  white-space: pre-wrap;
  word-break: break-word;
  font-family: inherit;
}

.msg-thoughts .kvps-val { font-style: italic; }

.kvps-img { max-width: 100%; border-radius: 4px; }
"#;

const ATTACHMENT_STYLES: &str = r#"
.attachments-container {
  display: flex;
  flex-wrap: wrap;
  gap: 0.5rem;
  margin-top: 0.5rem;
}

.attachment-item {
  display: flex;
  flex-direction: column;
  max-width: 320px;
  border: 1px solid var(--border);
  border-radius: 6px;
  overflow: hidden;
}

.attachment-preview { display: block; max-width: 100%; }

.file-preview,
.file-info {
  display: flex;
  justify-content: space-between;
  gap: 0.5rem;
  padding: 0.25rem 0.5rem;
  font-size: 0.8rem;
}

.filename { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.extension { color: var(--text-muted); font-weight: 600; }
"#;

const PRINT_STYLES: &str = r#"
@media print {
  body { background: #fff; color: #000; }
  .copy-button { display: none; }
  .message { break-inside: avoid; max-width: 100%; }
  iframe, video, audio { display: none; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_cover_emitted_classes() {
        let bundle = generate_styles();
        for class in [
            ".message-container",
            ".message-followup",
            ".center-container",
            ".message-user",
            ".message-agent-delegation",
            ".message-util",
            ".msg-content",
            ".msg-json",
            ".msg-output",
            ".msg-kvps",
            ".kvps-row",
            ".kvps-key",
            ".kvps-val",
            ".msg-thoughts",
            ".copy-button",
            ".media-error",
            ".path-link",
            ".attachments-container",
            ".attachment-item",
            ".file-info",
        ] {
            assert!(bundle.critical_css.contains(class), "missing {class}");
        }
    }

    #[test]
    fn test_palette_uses_color_constants() {
        let bundle = generate_styles();
        assert!(bundle.critical_css.contains(&format!("--error: {};", colors::STATUS_ERROR)));
    }

    #[test]
    fn test_print_hides_copy_buttons() {
        let bundle = generate_styles();
        assert!(bundle.print_css.contains("@media print"));
        assert!(bundle.print_css.contains(".copy-button { display: none; }"));
    }
}
