//! Standalone page template.
//!
//! Wraps rendered messages with the inline styles and scripts they need, so a page works offline
//! with nothing but the host functions it references.

use std::time::Instant;

use tracing::{debug, info};

use super::escape::html_escape;
use super::host::RenderContext;
use super::message::{Message, render_conversation};
use super::{scripts, styles};

/// Default transient "copied" feedback duration.
pub const DEFAULT_COPY_FEEDBACK_MS: u64 = 2000;

/// The HTML template structure.
pub struct HtmlTemplate {
    /// Document title
    pub title: String,

    /// Critical inline CSS
    pub critical_css: String,

    /// Print-specific CSS
    pub print_css: String,

    /// Inline JavaScript
    pub inline_js: String,

    /// Rendered message containers
    pub content: String,
}

impl HtmlTemplate {
    /// Generate the complete HTML document.
    pub fn render(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="msgview {version}">
    <title>{title}</title>
    <style>
{critical_css}
    </style>
    <style media="print">
{print_css}
    </style>
</head>
<body>
    <main id="messages">
{content}
    </main>
    <script>
{inline_js}
    </script>
</body>
</html>
"#,
            version = env!("CARGO_PKG_VERSION"),
            title = html_escape(&self.title),
            critical_css = self.critical_css,
            print_css = self.print_css,
            content = self.content,
            inline_js = self.inline_js,
        )
    }
}

/// Renders conversations into standalone pages or bare fragments.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    ctx: RenderContext,
    copy_feedback_ms: u64,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(RenderContext::default(), DEFAULT_COPY_FEEDBACK_MS)
    }
}

impl PageRenderer {
    pub fn new(ctx: RenderContext, copy_feedback_ms: u64) -> Self {
        Self {
            ctx,
            copy_feedback_ms,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Message containers only, without styles or scripts.
    pub fn render_fragment(&self, messages: &[Message]) -> String {
        render_conversation(messages, &self.ctx)
    }

    /// A complete HTML document for `messages`.
    pub fn render_page(&self, title: &str, messages: &[Message]) -> String {
        let started = Instant::now();
        info!(
            component = "template",
            operation = "render_page",
            message_count = messages.len(),
            math = self.ctx.host.math.is_some(),
            "Starting page render"
        );

        let content = self.render_fragment(messages);
        let styles = styles::generate_styles();
        let scripts = scripts::generate_scripts(&self.ctx.host, self.copy_feedback_ms);

        let template = HtmlTemplate {
            title: title.to_string(),
            critical_css: styles.critical_css,
            print_css: styles.print_css,
            inline_js: scripts.inline_js,
            content,
        };
        let html = template.render();

        debug!(
            component = "template",
            operation = "render_page_complete",
            duration_ms = started.elapsed().as_millis(),
            bytes = html.len(),
            "Page render complete"
        );
        html
    }
}
