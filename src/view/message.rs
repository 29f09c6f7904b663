//! Message rendering.
//!
//! Every message type has a small wrapper that picks a [`MessageStyle`] and delegates to the
//! shared renderer, which emits heading, key-value panel and content block in that order.
//! User messages take their own path with a fixed heading and an attachments list.
//!
//! Rendered messages are appended to a [`MessageContainer`]; styles that group or center a
//! message mark the container rather than the message itself.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace};

use super::attachments::{parse_attachments, render_attachments};
use super::escape::html_escape;
use super::host::RenderContext;
use super::kvps::{COPY_BUTTON, Kvps, render_panel};
use super::pipeline::{Converter, value_to_text};

/// Raw media-like tags that switch content to the free-flowing block form.
static CONTENT_MEDIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(img|video|audio|iframe|image)[^>]*>").expect("content media regex")
});

const TOOL_ARGS_KEY: &str = "tool_args";
const ATTACHMENTS_KEY: &str = "attachments";
const USER_HEADING: &str = "User message";

/// Message type tag. Unknown tags deserialize to [`MessageKind::Default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Agent,
    Response,
    Delegation,
    Tool,
    CodeExe,
    Browser,
    Info,
    Hint,
    Warning,
    RateLimit,
    Error,
    Util,
    #[default]
    #[serde(other)]
    Default,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Agent => "agent",
            MessageKind::Response => "response",
            MessageKind::Delegation => "delegation",
            MessageKind::Tool => "tool",
            MessageKind::CodeExe => "code_exe",
            MessageKind::Browser => "browser",
            MessageKind::Info => "info",
            MessageKind::Hint => "hint",
            MessageKind::Warning => "warning",
            MessageKind::RateLimit => "rate_limit",
            MessageKind::Error => "error",
            MessageKind::Util => "util",
            MessageKind::Default => "default",
        }
    }
}

/// A chat message as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "value_as_text")]
    pub content: String,
    /// Carried through but not rendered.
    #[serde(default, alias = "temporary")]
    pub temp: bool,
    #[serde(default)]
    pub kvps: Option<Kvps>,
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn value_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        other => value_to_text(&other),
    })
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_kvps(mut self, kvps: Kvps) -> Self {
        self.kvps = Some(kvps);
        self
    }
}

/// Caller-owned element that rendered messages are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContainer {
    classes: Vec<String>,
    children: String,
}

impl Default for MessageContainer {
    fn default() -> Self {
        Self {
            classes: vec!["message-container".to_string()],
            children: String::new(),
        }
    }
}

impl MessageContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn append(&mut self, markup: &str) {
        self.children.push_str(markup);
    }

    pub fn children(&self) -> &str {
        &self.children
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="{}">{}</div>"#,
            html_escape(&self.classes.join(" ")),
            self.children
        )
    }
}

/// How a message type presents its key-value data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvpsMode {
    Show,
    /// Merge the nested `tool_args` mapping into the top level and drop it.
    Flatten,
    Hide,
}

/// Presentation flags selected by a per-type wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStyle {
    pub message_classes: &'static [&'static str],
    pub content_classes: &'static [&'static str],
    pub follow_up: bool,
    pub kvps: KvpsMode,
    pub math: bool,
    pub center: bool,
}

impl MessageStyle {
    pub const DEFAULT: Self = Self {
        message_classes: &["message-ai", "message-default"],
        content_classes: &["msg-json"],
        follow_up: false,
        kvps: KvpsMode::Show,
        math: false,
        center: false,
    };
    pub const AGENT: Self = Self {
        message_classes: &["message-ai", "message-agent"],
        content_classes: &["msg-json"],
        follow_up: false,
        kvps: KvpsMode::Flatten,
        math: true,
        center: false,
    };
    pub const RESPONSE: Self = Self {
        message_classes: &["message-ai", "message-agent-response"],
        content_classes: &[],
        follow_up: true,
        kvps: KvpsMode::Hide,
        math: true,
        center: false,
    };
    pub const DELEGATION: Self = Self {
        message_classes: &["message-ai", "message-agent", "message-agent-delegation"],
        content_classes: &[],
        follow_up: true,
        kvps: KvpsMode::Show,
        math: true,
        center: false,
    };
    pub const TOOL: Self = Self {
        message_classes: &["message-ai", "message-tool"],
        content_classes: &["msg-output"],
        follow_up: true,
        kvps: KvpsMode::Show,
        math: false,
        center: false,
    };
    pub const CODE_EXE: Self = Self {
        message_classes: &["message-ai", "message-code-exe"],
        content_classes: &[],
        follow_up: true,
        kvps: KvpsMode::Hide,
        math: false,
        center: false,
    };
    pub const BROWSER: Self = Self {
        message_classes: &["message-ai", "message-browser"],
        content_classes: &["msg-json"],
        follow_up: true,
        kvps: KvpsMode::Show,
        math: false,
        center: false,
    };
    pub const INFO: Self = Self::centered(&["message-info"], &[]);
    pub const WARNING: Self = Self::centered(&["message-warning"], &[]);
    pub const ERROR: Self = Self::centered(&["message-error"], &[]);
    pub const UTIL: Self = Self::centered(&["message-util"], &["msg-json"]);

    const fn centered(
        message_classes: &'static [&'static str],
        content_classes: &'static [&'static str],
    ) -> Self {
        Self {
            message_classes,
            content_classes,
            follow_up: false,
            kvps: KvpsMode::Show,
            math: false,
            center: true,
        }
    }
}

/// Merge a nested `tool_args` object into the top level, then drop the `tool_args` key.
///
/// Keys already present keep their position and take the nested value. A `tool_args` value
/// that is not an object is dropped without merging.
pub fn flatten_tool_args(kvps: &Kvps) -> Kvps {
    let mut merged = kvps.clone();
    if let Some(Value::Object(args)) = kvps.get(TOOL_ARGS_KEY) {
        for (key, value) in args {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
        .into_iter()
        .filter(|(key, _)| key != TOOL_ARGS_KEY)
        .collect()
}

fn class_list(base: &str, extra: &[&str]) -> String {
    std::iter::once(base)
        .chain(extra.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn anchor_attr(message: &Message) -> String {
    message
        .id
        .as_ref()
        .map(|id| format!(r#" id="msg-{}""#, html_escape(id)))
        .unwrap_or_default()
}

/// Render `message` with `style`, append it to `container`, and return the message markup.
pub fn render_styled(
    container: &mut MessageContainer,
    message: &Message,
    style: &MessageStyle,
    ctx: &RenderContext,
) -> String {
    let started = Instant::now();
    let converter = Converter::new(&ctx.host);
    let mut html = format!(
        r#"<div class="{}"{}>"#,
        class_list("message", style.message_classes),
        anchor_attr(message)
    );

    if let Some(heading) = message.heading.as_deref().filter(|h| !h.is_empty()) {
        html.push_str(&format!("<h4>{}</h4>", html_escape(heading)));
    }

    match style.kvps {
        KvpsMode::Show => render_panel(&mut html, message.kvps.as_ref(), style.math, ctx),
        KvpsMode::Flatten => {
            let flat = message.kvps.as_ref().map(flatten_tool_args);
            render_panel(&mut html, flat.as_ref(), style.math, ctx);
        }
        KvpsMode::Hide => {}
    }

    let content = message.content.as_str();
    let media_block = !content.trim().is_empty() && CONTENT_MEDIA_RE.is_match(content);
    if !content.trim().is_empty() {
        let classes = class_list("msg-content", style.content_classes);
        if media_block {
            html.push_str(&format!(
                r#"<div class="{classes}" style="white-space: normal; word-break: break-word;">{}{COPY_BUTTON}</div>"#,
                converter.convert(content)
            ));
        } else {
            let math_attr = if ctx.math_available(style.math) {
                r#" data-math="true""#
            } else {
                ""
            };
            html.push_str(&format!(
                r#"<pre class="{classes}" style="white-space: pre-wrap; word-break: break-word;"><span data-copy="text"{math_attr}>{}</span>{COPY_BUTTON}</pre>"#,
                converter.convert(content)
            ));
        }
    }
    html.push_str("</div>");

    if style.follow_up {
        container.add_class("message-followup");
    }
    if style.center {
        container.add_class("center-container");
    }
    container.append(&html);

    trace!(
        component = "message",
        operation = "render_styled",
        kind = message.kind.as_str(),
        media_block,
        bytes = html.len(),
        duration_us = started.elapsed().as_micros(),
        "Message rendered"
    );
    html
}

pub fn render_default(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::DEFAULT, ctx);
}

pub fn render_agent(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::AGENT, ctx);
}

pub fn render_response(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::RESPONSE, ctx);
}

/// Delegation messages; not reachable through [`handler_for`].
pub fn render_delegation(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::DELEGATION, ctx);
}

pub fn render_tool(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::TOOL, ctx);
}

pub fn render_code_exe(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::CODE_EXE, ctx);
}

pub fn render_browser(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::BROWSER, ctx);
}

pub fn render_info(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::INFO, ctx);
}

pub fn render_warning(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::WARNING, ctx);
}

pub fn render_error(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::ERROR, ctx);
}

pub fn render_util(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    render_styled(container, message, &MessageStyle::UTIL, ctx);
}

/// User message: fixed heading, copyable text block, then attachments.
pub fn render_user(container: &mut MessageContainer, message: &Message, ctx: &RenderContext) {
    let mut html = format!(
        r#"<div class="message message-user"{}><h4>{USER_HEADING}</h4>"#,
        anchor_attr(message)
    );

    let content = message.content.as_str();
    if !content.trim().is_empty() {
        html.push_str(&format!(
            r#"<div class="message-text" data-copy="raw" data-copy-text="{}"><span>{}</span>{COPY_BUTTON}</div>"#,
            html_escape(content),
            Converter::new(&ctx.host).convert(content)
        ));
    }

    let attachments = parse_attachments(
        message
            .kvps
            .as_ref()
            .and_then(|kvps| kvps.get(ATTACHMENTS_KEY)),
    );
    render_attachments(&mut html, &attachments, &ctx.host);
    html.push_str("</div>");

    container.append(&html);
    trace!(
        component = "message",
        operation = "render_user",
        attachments = attachments.len(),
        bytes = html.len(),
        "User message rendered"
    );
}

/// Per-type message renderer.
pub type Handler = fn(&mut MessageContainer, &Message, &RenderContext);

/// Renderer for a type tag. Delegation has no entry and falls back to the default renderer.
pub fn handler_for(kind: MessageKind) -> Handler {
    match kind {
        MessageKind::User => render_user,
        MessageKind::Agent => render_agent,
        MessageKind::Response => render_response,
        MessageKind::Tool => render_tool,
        MessageKind::CodeExe => render_code_exe,
        MessageKind::Browser => render_browser,
        MessageKind::Warning | MessageKind::RateLimit => render_warning,
        MessageKind::Error => render_error,
        MessageKind::Info | MessageKind::Hint => render_info,
        MessageKind::Util => render_util,
        MessageKind::Delegation | MessageKind::Default => render_default,
    }
}

/// Render a message into a fresh container.
pub fn render_message(message: &Message, ctx: &RenderContext) -> MessageContainer {
    let mut container = MessageContainer::new();
    handler_for(message.kind)(&mut container, message, ctx);
    container
}

/// Render every message into its own container, one per line.
pub fn render_conversation(messages: &[Message], ctx: &RenderContext) -> String {
    let started = Instant::now();
    info!(
        component = "message",
        operation = "render_conversation",
        message_count = messages.len(),
        "Rendering conversation"
    );

    let mut html = String::with_capacity(messages.len() * 1024);
    for message in messages {
        html.push_str(&render_message(message, ctx).to_html());
        html.push('\n');
    }

    debug!(
        component = "message",
        operation = "render_conversation_complete",
        duration_ms = started.elapsed().as_millis(),
        bytes = html.len(),
        "Conversation rendered"
    );
    html
}
