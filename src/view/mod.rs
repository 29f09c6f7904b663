//! Chat message rendering.
//!
//! Turns agent chat messages into interactive markup:
//! - **Conversion pipeline**: media pseudo-tags, image URLs and file paths in plain text become
//!   styled, clickable markup; everything else is escaped
//! - **Key-value panels**: structured message fields as tables, with scheme-prefixed media
//! - **Per-type presentation**: a wrapper per message type selects classes and behavior
//! - **Self-contained pages**: inline styles and scripts for copy buttons and math rendering
//!
//! # Architecture
//!
//! ```text
//! view/
//! ├── mod.rs           # Module facade (this file)
//! ├── pipeline.rs      # Text -> markup conversion, in order
//! ├── media.rs         # Media pseudo-tag and image URL converters
//! ├── escape.rs        # Escaping with media-tag protection
//! ├── paths.rs         # File path links
//! ├── kvps.rs          # Key-value panel
//! ├── attachments.rs   # User message attachments
//! ├── message.rs       # Per-type message renderers and dispatch
//! ├── host.rs          # Injected host capabilities and endpoints
//! ├── template.rs      # Standalone page
//! ├── styles.rs        # CSS
//! └── scripts.rs       # JS (copy, math hook)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use agent_msgview::view::{Message, MessageKind, PageRenderer};
//!
//! let messages = vec![Message::new(MessageKind::Agent, "See /tmp/out.log")];
//! let html = PageRenderer::default().render_page("Session", &messages);
//! ```

mod attachments;
mod escape;
mod host;
mod kvps;
mod media;
mod message;
mod paths;
mod pipeline;
mod scripts;
mod styles;
mod template;

// Re-export public API
pub use attachments::{
    Attachment, AttachmentKind, MediaAttachment, parse_attachments, render_attachment,
    render_attachments,
};
pub use escape::{escape_html, html_escape, js_string_escape};
pub use host::{
    ENLARGE_MAX_SIZE, Endpoints, HostBindings, MathDelimiter, MathRenderer, RenderContext,
};
pub use kvps::{Kvps, MediaScheme, render_panel, title_case_key};
pub use media::{IFRAME_SANDBOX, INVALID_IMAGE_MARKER};
pub use message::{
    Handler, KvpsMode, Message, MessageContainer, MessageKind, MessageStyle, flatten_tool_args,
    handler_for, render_agent, render_browser, render_code_exe, render_conversation,
    render_default, render_delegation, render_error, render_info, render_message,
    render_response, render_styled, render_tool, render_user, render_util, render_warning,
};
pub use paths::linkify_paths_in;
pub use pipeline::{Converter, convert, value_to_text};
pub use scripts::{ScriptBundle, generate_scripts};
pub use styles::{StyleBundle, generate_styles};
pub use template::{DEFAULT_COPY_FEEDBACK_MS, HtmlTemplate, PageRenderer};

/// Page palette, injected as CSS custom properties.
pub mod colors {
    /// Page background (#1a1b26)
    pub const BG_PAGE: &str = "#1a1b26";

    /// Message card background (#24283b)
    pub const BG_MESSAGE: &str = "#24283b";

    /// User message background tint (#1a201e)
    pub const BG_USER: &str = "#1a201e";

    /// Borders and table separators (#3b4261)
    pub const BORDER: &str = "#3b4261";

    /// Body text (#c0caf5)
    pub const TEXT_PRIMARY: &str = "#c0caf5";

    /// Headings, key labels, extensions (#696e9e)
    pub const TEXT_MUTED: &str = "#696e9e";

    /// Agent messages and path links (#7aa2f7)
    pub const ACCENT: &str = "#7aa2f7";

    /// Tool, code execution and browser messages (#ff9e64)
    pub const TOOL: &str = "#ff9e64";

    pub const STATUS_INFO: &str = "#7dcfff";
    pub const STATUS_WARNING: &str = "#e0af68";
    pub const STATUS_ERROR: &str = "#f7768e";
}
