//! Capabilities the hosting page provides to rendered markup.
//!
//! Generated click handlers call host functions by name instead of relying on whatever globals
//! happen to exist, and fetch endpoints for `img://`-style values come from [`Endpoints`].

use serde::{Deserialize, Serialize};

/// Largest edge, in pixels, requested when an image is opened in the enlarge view.
pub const ENLARGE_MAX_SIZE: u32 = 1000;

/// Host functions invoked from generated markup and scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostBindings {
    /// `fn(url, maxSize)` that opens an enlarged media view.
    pub open_media: String,
    /// `fn(path)` that asks the host application to open a file.
    pub open_file: String,
    /// Math renderer applied to text blocks after insertion, when the message type enables it.
    pub math: Option<MathRenderer>,
}

impl Default for HostBindings {
    fn default() -> Self {
        Self {
            open_media: "openImageModal".to_string(),
            open_file: "openFileLink".to_string(),
            math: Some(MathRenderer::default()),
        }
    }
}

impl HostBindings {
    /// Bindings with no math renderer available.
    pub fn without_math(mut self) -> Self {
        self.math = None;
        self
    }

    /// `open_media('<url>', 1000)` call expression, before attribute escaping.
    pub(crate) fn open_media_call(&self, url_literal: &str) -> String {
        format!("{}({}, {})", self.open_media, url_literal, ENLARGE_MAX_SIZE)
    }
}

/// Math renderer configuration (auto-render style: `fn(element, options)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathRenderer {
    pub function: String,
    pub delimiters: Vec<MathDelimiter>,
    pub throw_on_error: bool,
}

impl Default for MathRenderer {
    fn default() -> Self {
        Self {
            function: "renderMathInElement".to_string(),
            delimiters: vec![MathDelimiter {
                left: "$".to_string(),
                right: "$".to_string(),
                display: true,
            }],
            throw_on_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathDelimiter {
    pub left: String,
    pub right: String,
    pub display: bool,
}

/// Fetch endpoint prefixes substituted for scheme tokens in key-value values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub image: String,
    pub media: String,
    pub pdf: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            image: "/image_get?path=".to_string(),
            media: "/media_get?path=".to_string(),
            pdf: "/pdf_get?path=".to_string(),
        }
    }
}

/// Everything a render call needs from its environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub host: HostBindings,
    pub endpoints: Endpoints,
}

impl RenderContext {
    pub fn new(host: HostBindings, endpoints: Endpoints) -> Self {
        Self { host, endpoints }
    }

    /// Whether text blocks of a math-enabled message should be marked for rendering.
    pub(crate) fn math_available(&self, enabled: bool) -> bool {
        enabled && self.host.math.is_some()
    }
}
