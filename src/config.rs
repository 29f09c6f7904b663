//! Renderer configuration.
//!
//! Host function names, fetch endpoints and copy feedback timing are read from TOML, by default
//! at `<config dir>/config.toml` (e.g. `~/.config/msgview/config.toml` on Linux). Every field is
//! optional.
//!
//! # Example Configuration
//!
//! ```toml
//! copy_feedback_ms = 2000
//! math = true
//!
//! [endpoints]
//! image = "/image_get?path="
//! media = "/media_get?path="
//! pdf = "/pdf_get?path="
//!
//! [host]
//! open_media = "openImageModal"
//! open_file = "openFileLink"
//!
//! [host.math]
//! function = "renderMathInElement"
//! throw_on_error = false
//! delimiters = [{ left = "$", right = "$", display = true }]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::view::{DEFAULT_COPY_FEEDBACK_MS, Endpoints, HostBindings, PageRenderer, RenderContext};

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// How long copy buttons show their "Copied!" state.
    pub copy_feedback_ms: u64,

    /// Mark text blocks of math-enabled message types for the host math renderer.
    pub math: bool,

    pub endpoints: Endpoints,

    pub host: HostBindings,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
            math: true,
            endpoints: Endpoints::default(),
            host: HostBindings::default(),
        }
    }
}

impl ViewConfig {
    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    debug!(
                        component = "config",
                        operation = "load",
                        path = %path.display(),
                        "No config file, using defaults"
                    );
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(
            component = "config",
            operation = "load",
            path = %path.display(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        directories::ProjectDirs::from("com", "agent-msgview", "msgview")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Host function names end up in generated scripts and handlers, so each must be a plain
    /// JavaScript identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = vec![
            ("host.open_media", self.host.open_media.as_str()),
            ("host.open_file", self.host.open_file.as_str()),
        ];
        if let Some(math) = &self.host.math {
            names.push(("host.math.function", math.function.as_str()));
        }
        for (field, name) in names {
            if !is_js_identifier(name) {
                return Err(ConfigError::Validation(format!(
                    "{field} must be a JavaScript identifier, got {name:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn render_context(&self) -> RenderContext {
        let host = if self.math {
            self.host.clone()
        } else {
            self.host.clone().without_math()
        };
        RenderContext::new(host, self.endpoints.clone())
    }

    pub fn page_renderer(&self) -> PageRenderer {
        PageRenderer::new(self.render_context(), self.copy_feedback_ms)
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_default() {
        let config = ViewConfig::from_toml("").expect("empty config");
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.copy_feedback_ms, 2000);
        assert_eq!(config.endpoints.pdf, "/pdf_get?path=");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ViewConfig::from_toml(
            r#"
copy_feedback_ms = 500

[endpoints]
image = "/img?p="

[host]
open_file = "openPath"
"#,
        )
        .expect("config");
        assert_eq!(config.copy_feedback_ms, 500);
        assert_eq!(config.endpoints.image, "/img?p=");
        assert_eq!(config.endpoints.media, "/media_get?path=");
        assert_eq!(config.host.open_file, "openPath");
        assert_eq!(config.host.open_media, "openImageModal");
        assert!(config.host.math.is_some());
    }

    #[test]
    fn test_math_section() {
        let config = ViewConfig::from_toml(
            r#"
[host.math]
function = "katexRender"
delimiters = [{ left = "$$", right = "$$", display = true }, { left = "$", right = "$", display = false }]
"#,
        )
        .expect("config");
        let math = config.host.math.expect("math");
        assert_eq!(math.function, "katexRender");
        assert_eq!(math.delimiters.len(), 2);
        assert!(!math.throw_on_error);
    }

    #[test]
    fn test_math_can_be_disabled() {
        let config = ViewConfig::from_toml("math = false").expect("config");
        assert!(config.render_context().host.math.is_none());
        assert!(ViewConfig::default().render_context().host.math.is_some());
    }

    #[test]
    fn test_validation_rejects_non_identifiers() {
        let err = ViewConfig::from_toml(
            r#"
[host]
open_media = "alert(1);x"
"#,
        )
        .expect_err("invalid name");
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("host.open_media"));

        assert!(ViewConfig::from_toml("[host]\nopen_file = \"\"").is_err());
        assert!(ViewConfig::from_toml("[host]\nopen_file = \"9lives\"").is_err());
        assert!(ViewConfig::from_toml("[host]\nopen_file = \"$open_file2\"").is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = ViewConfig::from_toml("copy_feedback_ms = \"soon\"").expect_err("bad type");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "copy_feedback_ms = 1234").expect("write");
        let config = ViewConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.copy_feedback_ms, 1234);
        assert_eq!(config.page_renderer().context(), &config.render_context());
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ViewConfig::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
