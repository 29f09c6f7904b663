//! Text to markup conversion pipeline.
//!
//! Converts raw message text into markup in a fixed order:
//!
//! 1. `<image>` base64 pseudo-tags
//! 2. bare image URLs
//! 3. `<video>` / `<audio>` pseudo-tags
//! 4. `<iframe>` pseudo-tags
//! 5. pre-existing `<img>` tags
//! 6. escaping of everything that is still text
//! 7. filesystem path links
//!
//! Every pass works on [`Fragments`]: text that later passes may still rewrite, and markup that
//! an earlier pass produced. Markup is never touched again, so a generated tag reaches the output
//! byte-identical and is never escaped twice.

use std::time::Instant;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::trace;

use super::host::HostBindings;
use super::{escape, media, paths};

/// A piece of pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    /// Input text not yet claimed by a converter.
    Text(String),
    /// Generated or protected markup, emitted verbatim.
    Markup(String),
}

impl Fragment {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Fragment::Text(s) | Fragment::Markup(s) => s,
        }
    }
}

/// Ordered pipeline output. Adjacent text fragments are always merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Fragments(Vec<Fragment>);

impl Fragments {
    pub(crate) fn from_text(text: &str) -> Self {
        let mut fragments = Self::default();
        fragments.push_text(text);
        fragments
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Fragment::Text(last)) = self.0.last_mut() {
            last.push_str(text);
        } else {
            self.0.push(Fragment::Text(text.to_string()));
        }
    }

    pub(crate) fn push_markup(&mut self, markup: String) {
        if !markup.is_empty() {
            self.0.push(Fragment::Markup(markup));
        }
    }

    /// Run `rewrite` on every match of `re` inside text fragments.
    ///
    /// `rewrite` appends its replacement to the output and returns `true`, or returns `false`
    /// to keep the matched text unchanged. Scanning resumes after each match either way.
    pub(crate) fn rewrite_text<F>(self, re: &Regex, mut rewrite: F) -> Self
    where
        F: FnMut(&Captures<'_>, &mut Fragments) -> bool,
    {
        let mut out = Fragments::default();
        for fragment in self.0 {
            let text = match fragment {
                Fragment::Markup(markup) => {
                    out.push_markup(markup);
                    continue;
                }
                Fragment::Text(text) => text,
            };
            let mut last = 0;
            for caps in re.captures_iter(&text) {
                let Some(whole) = caps.get(0) else { continue };
                out.push_text(&text[last..whole.start()]);
                if !rewrite(&caps, &mut out) {
                    out.push_text(whole.as_str());
                }
                last = whole.end();
            }
            out.push_text(&text[last..]);
        }
        out
    }

    pub(crate) fn render(&self) -> String {
        let len = self.0.iter().map(|f| f.as_str().len()).sum();
        let mut html = String::with_capacity(len);
        for fragment in &self.0 {
            html.push_str(fragment.as_str());
        }
        html
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[Fragment] {
        &self.0
    }
}

impl IntoIterator for Fragments {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Runs the conversion pipeline against a set of host bindings.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    host: &'a HostBindings,
}

impl<'a> Converter<'a> {
    pub fn new(host: &'a HostBindings) -> Self {
        Self { host }
    }

    /// Convert raw message text to markup.
    pub fn convert(&self, raw: &str) -> String {
        let started = Instant::now();
        let html = self.fragments(raw).render();
        trace!(
            component = "pipeline",
            operation = "convert",
            input_len = raw.len(),
            output_len = html.len(),
            duration_us = started.elapsed().as_micros(),
            "Converted text to markup"
        );
        html
    }

    /// Convert a JSON value; anything but a string is pretty-printed first.
    pub fn convert_value(&self, value: &Value) -> String {
        self.convert(&value_to_text(value))
    }

    pub(crate) fn fragments(&self, raw: &str) -> Fragments {
        let fragments = Fragments::from_text(raw);
        let fragments = media::convert_image_tags(fragments, self.host);
        let fragments = media::convert_image_urls(fragments, self.host);
        let fragments = media::convert_video_tags(fragments);
        let fragments = media::convert_audio_tags(fragments);
        let fragments = media::convert_iframe_tags(fragments);
        let fragments = media::convert_existing_img_tags(fragments, self.host);
        let fragments = escape::escape_fragments(fragments);
        paths::linkify_paths(fragments, self.host)
    }
}

/// Convert raw message text to markup.
pub fn convert(raw: &str, host: &HostBindings) -> String {
    Converter::new(host).convert(raw)
}

/// Text form of a JSON value: strings as-is, everything else as 2-space pretty JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
