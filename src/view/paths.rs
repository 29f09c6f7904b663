//! Filesystem path links.
//!
//! An absolute path in escaped text becomes one anchor per path segment, each opening the
//! cumulative path through the host's file opener:
//!
//! ```text
//! /home/user/a.txt  ->  /<a ..>home</a>/<a ..>user</a>/<a ..>a.txt</a>
//! ```
//!
//! A path must start at the beginning of the input or right after a space, newline, backtick,
//! quote, or the entity form of a quote. Generated markup is never scanned.

use super::escape::html_escape;
use super::host::HostBindings;
use super::pipeline::{Fragment, Fragments};

const BOUNDARY_ENTITIES: [&str; 2] = ["&#39;", "&quot;"];

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'/' | b'.' | b'-')
}

fn is_boundary(preceding: &str) -> bool {
    match preceding.as_bytes().last() {
        Some(b' ' | b'`' | b'\'' | b'"' | b'\n') => true,
        _ => BOUNDARY_ENTITIES.iter().any(|e| preceding.ends_with(e)),
    }
}

/// Length of the path starting at the `/` at `start`, if one is there.
fn path_len(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut end = start + 1;
    while end < bytes.len() && is_path_byte(bytes[end]) {
        end += 1;
    }
    while end > start + 1 && bytes[end - 1] == b'.' {
        end -= 1;
    }
    (end > start + 1).then_some(end - start)
}

fn segment_links(path: &str, host: &HostBindings, out: &mut String) {
    let mut cumulative = String::with_capacity(path.len());
    for part in path[1..].split('/') {
        cumulative.push('/');
        cumulative.push_str(part);
        let onclick = format!("{}('{}');", host.open_file, cumulative);
        out.push_str(&format!(
            r##"/<a href="#" class="path-link" onclick="{}">{}</a>"##,
            html_escape(&onclick),
            part
        ));
    }
}

/// Linkify every path in `text`. `at_input_start` says whether `text` begins the whole input.
fn linkify_text(text: &str, at_input_start: bool, host: &HostBindings) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('/') {
        let slash = pos + offset;
        let boundary = if slash == 0 {
            at_input_start
        } else {
            is_boundary(&text[..slash])
        };
        match path_len(text, slash).filter(|_| boundary) {
            Some(len) => {
                out.push_str(&text[last..slash]);
                segment_links(&text[slash..slash + len], host, &mut out);
                last = slash + len;
                pos = last;
            }
            None => pos = slash + 1,
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Linkify paths in every text fragment. The results are markup.
pub(crate) fn linkify_paths(fragments: Fragments, host: &HostBindings) -> Fragments {
    let mut out = Fragments::default();
    for (index, fragment) in fragments.into_iter().enumerate() {
        match fragment {
            Fragment::Markup(markup) => out.push_markup(markup),
            // A text fragment that is not first always follows markup, which ends in '>'.
            Fragment::Text(text) => out.push_markup(linkify_text(&text, index == 0, host)),
        }
    }
    out
}

/// Linkify paths in already-escaped text.
pub fn linkify_paths_in(text: &str, host: &HostBindings) -> String {
    linkify_text(text, true, host)
}
