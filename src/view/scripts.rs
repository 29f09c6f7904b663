//! Client-side behavior for rendered messages.
//!
//! Generates inline JavaScript for:
//! - Copy buttons (row, content block and user text)
//! - Click-to-copy on text spans
//! - Transient "Copied!" feedback with per-action timers
//! - Post-insertion math rendering for marked spans
//! - Fallbacks for host functions the page does not define

use serde_json::json;
use tracing::debug;

use super::host::{HostBindings, MathRenderer};

/// Bundle of JavaScript for the template.
pub struct ScriptBundle {
    /// Inline JavaScript to include in the document
    pub inline_js: String,
}

/// Generate all JavaScript for the page.
pub fn generate_scripts(host: &HostBindings, copy_feedback_ms: u64) -> ScriptBundle {
    let mut scripts = vec![
        generate_host_fallbacks(host),
        generate_copy_js(copy_feedback_ms),
    ];
    if let Some(math) = &host.math {
        scripts.push(generate_math_js(math));
    }
    scripts.push(generate_init_js(host.math.is_some()));

    let inline_js = scripts.join("\n\n");
    debug!(
        component = "scripts",
        operation = "generate",
        math = host.math.is_some(),
        copy_feedback_ms,
        inline_bytes = inline_js.len(),
        "Generated inline scripts"
    );

    ScriptBundle { inline_js }
}

/// JSON literal that is safe to embed in a `<script>` element.
fn script_literal(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn generate_host_fallbacks(host: &HostBindings) -> String {
    format!(
        r#"// Host functions referenced by generated markup
if (typeof window[{open_media}] !== 'function') {{
    window[{open_media}] = (url, maxSize) => {{
        window.open(url, '_blank', 'noopener');
    }};
}}
if (typeof window[{open_file}] !== 'function') {{
    window[{open_file}] = (path) => {{
        console.info('No file opener available for', path);
    }};
}}"#,
        open_media = script_literal(&json!(host.open_media)),
        open_file = script_literal(&json!(host.open_file)),
    )
}

fn generate_copy_js(copy_feedback_ms: u64) -> String {
    format!(
        r#"// Clipboard copy
const COPY_FEEDBACK_MS = {copy_feedback_ms};

async function copyText(text, element) {{
    try {{
        await navigator.clipboard.writeText(text);
        element.classList.add('copied');
        setTimeout(() => element.classList.remove('copied'), COPY_FEEDBACK_MS);
    }} catch (err) {{
        console.error('Failed to copy text:', err);
    }}
}}

const CopyButtons = {{
    textFor(button) {{
        const container = button.closest('.msg-content, .kvps-row, .message-text');
        if (!container) return null;
        if (container.classList.contains('kvps-row')) {{
            const value = container.querySelector('.kvps-val');
            return value ? value.textContent : null;
        }}
        const span = container.querySelector('span');
        if (span) return span.textContent;
        // Media blocks have no span: copy the block text minus button labels.
        const clone = container.cloneNode(true);
        clone.querySelectorAll('.copy-button').forEach((el) => el.remove());
        return clone.textContent;
    }},

    async copy(button) {{
        const text = this.textFor(button);
        if (text === null) return;
        try {{
            await navigator.clipboard.writeText(text);
            const originalText = button.textContent;
            button.classList.add('copied');
            button.textContent = 'Copied!';
            setTimeout(() => {{
                button.classList.remove('copied');
                button.textContent = originalText;
            }}, COPY_FEEDBACK_MS);
        }} catch (err) {{
            console.error('Failed to copy text:', err);
        }}
    }},

    init() {{
        document.addEventListener('click', (e) => {{
            const button = e.target.closest('.copy-button');
            if (button) {{
                e.stopPropagation();
                this.copy(button);
                return;
            }}
            const target = e.target.closest('[data-copy]');
            if (!target || e.target.closest('a, button')) return;
            const text = target.dataset.copy === 'raw'
                ? target.dataset.copyText
                : target.textContent;
            copyText(text, target);
        }});
    }}
}};"#
    )
}

fn generate_math_js(math: &MathRenderer) -> String {
    let delimiters: Vec<_> = math
        .delimiters
        .iter()
        .map(|d| json!({ "left": d.left, "right": d.right, "display": d.display }))
        .collect();
    let options = json!({ "delimiters": delimiters, "throwOnError": math.throw_on_error });

    format!(
        r#"// Math rendering for marked text blocks
const MathHook = {{
    init() {{
        const render = window[{function}];
        if (typeof render !== 'function') return;
        document.querySelectorAll('[data-math]').forEach((el) => {{
            try {{
                render(el, {options});
            }} catch (err) {{
                console.error('Math rendering failed:', err);
            }}
        }});
    }}
}};"#,
        function = script_literal(&json!(math.function)),
        options = script_literal(&options),
    )
}

fn generate_init_js(math: bool) -> String {
    let mut inits =
        vec!["try { CopyButtons.init(); } catch (e) { console.error('CopyButtons init failed', e); }"];
    if math {
        inits.push("try { MathHook.init(); } catch (e) { console.error('MathHook init failed', e); }");
    }

    format!(
        r#"// Initialize after DOM is ready (or immediately if already ready)
const __msgviewInitAll = () => {{
    {}
}};

if (document.readyState === 'loading') {{
    document.addEventListener('DOMContentLoaded', __msgviewInitAll);
}} else {{
    __msgviewInitAll();
}}"#,
        inits.join("\n    ")
    )
}
