//! Property tests for the conversion pipeline and key-value panels.

use agent_msgview::view::{
    HostBindings, Kvps, MediaScheme, RenderContext, convert, escape_html, html_escape,
    render_panel, title_case_key,
};
use proptest::prelude::*;
use serde_json::Value;

fn panel(kvps: &Kvps) -> String {
    let mut out = String::new();
    render_panel(&mut out, Some(kvps), false, &RenderContext::default());
    out
}

fn scheme_strategy() -> impl Strategy<Value = MediaScheme> {
    prop::sample::select(MediaScheme::ALL.to_vec())
}

/// One input per tag-producing converter.
fn media_source_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "<image>QUJD</image>",
        r#"<image alt="cat" width="20px">QUJD</image>"#,
        r#"<video src="clip.mp4"></video>"#,
        "<video>clip.mp4</video>",
        r#"<audio src="song.mp3"></audio>"#,
        r#"<iframe src="https://e.com/x" height="200px"></iframe>"#,
        r#"<img src="pic.png" alt="p">"#,
    ])
}

#[test]
fn test_path_segments_link_progressive_prefixes() {
    let html = convert("Find it at /home/user/report.txt now", &HostBindings::default());
    let targets: Vec<&str> = html
        .match_indices("openFileLink(&#39;")
        .map(|(start, m)| {
            let rest = &html[start + m.len()..];
            &rest[..rest.find("&#39;").expect("closing quote")]
        })
        .collect();
    assert_eq!(targets, ["/home", "/home/user", "/home/user/report.txt"]);
    assert!(html.starts_with("Find it at /<a "));
    assert!(html.ends_with(">report.txt</a> now"));
}

#[test]
fn test_image_tag_example() {
    let html = convert(r#"<image alt="cat">QUJD</image>"#, &HostBindings::default());
    assert!(html.contains(r#"<img src="data:image/jpeg;base64,QUJD" alt="cat""#));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn proptest_generated_tag_round_trips(
        source in media_source_strategy(),
        before in "[a-z &>'\"]{0,20}",
        after in "[a-z &>'\"]{0,20}",
    ) {
        let host = HostBindings::default();
        let tag = convert(source, &host);
        prop_assert_ne!(&tag, &escape_html(source));
        let html = convert(&format!("{before}{source}{after}"), &host);
        prop_assert_eq!(html, format!("{}{}{}", html_escape(&before), tag, html_escape(&after)));
    }

    #[test]
    fn proptest_escaping_is_not_idempotent(text in "[a-z]{0,8}&[a-z&]{0,8}") {
        let once = escape_html(&text);
        let twice = escape_html(&once);
        prop_assert_ne!(once, twice);
    }

    #[test]
    fn proptest_rows_follow_insertion_order(keys in prop::collection::hash_set("[a-z]{1,8}", 1..8)) {
        let keys: Vec<String> = keys.into_iter().collect();
        let kvps: Kvps = keys
            .iter()
            .map(|k| (k.clone(), Value::String("v".to_string())))
            .collect();
        let html = panel(&kvps);

        let mut last = 0;
        for key in &keys {
            let label = format!(r#"<td class="kvps-key">{}</td>"#, title_case_key(key));
            let pos = html.find(&label).expect("row label");
            prop_assert!(pos >= last, "row {} out of order", key);
            last = pos;
        }
        prop_assert_eq!(html.matches("<tr ").count(), keys.len());
    }

    #[test]
    fn proptest_scheme_values_use_media_renderer(scheme in scheme_strategy(), rest in "[a-z0-9_.]{1,12}") {
        let ctx = RenderContext::default();
        let mut kvps = Kvps::new();
        kvps.insert("k".to_string(), Value::String(format!("{}{}", scheme.prefix(), rest)));
        let html = panel(&kvps);

        let src = html_escape(&scheme.resolve(&rest, &ctx.endpoints));
        prop_assert!(html.contains(&format!(r#"src="{src}""#)), "{}", html);
        prop_assert!(!html.contains("kvps-val"));
    }

    #[test]
    fn proptest_plain_values_render_as_text(value in "[a-z ]{1,20}") {
        let mut kvps = Kvps::new();
        kvps.insert("k".to_string(), Value::String(value.clone()));
        let html = panel(&kvps);

        prop_assert!(html.contains(r#"<pre class="kvps-val">"#));
        for tag in ["<img", "<video", "<audio", "<iframe"] {
            prop_assert!(!html.contains(tag));
        }
    }

    #[test]
    fn proptest_array_entries_render_in_order(items in prop::collection::vec("[a-z]{1,10}", 0..6)) {
        let mut kvps = Kvps::new();
        kvps.insert(
            "list".to_string(),
            Value::Array(items.iter().cloned().map(Value::String).collect()),
        );
        let html = panel(&kvps);

        prop_assert_eq!(html.matches(r#"<pre class="kvps-val">"#).count(), items.len());
        let mut cursor = 0;
        for item in &items {
            let needle = format!(">{item}</span>");
            let found = html[cursor..].find(&needle);
            prop_assert!(found.is_some(), "entry {} missing or out of order", item);
            cursor += found.unwrap_or(0) + needle.len();
        }
    }
}
