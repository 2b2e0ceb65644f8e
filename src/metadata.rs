use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::inspect::{inspect, InspectOptions};
use crate::record::{ErrorField, ErrorValue, Metadata};

const KEY_CLASS: &str = "uk-text-primary";
const VALUE_CLASS: &str = "uk-text-warning";
const STRING_CLASS: &str = "uk-text-success";

static JSON_LINE: OnceLock<Regex> = OnceLock::new();

fn json_line() -> &'static Regex {
    JSON_LINE.get_or_init(|| {
        // indent, optional `"key": `, optional scalar or string, optional opener
        Regex::new(r#"(?m)^( *)("[\w]+": )?("[^"]*"|[\w.+-]*)?([,\[{])?$"#)
            .expect("valid json line regex")
    })
}

/// Escape HTML special characters.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Render a JSON value as indented, colorized markup.
///
/// Keys are sorted, indentation is two spaces. Lines that do not look like
/// `indent "key": value` are emitted unstyled.
pub fn json_to_markup(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let escaped = pretty
        .replace('&', "&amp;")
        .replace("\\\"", "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    json_line()
        .replace_all(&escaped, |caps: &Captures| {
            let mut line = caps.get(1).map_or("", |m| m.as_str()).to_string();
            if let Some(key) = caps.get(2) {
                let name: String = key
                    .as_str()
                    .chars()
                    .filter(|c| !matches!(c, '"' | ':' | ' '))
                    .collect();
                line.push_str(&format!("<span class={KEY_CLASS}>{name}</span>: "));
            }
            if let Some(val) = caps.get(3).filter(|m| !m.as_str().is_empty()) {
                let class = if val.as_str().starts_with('"') {
                    STRING_CLASS
                } else {
                    VALUE_CLASS
                };
                line.push_str(&format!("<span class={class}>{}</span>", val.as_str()));
            }
            line.push_str(caps.get(4).map_or("", |m| m.as_str()));
            line
        })
        .into_owned()
}

/// Itemized list of an error's message, stack and extra properties.
pub fn error_to_markup(err: &ErrorValue) -> String {
    let mut out = String::from(r#"<ul class="uk-list uk-list-divider" style="white-space:pre;">"#);
    out.push_str(&danger_item("message", &err.message));
    if let Some(stack) = &err.stack {
        out.push_str(&danger_item("stack", stack));
    }

    for (name, field) in &err.fields {
        if name == "message" || name == "stack" {
            continue;
        }
        let ErrorField::Value(value) = field else {
            continue;
        };
        out.push_str(&format!(
            r#"<li><span class="uk-text-capitalize">{}</span>: {}</li>"#,
            html_escape(name),
            html_escape(&value_text(value))
        ));
    }
    out.push_str("</ul>");
    out
}

fn danger_item(name: &str, text: &str) -> String {
    format!(
        r#"<li class="uk-text-danger"><span class="uk-text-capitalize">{name}</span>: {}</li>"#,
        html_escape(text)
    )
}

/// Text form used when a value is concatenated into a message.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Appends rendered metadata to a message.
#[derive(Debug, Clone, Default)]
pub struct MetadataRenderer {
    pub pretty_json: bool,
    pub inspect: InspectOptions,
}

impl MetadataRenderer {
    pub fn render_into(&self, message: &mut String, metadata: &Metadata) {
        if metadata.is_empty() {
            return;
        }

        match metadata {
            Metadata::None => {}
            Metadata::Error(err) => message.push_str(&error_to_markup(err)),
            Metadata::Scalar(value) => {
                if !message.is_empty() {
                    message.push(' ');
                }
                message.push_str(&value_text(value));
            }
            Metadata::Object(value) => {
                if !message.is_empty() {
                    message.push_str("<br>");
                }
                if self.pretty_json {
                    message.push_str(r#"<span style="white-space:pre;">"#);
                    message.push_str(&json_to_markup(value));
                    message.push_str("</span>");
                } else {
                    message.push_str(&inspect(value, &self.inspect));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(renderer: &MetadataRenderer, message: &str, metadata: Metadata) -> String {
        let mut out = message.to_string();
        renderer.render_into(&mut out, &metadata);
        out
    }

    #[test]
    fn colorizes_keys_strings_and_values() {
        let out = json_to_markup(&json!({"a": 1, "b": "x"}));
        assert_eq!(
            out,
            "{\n  <span class=uk-text-primary>a</span>: <span class=uk-text-warning>1</span>,\n  \
             <span class=uk-text-primary>b</span>: <span class=uk-text-success>\"x\"</span>\n}"
        );
    }

    #[test]
    fn escapes_markup_inside_json() {
        let out = json_to_markup(&json!({"html": "<b>\"hi\" & bye</b>"}));
        assert!(out.contains("&lt;b&gt;&quot;hi&quot; &amp; bye&lt;/b&gt;"));
        assert!(!out.contains("<b>"));
    }

    #[test]
    fn nested_structure_lines_stay_unstyled() {
        let out = json_to_markup(&json!({"list": [true], "o": {}}));
        assert!(out.contains("<span class=uk-text-primary>list</span>: ["));
        assert!(out.contains("\n    <span class=uk-text-warning>true</span>\n  ],"));
        assert!(out.contains("\n  \"o\": {}\n}"));
    }

    #[test]
    fn error_lists_message_stack_and_extra_fields() {
        let err = ErrorValue::new("boom")
            .with_stack("trace...")
            .with_field("code", "E42")
            .with_field("message", "shadowed")
            .with_callable("toJSON");
        let out = error_to_markup(&err);

        assert!(out.starts_with(r#"<ul class="uk-list uk-list-divider" style="white-space:pre;">"#));
        assert!(out.contains(r#"<span class="uk-text-capitalize">message</span>: boom</li>"#));
        assert!(out.contains(r#"<span class="uk-text-capitalize">stack</span>: trace...</li>"#));
        assert!(out.contains(r#"<li><span class="uk-text-capitalize">code</span>: E42</li>"#));
        assert!(!out.contains("shadowed"));
        assert!(!out.contains("toJSON"));
        assert!(out.ends_with("</ul>"));
    }

    #[test]
    fn error_text_is_escaped() {
        let out = error_to_markup(&ErrorValue::new("<anonymous>"));
        assert!(out.contains("&lt;anonymous&gt;"));
    }

    #[test]
    fn scalar_is_space_joined() {
        let renderer = MetadataRenderer::default();
        assert_eq!(render(&renderer, "count", Metadata::from(json!(3))), "count 3");
        assert_eq!(render(&renderer, "", Metadata::from(json!("solo"))), "solo");
    }

    #[test]
    fn object_goes_after_line_break() {
        let renderer = MetadataRenderer {
            pretty_json: false,
            inspect: InspectOptions::default(),
        };
        assert_eq!(
            render(&renderer, "hi", Metadata::from(json!({"a": 1}))),
            "hi<br>{\n  a: 1\n}"
        );
        assert_eq!(render(&renderer, "", Metadata::from(json!({"a": 1}))), "{\n  a: 1\n}");
    }

    #[test]
    fn pretty_mode_wraps_in_preformatted_span() {
        let renderer = MetadataRenderer {
            pretty_json: true,
            ..MetadataRenderer::default()
        };
        let out = render(&renderer, "hi", Metadata::from(json!({"a": 1})));
        assert!(out.starts_with("hi<br><span style=\"white-space:pre;\">{\n"));
        assert!(out.ends_with("\n}</span>"));
    }

    #[test]
    fn empty_object_adds_nothing_in_either_mode() {
        for pretty_json in [false, true] {
            let renderer = MetadataRenderer {
                pretty_json,
                ..MetadataRenderer::default()
            };
            assert_eq!(render(&renderer, "hello", Metadata::from(json!({}))), "hello");
        }
    }
}
