//! Structural dump of JSON metadata in the style of Node's `util.inspect`.
//!
//! Only plain data is covered: objects, arrays, strings, numbers, booleans
//! and null. Containers that do not fit on one line within `break_length`
//! columns are broken into one entry per line.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Options for [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InspectOptions {
    /// Maximum nesting depth shown before containers collapse into
    /// `[Object]` / `[Array]`. `None` means unlimited.
    pub depth: Option<usize>,
    /// Style values with ANSI escape codes. `None` follows the transport's
    /// `colorize` setting.
    pub colors: Option<bool>,
    /// Column budget for the single-line form of a container.
    #[serde(alias = "breakLength")]
    pub break_length: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: None,
            colors: None,
            break_length: 1,
        }
    }
}

#[derive(Clone, Copy)]
enum Style {
    String,
    Number,
    Null,
    Special,
}

impl Style {
    fn codes(self) -> (u8, u8) {
        match self {
            Style::String => (32, 39),
            Style::Number => (33, 39),
            Style::Null => (1, 22),
            Style::Special => (36, 39),
        }
    }
}

struct Inspector {
    depth: Option<usize>,
    colors: bool,
    break_length: usize,
}

/// Render `value` as an inspect-style dump.
pub fn inspect(value: &Value, options: &InspectOptions) -> String {
    let inspector = Inspector {
        depth: options.depth,
        colors: options.colors.unwrap_or(false),
        break_length: options.break_length,
    };
    inspector.format(value, 0, 0)
}

impl Inspector {
    fn stylize(&self, text: &str, style: Style) -> String {
        if !self.colors {
            return text.to_string();
        }
        let (open, close) = style.codes();
        format!("\x1b[{open}m{text}\x1b[{close}m")
    }

    fn format(&self, value: &Value, level: usize, indent: usize) -> String {
        match value {
            Value::Null => self.stylize("null", Style::Null),
            Value::Bool(b) => self.stylize(&b.to_string(), Style::Number),
            Value::Number(n) => self.stylize(&n.to_string(), Style::Number),
            Value::String(s) => self.stylize(&quote(s), Style::String),
            Value::Array(items) => self.format_array(items, level, indent),
            Value::Object(map) => self.format_object(map, level, indent),
        }
    }

    fn collapsed(&self, level: usize) -> bool {
        self.depth.is_some_and(|depth| level > depth)
    }

    fn format_array(&self, items: &[Value], level: usize, indent: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }
        if self.collapsed(level) {
            return self.stylize("[Array]", Style::Special);
        }
        let entries: Vec<String> = items
            .iter()
            .map(|item| self.format(item, level + 1, indent + 2))
            .collect();
        self.join(&entries, ('[', ']'), indent)
    }

    fn format_object(&self, map: &Map<String, Value>, level: usize, indent: usize) -> String {
        if map.is_empty() {
            return "{}".to_string();
        }
        if self.collapsed(level) {
            return self.stylize("[Object]", Style::Special);
        }
        let entries: Vec<String> = map
            .iter()
            .map(|(key, item)| {
                format!(
                    "{}: {}",
                    self.format_key(key),
                    self.format(item, level + 1, indent + 2)
                )
            })
            .collect();
        self.join(&entries, ('{', '}'), indent)
    }

    fn format_key(&self, key: &str) -> String {
        if is_identifier(key) {
            key.to_string()
        } else {
            self.stylize(&quote(key), Style::String)
        }
    }

    fn join(&self, entries: &[String], braces: (char, char), indent: usize) -> String {
        let single = format!("{} {} {}", braces.0, entries.join(", "), braces.1);
        let fits = indent + visible_len(&single) <= self.break_length;
        if fits && !entries.iter().any(|e| e.contains('\n')) {
            return single;
        }

        let pad = " ".repeat(indent + 2);
        let body = entries
            .iter()
            .map(|entry| format!("{pad}{entry}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{}\n{}\n{}{}", braces.0, body, " ".repeat(indent), braces.1)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\x7f' => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Character count ignoring ANSI SGR sequences.
fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}
