//! Conversion of ANSI SGR escape sequences into HTML markup.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::metadata::html_escape;

/// Turns terminal-styled text into markup.
pub trait AnsiConverter: Send + Sync {
    fn convert(&self, text: &str) -> String;
}

/// Options for [`AnsiToHtml`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnsiOptions {
    /// Default foreground, restored by SGR 39.
    pub fg: String,
    /// Default background, restored by SGR 49.
    pub bg: String,
    /// Convert `\n` into `<br/>`.
    pub newline: bool,
    /// Escape `&`, `<` and `>` in plain text.
    #[serde(alias = "escapeXML")]
    pub escape_xml: bool,
    /// Palette overrides keyed by 256-color index.
    pub colors: BTreeMap<u8, String>,
}

impl Default for AnsiOptions {
    fn default() -> Self {
        Self {
            fg: "#FFF".to_string(),
            bg: "#000".to_string(),
            newline: false,
            escape_xml: false,
            colors: BTreeMap::new(),
        }
    }
}

const BASE_COLORS: [&str; 16] = [
    "#000", "#A00", "#0A0", "#A50", "#00A", "#A0A", "#0AA", "#AAA", "#555", "#F55", "#5F5",
    "#FF5", "#55F", "#F5F", "#5FF", "#FFF",
];

fn xterm_palette() -> Vec<String> {
    let mut palette: Vec<String> = BASE_COLORS.iter().map(|c| c.to_string()).collect();
    let levels = [0u8, 95, 135, 175, 215, 255];
    for r in levels {
        for g in levels {
            for b in levels {
                palette.push(format!("#{r:02x}{g:02x}{b:02x}"));
            }
        }
    }
    for i in 0..24u8 {
        let v = 8 + i * 10;
        palette.push(format!("#{v:02x}{v:02x}{v:02x}"));
    }
    palette
}

#[derive(Debug, Clone, PartialEq)]
enum Tag {
    Bold,
    Italic,
    Underline,
    Strike,
    Fg(String),
    Bg(String),
}

impl Tag {
    fn open(&self) -> String {
        match self {
            Tag::Bold => "<b>".to_string(),
            Tag::Italic => "<i>".to_string(),
            Tag::Underline => "<u>".to_string(),
            Tag::Strike => "<strike>".to_string(),
            Tag::Fg(color) => format!("<span style=\"color:{color}\">"),
            Tag::Bg(color) => format!("<span style=\"background-color:{color}\">"),
        }
    }

    fn close(&self) -> &'static str {
        match self {
            Tag::Bold => "</b>",
            Tag::Italic => "</i>",
            Tag::Underline => "</u>",
            Tag::Strike => "</strike>",
            Tag::Fg(_) | Tag::Bg(_) => "</span>",
        }
    }

    fn same_kind(&self, other: &Tag) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Default [`AnsiConverter`] emitting `<b>`, `<i>`, `<u>`, `<strike>` and
/// inline-styled `<span>` elements.
#[derive(Debug, Clone)]
pub struct AnsiToHtml {
    options: AnsiOptions,
    palette: Vec<String>,
}

impl Default for AnsiToHtml {
    fn default() -> Self {
        Self::new(AnsiOptions::default())
    }
}

impl AnsiToHtml {
    pub fn new(options: AnsiOptions) -> Self {
        let mut palette = xterm_palette();
        for (index, color) in &options.colors {
            palette[usize::from(*index)] = color.clone();
        }
        Self { options, palette }
    }
}

impl AnsiConverter for AnsiToHtml {
    fn convert(&self, text: &str) -> String {
        let mut state = Render {
            out: String::with_capacity(text.len()),
            stack: Vec::new(),
            converter: self,
        };
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\x1b' => match chars.next() {
                    Some('[') => {
                        let mut params = String::new();
                        let mut terminator = None;
                        for c in chars.by_ref() {
                            if ('\x40'..='\x7e').contains(&c) {
                                terminator = Some(c);
                                break;
                            }
                            params.push(c);
                        }
                        if terminator == Some('m') {
                            state.apply_sgr(&params);
                        }
                    }
                    Some(']') => {
                        // OSC: runs until BEL or ST
                        while let Some(c) = chars.next() {
                            if c == '\x07' {
                                break;
                            }
                            if c == '\x1b' && chars.peek() == Some(&'\\') {
                                chars.next();
                                break;
                            }
                        }
                    }
                    _ => {}
                },
                '\n' if self.options.newline => state.out.push_str("<br/>"),
                c if self.options.escape_xml && matches!(c, '&' | '<' | '>') => {
                    state.out.push_str(&html_escape(&c.to_string()));
                }
                c => state.out.push(c),
            }
        }

        state.close_all();
        state.out
    }
}

struct Render<'a> {
    out: String,
    stack: Vec<Tag>,
    converter: &'a AnsiToHtml,
}

impl Render<'_> {
    fn apply_sgr(&mut self, params: &str) {
        let codes: Vec<u32> = if params.is_empty() {
            vec![0]
        } else {
            params.split(';').map(|p| p.parse().unwrap_or(0)).collect()
        };

        let mut iter = codes.into_iter();
        while let Some(code) = iter.next() {
            match code {
                0 => self.close_all(),
                1 => self.push(Tag::Bold),
                3 => self.push(Tag::Italic),
                4 => self.push(Tag::Underline),
                9 => self.push(Tag::Strike),
                22 => self.close(&Tag::Bold),
                23 => self.close(&Tag::Italic),
                24 => self.close(&Tag::Underline),
                29 => self.close(&Tag::Strike),
                30..=37 => self.replace(Tag::Fg(self.color(code - 30))),
                90..=97 => self.replace(Tag::Fg(self.color(code - 90 + 8))),
                40..=47 => self.replace(Tag::Bg(self.color(code - 40))),
                100..=107 => self.replace(Tag::Bg(self.color(code - 100 + 8))),
                39 => self.replace(Tag::Fg(self.converter.options.fg.clone())),
                49 => self.replace(Tag::Bg(self.converter.options.bg.clone())),
                38 | 48 => {
                    let color = match iter.next() {
                        Some(5) => iter.next().and_then(|n| self.palette_color(n)),
                        Some(2) => {
                            let rgb: Vec<u32> = iter.by_ref().take(3).collect();
                            (rgb.len() == 3).then(|| {
                                format!("#{:02x}{:02x}{:02x}", rgb[0].min(255), rgb[1].min(255), rgb[2].min(255))
                            })
                        }
                        _ => None,
                    };
                    if let Some(color) = color {
                        let tag = if code == 38 { Tag::Fg(color) } else { Tag::Bg(color) };
                        self.replace(tag);
                    }
                }
                _ => {}
            }
        }
    }

    fn color(&self, index: u32) -> String {
        self.palette_color(index).unwrap_or_default()
    }

    /// Entry of the 256-color palette; `None` past its end.
    fn palette_color(&self, index: u32) -> Option<String> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.converter.palette.get(i))
            .cloned()
    }

    fn push(&mut self, tag: Tag) {
        self.out.push_str(&tag.open());
        self.stack.push(tag);
    }

    fn replace(&mut self, tag: Tag) {
        self.close(&tag);
        self.push(tag);
    }

    /// Close the innermost tag of the same kind, reopening anything that was
    /// nested inside it so the markup stays well-formed.
    fn close(&mut self, kind: &Tag) {
        let Some(pos) = self.stack.iter().rposition(|t| t.same_kind(kind)) else {
            return;
        };
        let reopen = self.stack.split_off(pos + 1);
        for tag in reopen.iter().rev() {
            self.out.push_str(tag.close());
        }
        if let Some(tag) = self.stack.pop() {
            self.out.push_str(tag.close());
        }
        for tag in reopen {
            self.push(tag);
        }
    }

    fn close_all(&mut self) {
        while let Some(tag) = self.stack.pop() {
            self.out.push_str(tag.close());
        }
    }
}
