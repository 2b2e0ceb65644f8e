//! Best-effort detection of URL-like substrings in log messages.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// Default URL pattern: `http`, `https`, `ftp` and `file` schemes followed by
/// a restricted character class that must not end on punctuation.
pub const DEFAULT_LINK_PATTERN: &str =
    r"(?i)\b(?:https?|ftp|file)://[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|]";

static DEFAULT_REGEX: OnceLock<Regex> = OnceLock::new();

fn default_regex() -> &'static Regex {
    DEFAULT_REGEX.get_or_init(|| Regex::new(DEFAULT_LINK_PATTERN).expect("valid default link regex"))
}

/// Wraps URL matches in anchors that open in a new tab.
#[derive(Debug, Clone, Default)]
pub struct Linkifier {
    pattern: Option<Regex>,
}

impl Linkifier {
    /// Use a caller-supplied pattern instead of [`DEFAULT_LINK_PATTERN`].
    /// The whole match becomes the link target.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    fn regex(&self) -> &Regex {
        self.pattern.as_ref().unwrap_or_else(|| default_regex())
    }

    pub fn linkify<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.regex()
            .replace_all(text, "<a target='_blank' href='$0'>$0</a>")
    }
}
