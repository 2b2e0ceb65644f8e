use crate::ansi::{AnsiConverter, AnsiToHtml};
use crate::config::FormatterConfig;
use crate::error::ConfigError;
use crate::level::Level;
use crate::linkify::Linkifier;
use crate::metadata::MetadataRenderer;
use crate::record::Metadata;

/// Output of [`Formatter::format`]: the level label and the final markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub level: String,
    pub message: String,
}

/// Turns a level, message and metadata into markup.
///
/// Built once from a [`FormatterConfig`] and shared read-only by every
/// call afterwards.
pub struct Formatter {
    config: FormatterConfig,
    linkifier: Linkifier,
    renderer: MetadataRenderer,
    converter: Box<dyn AnsiConverter>,
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Formatter {
    pub fn new(config: FormatterConfig) -> Result<Self, ConfigError> {
        let linkifier = match &config.link_pattern {
            Some(pattern) => Linkifier::with_pattern(pattern)?,
            None => Linkifier::default(),
        };

        let mut inspect = config.inspect.clone();
        inspect.colors.get_or_insert(config.colorize_level);

        let renderer = MetadataRenderer {
            pretty_json: config.pretty_json_metadata,
            inspect,
        };
        let converter = Box::new(AnsiToHtml::new(config.ansi.clone()));

        Ok(Self {
            config,
            linkifier,
            renderer,
            converter,
        })
    }

    /// Replace the ANSI-to-markup converter used when `ansi_to_markup` is on.
    pub fn with_converter(mut self, converter: impl AnsiConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Level label, wrapped in a style span when `colorize_level` is set.
    /// Levels without a known class come back unwrapped.
    pub fn level_label(&self, level: &str) -> String {
        if !self.config.colorize_level {
            return level.to_string();
        }

        let class = self
            .config
            .color_map
            .get(level)
            .cloned()
            .or_else(|| level.parse::<Level>().ok().map(|l| l.default_class().to_string()));

        match class {
            Some(class) => format!("<span class=\"{class}\">{level}</span>"),
            None => level.to_string(),
        }
    }

    pub fn format(&self, level: &str, message: &str, metadata: &Metadata) -> Formatted {
        let level = self.level_label(level);

        let mut text = if self.config.linkify && !metadata.is_error() {
            self.linkifier.linkify(message).into_owned()
        } else {
            message.to_string()
        };

        self.renderer.render_into(&mut text, metadata);

        // Runs last so markup added above is never read as escape codes.
        if self.config.ansi_to_markup {
            text = self.converter.convert(&text);
        }

        Formatted {
            level,
            message: text,
        }
    }
}
