use serde::Deserialize;
use std::fs;
use std::path::Path;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub pages: PagesConfig,
    pub markup: MarkupConfig,
    pub output: OutputConfig,
}

/// Settings for the structured word-processing export.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    pub font: String,
    /// Body text size in points.
    pub font_size: u32,
    /// Body text colour as a hex triplet without `#`.
    pub color: String,
    pub margin_inches: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            font: "Georgia".to_string(),
            font_size: 12,
            color: "0F172A".to_string(),
            margin_inches: 1.0,
        }
    }
}

impl DocumentConfig {
    /// Font size in half-points, the unit WordprocessingML uses for `w:sz`.
    pub fn half_points(&self) -> u32 {
        self.font_size * 2
    }

    /// Page margin in twentieths of a point.
    pub fn margin_twips(&self) -> u32 {
        (self.margin_inches * 1440.0).round().max(0.0) as u32
    }
}

/// Settings for the paginated export.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PagesConfig {
    /// Typst paper name, e.g. `us-letter` or `a4`.
    pub paper: String,
    pub margin_inches: f64,
    pub font: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            paper: "us-letter".to_string(),
            margin_inches: 0.5,
            font: "Georgia".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkupConfig {
    pub title: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            title: "Exported Document".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// File name used for artifacts when no explicit output path is given.
    pub file_stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_stem: "export".to_string(),
        }
    }
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Self::compiled_default()
                }
            },
            Err(_) => Self::compiled_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compiled_default_matches_code_defaults() {
        assert_eq!(Config::compiled_default(), Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: Config = toml::from_str("[pages]\npaper = \"a4\"\n").unwrap();
        assert_eq!(config.pages.paper, "a4");
        assert_eq!(config.pages.margin_inches, 0.5);
        assert_eq!(config.document, DocumentConfig::default());
    }

    #[test]
    fn document_units() {
        let doc = DocumentConfig::default();
        assert_eq!(doc.half_points(), 24);
        assert_eq!(doc.margin_twips(), 1440);
    }

    #[test]
    fn missing_file_falls_back() {
        let config = Config::load(Path::new("/nonexistent/quire.toml"));
        assert_eq!(config, Config::default());
    }
}
