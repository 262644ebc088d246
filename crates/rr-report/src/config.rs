//! Report configuration types.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an extra font directory, searched first.
pub const FONT_DIR_ENV: &str = "RR_FONT_DIR";

/// Font files making up one family.
///
/// Missing bold/italic variants fall back to the regular face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFamilySpec {
    /// Display name, used in logs and errors.
    pub name: String,
    /// Regular face file name.
    pub regular: String,
    /// Bold face file name.
    #[serde(default)]
    pub bold: Option<String>,
    /// Italic face file name.
    #[serde(default)]
    pub italic: Option<String>,
    /// Bold italic face file name.
    #[serde(default)]
    pub bold_italic: Option<String>,
}

impl FontFamilySpec {
    /// Create a family with only a regular face.
    pub fn new(name: impl Into<String>, regular: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regular: regular.into(),
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    /// Set the bold, italic and bold-italic file names.
    pub fn with_variants(
        mut self,
        bold: impl Into<String>,
        italic: impl Into<String>,
        bold_italic: impl Into<String>,
    ) -> Self {
        self.bold = Some(bold.into());
        self.italic = Some(italic.into());
        self.bold_italic = Some(bold_italic.into());
        self
    }
}

/// Font lookup configuration for the PDF renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Directories searched (recursively, a few levels deep) in order.
    #[serde(default = "default_font_dirs")]
    pub dirs: Vec<PathBuf>,
    /// Families tried in order; the first one found wins.
    #[serde(default = "default_font_families")]
    pub families: Vec<FontFamilySpec>,
}

fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os(FONT_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/usr/X11R6/lib/X11/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
            "C:\\Windows\\Fonts",
        ]
        .iter()
        .map(PathBuf::from),
    );
    dirs
}

fn default_font_families() -> Vec<FontFamilySpec> {
    vec![
        FontFamilySpec::new("DejaVu Sans", "DejaVuSans.ttf").with_variants(
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ),
        FontFamilySpec::new("Liberation Sans", "LiberationSans-Regular.ttf").with_variants(
            "LiberationSans-Bold.ttf",
            "LiberationSans-Italic.ttf",
            "LiberationSans-BoldItalic.ttf",
        ),
        FontFamilySpec::new("FreeSans", "FreeSans.ttf").with_variants(
            "FreeSansBold.ttf",
            "FreeSansOblique.ttf",
            "FreeSansBoldOblique.ttf",
        ),
    ]
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dirs: default_font_dirs(),
            families: default_font_families(),
        }
    }
}

/// Hard cap on table rows; `limits.max_rows` may lower it, never raise it.
pub const MAX_TABLE_ROWS: usize = 50;

/// Output bounds for generated reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLimits {
    /// Maximum vulnerability rows shown in the table.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Maximum caption length in characters.
    #[serde(default = "default_max_caption_chars")]
    pub max_caption_chars: usize,
    /// Maximum filename stem length (before the date suffix).
    #[serde(default = "default_max_filename_stem")]
    pub max_filename_stem: usize,
}

fn default_max_rows() -> usize {
    50
}

fn default_max_caption_chars() -> usize {
    1024
}

fn default_max_filename_stem() -> usize {
    60
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            max_caption_chars: default_max_caption_chars(),
            max_filename_stem: default_max_filename_stem(),
        }
    }
}

/// Complete report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// IANA timezone used for the report date.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Glyph shown for missing KPI values.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Resource limits.
    #[serde(default)]
    pub limits: ReportLimits,
    /// Renderer fonts.
    #[serde(default)]
    pub fonts: FontConfig,
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn default_timezone() -> String {
    "Europe/Helsinki".to_string()
}

fn default_placeholder() -> String {
    "—".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            timezone: default_timezone(),
            placeholder: default_placeholder(),
            limits: ReportLimits::default(),
            fonts: FontConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Create a new report configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Set the maximum number of table rows.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.limits.max_rows = max_rows;
        self
    }

    /// Put a font directory in front of the search list.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fonts.dirs.insert(0, dir.into());
        self
    }

    /// Load configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check values that the generator relies on.
    ///
    /// The timezone is checked separately when the generator parses it.
    pub fn validate(&self) -> crate::Result<()> {
        if self.placeholder.trim().is_empty() {
            return Err(invalid("placeholder must not be blank"));
        }
        if !(1..=MAX_TABLE_ROWS).contains(&self.limits.max_rows) {
            return Err(invalid(format!(
                "limits.max_rows must be between 1 and {}, got {}",
                MAX_TABLE_ROWS, self.limits.max_rows
            )));
        }
        if self.limits.max_caption_chars == 0 {
            return Err(invalid("limits.max_caption_chars must be at least 1"));
        }
        if self.limits.max_filename_stem == 0 {
            return Err(invalid("limits.max_filename_stem must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ReportError {
    ReportError::InvalidConfig(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.schema_version, "1.0.0");
        assert_eq!(config.timezone, "Europe/Helsinki");
        assert_eq!(config.placeholder, "—");
        assert_eq!(config.limits.max_rows, 50);
        assert_eq!(config.limits.max_filename_stem, 60);
        assert_eq!(config.fonts.families[0].name, "DejaVu Sans");
    }

    #[test]
    fn test_config_builder() {
        let config = ReportConfig::new()
            .with_timezone("UTC")
            .with_max_rows(10)
            .with_font_dir("/opt/fonts");

        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.limits.max_rows, 10);
        assert_eq!(config.fonts.dirs[0], PathBuf::from("/opt/fonts"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ReportConfig::from_json(r#"{"limits": {"max_rows": 5}}"#).unwrap();
        assert_eq!(config.limits.max_rows, 5);
        assert_eq!(config.limits.max_caption_chars, 1024);
        assert_eq!(config.timezone, "Europe/Helsinki");
        assert!(!config.fonts.families.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ReportConfig::default().validate().is_ok());
        assert!(ReportConfig::new().with_max_rows(1).validate().is_ok());
    }

    #[test]
    fn test_blank_placeholder_rejected() {
        for placeholder in ["", "   "] {
            let config =
                ReportConfig::from_json(&format!(r#"{{"placeholder": "{}"}}"#, placeholder)).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ReportError::InvalidConfig(ref m) if m.contains("placeholder")));
        }
    }

    #[test]
    fn test_zero_rows_rejected() {
        let err = ReportConfig::new().with_max_rows(0).validate().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(ref m) if m.contains("max_rows")));
    }

    #[test]
    fn test_rows_above_cap_rejected() {
        let err = ReportConfig::new()
            .with_max_rows(MAX_TABLE_ROWS + 1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(ref m) if m.contains("max_rows")));
    }

    #[test]
    fn test_zero_caption_limit_rejected() {
        let config = ReportConfig::from_json(r#"{"limits": {"max_caption_chars": 0}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(ref m) if m.contains("max_caption_chars")));
    }

    #[test]
    fn test_zero_filename_stem_rejected() {
        let config = ReportConfig::from_json(r#"{"limits": {"max_filename_stem": 0}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(ref m) if m.contains("max_filename_stem")));
    }

    #[test]
    fn test_config_serialization() {
        let config = ReportConfig::default();
        let json = config.to_json().unwrap();
        let parsed: ReportConfig = ReportConfig::from_json(&json).unwrap();
        assert_eq!(parsed.schema_version, config.schema_version);
        assert_eq!(parsed.fonts.families, config.fonts.families);
    }
}
