//! Analysis configuration.
//!
//! Every field has a default so an empty TOML document (or no config file
//! at all) yields a working setup. A config file only needs the keys it
//! wants to change:
//!
//! ```toml
//! [discovery]
//! extensions = ["loc", "bil", "inf"]
//!
//! [render]
//! marker_icon = "static/img/marker-icon-2x-red.png"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default number of locations that get a map and a report section.
pub const DEFAULT_TOP_N: usize = 5;

/// Errors that can occur when loading an [`AnalyzeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The TOML document is malformed or has wrongly typed keys.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document parsed but is internally inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzeConfig {
    pub discovery: DiscoveryConfig,
    pub render: RenderConfig,
    pub report: ReportConfig,
}

/// How input files are found and decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Recognized companion-file extensions (without the dot). Files with
    /// any other extension are ignored by the classifier.
    pub extensions: Vec<String>,
    /// The extension that marks the location log itself.
    pub log_extension: String,
    /// WHATWG label of the encoding the logs are written in.
    pub encoding: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["loc".to_string(), "bil".to_string(), "inf".to_string()],
            log_extension: "loc".to_string(),
            encoding: "windows-1251".to_string(),
        }
    }
}

/// Map image settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Half the side of the square viewport, in projected meters.
    pub half_width_m: f64,
    pub width: u32,
    pub height: u32,
    pub image_extension: String,
    /// Icon drawn at the location. The built-in renderer falls back to its
    /// own marker when this file does not exist.
    pub marker_icon: PathBuf,
    /// How many of the ranked locations get a map and a report section.
    pub top_n: usize,
    /// External rendering program. When unset the built-in raster
    /// renderer is used.
    pub command: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            half_width_m: 2000.0,
            width: 1024,
            height: 1024,
            image_extension: "png".to_string(),
            marker_icon: PathBuf::from("static/img/marker-icon-2x-red.png"),
            top_n: DEFAULT_TOP_N,
            command: None,
        }
    }
}

/// HTML report settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory holding `report_style.css` and `report_script.js`. Missing
    /// files fall back to the built-in resources.
    pub resources_dir: PathBuf,
    /// Address text the operator uses for fixes without a location. Such
    /// locations are listed but never rendered.
    pub no_address_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("."),
            no_address_label: "No address".to_string(),
        }
    }
}

impl AnalyzeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed TOML and
    /// [`ConfigError::Invalid`] when the values are inconsistent.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let discovery = &self.discovery;
        if !discovery
            .extensions
            .iter()
            .any(|ext| ext == &discovery.log_extension)
        {
            return Err(ConfigError::Invalid(format!(
                "log extension '{}' is not among the recognized extensions {:?}",
                discovery.log_extension, discovery.extensions
            )));
        }
        if discovery.extensions.iter().any(|ext| ext.starts_with('.')) {
            return Err(ConfigError::Invalid(
                "extensions must be given without the leading dot".to_string(),
            ));
        }
        let half_width = self.render.half_width_m;
        if half_width.is_nan() || half_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "render.half_width_m must be positive, got {half_width}"
            )));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Invalid(
                "render.width and render.height must be non-zero".to_string(),
            ));
        }
        let extension = &self.render.image_extension;
        if self.render.command.is_none() && !extension.eq_ignore_ascii_case("png") {
            return Err(ConfigError::Invalid(format!(
                "the built-in renderer only writes png images, got '{extension}'"
            )));
        }
        Ok(())
    }
}
