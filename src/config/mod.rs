// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::output::OutputConfig;
use crate::watermark::{FontConfig, LayoutSettings, WatermarkSettings};

/// Settings file contents. Every section is optional.
///
/// ```yaml
/// watermark:
///   text: "© ${PHOTOGRAPHER} {exif_date}"
///   font_size: 40
///   opacity: 80
///   color: "#FFFF00"
///   position: bottom-right
///   multi_size: true
/// fonts:
///   english: /usr/share/fonts/TTF/DejaVuSans.ttf
/// output:
///   jpeg_quality: 90
/// logging:
///   level: debug
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watermark: WatermarkSettings,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse YAML, replacing `${VAR_NAME}` with environment variable values.
    ///
    /// JSON is valid YAML, so JSON settings files load the same way.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        // Every referenced variable must exist before anything is replaced
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&substituted).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watermark.validate().map_err(ConfigError::Invalid)?;
        self.output.validate().map_err(ConfigError::Invalid)?;
        self.layout.validate().map_err(ConfigError::Invalid)?;
        self.logging.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
