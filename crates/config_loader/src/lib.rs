//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Report suspicious timestamp-basis settings
//! - Generate `ExtractorConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("extract.toml")).unwrap();
//! println!("{} targets", config.targets.len());
//! ```

mod parser;
mod validator;

pub use contracts::ExtractorConfig;
pub use parser::ConfigFormat;

use contracts::{BasisWarning, ExtractError};
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ExtractorConfig, ExtractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ExtractorConfig, ExtractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate a configuration assembled elsewhere (e.g. from CLI flags)
    pub fn validate(config: &ExtractorConfig) -> Result<(), ExtractError> {
        validator::validate(config)
    }

    /// Basis mismatches that do not prevent extraction
    pub fn warnings(config: &ExtractorConfig) -> Vec<BasisWarning> {
        validator::warnings(config)
    }

    /// Serialize ExtractorConfig to TOML string
    pub fn to_toml(config: &ExtractorConfig) -> Result<String, ExtractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ExtractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ExtractorConfig to JSON string
    pub fn to_json(config: &ExtractorConfig) -> Result<String, ExtractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ExtractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ExtractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ExtractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ExtractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ExtractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ExtractorConfig, ExtractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
