//! Engine configuration, loadable from TOML
//!
//! ```toml
//! [engine]
//! max_partial_depth = 32
//!
//! [partials]
//! directory = "partials"
//! extension = "hbs"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default limit on nested partials
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// Default partial file extension
pub const DEFAULT_PARTIAL_EXTENSION: &str = "hbs";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Partials nested deeper than this abort the render
    pub max_partial_depth: usize,
    pub partials: PartialsConfig,
}

/// Where to load partial files from
#[derive(Debug, Clone, PartialEq)]
pub struct PartialsConfig {
    pub directory: Option<PathBuf>,
    pub extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
            partials: PartialsConfig::default(),
        }
    }
}

impl Default for PartialsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extension: DEFAULT_PARTIAL_EXTENSION.to_string(),
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    engine: Option<TomlEngine>,
    partials: Option<TomlPartials>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlEngine {
    max_partial_depth: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPartials {
    directory: Option<PathBuf>,
    extension: Option<String>,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// A relative partial directory is resolved against the file's location.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        let base = path.parent().unwrap_or(Path::new(""));
        config.partials.directory = config.partials.directory.take().map(|dir| {
            if dir.is_relative() {
                base.join(dir)
            } else {
                dir
            }
        });
        Ok(config)
    }

    /// Load configuration from a TOML string; missing keys keep defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let max_partial_depth = parsed
            .engine
            .and_then(|e| e.max_partial_depth)
            .unwrap_or(defaults.max_partial_depth);

        let partials = match parsed.partials {
            Some(p) => PartialsConfig {
                directory: p.directory,
                extension: p.extension.unwrap_or(defaults.partials.extension),
            },
            None => defaults.partials,
        };

        Ok(Self {
            max_partial_depth,
            partials,
        })
    }

    /// Set the partial nesting limit
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }

    /// Set the directory partials are loaded from
    pub fn with_partials_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.partials.directory = Some(dir.into());
        self
    }

    /// Set the partial file extension, without the leading dot
    pub fn with_partials_extension(mut self, extension: impl Into<String>) -> Self {
        self.partials.extension = extension.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_str("").expect("Should parse");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.partials.extension, "hbs");
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_str(
            r#"
[engine]
max_partial_depth = 8

[partials]
directory = "views/partials"
extension = "mustache"
"#,
        )
        .expect("Should parse");
        assert_eq!(config.max_partial_depth, 8);
        assert_eq!(config.partials.directory, Some(PathBuf::from("views/partials")));
        assert_eq!(config.partials.extension, "mustache");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = EngineConfig::from_str("[engine]\nmax_depth = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_max_partial_depth(2)
            .with_partials_directory("p")
            .with_partials_extension("html");
        assert_eq!(config.max_partial_depth, 2);
        assert_eq!(config.partials.directory, Some(PathBuf::from("p")));
        assert_eq!(config.partials.extension, "html");
    }
}
