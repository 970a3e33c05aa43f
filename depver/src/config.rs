//! Configuration management for depver

use serde::Deserialize;

use crate::modfile::{ParseMode, ParseOptions};

/// Extraction configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Parser configuration
    pub parse: ParseConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Parser configuration
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct ParseConfig {
    /// "strict" checks every directive; "lax" reads a dependency's go.mod
    pub mode: ParseMode,
    /// Reject versions whose major version disagrees with the module path
    pub check_path_major: bool,
}

impl ParseConfig {
    pub fn options(&self) -> ParseOptions {
        ParseOptions {
            mode: self.mode,
            check_path_major: self.check_path_major,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON record
    pub pretty: bool,
    /// Leave `// indirect` requirements out of the dependency list
    pub skip_indirect: bool,
}

impl Config {
    /// Parse configuration from a JSON options object
    pub fn from_init_options(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Invalid options, using defaults: {e}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.parse.mode, ParseMode::Strict);
        assert!(!config.parse.check_path_major);
        assert!(!config.output.pretty);
        assert!(!config.output.skip_indirect);
    }

    #[test]
    fn test_parse_from_json() {
        let json = json!({
            "parse": {
                "mode": "lax",
                "check_path_major": true
            },
            "output": {
                "pretty": true,
                "skip_indirect": true
            }
        });

        let config = Config::from_init_options(Some(json));
        assert_eq!(config.parse.mode, ParseMode::Lax);
        assert!(config.parse.check_path_major);
        assert!(config.output.pretty);
        assert!(config.output.skip_indirect);
    }

    #[test]
    fn test_partial_config() {
        let json = json!({
            "output": {
                "pretty": true
            }
        });

        let config = Config::from_init_options(Some(json));
        assert!(config.output.pretty);
        // Other fields should use defaults
        assert!(!config.output.skip_indirect);
        assert_eq!(config.parse.mode, ParseMode::Strict);
    }

    #[test]
    fn test_options_mapping() {
        let config = ParseConfig {
            mode: ParseMode::Lax,
            check_path_major: true,
        };
        let options = config.options();
        assert_eq!(options.mode, ParseMode::Lax);
        assert!(options.check_path_major);
    }

    #[test]
    fn test_from_init_options_none() {
        let config = Config::from_init_options(None);
        assert_eq!(config.parse.mode, ParseMode::Strict);
    }

    #[test]
    fn test_from_init_options_invalid_json() {
        let config = Config::from_init_options(Some(json!("invalid")));
        assert_eq!(config.parse.mode, ParseMode::Strict);

        let config = Config::from_init_options(Some(json!({ "parse": { "mode": "sloppy" } })));
        assert_eq!(config.parse.mode, ParseMode::Strict);
    }
}
