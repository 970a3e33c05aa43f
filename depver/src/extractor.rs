//! Projection of a parsed go.mod file into the flat record consumed by the
//! dependency analyzer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, OutputConfig};
use crate::modfile::{self, ModFile, ParseErrors, ParseOptions};

/// Separates path and version inside a [`ManifestRecord::dependencies`] entry.
pub const DEPENDENCY_SEPARATOR: char = ';';

/// Output handed to the host when extraction fails.
pub const SENTINEL: &str = "";

/// Why a manifest could not be turned into a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("manifest is empty")]
    Empty,
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] ParseErrors),
    #[error("failed to serialize manifest record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flat dependency metadata of one go.mod file.
///
/// Absent data is represented by empty strings and an empty list; no field
/// is ever omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Version from the `go` directive
    #[serde(rename = "MinGoVer")]
    pub min_go_version: String,
    #[serde(rename = "ModPath")]
    pub module_path: String,
    #[serde(rename = "ModVer")]
    pub module_version: String,
    #[serde(rename = "ModDeprecated")]
    pub deprecation_notice: String,
    /// `path;version` entries in require order
    #[serde(rename = "DepVer")]
    pub dependencies: Vec<String>,
}

impl ManifestRecord {
    /// Builds a record from a parsed file. Requirements with an empty path
    /// are dropped, as are indirect ones when `skip_indirect` is set.
    pub fn from_mod_file(file: &ModFile, skip_indirect: bool) -> Self {
        let min_go_version = file
            .go
            .as_ref()
            .map(|go| go.version.clone())
            .unwrap_or_default();

        let (module_path, module_version, deprecation_notice) = match &file.module {
            Some(module) => (
                module.module.path.clone(),
                module.module.version.clone(),
                module.deprecated.clone(),
            ),
            None => Default::default(),
        };

        let dependencies = file
            .require
            .iter()
            .filter(|req| !req.module.path.is_empty())
            .filter(|req| !(skip_indirect && req.indirect))
            .map(|req| {
                format!(
                    "{}{DEPENDENCY_SEPARATOR}{}",
                    req.module.path, req.module.version
                )
            })
            .collect();

        Self {
            min_go_version,
            module_path,
            module_version,
            deprecation_notice,
            dependencies,
        }
    }

    /// Splits the dependency entries back into `(path, version)` pairs.
    /// Versions never contain the separator, so a quoted path may.
    pub fn dependency_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies
            .iter()
            .filter_map(|entry| entry.rsplit_once(DEPENDENCY_SEPARATOR))
    }
}

/// Turns go.mod text into [`ManifestRecord`]s.
///
/// Holds only configuration, so one extractor can be shared freely across
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestExtractor {
    options: ParseOptions,
    output: OutputConfig,
}

impl ManifestExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            options: config.parse.options(),
            output: config.output,
        }
    }

    /// Parses `text` and projects it into a record.
    pub fn extract(&self, text: &str) -> Result<ManifestRecord, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }

        let file = modfile::parse_with(text, self.options)?;
        tracing::trace!(
            requires = file.require.len(),
            has_module = file.module.is_some(),
            "parsed manifest"
        );
        Ok(ManifestRecord::from_mod_file(&file, self.output.skip_indirect))
    }

    /// Extracts and serializes a record to JSON.
    pub fn extract_json(&self, text: &str) -> Result<String, ExtractError> {
        let record = self.extract(text)?;
        let json = if self.output.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        Ok(json)
    }

    /// Like [`extract_json`](Self::extract_json) but collapses every failure
    /// into [`SENTINEL`].
    pub fn extract_or_sentinel(&self, text: &str) -> String {
        match self.extract_json(text) {
            Ok(json) => json,
            Err(ExtractError::Serialize(e)) => {
                tracing::warn!("Failed to serialize manifest record: {e}");
                SENTINEL.to_string()
            }
            Err(e) => {
                tracing::debug!("Manifest extraction failed: {e}");
                SENTINEL.to_string()
            }
        }
    }
}

/// Extracts the JSON record for `text` with default settings, or returns
/// the empty [`SENTINEL`] when the manifest is empty or malformed.
///
/// ```
/// let json = depver::extract_dependencies("module example.com/foo\n");
/// assert_eq!(
///     json,
///     r#"{"MinGoVer":"","ModPath":"example.com/foo","ModVer":"","ModDeprecated":"","DepVer":[]}"#
/// );
/// assert_eq!(depver::extract_dependencies("not a valid manifest {{{"), "");
/// ```
pub fn extract_dependencies(text: &str) -> String {
    ManifestExtractor::new().extract_or_sentinel(text)
}
