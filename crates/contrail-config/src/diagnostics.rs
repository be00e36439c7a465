use std::fmt;

use serde::de::DeserializeOwned;

/// Everything found while loading and validating a `contrail.toml`.
///
/// Loading is best effort: a config that deserializes is always returned,
/// along with whatever problems were noticed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys the schema does not know, as dotted paths (`inference.max_state`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
    /// Values that would make inference misbehave.
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn extend_validation(&mut self, validation: ValidationDiagnostics) {
        self.warnings.extend(validation.warnings);
        self.errors.extend(validation.errors);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationDiagnostics {
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    LoggingLevelInvalid { value: String, normalized: String },
    LoggingFileParentMissing { toml_path: String, parent: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::LoggingLevelInvalid { value, normalized } => write!(
                f,
                "logging.level `{value}` is not a valid filter (`{normalized}`); falling back to `info`"
            ),
            ConfigWarning::LoggingFileParentMissing { toml_path, parent } => write!(
                f,
                "{toml_path}: directory `{parent}` does not exist; file logging will be disabled"
            ),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue { toml_path: String, message: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::InvalidValue { toml_path, message } => {
                write!(f, "{toml_path}: {message}")
            }
        }
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_ignored_path(&path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

// `serde_ignored` renders root paths with a leading `.`.
fn normalize_ignored_path(path: &serde_ignored::Path<'_>) -> String {
    path.to_string().trim_start_matches('.').to_string()
}
