//! `contrail.toml` loading, validation and tracing setup.
//!
//! ```toml
//! [logging]
//! level = "contrail.flow=debug,info"
//! json = false
//! stderr = true
//! file = "contrail.log"
//!
//! [inference]
//! max_states = 300
//! prefer_declared = true
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use contrail_flow::{ContractConfig, InferenceConfig, DEFAULT_MAX_STATES};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;

mod diagnostics;
mod schema;
mod validation;

pub use diagnostics::{
    ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics,
};
pub use schema::json_schema;
pub use validation::ConfigValidationContext;

/// File names looked up, in order, in each directory during discovery.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["contrail.toml", ".contrail.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ContrailConfig {
    /// Logging settings for every Contrail crate.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Contract inference settings.
    #[serde(default)]
    pub inference: InferenceSettings,
}

#[allow(clippy::derivable_impls)]
impl Default for ContrailConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            inference: InferenceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file. A relative path is taken from the
    /// directory of the config file. If the file cannot be opened, file
    /// logging is disabled while stderr logging stays active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Makes a relative `file` relative to `dir` instead of the working
    /// directory.
    pub fn resolve_relative_to(&mut self, dir: &Path) {
        if let Some(file) = self.file.as_mut().filter(|file| file.is_relative()) {
            *file = dir.join(&*file);
        }
    }

    fn default_level() -> String {
        "warn".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            "off" | "none" => "off".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level with `RUST_LOG` merged in.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct InferenceSettings {
    /// Live states above which an expression stops being analysed.
    #[serde(default = "InferenceSettings::default_max_states")]
    #[schemars(range(min = 1))]
    pub max_states: usize,

    /// Use a valid `@Contract` annotation instead of inferring.
    #[serde(default = "InferenceSettings::default_prefer_declared")]
    pub prefer_declared: bool,
}

impl InferenceSettings {
    fn default_max_states() -> usize {
        DEFAULT_MAX_STATES
    }

    fn default_prefer_declared() -> bool {
        true
    }
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            max_states: Self::default_max_states(),
            prefer_declared: Self::default_prefer_declared(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` carries a source snippet; the message alone is enough.
        ConfigError::Toml(err.message().trim().to_owned())
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl ContrailConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read_config(path)?;
        let mut config: Self = toml::from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.logging.resolve_relative_to(dir);
        }
        Ok(config)
    }

    /// Loads a config file and reports unknown keys and validation problems.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = read_config(path)?;
        let ctx = ConfigValidationContext {
            config_dir: path.parent(),
        };
        let (mut config, diagnostics) = Self::load_from_str_with_diagnostics_inner(&text, ctx)?;
        if let Some(dir) = path.parent() {
            config.logging.resolve_relative_to(dir);
        }
        Ok((config, diagnostics))
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        Self::load_from_str_with_diagnostics_inner(text, ConfigValidationContext::default())
    }

    fn load_from_str_with_diagnostics_inner(
        text: &str,
        ctx: ConfigValidationContext<'_>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<ContrailConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate_with_context(ctx));

        Ok((config, diagnostics))
    }

    /// Settings for `contrail_flow::method_contracts`. A zero fuse is raised
    /// to one.
    #[must_use]
    pub fn contract_config(&self) -> ContractConfig {
        ContractConfig {
            inference: InferenceConfig {
                max_states: self.inference.max_states.max(1),
            },
            prefer_declared: self.inference.prefer_declared,
        }
    }
}

/// Finds the config file for `start` (a file or directory) by walking up
/// its ancestors. In each directory the names in [`CONFIG_FILE_NAMES`] are
/// tried in order.
pub fn discover_config_path(start: &Path) -> Option<PathBuf> {
    let start = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());
    let dir = if start.is_dir() {
        start.as_path()
    } else {
        start.parent()?
    };

    dir.ancestors()
        .flat_map(|ancestor| CONFIG_FILE_NAMES.iter().map(move |name| ancestor.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Loads the config that applies to `start`, with diagnostics.
///
/// Without a config file this is [`ContrailConfig::default`], `None` and no
/// diagnostics.
pub fn load_for_path_with_diagnostics(
    start: &Path,
) -> Result<(ContrailConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(start) else {
        return Ok((ContrailConfig::default(), None, ConfigDiagnostics::default()));
    };
    let (config, diagnostics) = ContrailConfig::load_from_path_with_diagnostics(&path)?;
    tracing::debug!(target: "contrail.config", path = %path.display(), "loaded config");
    Ok((config, Some(path), diagnostics))
}

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber described by `config`.
///
/// Only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let file = config.file.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_failed = config.file.is_some() && file.is_none();

        let writer = match (config.stderr, file.map(Mutex::new)) {
            (true, Some(file)) => BoxMakeWriter::new(std::io::stderr.and(file)),
            (true, None) => BoxMakeWriter::new(std::io::stderr),
            (false, Some(file)) => BoxMakeWriter::new(file),
            (false, None) => BoxMakeWriter::new(std::io::sink),
        };

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() && file_failed {
            if let Some(path) = config.file.as_ref() {
                tracing::warn!(
                    target: "contrail.config",
                    path = %path.display(),
                    "failed to open log file; file logging disabled"
                );
            }
        }
    });
}
