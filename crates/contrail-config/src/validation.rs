use std::path::Path;

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{ContrailConfig, LoggingConfig};

/// Context for semantic validation. Relative paths in the config resolve
/// against `config_dir` when it is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidationContext<'a> {
    pub config_dir: Option<&'a Path>,
}

impl ContrailConfig {
    /// Checks semantic invariants, reporting every problem in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        self.validate_with_context(ConfigValidationContext::default())
    }

    #[must_use]
    pub fn validate_with_context(&self, ctx: ConfigValidationContext<'_>) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();
        validate_logging(&self.logging, ctx, &mut out);
        validate_inference(self, &mut out);
        out
    }
}

fn validate_logging(
    logging: &LoggingConfig,
    ctx: ConfigValidationContext<'_>,
    out: &mut ValidationDiagnostics,
) {
    let normalized = LoggingConfig::normalize_level_directives(&logging.level);
    if !logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: logging.level.clone(),
            normalized,
        });
    }

    let Some(file) = logging.file.as_deref() else {
        return;
    };
    let resolved = match ctx.config_dir {
        Some(dir) if file.is_relative() => dir.join(file),
        _ => file.to_path_buf(),
    };
    if let Some(parent) = resolved.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            out.warnings.push(ConfigWarning::LoggingFileParentMissing {
                toml_path: "logging.file".to_string(),
                parent: parent.display().to_string(),
            });
        }
    }
}

fn validate_inference(config: &ContrailConfig, out: &mut ValidationDiagnostics) {
    if config.inference.max_states == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "inference.max_states".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}
