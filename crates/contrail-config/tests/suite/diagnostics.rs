use contrail_config::{ConfigValidationError, ConfigWarning, ContrailConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[logging]
levle = "debug"

[inference]
max_state = 10
"#;

    let (config, diagnostics) =
        ContrailConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["inference.max_state", "logging.levle", "typo"]
    );
    assert_eq!(config, ContrailConfig::default());
    assert!(diagnostics.is_ok());
}

#[test]
fn zero_max_states_is_an_error() {
    let (config, diagnostics) =
        ContrailConfig::load_from_str_with_diagnostics("[inference]\nmax_states = 0\n")
            .expect("config should parse");

    assert_eq!(config.inference.max_states, 0);
    assert!(!diagnostics.is_ok());
    assert_eq!(
        diagnostics.errors,
        vec![ConfigValidationError::InvalidValue {
            toml_path: "inference.max_states".to_string(),
            message: "must be >= 1".to_string(),
        }]
    );
    assert_eq!(
        diagnostics.errors[0].to_string(),
        "inference.max_states: must be >= 1"
    );
}

#[test]
fn invalid_log_directive_is_a_warning() {
    let (_config, diagnostics) =
        ContrailConfig::load_from_str_with_diagnostics("[logging]\nlevel = \"contrail=verbose\"\n")
            .expect("config should parse");

    assert!(diagnostics.is_ok());
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { value, .. }] if value == "contrail=verbose"
    ));
}

#[test]
fn directive_strings_are_accepted() {
    let text = "[logging]\nlevel = \"contrail.flow=debug,warn\"\njson = true\n";
    let (config, diagnostics) =
        ContrailConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert!(config.logging.json);
    assert!(config.logging.stderr);
}

#[test]
fn log_file_in_missing_directory_is_a_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contrail.toml");
    std::fs::write(&path, "[logging]\nfile = \"missing/contrail.log\"\n").unwrap();

    let (_config, diagnostics) =
        ContrailConfig::load_from_path_with_diagnostics(&path).expect("config should load");

    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingFileParentMissing { toml_path, .. }] if toml_path == "logging.file"
    ));
}

#[test]
fn log_file_next_to_the_config_is_fine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contrail.toml");
    std::fs::write(&path, "[logging]\nfile = \"contrail.log\"\n").unwrap();

    let (_config, diagnostics) =
        ContrailConfig::load_from_path_with_diagnostics(&path).expect("config should load");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn relative_log_file_resolves_against_the_config_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contrail.toml");
    std::fs::write(&path, "[logging]\nfile = \"logs/contrail.log\"\n").unwrap();
    let expected = Some(dir.path().join("logs/contrail.log"));

    let (config, _diagnostics) =
        ContrailConfig::load_from_path_with_diagnostics(&path).expect("config should load");
    assert_eq!(config.logging.file, expected);

    let config = ContrailConfig::load_from_path(&path).expect("config should load");
    assert_eq!(config.logging.file, expected);
}

#[test]
fn absolute_log_file_is_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contrail.toml");
    let log = dir.path().join("contrail.log");
    let text = format!("[logging]\nfile = {:?}\n", log.display().to_string());
    std::fs::write(&path, text).unwrap();

    let config = ContrailConfig::load_from_path(&path).expect("config should load");
    assert_eq!(config.logging.file, Some(log));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = ContrailConfig::load_from_path(dir.path().join("nope.toml")).unwrap_err();
    assert!(err.to_string().starts_with("failed to read config file"));
}
