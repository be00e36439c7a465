use std::path::Path;

use contrail_config::{discover_config_path, load_for_path_with_diagnostics, ContrailConfig};
use tempfile::tempdir;

fn canonical(path: &Path) -> std::path::PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[test]
fn finds_config_in_an_ancestor_of_a_source_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("contrail.toml");
    std::fs::write(&config_path, "[inference]\nmax_states = 12\n").unwrap();

    let nested = dir.path().join("src/main/java/com/example");
    std::fs::create_dir_all(&nested).unwrap();
    let source = nested.join("Util.java");
    std::fs::write(&source, "class Util {}").unwrap();

    assert_eq!(discover_config_path(&source), Some(canonical(&config_path)));
    assert_eq!(discover_config_path(&nested), Some(canonical(&config_path)));

    let (config, path, diagnostics) = load_for_path_with_diagnostics(&source).unwrap();
    assert_eq!(config.inference.max_states, 12);
    assert_eq!(path, Some(canonical(&config_path)));
    assert!(diagnostics.is_empty());
}

#[test]
fn nearest_config_wins() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("contrail.toml"), "").unwrap();
    let module = dir.path().join("module");
    std::fs::create_dir_all(&module).unwrap();
    let inner = module.join(".contrail.toml");
    std::fs::write(&inner, "").unwrap();

    assert_eq!(discover_config_path(&module), Some(canonical(&inner)));
}

#[test]
fn plain_name_is_preferred_over_hidden_name() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("contrail.toml");
    std::fs::write(&plain, "").unwrap();
    std::fs::write(dir.path().join(".contrail.toml"), "").unwrap();

    assert_eq!(discover_config_path(dir.path()), Some(canonical(&plain)));
}

#[test]
fn no_config_means_defaults() {
    let dir = tempdir().unwrap();
    let isolated = dir.path().join("a/b");
    std::fs::create_dir_all(&isolated).unwrap();

    // Only meaningful when nothing above the temp dir carries a config.
    if discover_config_path(dir.path()).is_some() {
        return;
    }
    let (config, path, diagnostics) = load_for_path_with_diagnostics(&isolated).unwrap();
    assert_eq!(config, ContrailConfig::default());
    assert_eq!(path, None);
    assert!(diagnostics.is_empty());
}
