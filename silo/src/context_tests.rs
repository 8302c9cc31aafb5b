use super::*;
use tempfile::TempDir;

#[test]
fn test_verbosity_from_count() {
    assert_eq!(VerbosityLevel::from_count(0), VerbosityLevel::Normal);
    assert_eq!(VerbosityLevel::from_count(1), VerbosityLevel::Debug);
    assert_eq!(VerbosityLevel::from_count(2), VerbosityLevel::Trace);
    assert_eq!(VerbosityLevel::from_count(5), VerbosityLevel::Trace);
}

#[test]
fn test_build_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "logging:\n  level: warn\nnetwork:\n  timeout: 12\n").unwrap();

    let ctx = AppContext::build(Some(&path), None, VerbosityLevel::Normal).unwrap();

    assert_eq!(ctx.config.logging.level, "warn");
    assert_eq!(ctx.config.network.timeout, 12);
}

#[test]
fn test_build_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.yaml");

    assert!(AppContext::build(Some(&path), None, VerbosityLevel::Normal).is_err());
}

#[test]
fn test_catalog_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "catalog:\n  path: /nowhere/catalog.json\n").unwrap();
    let catalog = dir.path().join("catalog.json");

    let ctx = AppContext::build(
        Some(&config_path),
        Some(catalog.clone()),
        VerbosityLevel::Normal,
    )
    .unwrap();

    assert_eq!(ctx.config.catalog.resolved_path(), catalog);
    let silo = ctx.open_silo().unwrap();
    assert!(silo.registries().unwrap().is_empty());
}
