use std::io::Write;

use hogard::config::AreaConfig;
use hogard::Config;
use hogard::ConfigError;
use hogard::LogLevel;
use tempfile::NamedTempFile;

#[test]
fn test_load_reads_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[logging]
level = "warn"

[areas]
default = "estudio"

[[areas.area]]
name = "estudio"
aliases = ["oficina", "escritorio"]
devices = ["light.study_desk", "light.study_ceiling"]
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.areas.default, "estudio");
    assert_eq!(
        config.areas.areas,
        vec![AreaConfig::new(
            "estudio",
            &["oficina", "escritorio"],
            &["light.study_desk", "light.study_ceiling"]
        )]
    );
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = Config::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::Io(ref p, _) if p == &path), "{}", err);
}

#[test]
fn test_load_rejects_invalid_areas() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[areas]
default = "living"

[[areas.area]]
name = "cocina"
devices = ["light.kitchen"]
"#
    )
    .unwrap();

    let err = Config::load(Some(file.path())).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid configuration: default area 'living' not found in areas"
    );
}

#[test]
fn test_load_reports_syntax_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[server\nport = 1").unwrap();

    assert!(matches!(
        Config::load(Some(file.path())),
        Err(ConfigError::Parse(_))
    ));
}
