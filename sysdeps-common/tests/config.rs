use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use sysdeps_common::config::{parse_property, split_path_list};
use sysdeps_common::{Config, Scope, SysdepsError};
use tempfile::TempDir;

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn path_lists_are_trimmed_and_deduplicated() {
    assert_eq!(
        split_path_list(" /a , /b,,/a ,"),
        vec![PathBuf::from("/a"), PathBuf::from("/b")]
    );
}

#[test]
fn environment_overrides_defaults() {
    let mut config = Config::default();
    config.apply_env(vars(&[
        ("SYSDEPS_METADATA_DIR", "/poms,/more-poms"),
        ("SYSDEPS_JAR_DIR", "/jars"),
        ("SYSDEPS_SCAN_DEPTH", "3"),
        ("SYSDEPS_SCAN_WORKERS", "0"),
        ("UNRELATED", "x"),
    ]));

    assert_eq!(
        config.metadata_dirs,
        vec![PathBuf::from("/poms"), PathBuf::from("/more-poms")]
    );
    assert_eq!(config.jar_dirs, vec![PathBuf::from("/jars")]);
    assert_eq!(config.scan_depth, 3);
    assert_eq!(config.scan_workers, 1);
}

#[test]
fn invalid_numbers_are_ignored() {
    let mut config = Config::default();
    config.apply_env(vars(&[("SYSDEPS_SCAN_DEPTH", "deep")]));
    assert_eq!(config.scan_depth, Config::default().scan_depth);
}

#[test]
fn config_file_is_layered_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
metadata_dirs = ["/srv/poms"]
max_interpolation_passes = 4
scopes = ["compile", "test"]
profiles = ["linux"]

[properties]
"java.version" = "17"
"#,
    )
    .unwrap();

    let mut config = Config::default();
    config.merge_file(&path).unwrap();

    assert_eq!(config.metadata_dirs, vec![PathBuf::from("/srv/poms")]);
    assert_eq!(config.jar_dirs, Config::default().jar_dirs);
    assert_eq!(config.max_interpolation_passes, 4);
    assert!(config.scopes.admits(Scope::Test));
    assert!(!config.scopes.admits(Scope::Runtime));
    assert_eq!(config.active_profiles, vec!["linux".to_string()]);
    assert_eq!(config.properties.get("java.version").map(String::as_str), Some("17"));
}

#[test]
fn malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "scan_depth = \"ten\"\n").unwrap();

    let err = Config::default().merge_file(&path).unwrap_err();
    assert!(matches!(err, SysdepsError::Toml(_)), "{err:?}");
}

#[test]
fn property_arguments() {
    assert_eq!(
        parse_property("a.b=c=d").unwrap(),
        ("a.b".to_string(), "c=d".to_string())
    );
    assert_eq!(
        parse_property("flag").unwrap(),
        ("flag".to_string(), "true".to_string())
    );
    assert!(parse_property("=x").is_err());
}
