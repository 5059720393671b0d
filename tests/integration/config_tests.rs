use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;
use tmplmerge::config::{Config, ConfigOverrides};

#[test]
fn test_config_load_defaults() {
    // Figment without Env so parallel tests cannot interfere
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.chunk_size, 100);
    assert_eq!(config.extensions, vec!["yaml", "yml"]);
}

#[test]
fn test_config_load_from_env() {
    // A prefix no other test uses
    std::env::set_var("TMPLMERGE_ENVTEST_CHUNK_SIZE", "42");
    std::env::set_var("TMPLMERGE_ENVTEST_SKIP_HIDDEN", "true");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("TMPLMERGE_ENVTEST_").split("__"))
        .extract()
        .unwrap();

    assert_eq!(config.chunk_size, 42);
    assert!(config.skip_hidden);

    std::env::remove_var("TMPLMERGE_ENVTEST_CHUNK_SIZE");
    std::env::remove_var("TMPLMERGE_ENVTEST_SKIP_HIDDEN");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
sources = ["/opt/one", "/opt/two"]
target = "/opt/corpus"
chunk_prefix = "part_"
io_threads = 8
follow_symlinks = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(
        config.sources,
        vec![PathBuf::from("/opt/one"), PathBuf::from("/opt/two")]
    );
    assert_eq!(config.target, PathBuf::from("/opt/corpus"));
    assert_eq!(config.chunk_prefix, "part_");
    assert_eq!(config.io_threads, 8);
    assert!(config.follow_symlinks);
}

#[test]
fn test_cli_overrides_replace_lists() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "sources = [\"/from/file\"]\nextensions = [\"json\"]\n").unwrap();

    let overrides = ConfigOverrides {
        sources: Some(vec![PathBuf::from("/from/cli")]),
        ..ConfigOverrides::default()
    };
    let config = Config::load_with(Some(&config_path), &overrides).unwrap();

    assert_eq!(config.sources, vec![PathBuf::from("/from/cli")]);
    assert_eq!(config.extensions, vec!["json"]);
}

#[test]
fn test_zero_chunk_size_in_file_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "chunk_size = 0\n").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_default_config_path_is_toml() {
    if let Some(path) = Config::default_config_path() {
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }
}
