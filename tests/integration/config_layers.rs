//! Integration tests for layered configuration

use crate::integration::with_config_env;
use rack::config::{global_config_path, ConfigLoader};
use rack::input::DecodePolicy;
use rack::render::OutputFormat;
use tempfile::TempDir;

fn write_global(test_dir: &TempDir, contents: &str) {
    let dir = test_dir.path().join("rack");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.service.timeout_secs, 30);
        assert!(config.service.region.is_none());
    });
}

#[test]
fn test_global_file_is_found_under_xdg_config_home() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        assert_eq!(
            global_config_path().unwrap(),
            test_dir.path().join("rack").join("config.toml")
        );
        write_global(&test_dir, "[output]\nformat = \"json\"\n");
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
    });
}

#[test]
fn test_explicit_file_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        write_global(&test_dir, "[batch]\nworkers = 2\non_decode_error = \"skip\"\n");
        let explicit = test_dir.path().join("team.toml");
        std::fs::write(&explicit, "[batch]\nworkers = 9\n").unwrap();

        let config = ConfigLoader::load(Some(explicit.as_path())).unwrap();
        assert_eq!(config.batch.workers, 9);
        assert_eq!(config.batch.on_decode_error, DecodePolicy::Skip);
    });
}

#[test]
fn test_environment_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        write_global(&test_dir, "[batch]\nworkers = 2\n");
        std::env::set_var("RACK_BATCH__WORKERS", "12");
        std::env::set_var("RACK_SERVICE__ENDPOINT", "https://storage.example.com/v1/AUTH_t");
        std::env::set_var("RS_REGION_NAME", "DFW");

        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.batch.workers, 12);
        assert_eq!(
            config.service.endpoint.as_deref(),
            Some("https://storage.example.com/v1/AUTH_t")
        );
        assert_eq!(config.service.region.as_deref(), Some("DFW"));
    });
}

#[test]
fn test_invalid_file_is_config_error() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        write_global(&test_dir, "[batch]\nworkers = \"many\"\n");
        let err = ConfigLoader::load(None).unwrap_err();
        assert_eq!(
            rack::dispatch::ExitStatus::for_error(&err),
            rack::dispatch::ExitStatus::Config
        );
    });
}
