//! Tests for the 'validate' command
//!
//! The validate command checks configuration file syntax and validity.

use backup_dispatch::config::load_config;
use test_utils::{ConfigBuilder, ResultAssertions, TestContext};

#[test]
fn test_validate_generated_config() {
    let (path, _dir) = ConfigBuilder::new()
        .with_log_directory()
        .with_log_level("debug")
        .with_http_url("https://backups.example.com/upload")
        .with_http_extra_data("site", "lab")
        .with_redis_command("rpush")
        .with_backup_dir()
        .write();

    let loaded = load_config(&path).assert_ok();
    assert_eq!(loaded.global.log_level, "debug");
    assert!(loaded.global.log_directory.is_some());
    assert_eq!(loaded.redis.redis_command.as_deref(), Some("rpush"));
}

#[test]
fn test_validate_invalid_toml() {
    let ctx = TestContext::new();
    let config_path = ctx.create_file("config.toml", "invalid { toml content");

    load_config(&config_path).assert_err_contains("parse");
}

#[test]
fn test_validate_rejects_zero_log_files() {
    let ctx = TestContext::new();
    let config_path = ctx.create_file("config.toml", "[global]\nlog_max_files = 0\n");

    load_config(&config_path).assert_err_contains("log_max_files");
}

#[test]
fn test_validate_rejects_unknown_section_types() {
    let ctx = TestContext::new();
    let config_path = ctx.create_file("config.toml", "[redis]\nport = \"high\"\n");

    load_config(&config_path).assert_err();
}
