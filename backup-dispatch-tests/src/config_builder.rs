//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible defaults.

use backup_dispatch::config::{
    Config, DeviceBackupOptions, GlobalConfig, HttpUploadOptions, RedisUploadOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    global: GlobalConfig,
    http: HttpUploadOptions,
    redis: RedisUploadOptions,
    device: DeviceBackupOptions,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder with built-in defaults and no log directory
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            global: GlobalConfig::default(),
            http: HttpUploadOptions::default(),
            redis: RedisUploadOptions::default(),
            device: DeviceBackupOptions::default(),
        }
    }

    /// Route logs to a `logs` directory inside the temp dir
    pub fn with_log_directory(mut self) -> Self {
        let log_directory = self.temp_dir.path().join("logs");
        fs::create_dir_all(&log_directory).expect("Failed to create log_directory");
        self.global.log_directory = Some(log_directory);
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.global.log_level = level.to_string();
        self
    }

    pub fn with_http_url(mut self, url: &str) -> Self {
        self.http.url = Some(url.to_string());
        self
    }

    pub fn with_http_header(mut self, name: &str, value: &str) -> Self {
        self.http.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_http_extra_data(mut self, key: &str, value: &str) -> Self {
        self.http.extra_data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_redis_host(mut self, host: &str) -> Self {
        self.redis.host = Some(host.to_string());
        self
    }

    pub fn with_redis_port(mut self, port: u16) -> Self {
        self.redis.port = Some(port);
        self
    }

    pub fn with_redis_db(mut self, db: i64) -> Self {
        self.redis.db = Some(db);
        self
    }

    pub fn with_redis_command(mut self, command: &str) -> Self {
        self.redis.redis_command = Some(command.to_string());
        self
    }

    pub fn with_socket_path(mut self, path: &Path) -> Self {
        self.device.socket_path = Some(path.to_path_buf());
        self
    }

    /// Write device backups into `backups` inside the temp dir
    pub fn with_backup_dir(mut self) -> Self {
        self.device.dir_path = Some(self.temp_dir.path().join("backups"));
        self
    }

    /// Build the configuration (temp dir is dropped)
    pub fn build(self) -> Config {
        self.persist().0
    }

    /// Build the configuration and keep the temp dir alive
    pub fn persist(self) -> (Config, TempDir) {
        let config = Config {
            global: self.global,
            http: self.http,
            redis: self.redis,
            device: self.device,
        };
        (config, self.temp_dir)
    }

    /// Write the configuration as `config.toml` and keep the temp dir alive
    pub fn write(self) -> (PathBuf, TempDir) {
        let (config, temp_dir) = self.persist();
        let path = temp_dir.path().join("config.toml");
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, toml_str).expect("Failed to write config");
        (path, temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
