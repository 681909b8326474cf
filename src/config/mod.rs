//! Configuration module for backup-dispatch
//!
//! This module handles loading and validating the optional TOML config file
//! and resolving the parameter record of each command.
//!
//! ## Parameter Layering
//!
//! Settings are applied in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Config file section (`[http]`, `[redis]`, `[device]`)
//! 3. Args file supplied by the host
//! 4. Command line flags
//!
//! Map-valued parameters (headers, params, extra_data) merge per key.
//!
//! ## Example Usage
//!
//! ```no_run
//! use backup_dispatch::config::{self, RedisUploadOptions};
//!
//! let config = config::load_config("backup-dispatch.toml")?;
//! let request = RedisUploadOptions {
//!     name: Some("backups:core-1".to_string()),
//!     content: Some("hostname core-1".to_string()),
//!     ..Default::default()
//! };
//! let params = config::resolve_redis_upload(&config.redis, request)?;
//! println!("writing to {} with {}", params.server, params.command);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod loader;
mod types;

pub use loader::{
    load_args_file, load_config, resolve_device_backup, resolve_http_upload,
    resolve_redis_upload, ConfigError, Result,
};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
