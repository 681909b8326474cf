use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure
///
/// Every section holds *defaults* for the matching command. Parameters given
/// through an args file or on the command line override them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub http: HttpUploadOptions,
    #[serde(default)]
    pub redis: RedisUploadOptions,
    #[serde(default)]
    pub device: DeviceBackupOptions,
}

/// Global configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Enables rotating file logs when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_directory: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_directory: None,
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
        }
    }
}

/// HTTP upload parameters (raw, before defaults are applied)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpUploadOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Read the payload from a file instead (`-` for stdin)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Extra plain form fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_data: BTreeMap<String, String>,
    /// Query string parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Redis write parameters (raw, before defaults are applied)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RedisUploadOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Logical database index. Numeric strings are accepted for hosts that
    /// declare the option as text.
    #[serde(
        default,
        deserialize_with = "deserialize_db",
        skip_serializing_if = "Option::is_none"
    )]
    pub db: Option<i64>,
    /// Key name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_file: Option<PathBuf>,
    /// Kept as text so an unknown command is reported with its value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_command: Option<String>,
}

/// Device backup parameters (raw, before defaults are applied)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceBackupOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<bool>,
    /// Unix socket of the persistent device connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_path: Option<PathBuf>,
    /// Used to name the on-disk copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Resolved HTTP upload parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpUploadParams {
    pub url: String,
    pub content: String,
    pub field: String,
    pub filename: String,
    pub extra_data: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

/// Redis server coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisServer {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl fmt::Display for RedisServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Resolved Redis write parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisUploadParams {
    pub server: RedisServer,
    pub name: String,
    pub content: String,
    pub command: RedisCommand,
}

/// Write primitive used to store the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedisCommand {
    Set,
    Xadd,
    Lpush,
    Rpush,
}

impl RedisCommand {
    pub const ALL: [RedisCommand; 4] = [
        RedisCommand::Set,
        RedisCommand::Xadd,
        RedisCommand::Lpush,
        RedisCommand::Rpush,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RedisCommand::Set => "set",
            RedisCommand::Xadd => "xadd",
            RedisCommand::Lpush => "lpush",
            RedisCommand::Rpush => "rpush",
        }
    }
}

impl fmt::Display for RedisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedisCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RedisCommand::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Where the on-disk copy of a device backup goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub dir_path: PathBuf,
    /// Generated from hostname and timestamp when absent
    pub filename: Option<String>,
}

/// Resolved device backup parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBackupParams {
    pub defaults: bool,
    pub socket_path: Option<PathBuf>,
    pub file: Option<BackupFile>,
    pub hostname: Option<String>,
}

fn deserialize_db<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDb {
        Int(i64),
        Text(String),
    }

    match Option::<RawDb>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDb::Int(db)) => Ok(Some(db)),
        Some(RawDb::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            D::Error::custom(format!("db must be an integer, got \"{}\"", text))
        }),
    }
}

// Default value functions

pub const DEFAULT_HTTP_FIELD: &str = "backup";
pub const DEFAULT_HTTP_FILENAME: &str = "backup.cfg";
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_REDIS_DB: i64 = 1;
pub const DEFAULT_BACKUP_DIR: &str = "backup";

fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
