use super::types::*;
use crate::error::DispatchError;
use crate::utils::payload;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse args file: {0}")]
    ArgsError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the parameter record of one command from a JSON args file
pub fn load_args_file<T, P>(path: P) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if !LOG_LEVELS.contains(&config.global.log_level.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "Unknown log level: {}",
            config.global.log_level
        )));
    }

    if config.global.log_max_files == 0 {
        return Err(ConfigError::ValidationError(
            "log_max_files must be at least 1".to_string(),
        ));
    }

    if let Some(ref field) = config.http.field {
        if field.is_empty() {
            return Err(ConfigError::ValidationError(
                "http.field must not be empty".to_string(),
            ));
        }
    }

    if let Some(ref filename) = config.http.filename {
        if filename.is_empty() {
            return Err(ConfigError::ValidationError(
                "http.filename must not be empty".to_string(),
            ));
        }
    }

    if config.redis.port == Some(0) {
        return Err(ConfigError::ValidationError(
            "redis.port must not be 0".to_string(),
        ));
    }

    if let Some(ref command) = config.redis.redis_command {
        if command.parse::<RedisCommand>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Unknown redis command: {}",
                command
            )));
        }
    }

    Ok(())
}

fn merge_maps(
    mut base: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    base.extend(overrides);
    base
}

/// Content and content_file travel together: the layer naming either wins
fn pick_content(
    base: (Option<String>, Option<PathBuf>),
    overrides: (Option<String>, Option<PathBuf>),
) -> (Option<String>, Option<PathBuf>) {
    if overrides.0.is_some() || overrides.1.is_some() {
        overrides
    } else {
        base
    }
}

impl HttpUploadOptions {
    /// Layer `overrides` on top of `self`; maps merge per key
    pub fn merge(self, overrides: Self) -> Self {
        let (content, content_file) = pick_content(
            (self.content, self.content_file),
            (overrides.content, overrides.content_file),
        );
        Self {
            url: overrides.url.or(self.url),
            content,
            content_file,
            field: overrides.field.or(self.field),
            filename: overrides.filename.or(self.filename),
            extra_data: merge_maps(self.extra_data, overrides.extra_data),
            params: merge_maps(self.params, overrides.params),
            headers: merge_maps(self.headers, overrides.headers),
        }
    }
}

impl RedisUploadOptions {
    pub fn merge(self, overrides: Self) -> Self {
        let (content, content_file) = pick_content(
            (self.content, self.content_file),
            (overrides.content, overrides.content_file),
        );
        Self {
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            db: overrides.db.or(self.db),
            name: overrides.name.or(self.name),
            content,
            content_file,
            redis_command: overrides.redis_command.or(self.redis_command),
        }
    }
}

impl DeviceBackupOptions {
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            defaults: overrides.defaults.or(self.defaults),
            socket_path: overrides.socket_path.or(self.socket_path),
            filename: overrides.filename.or(self.filename),
            dir_path: overrides.dir_path.or(self.dir_path),
            hostname: overrides.hostname.or(self.hostname),
        }
    }
}

/// Read the payload from `content` or `content_file` and normalize it
fn resolve_content(
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> crate::error::Result<String> {
    match (content, content_file) {
        (Some(_), Some(_)) => Err(DispatchError::invalid(
            "content",
            "content and content_file are mutually exclusive",
        )),
        (Some(text), None) => Ok(payload::normalize_payload(text.into())),
        (None, Some(path)) => {
            let bytes = read_content_file(&path)?;
            Ok(payload::normalize_payload(bytes.into()))
        }
        (None, None) => Err(DispatchError::MissingParameter("content")),
    }
}

fn read_content_file(path: &Path) -> crate::error::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    fs::read(path).map_err(|e| {
        DispatchError::invalid("content_file", format!("{}: {}", path.display(), e))
    })
}

/// Only an absent value is missing; an empty string is a valid value
fn required(value: Option<String>, name: &'static str) -> crate::error::Result<String> {
    value.ok_or(DispatchError::MissingParameter(name))
}

/// Resolve HTTP upload parameters (request > config defaults > built-ins)
pub fn resolve_http_upload(
    defaults: &HttpUploadOptions,
    request: HttpUploadOptions,
) -> crate::error::Result<HttpUploadParams> {
    let merged = defaults.clone().merge(request);

    let url = required(merged.url, "url")?;
    let content = resolve_content(merged.content, merged.content_file)?;

    Ok(HttpUploadParams {
        url,
        content,
        field: merged.field.unwrap_or_else(|| DEFAULT_HTTP_FIELD.to_string()),
        filename: merged
            .filename
            .unwrap_or_else(|| DEFAULT_HTTP_FILENAME.to_string()),
        extra_data: merged.extra_data,
        params: merged.params,
        headers: merged.headers,
    })
}

/// Resolve Redis write parameters (request > config defaults > built-ins)
///
/// The command is checked first so an unknown command never reaches Redis.
pub fn resolve_redis_upload(
    defaults: &RedisUploadOptions,
    request: RedisUploadOptions,
) -> crate::error::Result<RedisUploadParams> {
    let merged = defaults.clone().merge(request);

    let command = match merged.redis_command {
        Some(ref raw) => raw
            .parse::<RedisCommand>()
            .map_err(DispatchError::UnknownCommand)?,
        None => RedisCommand::Set,
    };

    if merged.port == Some(0) {
        return Err(DispatchError::invalid("port", "port must not be 0"));
    }

    let name = required(merged.name, "name")?;
    let content = resolve_content(merged.content, merged.content_file)?;

    Ok(RedisUploadParams {
        server: RedisServer {
            host: merged
                .host
                .unwrap_or_else(|| DEFAULT_REDIS_HOST.to_string()),
            port: merged.port.unwrap_or(DEFAULT_REDIS_PORT),
            db: merged.db.unwrap_or(DEFAULT_REDIS_DB),
        },
        name,
        content,
        command,
    })
}

/// Resolve device backup parameters (request > config defaults > built-ins)
pub fn resolve_device_backup(
    defaults: &DeviceBackupOptions,
    request: DeviceBackupOptions,
) -> DeviceBackupParams {
    let merged = defaults.clone().merge(request);

    let file = if merged.filename.is_some() || merged.dir_path.is_some() {
        Some(BackupFile {
            dir_path: merged
                .dir_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
            filename: merged.filename,
        })
    } else {
        None
    };

    DeviceBackupParams {
        defaults: merged.defaults.unwrap_or(false),
        socket_path: merged.socket_path,
        file,
        hostname: merged.hostname,
    }
}
