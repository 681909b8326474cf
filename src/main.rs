use anyhow::Result;
use backup_dispatch::config::{
    self, Config, ConfigError, DeviceBackupOptions, HttpUploadOptions, RedisUploadOptions,
};
use backup_dispatch::managers::logging::{self, LogGuard, LoggingConfig};
use backup_dispatch::sinks::{HttpUploadRecord, RedisWriteRecord};
use backup_dispatch::sources::DeviceBackupRecord;
use backup_dispatch::{DispatchError, DispatchResult, Dispatcher, ResultRecord};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(name = "backup-dispatch")]
#[command(about = "Deliver configuration backups to HTTP or Redis, or pull them from a device", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON file holding the parameter record of the command
    #[arg(long, global = true)]
    args_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a backup to an HTTP endpoint as multipart form data
    HttpUpload(HttpUploadArgs),

    /// Write a backup to a Redis key
    RedisUpload(RedisUploadArgs),

    /// Retrieve the running configuration from a network device
    DeviceBackup(DeviceBackupArgs),

    /// Validate configuration file
    Validate,
}

#[derive(Args)]
struct HttpUploadArgs {
    /// Endpoint accepting multipart/form-data
    #[arg(long)]
    url: Option<String>,

    /// Backup content
    #[arg(long)]
    content: Option<String>,

    /// Read the backup content from a file (`-` for stdin)
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Form field carrying the file [default: backup]
    #[arg(long)]
    field: Option<String>,

    /// File name of the uploaded part [default: backup.cfg]
    #[arg(long)]
    filename: Option<String>,

    /// Extra form field (repeatable)
    #[arg(long = "extra-data", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    extra_data: Vec<(String, String)>,

    /// Query string parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Request header (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    headers: Vec<(String, String)>,
}

#[derive(Args)]
struct RedisUploadArgs {
    /// Redis host [default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Redis port [default: 6379]
    #[arg(long)]
    port: Option<u16>,

    /// Logical database [default: 1]
    #[arg(long)]
    db: Option<i64>,

    /// Key to write
    #[arg(long)]
    name: Option<String>,

    /// Backup content
    #[arg(long)]
    content: Option<String>,

    /// Read the backup content from a file (`-` for stdin)
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// One of set, xadd, lpush, rpush [default: set]
    #[arg(long)]
    redis_command: Option<String>,
}

#[derive(Args)]
struct DeviceBackupArgs {
    /// Unix socket of the persistent device connection
    #[arg(long)]
    socket_path: Option<PathBuf>,

    /// Retrieve the configuration including default values (`--defaults=false` to turn off)
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    defaults: Option<bool>,

    /// Also write the backup to this file name
    #[arg(long)]
    filename: Option<String>,

    /// Directory for the on-disk copy [default: backup]
    #[arg(long)]
    dir_path: Option<PathBuf>,

    /// Hostname used in generated file names
    #[arg(long)]
    hostname: Option<String>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn into_map(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

impl From<HttpUploadArgs> for HttpUploadOptions {
    fn from(args: HttpUploadArgs) -> Self {
        Self {
            url: args.url,
            content: args.content,
            content_file: args.content_file,
            field: args.field,
            filename: args.filename,
            extra_data: into_map(args.extra_data),
            params: into_map(args.params),
            headers: into_map(args.headers),
        }
    }
}

impl From<RedisUploadArgs> for RedisUploadOptions {
    fn from(args: RedisUploadArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            db: args.db,
            name: args.name,
            content: args.content,
            content_file: args.content_file,
            redis_command: args.redis_command,
        }
    }
}

impl From<DeviceBackupArgs> for DeviceBackupOptions {
    fn from(args: DeviceBackupArgs) -> Self {
        Self {
            defaults: args.defaults,
            socket_path: args.socket_path,
            filename: args.filename,
            dir_path: args.dir_path,
            hostname: args.hostname,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    if let Commands::Validate = cli.command {
        return handle_validate(cli.config.as_deref());
    }

    let config = match load_optional_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return early_failure(&cli.command, DispatchError::Config(e)),
    };

    // Must stay alive until the result is written
    let _log_guard = init_logging(&config);

    let dispatcher = Dispatcher::new(config);
    let args_file = cli.args_file.as_deref();

    match cli.command {
        Commands::HttpUpload(args) => {
            let request = match layered::<HttpUploadOptions>(args_file, args.into()) {
                Ok(request) => request,
                Err(e) => return emit(&DispatchResult::<HttpUploadRecord>::from_error(&e)),
            };
            emit(&dispatcher.upload_http(request))
        }
        Commands::RedisUpload(args) => {
            let request = match layered::<RedisUploadOptions>(args_file, args.into()) {
                Ok(request) => request,
                Err(e) => return emit(&DispatchResult::<RedisWriteRecord>::from_error(&e)),
            };
            emit(&dispatcher.upload_redis(request))
        }
        Commands::DeviceBackup(args) => {
            let request = match layered::<DeviceBackupOptions>(args_file, args.into()) {
                Ok(request) => request,
                Err(e) => return emit(&DispatchResult::<DeviceBackupRecord>::from_error(&e)),
            };
            emit(&dispatcher.backup_device(request))
        }
        Commands::Validate => unreachable!("handled above"),
    }
}

/// Options from the args file (if any) with CLI flags layered on top
trait Layered: Sized + serde::de::DeserializeOwned {
    fn merge_over(self, overrides: Self) -> Self;
}

impl Layered for HttpUploadOptions {
    fn merge_over(self, overrides: Self) -> Self {
        self.merge(overrides)
    }
}

impl Layered for RedisUploadOptions {
    fn merge_over(self, overrides: Self) -> Self {
        self.merge(overrides)
    }
}

impl Layered for DeviceBackupOptions {
    fn merge_over(self, overrides: Self) -> Self {
        self.merge(overrides)
    }
}

fn layered<T: Layered>(args_file: Option<&Path>, cli: T) -> std::result::Result<T, DispatchError> {
    match args_file {
        Some(path) => {
            let from_file: T = config::load_args_file(path)?;
            Ok(from_file.merge_over(cli))
        }
        None => Ok(cli),
    }
}

fn load_optional_config(path: Option<&Path>) -> config::Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(Config::default()),
    }
}

/// File logging when configured; console only when it is not, or cannot be set up
fn init_logging(config: &Config) -> LogGuard {
    let Some(logging_config) = LoggingConfig::from_global(&config.global) else {
        return logging::init_console_logging(&config.global.log_level);
    };

    match logging::init_logging(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            let guard = logging::init_console_logging(&config.global.log_level);
            warn!("File logging disabled: {:#}", e);
            guard
        }
    }
}

fn early_failure(command: &Commands, error: DispatchError) -> Result<i32> {
    match command {
        Commands::HttpUpload(_) => emit(&DispatchResult::<HttpUploadRecord>::from_error(&error)),
        Commands::RedisUpload(_) => emit(&DispatchResult::<RedisWriteRecord>::from_error(&error)),
        Commands::DeviceBackup(_) => {
            emit(&DispatchResult::<DeviceBackupRecord>::from_error(&error))
        }
        Commands::Validate => Err(error.into()),
    }
}

/// Write the result record to stdout and return the exit code
fn emit<T: ResultRecord>(result: &DispatchResult<T>) -> Result<i32> {
    println!("{}", serde_json::to_string(result)?);
    Ok(result.exit_code())
}

fn handle_validate(path: Option<&Path>) -> Result<i32> {
    let Some(path) = path else {
        println!("No configuration file given; built-in defaults apply");
        return Ok(0);
    };

    match config::load_config(path) {
        Ok(config) => {
            println!("✓ Configuration is valid: {}", path.display());
            print_summary(&config);
            Ok(0)
        }
        Err(e) => {
            eprintln!("✗ Configuration is invalid: {}", path.display());
            eprintln!("  {}", e);
            if let ConfigError::ParseError(_) = e {
                eprintln!("  (check the TOML syntax and field types)");
            }
            Ok(1)
        }
    }
}

fn print_summary(config: &Config) {
    #[derive(Serialize)]
    struct Summary<'a> {
        http: &'a HttpUploadOptions,
        redis: &'a RedisUploadOptions,
        device: &'a DeviceBackupOptions,
    }

    match config.global.log_directory {
        Some(ref dir) => println!(
            "  Logging: {} to {} (keep {} files)",
            config.global.log_level,
            dir.display(),
            config.global.log_max_files
        ),
        None => println!("  Logging: {} to stderr", config.global.log_level),
    }

    let summary = Summary {
        http: &config.http,
        redis: &config.redis,
        device: &config.device,
    };
    if let Ok(text) = toml::to_string_pretty(&summary) {
        if !text.trim().is_empty() {
            println!("  Defaults:");
            for line in text.lines() {
                println!("    {}", line);
            }
        }
    }
}
