//! Dispatch manager - runs one sink or source per invocation
//!
//! Resolves the parameter record against the config defaults, performs the
//! single external call and folds every outcome into a [`DispatchResult`].
//! Nothing here returns an error to the caller.

use crate::config::{
    resolve_device_backup, resolve_http_upload, resolve_redis_upload, Config,
    DeviceBackupOptions, HttpUploadOptions, RedisUploadOptions,
};
use crate::error::{DispatchError, Result};
use crate::result::{DispatchResult, ResultRecord};
use crate::sinks::{HttpSink, HttpUploadRecord, RedisSink, RedisWriteRecord};
use crate::sources::{DeviceBackupRecord, DeviceConfigSource};
use crate::utils::redis_ops::{RealRedisOps, RedisOperations};
use crate::utils::transport::DeviceTransport;
use std::time::Instant;
use tracing::{error, info};

pub struct Dispatcher {
    config: Config,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Upload a payload to an HTTP endpoint as multipart form data
    pub fn upload_http(&self, request: HttpUploadOptions) -> DispatchResult<HttpUploadRecord> {
        self.run("http-upload", || {
            let params = resolve_http_upload(&self.config.http, request)?;
            info!("Uploading backup to {} as field '{}'", params.url, params.field);
            HttpSink::new()?.upload(&params)
        })
    }

    /// Write a payload to Redis through a fresh connection
    pub fn upload_redis(&self, request: RedisUploadOptions) -> DispatchResult<RedisWriteRecord> {
        self.upload_redis_with(request, &RealRedisOps::new())
    }

    pub fn upload_redis_with<O: RedisOperations + ?Sized>(
        &self,
        request: RedisUploadOptions,
        ops: &O,
    ) -> DispatchResult<RedisWriteRecord> {
        self.run("redis-upload", || {
            let params = resolve_redis_upload(&self.config.redis, request)?;
            info!(
                "Writing backup to redis key '{}' on {} with {}",
                params.name, params.server, params.command
            );
            RedisSink::new(ops).write(&params)
        })
    }

    /// Back up the running config over the persistent connection socket
    #[cfg(unix)]
    pub fn backup_device(&self, request: DeviceBackupOptions) -> DispatchResult<DeviceBackupRecord> {
        use crate::utils::jsonrpc::SocketTransport;

        let socket_path = request
            .socket_path
            .clone()
            .or_else(|| self.config.device.socket_path.clone());

        match socket_path {
            Some(path) => self.backup_device_with(request, &SocketTransport::new(path)),
            None => self.run("device-backup", || {
                Err(DispatchError::MissingParameter("socket_path"))
            }),
        }
    }

    #[cfg(not(unix))]
    pub fn backup_device(&self, _request: DeviceBackupOptions) -> DispatchResult<DeviceBackupRecord> {
        self.run("device-backup", || {
            Err(DispatchError::Transport(
                "the persistent connection socket requires a unix platform".to_string(),
            ))
        })
    }

    pub fn backup_device_with<T: DeviceTransport + ?Sized>(
        &self,
        request: DeviceBackupOptions,
        transport: &T,
    ) -> DispatchResult<DeviceBackupRecord> {
        self.run("device-backup", || {
            let params = resolve_device_backup(&self.config.device, request);
            info!("Retrieving running config (defaults: {})", params.defaults);
            DeviceConfigSource::new(transport).backup(&params)
        })
    }

    fn run<T, F>(&self, command: &str, f: F) -> DispatchResult<T>
    where
        T: ResultRecord,
        F: FnOnce() -> Result<T>,
    {
        let start = Instant::now();
        let result = DispatchResult::from_result(f());
        let elapsed_ms = start.elapsed().as_millis();

        match result.failure_message() {
            None => info!("{} succeeded in {}ms", command, elapsed_ms),
            Some(msg) => error!("{} failed after {}ms: {}", command, elapsed_ms, msg),
        }

        result
    }
}
