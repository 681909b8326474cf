//! Device config source
//!
//! Negotiates optional retrieval features against the device's capability
//! map and pulls the running configuration over a [`DeviceTransport`].
//! Every fatal condition is raised before `get_config` is called.

use super::capabilities::{DeviceCapabilities, Feature, Support, DEFAULT_FLAG_RPC};
use crate::config::{expand_tilde, BackupFile, DeviceBackupParams};
use crate::error::{DispatchError, Result};
use crate::result::ResultRecord;
use crate::utils::transport::{DeviceTransport, RetrievalFlags};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Success record of a device backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceBackupRecord {
    #[serde(rename = "__backup__")]
    pub backup: String,
    /// Set when the configuration was also written to disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl ResultRecord for DeviceBackupRecord {
    fn sentinel() -> Self {
        Self {
            backup: String::new(),
            backup_path: None,
        }
    }
}

/// Features the caller asked for
pub fn requested_features(use_defaults: bool) -> Vec<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| match f {
            Feature::Defaults => use_defaults,
        })
        .collect()
}

/// Fail unless every requested feature is declared and supported
pub fn validate_features(capabilities: &DeviceCapabilities, requested: &[Feature]) -> Result<()> {
    for feature in requested {
        match capabilities.supports(*feature) {
            Support::Yes => debug!("Feature '{}' supported", feature),
            Support::No => return Err(DispatchError::CapabilityUnsupported(*feature)),
            Support::Undeclared => return Err(DispatchError::CapabilityUndeclared(*feature)),
        }
    }
    Ok(())
}

/// Flags to pass to configuration retrieval
pub fn resolve_flags<T: DeviceTransport + ?Sized>(
    use_defaults: bool,
    capabilities: &DeviceCapabilities,
    transport: &T,
) -> Result<RetrievalFlags> {
    if !use_defaults {
        return Ok(RetrievalFlags::None);
    }

    if capabilities.has_rpc(DEFAULT_FLAG_RPC) {
        Ok(RetrievalFlags::Device(transport.get_default_flag()?))
    } else {
        Ok(RetrievalFlags::All)
    }
}

/// `<hostname>_config.<YYYY-MM-DD>@<HH:MM:SS>`
pub fn default_backup_filename(hostname: &str, at: NaiveDateTime) -> String {
    format!("{}_config.{}", hostname, at.format("%Y-%m-%d@%H:%M:%S"))
}

pub struct DeviceConfigSource<'a, T: DeviceTransport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: DeviceTransport + ?Sized> DeviceConfigSource<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Query capabilities from the transport, then retrieve the config
    pub fn fetch_config(&self, use_defaults: bool) -> Result<String> {
        let capabilities = self.query_capabilities()?;
        self.fetch_config_with(use_defaults, &capabilities)
    }

    /// Retrieve the config against an already known capability map
    pub fn fetch_config_with(
        &self,
        use_defaults: bool,
        capabilities: &DeviceCapabilities,
    ) -> Result<String> {
        validate_features(capabilities, &requested_features(use_defaults))?;
        let flags = resolve_flags(use_defaults, capabilities, self.transport)?;
        debug!("Retrieving running config with flags {:?}", flags);
        self.transport.get_config(&flags)
    }

    /// Full backup: retrieve, and optionally write the on-disk copy
    pub fn backup(&self, params: &DeviceBackupParams) -> Result<DeviceBackupRecord> {
        let capabilities = self.query_capabilities()?;
        let config = self.fetch_config_with(params.defaults, &capabilities)?;

        let backup_path = match params.file {
            Some(ref file) => {
                let hostname = params
                    .hostname
                    .as_deref()
                    .or_else(|| capabilities.hostname())
                    .unwrap_or("device");
                Some(write_backup_file(file, hostname, &config)?)
            }
            None => None,
        };

        Ok(DeviceBackupRecord {
            backup: config,
            backup_path,
        })
    }

    fn query_capabilities(&self) -> Result<DeviceCapabilities> {
        let capabilities = self.transport.get_capabilities()?.unwrap_or_default();
        if capabilities.is_empty() {
            debug!("Device reported no capabilities");
        }
        Ok(capabilities)
    }
}

fn write_backup_file(file: &BackupFile, hostname: &str, config: &str) -> Result<PathBuf> {
    let dir = expand_tilde(&file.dir_path);
    fs::create_dir_all(&dir)?;

    let filename = match file.filename {
        Some(ref name) => name.clone(),
        None => default_backup_filename(hostname, chrono::Local::now().naive_local()),
    };

    let path = dir.join(filename);
    fs::write(&path, config)?;
    info!("Wrote device backup to {:?}", path);
    Ok(path)
}
