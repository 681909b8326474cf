//! Test fixtures and sample data
//!
//! Provides capability maps, sample running configs and payloads.

use backup_dispatch::sources::DeviceCapabilities;
use serde_json::{json, Value};

/// A short running configuration as a device would return it
pub fn sample_running_config() -> &'static str {
    "!\nhostname edge-rtr-01\n!\ninterface Loopback0\n ip address 10.0.0.1 255.255.255.255\n!\nend\n"
}

/// Payload containing bytes that are not valid UTF-8
pub fn invalid_utf8_payload() -> Vec<u8> {
    let mut bytes = b"hostname r1\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b"interface eth0\n");
    bytes
}

/// [`invalid_utf8_payload`] with the invalid bytes removed
pub fn invalid_utf8_payload_cleaned() -> &'static str {
    "hostname r1\ninterface eth0\n"
}

/// Capabilities of a device that supports defaults through its own flag RPC
pub fn capabilities_with_default_flag() -> DeviceCapabilities {
    capabilities_from(json!({
        "rpc": ["get_config", "get_capabilities", "get_default_flag"],
        "device_operations": {"supports_defaults": true},
        "device_info": {"network_os": "ios", "network_os_hostname": "edge-rtr-01"},
        "network_api": "cliconf",
    }))
}

/// Capabilities of a device that supports defaults without a flag RPC
pub fn capabilities_with_defaults() -> DeviceCapabilities {
    capabilities_from(json!({
        "rpc": ["get_config", "get_capabilities"],
        "device_operations": {"supports_defaults": true},
        "device_info": {"network_os_hostname": "core-sw-02"},
    }))
}

/// Capabilities of a device that explicitly lacks defaults support
pub fn capabilities_without_defaults() -> DeviceCapabilities {
    capabilities_from(json!({
        "rpc": ["get_config"],
        "device_operations": {"supports_defaults": false},
    }))
}

/// Capabilities that say nothing about defaults
pub fn capabilities_undeclared() -> DeviceCapabilities {
    capabilities_from(json!({
        "rpc": ["get_config"],
        "device_operations": {"supports_commit": true},
    }))
}

pub fn capabilities_from(value: Value) -> DeviceCapabilities {
    serde_json::from_value(value).expect("Invalid capability fixture")
}
