//! Device capability map
//!
//! The connection layer describes which optional retrieval features a device
//! supports and which RPCs it exposes. This module only reads that map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Optional retrieval features a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Include default values in the running configuration
    Defaults,
}

impl Feature {
    pub const ALL: [Feature; 1] = [Feature::Defaults];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Defaults => "defaults",
        }
    }

    /// Key under `device_operations` declaring support
    pub fn capability_key(&self) -> String {
        format!("supports_{}", self.name())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Support status of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Yes,
    No,
    /// The provider does not say either way
    Undeclared,
}

/// RPC that returns the flag for retrieving configuration with defaults
pub const DEFAULT_FLAG_RPC: &str = "get_default_flag";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceCapabilities {
    #[serde(default)]
    pub rpc: Vec<String>,
    #[serde(default)]
    pub device_operations: Map<String, Value>,
    #[serde(default)]
    pub device_info: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_api: Option<String>,
}

impl DeviceCapabilities {
    pub fn is_empty(&self) -> bool {
        self.rpc.is_empty()
            && self.device_operations.is_empty()
            && self.device_info.is_empty()
            && self.network_api.is_none()
    }

    pub fn supports(&self, feature: Feature) -> Support {
        match self.device_operations.get(&feature.capability_key()) {
            None | Some(Value::Null) => Support::Undeclared,
            Some(value) if is_truthy(value) => Support::Yes,
            Some(_) => Support::No,
        }
    }

    pub fn has_rpc(&self, name: &str) -> bool {
        self.rpc.iter().any(|r| r == name)
    }

    /// Hostname reported by the device, if any
    pub fn hostname(&self) -> Option<&str> {
        self.device_info
            .get("network_os_hostname")
            .and_then(Value::as_str)
            .filter(|h| !h.is_empty())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
