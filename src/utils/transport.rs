//! Device transport abstraction for testability
//!
//! The persistent device connection is owned by the host. This trait is the
//! seam the device config source talks through.

use crate::error::Result;
use crate::sources::capabilities::DeviceCapabilities;
use serde_json::Value;

/// Flags passed to configuration retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalFlags {
    /// No flags
    None,
    /// Retrieve the full configuration including defaults
    All,
    /// Flag value supplied by the device's own default-flag RPC
    Device(Value),
}

impl RetrievalFlags {
    /// Wire representation sent to the connection
    pub fn to_value(&self) -> Value {
        match self {
            RetrievalFlags::None => Value::Array(Vec::new()),
            RetrievalFlags::All => Value::String("all".to_string()),
            RetrievalFlags::Device(value) => value.clone(),
        }
    }
}

/// Abstraction over the device CLI connection, enabling mocking in tests
pub trait DeviceTransport {
    /// Capability map; `None` when the connection reports nothing
    fn get_capabilities(&self) -> Result<Option<DeviceCapabilities>>;

    /// Retrieve the running configuration
    fn get_config(&self, flags: &RetrievalFlags) -> Result<String>;

    /// Flag value that makes `get_config` include defaults
    fn get_default_flag(&self) -> Result<Value>;
}

/// Mock transport for testing
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use crate::error::DispatchError;
    use std::sync::{Arc, Mutex};

    /// Recorded transport call
    #[derive(Clone, Debug, PartialEq)]
    pub enum TransportCall {
        GetCapabilities,
        GetConfig { flags: RetrievalFlags },
        GetDefaultFlag,
    }

    /// Mock device transport
    #[derive(Clone, Default)]
    pub struct MockTransport {
        /// Recorded calls
        pub calls: Arc<Mutex<Vec<TransportCall>>>,
        capabilities: Option<DeviceCapabilities>,
        config: String,
        default_flag: Value,
        fail_with: Option<String>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                config: "!\nhostname mock-device\n!\n".to_string(),
                default_flag: Value::String("include-default".to_string()),
                ..Default::default()
            }
        }

        /// Configure the capability map returned
        pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
            self.capabilities = Some(capabilities);
            self
        }

        /// Configure the running config returned
        pub fn with_config(mut self, config: &str) -> Self {
            self.config = config.to_string();
            self
        }

        /// Configure the default flag returned
        pub fn with_default_flag(mut self, flag: Value) -> Self {
            self.default_flag = flag;
            self
        }

        /// Make every call fail with a transport error
        pub fn with_failure(mut self, message: &str) -> Self {
            self.fail_with = Some(message.to_string());
            self
        }

        pub fn get_calls(&self) -> Vec<TransportCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Flags of every `get_config` call
        pub fn config_requests(&self) -> Vec<RetrievalFlags> {
            self.get_calls()
                .into_iter()
                .filter_map(|c| match c {
                    TransportCall::GetConfig { flags } => Some(flags),
                    _ => None,
                })
                .collect()
        }

        pub fn default_flag_called(&self) -> bool {
            self.get_calls()
                .iter()
                .any(|c| matches!(c, TransportCall::GetDefaultFlag))
        }

        fn record_call(&self, call: TransportCall) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with {
                Some(ref message) => Err(DispatchError::Transport(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl DeviceTransport for MockTransport {
        fn get_capabilities(&self) -> Result<Option<DeviceCapabilities>> {
            self.record_call(TransportCall::GetCapabilities)?;
            Ok(self.capabilities.clone())
        }

        fn get_config(&self, flags: &RetrievalFlags) -> Result<String> {
            self.record_call(TransportCall::GetConfig {
                flags: flags.clone(),
            })?;
            Ok(self.config.clone())
        }

        fn get_default_flag(&self) -> Result<Value> {
            self.record_call(TransportCall::GetDefaultFlag)?;
            Ok(self.default_flag.clone())
        }
    }
}
