//! Test utilities for backup-dispatch
//!
//! This crate provides shared test utilities, fixtures and re-exports of the
//! mock sinks and transports that live in the main crate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, MockRedisOps};
//!
//! #[test]
//! fn my_test() {
//!     let (config, _dir) = ConfigBuilder::new().with_redis_host("cache").persist();
//!     let ops = MockRedisOps::new();
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use backup_dispatch::config::{
    Config, DeviceBackupOptions, GlobalConfig, HttpUploadOptions, RedisCommand,
    RedisUploadOptions,
};
pub use backup_dispatch::result::DispatchResult;
pub use backup_dispatch::sources::DeviceCapabilities;

// Re-export mock implementations from the main crate
pub use backup_dispatch::utils::redis_ops::mock::{MockRedisOps, RedisCall};
pub use backup_dispatch::utils::redis_ops::{RedisOperations, RedisReply};
pub use backup_dispatch::utils::transport::mock::{MockTransport, TransportCall};
pub use backup_dispatch::utils::transport::{DeviceTransport, RetrievalFlags};

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
