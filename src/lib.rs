//! Backup Dispatch Library
//!
//! This library delivers configuration backups to a sink (HTTP multipart
//! upload, Redis key write) or pulls them from a source (network device over
//! the persistent connection socket), one external call per invocation.

pub mod config;
pub mod error;
pub mod managers;
pub mod result;
pub mod sinks;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config};
pub use error::DispatchError;
pub use managers::dispatch::Dispatcher;
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use result::{DispatchResult, ResultRecord};
