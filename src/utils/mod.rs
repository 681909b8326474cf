pub mod payload;

// Trait-based abstractions for testability
pub mod redis_ops;
pub mod transport;
#[cfg(unix)]
pub mod jsonrpc;

// Re-export commonly used types and traits (used by test crate)
pub use redis_ops::{RealRedisOps, RedisOperations, RedisReply};
pub use transport::{DeviceTransport, RetrievalFlags};
