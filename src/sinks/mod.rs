//! Backup sinks
//!
//! A sink accepts a normalized payload and delivers it with exactly one
//! external call.

pub mod http;
pub mod redis;

pub use self::http::{HttpSink, HttpUploadRecord};
pub use self::redis::{RedisSink, RedisWriteRecord};
