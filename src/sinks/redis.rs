//! Redis sink: stores a payload under a key with one write primitive

use crate::config::RedisUploadParams;
use crate::error::Result;
use crate::result::ResultRecord;
use crate::utils::redis_ops::{RedisOperations, RedisReply};
use serde::Serialize;
use tracing::debug;

/// Success record of a Redis write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisWriteRecord {
    /// Driver reply as returned (list length, stream id, or OK marker)
    pub code: RedisReply,
}

impl ResultRecord for RedisWriteRecord {
    fn sentinel() -> Self {
        Self {
            code: RedisReply::Integer(0),
        }
    }
}

pub struct RedisSink<'a, O: RedisOperations + ?Sized> {
    ops: &'a O,
}

impl<'a, O: RedisOperations + ?Sized> RedisSink<'a, O> {
    pub fn new(ops: &'a O) -> Self {
        Self { ops }
    }

    pub fn write(&self, params: &RedisUploadParams) -> Result<RedisWriteRecord> {
        debug!(
            "{} '{}' on {} ({} bytes)",
            params.command,
            params.name,
            params.server,
            params.content.len()
        );
        let code = self
            .ops
            .execute(&params.server, params.command, &params.name, &params.content)?;
        Ok(RedisWriteRecord { code })
    }
}
