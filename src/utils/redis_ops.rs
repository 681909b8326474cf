//! Redis operations abstraction for testability
//!
//! This module provides a trait-based abstraction over the Redis write
//! primitives, enabling dependency injection and mocking for tests.

use crate::config::{RedisCommand, RedisServer};
use crate::error::Result;
use serde::{Serialize, Serializer};
use tracing::debug;

/// Raw reply of a write command, exposed to the caller verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisReply {
    /// New list length (LPUSH/RPUSH)
    Integer(i64),
    /// Status reply of SET
    Okay,
    /// Stream entry id (XADD) or any other textual reply
    Text(String),
    Nil,
}

impl RedisReply {
    pub fn from_value(value: redis::Value) -> Self {
        match value {
            redis::Value::Int(i) => RedisReply::Integer(i),
            redis::Value::Okay => RedisReply::Okay,
            redis::Value::SimpleString(s) if s == "OK" => RedisReply::Okay,
            redis::Value::SimpleString(s) => RedisReply::Text(s),
            redis::Value::BulkString(b) => {
                RedisReply::Text(String::from_utf8_lossy(&b).to_string())
            }
            redis::Value::Nil => RedisReply::Nil,
            other => RedisReply::Text(format!("{:?}", other)),
        }
    }
}

impl Serialize for RedisReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RedisReply::Integer(i) => serializer.serialize_i64(*i),
            RedisReply::Okay => serializer.serialize_bool(true),
            RedisReply::Text(s) => serializer.serialize_str(s),
            RedisReply::Nil => serializer.serialize_none(),
        }
    }
}

/// Abstraction for Redis writes, enabling mocking in tests
pub trait RedisOperations: Send + Sync {
    /// Run one write command against `server`
    fn execute(
        &self,
        server: &RedisServer,
        command: RedisCommand,
        key: &str,
        content: &str,
    ) -> Result<RedisReply>;
}

/// Default implementation opening one connection per call
#[derive(Debug, Clone, Default)]
pub struct RealRedisOps;

impl RealRedisOps {
    pub fn new() -> Self {
        Self
    }

    fn connection_info(server: &RedisServer) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(server.host.clone(), server.port),
            redis: redis::RedisConnectionInfo {
                db: server.db,
                ..Default::default()
            },
        }
    }
}

/// Build the wire command for a write primitive
pub fn build_command(command: RedisCommand, key: &str, content: &str) -> redis::Cmd {
    match command {
        RedisCommand::Set => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(content);
            cmd
        }
        RedisCommand::Lpush => {
            let mut cmd = redis::cmd("LPUSH");
            cmd.arg(key).arg(content);
            cmd
        }
        RedisCommand::Rpush => {
            let mut cmd = redis::cmd("RPUSH");
            cmd.arg(key).arg(content);
            cmd
        }
        RedisCommand::Xadd => {
            let mut cmd = redis::cmd("XADD");
            cmd.arg(key).arg("*").arg("content").arg(content);
            cmd
        }
    }
}

impl RedisOperations for RealRedisOps {
    fn execute(
        &self,
        server: &RedisServer,
        command: RedisCommand,
        key: &str,
        content: &str,
    ) -> Result<RedisReply> {
        debug!("Connecting to redis at {}", server);
        let client = redis::Client::open(Self::connection_info(server))?;
        let mut con = client.get_connection()?;

        let value: redis::Value = build_command(command, key, content).query(&mut con)?;
        debug!("{} {} -> {:?}", command, key, value);

        Ok(RedisReply::from_value(value))
    }
}

/// Mock implementation for testing
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use crate::error::DispatchError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// Recorded operation call
    #[derive(Clone, Debug, PartialEq)]
    pub struct RedisCall {
        pub server: RedisServer,
        pub command: RedisCommand,
        pub key: String,
        pub content: String,
    }

    #[derive(Clone, Debug)]
    enum Entry {
        Text(String),
        List(VecDeque<String>),
        Stream(Vec<(String, String)>),
    }

    /// In-memory keyspace standing in for a Redis server
    #[derive(Clone, Default)]
    pub struct MockRedisOps {
        /// Recorded operation calls (one per connection)
        pub calls: Arc<Mutex<Vec<RedisCall>>>,
        store: Arc<Mutex<HashMap<String, Entry>>>,
        stream_seq: Arc<Mutex<u64>>,
        fail_with: Option<String>,
    }

    impl MockRedisOps {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every call fail as if the server were unreachable
        pub fn with_failure(mut self, message: &str) -> Self {
            self.fail_with = Some(message.to_string());
            self
        }

        pub fn get_calls(&self) -> Vec<RedisCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Number of connections opened
        pub fn connection_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// String value at `key`
        pub fn get(&self, key: &str) -> Option<String> {
            match self.store.lock().unwrap().get(key) {
                Some(Entry::Text(s)) => Some(s.clone()),
                _ => None,
            }
        }

        /// List contents at `key`, head first
        pub fn list(&self, key: &str) -> Vec<String> {
            match self.store.lock().unwrap().get(key) {
                Some(Entry::List(items)) => items.iter().cloned().collect(),
                _ => Vec::new(),
            }
        }

        /// Stream entries at `key` as (id, content)
        pub fn stream(&self, key: &str) -> Vec<(String, String)> {
            match self.store.lock().unwrap().get(key) {
                Some(Entry::Stream(entries)) => entries.clone(),
                _ => Vec::new(),
            }
        }

        fn wrong_type() -> DispatchError {
            DispatchError::Transport(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )
        }

        fn push(&self, key: &str, content: &str, front: bool) -> Result<RedisReply> {
            let mut store = self.store.lock().unwrap();
            let entry = store
                .entry(key.to_string())
                .or_insert_with(|| Entry::List(VecDeque::new()));
            match entry {
                Entry::List(items) => {
                    if front {
                        items.push_front(content.to_string());
                    } else {
                        items.push_back(content.to_string());
                    }
                    Ok(RedisReply::Integer(items.len() as i64))
                }
                _ => Err(Self::wrong_type()),
            }
        }

        fn append(&self, key: &str, content: &str) -> Result<RedisReply> {
            let mut seq = self.stream_seq.lock().unwrap();
            let mut store = self.store.lock().unwrap();
            let entry = store
                .entry(key.to_string())
                .or_insert_with(|| Entry::Stream(Vec::new()));
            match entry {
                Entry::Stream(entries) => {
                    *seq += 1;
                    let id = format!("{}-0", *seq);
                    entries.push((id.clone(), content.to_string()));
                    Ok(RedisReply::Text(id))
                }
                _ => Err(Self::wrong_type()),
            }
        }
    }

    impl RedisOperations for MockRedisOps {
        fn execute(
            &self,
            server: &RedisServer,
            command: RedisCommand,
            key: &str,
            content: &str,
        ) -> Result<RedisReply> {
            self.calls.lock().unwrap().push(RedisCall {
                server: server.clone(),
                command,
                key: key.to_string(),
                content: content.to_string(),
            });

            if let Some(ref message) = self.fail_with {
                return Err(DispatchError::Transport(message.clone()));
            }

            match command {
                RedisCommand::Set => {
                    self.store
                        .lock()
                        .unwrap()
                        .insert(key.to_string(), Entry::Text(content.to_string()));
                    Ok(RedisReply::Okay)
                }
                RedisCommand::Lpush => self.push(key, content, true),
                RedisCommand::Rpush => self.push(key, content, false),
                RedisCommand::Xadd => self.append(key, content),
            }
        }
    }
}
