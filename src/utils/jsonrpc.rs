//! JSON-RPC transport over the persistent connection socket
//!
//! Every RPC opens its own Unix socket connection. Frames in both directions
//! are an 8-byte big-endian length followed by the JSON document.

use super::transport::{DeviceTransport, RetrievalFlags};
use crate::error::{DispatchError, Result};
use crate::sources::capabilities::DeviceCapabilities;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Upper bound on a single response frame
const MAX_FRAME_LEN: u64 = 256 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn describe(&self) -> String {
        let text = match self.data {
            Some(Value::String(ref s)) if !s.is_empty() => s.clone(),
            Some(ref v) if !v.is_null() => v.to_string(),
            _ => self.message.clone(),
        };
        if text.is_empty() {
            format!("json-rpc error {}", self.code)
        } else {
            text
        }
    }
}

/// Device transport speaking JSON-RPC 2.0 over a Unix domain socket
#[derive(Debug)]
pub struct SocketTransport {
    socket_path: PathBuf,
    next_id: AtomicU64,
}

impl SocketTransport {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request_id(&self) -> String {
        format!(
            "{}-{}",
            std::process::id(),
            self.next_id.fetch_add(1, Ordering::Relaxed)
        )
    }

    /// Invoke `method` and return its `result`
    pub fn call(&self, method: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value> {
        let id = self.request_id();
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "id": id,
            "params": [args, kwargs],
        });

        debug!("json-rpc call {} (id {})", method, id);

        let mut stream = UnixStream::connect(&self.socket_path).map_err(|e| {
            DispatchError::Transport(format!(
                "unable to connect to socket {}: {}",
                self.socket_path.display(),
                e
            ))
        })?;

        let body = serde_json::to_vec(&request)
            .map_err(|e| DispatchError::Transport(format!("failed to encode request: {}", e)))?;
        write_frame(&mut stream, &body)?;
        let data = read_frame(&mut stream)?;

        let response: RpcResponse = serde_json::from_slice(&data).map_err(|e| {
            DispatchError::Transport(format!("invalid json-rpc response: {}", e))
        })?;

        if response.id.as_deref() != Some(id.as_str()) {
            return Err(DispatchError::Transport(
                "invalid json-rpc id received".to_string(),
            ));
        }

        if let Some(error) = response.error {
            return Err(DispatchError::Transport(error.describe()));
        }

        Ok(response.result)
    }
}

impl DeviceTransport for SocketTransport {
    fn get_capabilities(&self) -> Result<Option<DeviceCapabilities>> {
        let raw = self.call("get_capabilities", Vec::new(), Map::new())?;

        // Cliconf plugins return the map JSON-encoded as a string
        let value = match raw {
            Value::Null => return Ok(None),
            Value::String(ref s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => serde_json::from_str(&s).map_err(|e| {
                DispatchError::Transport(format!("invalid capabilities document: {}", e))
            })?,
            other => other,
        };

        if value.is_null() {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| DispatchError::Transport(format!("invalid capabilities document: {}", e)))
    }

    fn get_config(&self, flags: &RetrievalFlags) -> Result<String> {
        let mut kwargs = Map::new();
        kwargs.insert("flags".to_string(), flags.to_value());

        match self.call("get_config", Vec::new(), kwargs)? {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(DispatchError::Transport(format!(
                "unexpected get_config result: {}",
                other
            ))),
        }
    }

    fn get_default_flag(&self) -> Result<Value> {
        self.call("get_default_flag", Vec::new(), Map::new())
    }
}

pub(crate) fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = payload.len() as u64;
    writer
        .write_all(&len.to_be_bytes())
        .and_then(|_| writer.write_all(payload))
        .and_then(|_| writer.flush())
        .map_err(|e| DispatchError::Transport(format!("failed to send request: {}", e)))
}

pub(crate) fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).map_err(|e| {
        DispatchError::Transport(format!("connection closed before response: {}", e))
    })?;

    let len = u64::from_be_bytes(header);
    if len > MAX_FRAME_LEN {
        return Err(DispatchError::Transport(format!(
            "response frame too large: {} bytes",
            len
        )));
    }

    let mut data = vec![0u8; len as usize];
    reader
        .read_exact(&mut data)
        .map_err(|e| DispatchError::Transport(format!("truncated response: {}", e)))?;
    Ok(data)
}
