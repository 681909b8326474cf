//! Tests for the 'device-backup' command
//!
//! Capability negotiation runs against the mock transport; the socket tests
//! serve length-prefixed JSON-RPC from a listener in the temp dir.

use backup_dispatch::Dispatcher;
use serde_json::json;
use test_utils::*;

fn request(defaults: bool) -> DeviceBackupOptions {
    DeviceBackupOptions {
        defaults: Some(defaults),
        ..Default::default()
    }
}

#[test]
fn test_plain_backup_returns_config() {
    let transport = MockTransport::new()
        .with_capabilities(capabilities_without_defaults())
        .with_config(sample_running_config());

    let result = Dispatcher::new(Config::default()).backup_device_with(request(false), &transport);

    assert!(result.is_success());
    assert_eq!(result.record().backup, sample_running_config());
    assert_eq!(transport.config_requests(), vec![RetrievalFlags::None]);
}

#[test]
fn test_defaults_with_device_flag() {
    let transport = MockTransport::new()
        .with_capabilities(capabilities_with_default_flag())
        .with_default_flag(json!("include-default"));

    let result = Dispatcher::new(Config::default()).backup_device_with(request(true), &transport);

    assert!(result.is_success());
    assert_eq!(
        transport.config_requests(),
        vec![RetrievalFlags::Device(json!("include-default"))]
    );
}

#[test]
fn test_defaults_without_flag_rpc_requests_all() {
    let transport = MockTransport::new().with_capabilities(capabilities_with_defaults());

    let result = Dispatcher::new(Config::default()).backup_device_with(request(true), &transport);

    assert!(result.is_success());
    assert_eq!(transport.config_requests(), vec![RetrievalFlags::All]);
    assert!(!transport.default_flag_called());
}

#[test]
fn test_unsupported_defaults_never_fetches() {
    let transport = MockTransport::new().with_capabilities(capabilities_without_defaults());

    let result = Dispatcher::new(Config::default()).backup_device_with(request(true), &transport);

    assert_eq!(
        result.failure_message(),
        Some("Option defaults is not supported on this platform")
    );
    assert_eq!(result.record().backup, "");
    assert!(transport.config_requests().is_empty());
}

#[test]
fn test_undeclared_defaults_never_fetches() {
    let transport = MockTransport::new().with_capabilities(capabilities_undeclared());

    let result = Dispatcher::new(Config::default()).backup_device_with(request(true), &transport);

    assert!(result
        .failure_message()
        .unwrap()
        .contains("Please report an issue against this platform's cliconf plugin"));
    assert!(transport.config_requests().is_empty());
}

#[test]
fn test_missing_capabilities_treated_as_empty() {
    let transport = MockTransport::new();
    let dispatcher = Dispatcher::new(Config::default());

    assert!(dispatcher.backup_device_with(request(false), &transport).is_success());
    assert!(!dispatcher.backup_device_with(request(true), &transport).is_success());
}

#[test]
fn test_transport_failure_is_reported() {
    let transport = MockTransport::new().with_failure("socket closed");

    let result = Dispatcher::new(Config::default()).backup_device_with(request(false), &transport);

    assert_eq!(result.failure_message(), Some("socket closed"));
}

#[test]
fn test_backup_written_with_generated_name() {
    let (config, dir) = ConfigBuilder::new().with_backup_dir().persist();
    let transport = MockTransport::new()
        .with_capabilities(capabilities_with_default_flag())
        .with_config(sample_running_config());

    let result = Dispatcher::new(config).backup_device_with(request(false), &transport);
    assert!(result.is_success(), "{:?}", result.failure_message());

    let path = result.record().backup_path.clone().assert_some();
    assert!(path.starts_with(dir.path().join("backups")));

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("edge-rtr-01_config."), "unexpected name {}", name);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), sample_running_config());
}

#[test]
fn test_backup_written_with_explicit_name() {
    let ctx = TestContext::new();
    let transport = MockTransport::new().with_config("hostname R9\n");

    let req = DeviceBackupOptions {
        filename: Some("r9.cfg".to_string()),
        dir_path: Some(ctx.temp_dir().to_path_buf()),
        ..Default::default()
    };
    let result = Dispatcher::new(Config::default()).backup_device_with(req, &transport);

    assert!(result.is_success());
    assert_eq!(ctx.read_file("r9.cfg").unwrap(), "hostname R9\n");
}

#[cfg(unix)]
#[test]
fn test_missing_socket_path() {
    let result = Dispatcher::new(Config::default()).backup_device(request(false));

    assert_eq!(
        result.failure_message(),
        Some("missing required parameter: socket_path")
    );
}

#[cfg(unix)]
mod socket {
    use super::*;
    use serde_json::Value;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::path::Path;
    use std::thread;

    fn read_frame(stream: &mut impl Read) -> Value {
        let mut header = [0u8; 8];
        stream.read_exact(&mut header).unwrap();
        let mut body = vec![0u8; u64::from_be_bytes(header) as usize];
        stream.read_exact(&mut body).unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn write_frame(stream: &mut impl Write, value: &Value) {
        let body = serde_json::to_vec(value).unwrap();
        stream.write_all(&(body.len() as u64).to_be_bytes()).unwrap();
        stream.write_all(&body).unwrap();
    }

    /// Serve `connections` requests, answering each method from `respond`,
    /// and return the requests seen
    fn serve<F>(path: &Path, connections: usize, respond: F) -> thread::JoinHandle<Vec<Value>>
    where
        F: Fn(&str, &Value) -> Value + Send + 'static,
    {
        let listener = UnixListener::bind(path).unwrap();
        thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().unwrap();
                let req = read_frame(&mut stream);
                let method = req["method"].as_str().unwrap_or_default().to_string();
                let reply = json!({
                    "jsonrpc": "2.0",
                    "id": req["id"].clone(),
                    "result": respond(&method, &req["params"]),
                });
                write_frame(&mut stream, &reply);
                seen.push(req);
            }
            seen
        })
    }

    #[test]
    fn test_backup_over_socket_with_defaults() {
        let ctx = TestContext::new();
        let socket = ctx.socket_path("conn.sock");

        let server = serve(&socket, 3, |method, _| match method {
            // Capabilities arrive JSON-encoded as a string
            "get_capabilities" => Value::String(
                json!({
                    "rpc": ["get_config", "get_default_flag"],
                    "device_operations": {"supports_defaults": true},
                })
                .to_string(),
            ),
            "get_default_flag" => json!("include-default"),
            "get_config" => json!("hostname R1\n"),
            _ => Value::Null,
        });

        let config = ConfigBuilder::new().with_socket_path(&socket).build();
        let result = Dispatcher::new(config).backup_device(request(true));

        assert!(result.is_success(), "{:?}", result.failure_message());
        assert_eq!(result.record().backup, "hostname R1\n");

        let seen = server.join().unwrap();
        let methods: Vec<&str> = seen.iter().filter_map(|r| r["method"].as_str()).collect();
        assert_eq!(methods, vec!["get_capabilities", "get_default_flag", "get_config"]);
        assert_eq!(seen[2]["params"][1]["flags"], json!("include-default"));
    }

    #[test]
    fn test_rpc_error_is_reported() {
        let ctx = TestContext::new();
        let socket = ctx.socket_path("conn.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let req = read_frame(&mut stream);
            let reply = json!({
                "jsonrpc": "2.0",
                "id": req["id"].clone(),
                "error": {"code": -32603, "message": "Internal error", "data": "device unreachable"},
            });
            write_frame(&mut stream, &reply);
        });

        let req = DeviceBackupOptions {
            socket_path: Some(socket.clone()),
            ..Default::default()
        };
        let result = Dispatcher::new(Config::default()).backup_device(req);
        server.join().unwrap();

        assert_eq!(result.failure_message(), Some("device unreachable"));
    }

    #[test]
    fn test_dead_socket_is_a_failure() {
        let ctx = TestContext::new();
        let req = DeviceBackupOptions {
            socket_path: Some(ctx.socket_path("missing.sock")),
            ..Default::default()
        };

        let result = Dispatcher::new(Config::default()).backup_device(req);

        assert!(result.failure_message().unwrap().contains("unable to connect"));
    }
}
