//! Redis integration tests
//!
//! These tests require Docker and verify every write primitive against a
//! real server.
//! Run with: `cargo test -p backup-dispatch-tests --test integration -- --ignored`

use super::common::{docker_exec, is_docker_available, ContainerGuard};
use anyhow::Result;
use backup_dispatch::Dispatcher;
use std::net::TcpListener;
use std::process::Command;
use std::thread;
use std::time::Duration;
use test_utils::*;

/// Start a Redis container published on a free local port
fn start_redis_container(name: &str) -> Result<u16> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            name,
            "-p",
            &format!("127.0.0.1:{}:6379", port),
            "redis:7-alpine",
        ])
        .status()?;
    if !status.success() {
        return Err(anyhow::anyhow!("docker run failed for {}", name));
    }

    for _ in 0..30 {
        if docker_exec(name, &["redis-cli", "ping"]) == "PONG" {
            return Ok(port);
        }
        thread::sleep(Duration::from_secs(1));
    }

    Err(anyhow::anyhow!("Redis failed to become ready"))
}

fn request(command: &str, content: &str) -> RedisUploadOptions {
    RedisUploadOptions {
        name: Some("backups:r1".to_string()),
        content: Some(content.to_string()),
        redis_command: Some(command.to_string()),
        ..Default::default()
    }
}

#[test]
#[ignore]
fn test_redis_write_primitives() -> Result<()> {
    if !is_docker_available() {
        eprintln!("Docker not available, skipping");
        return Ok(());
    }

    let container = format!("backup-dispatch-redis-{}", std::process::id());
    let _guard = ContainerGuard::new(container.clone());
    let port = start_redis_container(&container)?;

    let config = ConfigBuilder::new()
        .with_redis_host("127.0.0.1")
        .with_redis_port(port)
        .with_redis_db(2)
        .build();
    let dispatcher = Dispatcher::new(config);

    // set
    let result = dispatcher.upload_redis(request("set", "hostname R1"));
    assert!(result.is_success(), "{:?}", result.failure_message());
    assert_eq!(result.record().code, RedisReply::Okay);
    assert_eq!(
        docker_exec(&container, &["redis-cli", "-n", "2", "GET", "backups:r1"]),
        "hostname R1"
    );

    // list pushes on a fresh key
    let mut req = request("rpush", "first");
    req.name = Some("backups:list".to_string());
    assert_eq!(dispatcher.upload_redis(req).record().code, RedisReply::Integer(1));

    let mut req = request("lpush", "zeroth");
    req.name = Some("backups:list".to_string());
    assert_eq!(dispatcher.upload_redis(req).record().code, RedisReply::Integer(2));

    assert_eq!(
        docker_exec(&container, &["redis-cli", "-n", "2", "LRANGE", "backups:list", "0", "-1"]),
        "zeroth\nfirst"
    );

    // stream append
    let mut req = request("xadd", "hostname R1");
    req.name = Some("backups:stream".to_string());
    let result = dispatcher.upload_redis(req);
    assert!(matches!(result.record().code, RedisReply::Text(ref id) if id.contains('-')));

    // wrong type surfaces as a failure
    let result = dispatcher.upload_redis(request("lpush", "x"));
    assert!(result.failure_message().unwrap_or_default().contains("WRONGTYPE"));

    Ok(())
}

#[test]
fn test_unreachable_redis_is_a_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ConfigBuilder::new()
        .with_redis_host("127.0.0.1")
        .with_redis_port(port)
        .build();

    let result = Dispatcher::new(config).upload_redis(request("set", "x"));

    assert!(!result.is_success());
    assert!(!result.failure_message().unwrap().is_empty());
    assert_eq!(result.record().code, RedisReply::Integer(0));
}
