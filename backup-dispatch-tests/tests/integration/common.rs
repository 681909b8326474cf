//! Common utilities for integration tests
//!
//! This module provides cleanup guards and helper functions for integration tests.

use std::process::Command;

/// Guard that ensures Docker container cleanup on drop (even on panic)
pub struct ContainerGuard {
    name: String,
}

impl ContainerGuard {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let _ = Command::new("docker").args(["rm", "-f", "-v", &self.name]).output();
    }
}

/// Helper to check if Docker is available
pub fn is_docker_available() -> bool {
    Command::new("docker")
        .args(["ps"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run a command inside a container and return trimmed stdout
pub fn docker_exec(container: &str, args: &[&str]) -> String {
    let output = Command::new("docker")
        .arg("exec")
        .arg(container)
        .args(args)
        .output()
        .expect("Failed to run docker exec");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
