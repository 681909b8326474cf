//! Integration tests for backup-dispatch
//!
//! These tests require Docker and write to a real Redis server.
//! Run with: `cargo test -p backup-dispatch-tests --test integration -- --ignored`

mod common;
mod redis;
