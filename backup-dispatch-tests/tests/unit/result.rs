//! Unit tests for the result envelope written to stdout

use backup_dispatch::sinks::{HttpUploadRecord, RedisWriteRecord};
use backup_dispatch::sources::DeviceBackupRecord;
use backup_dispatch::{DispatchError, DispatchResult};
use serde_json::json;
use test_utils::RedisReply;

#[test]
fn test_http_success_envelope() {
    let result = DispatchResult::Success(HttpUploadRecord {
        response_status: 201,
        msg: Some("stored".to_string()),
    });

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"changed": false, "response_status": 201, "msg": "stored"})
    );
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn test_http_rejection_keeps_status() {
    let error = DispatchError::Rejected {
        status: 404,
        message: "not found".to_string(),
    };
    let result = DispatchResult::<HttpUploadRecord>::from_error(&error);

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"changed": false, "failed": true, "msg": "not found", "response_status": 404})
    );
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn test_redis_failure_uses_sentinel_code() {
    let error = DispatchError::UnknownCommand("hset".to_string());
    let result = DispatchResult::<RedisWriteRecord>::from_error(&error);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["code"], json!(0));
    assert_eq!(value["failed"], json!(true));
    assert_eq!(value["msg"], json!("Unknown redis command \"hset\"."));
}

#[test]
fn test_redis_set_reply_serializes_as_true() {
    let result = DispatchResult::Success(RedisWriteRecord {
        code: RedisReply::Okay,
    });

    assert_eq!(serde_json::to_value(&result).unwrap()["code"], json!(true));
}

#[test]
fn test_device_record_uses_backup_key() {
    let result = DispatchResult::Success(DeviceBackupRecord {
        backup: "hostname R1\n".to_string(),
        backup_path: None,
    });

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"changed": false, "__backup__": "hostname R1\n"})
    );
}

#[test]
fn test_failure_message_is_never_empty() {
    let error = DispatchError::Transport(String::new());
    let result = DispatchResult::<DeviceBackupRecord>::from_error(&error);

    let msg = result.failure_message().unwrap();
    assert!(!msg.is_empty());
    assert_eq!(result.record().backup, "");
}
