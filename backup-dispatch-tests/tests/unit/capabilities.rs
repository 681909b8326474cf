//! Unit tests for capability negotiation

use backup_dispatch::sources::device::{requested_features, resolve_flags, validate_features};
use backup_dispatch::sources::{Feature, Support};
use backup_dispatch::DispatchError;
use serde_json::json;
use test_utils::*;

#[test]
fn test_supports_reads_device_operations() {
    assert_eq!(capabilities_with_defaults().supports(Feature::Defaults), Support::Yes);
    assert_eq!(capabilities_without_defaults().supports(Feature::Defaults), Support::No);
    assert_eq!(capabilities_undeclared().supports(Feature::Defaults), Support::Undeclared);
}

#[test]
fn test_null_capability_is_undeclared() {
    let caps = capabilities_from(json!({"device_operations": {"supports_defaults": null}}));
    assert_eq!(caps.supports(Feature::Defaults), Support::Undeclared);
}

#[test]
fn test_truthy_values_count_as_supported() {
    let caps = capabilities_from(json!({"device_operations": {"supports_defaults": 1}}));
    assert_eq!(caps.supports(Feature::Defaults), Support::Yes);

    let caps = capabilities_from(json!({"device_operations": {"supports_defaults": ""}}));
    assert_eq!(caps.supports(Feature::Defaults), Support::No);
}

#[test]
fn test_nothing_requested_validates_against_anything() {
    assert!(requested_features(false).is_empty());
    validate_features(&capabilities_undeclared(), &requested_features(false)).assert_ok();
}

#[test]
fn test_undeclared_defaults_is_rejected() {
    let err = validate_features(&capabilities_undeclared(), &requested_features(true)).unwrap_err();
    assert!(matches!(err, DispatchError::CapabilityUndeclared(Feature::Defaults)));
    assert!(err.to_string().contains("does not specify whether defaults is supported"));
}

#[test]
fn test_unsupported_defaults_is_rejected() {
    let err =
        validate_features(&capabilities_without_defaults(), &requested_features(true)).unwrap_err();
    assert_eq!(err.to_string(), "Option defaults is not supported on this platform");
}

#[test]
fn test_empty_capabilities_reject_defaults() {
    let caps = DeviceCapabilities::default();
    validate_features(&caps, &requested_features(true))
        .assert_err_contains("does not specify whether defaults");
}

#[test]
fn test_flags_prefer_device_rpc() {
    let transport = MockTransport::new().with_default_flag(json!("include-default"));
    let flags = resolve_flags(true, &capabilities_with_default_flag(), &transport).unwrap();

    assert_eq!(flags, RetrievalFlags::Device(json!("include-default")));
    assert!(transport.default_flag_called());
}

#[test]
fn test_flags_fall_back_to_all() {
    let transport = MockTransport::new();
    let flags = resolve_flags(true, &capabilities_with_defaults(), &transport).unwrap();

    assert_eq!(flags, RetrievalFlags::All);
    assert_eq!(flags.to_value(), json!("all"));
    assert!(!transport.default_flag_called());
}

#[test]
fn test_hostname_from_device_info() {
    assert_eq!(capabilities_with_default_flag().hostname(), Some("edge-rtr-01"));
    assert_eq!(capabilities_without_defaults().hostname(), None);
}
