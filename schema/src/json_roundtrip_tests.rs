//! JSON round-trip tests for schema types
//!
//! These verify the wire format (camelCase, tagged events, optional fields
//! omitted) that the config file and any external consumers rely on.

use crate::*;
use std::path::PathBuf;

#[test]
fn app_spec_roundtrip_with_camel_case_keys() {
    let spec = AppSpec {
        name: "bot".to_string(),
        path: PathBuf::from("/ws/apps/bot"),
        command: Some("npm".to_string()),
        args: vec!["run".to_string(), "dev".to_string()],
        working_dir: Some(PathBuf::from("/ws/apps/bot")),
    };

    let value = serde_json::to_value(&spec).expect("serialize");
    assert_eq!(value["name"], "bot");
    assert_eq!(value["workingDir"], "/ws/apps/bot");
    assert!(value.get("working_dir").is_none());

    let decoded: AppSpec = serde_json::from_value(value).expect("deserialize");
    assert_eq!(decoded, spec);
}

#[test]
fn app_spec_optional_fields_default() {
    // Minimal config entry: args and workingDir omitted
    let decoded: AppSpec =
        serde_json::from_str(r#"{"name":"bot","path":"apps/bot","command":"bun"}"#)
            .expect("deserialize");
    assert_eq!(decoded.args, Vec::<String>::new());
    assert_eq!(decoded.working_dir, None);
}

#[test]
fn app_event_serializes_with_event_type_tag() {
    let event = AppEvent::Started {
        app: "dashboard".to_string(),
        pid: 4242,
        command: "npm".to_string(),
        args: vec!["run".to_string(), "dev".to_string()],
        timestamp: AppEvent::current_timestamp(),
    };

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "started");
    assert_eq!(value["pid"], 4242);

    let decoded: AppEvent = serde_json::from_value(value).expect("deserialize");
    assert_eq!(decoded, event);
}

#[test]
fn app_exit_omits_absent_code_and_signal() {
    let exit = AppExit {
        pid: 7,
        exit_code: None,
        signal: Some(15),
        timestamp: AppEvent::current_timestamp(),
    };

    let value = serde_json::to_value(&exit).expect("serialize");
    assert!(value.get("exitCode").is_none());
    assert_eq!(value["signal"], 15);

    let decoded: AppExit = serde_json::from_value(value).expect("deserialize");
    assert_eq!(decoded, exit);
}

#[test]
fn app_status_idle_snapshot() {
    let status = AppStatus::idle();
    let value = serde_json::to_value(&status).expect("serialize");
    assert_eq!(value["running"], false);
    assert!(value.get("pid").is_none());
    assert!(value.get("startedAt").is_none());
}

#[test]
fn telemetry_roundtrip() {
    let telemetry = Telemetry {
        cpu_percent: 3.5,
        memory_bytes: 128 * 1024 * 1024,
    };
    let encoded = serde_json::to_string(&telemetry).expect("serialize");
    assert!(encoded.contains("cpuPercent"));
    assert!(encoded.contains("memoryBytes"));
    let decoded: Telemetry = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, telemetry);
}
