//! Reactive surface end-to-end tests.
//!
//! Drives the MCP server through raw JSON-RPC lines and observes the
//! outbound queue directly, focusing on:
//! - Per-identity `resources/updated` routing for subscriptions
//! - Capability gating of prompt and resource listings
//! - `list_changed` bursts collapsing to one notification per kind
//! - Notification ordering relative to the mutation that caused them
//!
//! Store mutations await their change handlers before returning, so by the
//! time a request's response exists every notification it caused is already
//! queued. The tests lean on that ordering throughout.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use daybook::DaybookConfig;
use daybook::mcp::McpServer;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

fn test_server() -> (McpServer, mpsc::UnboundedReceiver<String>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DaybookConfig::default()
        .with_data_dir(dir.path().join("data"))
        .with_media_dir(dir.path().join("videos"))
        .with_simulated_renderer();
    config.renderer.simulated_steps = 4;
    config.renderer.simulated_step_delay = Duration::from_millis(1);

    let mut server = McpServer::new(&config).unwrap();
    let rx = server.take_outbound().unwrap();
    (server, rx, dir)
}

/// Sends one request line and parses the response.
async fn call(server: &McpServer, line: &str) -> Value {
    let response = server
        .handle_line(line)
        .await
        .expect("request should produce a response");
    serde_json::from_str(&response).unwrap()
}

async fn create_entry(server: &McpServer, request_id: u64, title: &str) -> Value {
    let line = format!(
        r#"{{"jsonrpc":"2.0","id":{request_id},"method":"tools/call","params":{{"name":"create_entry","arguments":{{"title":"{title}"}}}}}}"#
    );
    call(server, &line).await
}

async fn subscribe(server: &McpServer, uri: &str) -> Value {
    let line = format!(
        r#"{{"jsonrpc":"2.0","id":90,"method":"resources/subscribe","params":{{"uri":"{uri}"}}}}"#
    );
    call(server, &line).await
}

/// Empties the outbound queue, parsing each queued line.
fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(serde_json::from_str(&line).unwrap());
    }
    lines
}

fn methods(lines: &[Value]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.get("method").and_then(Value::as_str))
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Subscription Routing Tests
// ============================================================================

mod subscription_routing {
    use super::*;

    #[tokio::test]
    async fn test_subscribed_identity_gets_updated_notification() {
        let (server, mut rx, _dir) = test_server();

        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        let response = create_entry(&server, 1, "First day").await;
        assert!(response["result"]["isError"] == false);

        let lines = drain(&mut rx);
        let first = &lines[0];
        assert_eq!(first["method"], "notifications/resources/updated");
        assert_eq!(first["params"]["uri"], "daybook://entries/1");
        assert_eq!(first["params"]["title"], "First day");
    }

    #[tokio::test]
    async fn test_unsubscribed_identity_stays_silent() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "Quiet day").await;

        let lines = drain(&mut rx);
        assert!(
            !methods(&lines)
                .iter()
                .any(|m| m == "notifications/resources/updated"),
            "no subscription, so no updated notification"
        );
    }

    #[tokio::test]
    async fn test_update_notifies_identity_without_list_changed() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "Before").await;
        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        let update = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"update_entry","arguments":{"id":1,"title":"After"}}}"#;
        call(&server, update).await;

        let lines = drain(&mut rx);
        let methods = methods(&lines);
        assert_eq!(
            methods,
            vec!["notifications/resources/updated".to_string()],
            "an update touches the identity but flips no capability"
        );
        assert_eq!(lines[0]["params"]["title"], "After");
    }

    #[tokio::test]
    async fn test_affected_identity_notified_once_per_publish() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "One").await;
        subscribe(&server, "daybook://entries/1").await;
        subscribe(&server, "daybook://entries/2").await;
        drain(&mut rx);

        // Touches entry 2 only; entry 1 stays quiet.
        create_entry(&server, 2, "Two").await;

        let lines = drain(&mut rx);
        let updated: Vec<&Value> = lines
            .iter()
            .filter(|l| l["method"] == "notifications/resources/updated")
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["params"]["uri"], "daybook://entries/2");
    }

    #[tokio::test]
    async fn test_double_subscribe_notifies_once() {
        let (server, mut rx, _dir) = test_server();

        subscribe(&server, "daybook://entries/1").await;
        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        create_entry(&server, 1, "Once").await;

        let lines = drain(&mut rx);
        let updated: Vec<&Value> = lines
            .iter()
            .filter(|l| l["method"] == "notifications/resources/updated")
            .collect();
        assert_eq!(updated.len(), 1, "a repeated subscribe adds no second delivery");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_notifications() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "Watched").await;
        subscribe(&server, "daybook://entries/1").await;

        let unsubscribe = r#"{"jsonrpc":"2.0","id":91,"method":"resources/unsubscribe","params":{"uri":"daybook://entries/1"}}"#;
        call(&server, unsubscribe).await;
        drain(&mut rx);

        let update = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"update_entry","arguments":{"id":1,"title":"Unwatched"}}}"#;
        call(&server, update).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_future_resource_subscription_fires_on_creation() {
        let (server, mut rx, _dir) = test_server();

        // Entry 2 does not exist yet.
        subscribe(&server, "daybook://entries/2").await;
        drain(&mut rx);

        create_entry(&server, 1, "One").await;
        let lines = drain(&mut rx);
        assert!(
            !methods(&lines)
                .iter()
                .any(|m| m == "notifications/resources/updated")
        );

        create_entry(&server, 2, "Two").await;
        let lines = drain(&mut rx);
        assert_eq!(lines[0]["method"], "notifications/resources/updated");
        assert_eq!(lines[0]["params"]["uri"], "daybook://entries/2");
    }

    #[tokio::test]
    async fn test_deleted_entry_title_falls_back_to_uri_tail() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "Doomed").await;
        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        let delete = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"delete_entry","arguments":{"id":1}}}"#;
        call(&server, delete).await;

        let lines = drain(&mut rx);
        assert_eq!(lines[0]["method"], "notifications/resources/updated");
        assert_eq!(lines[0]["params"]["uri"], "daybook://entries/1");
        // The record is gone, so the identity tail stands in for the title.
        assert_eq!(lines[0]["params"]["title"], "1");
    }
}

// ============================================================================
// Capability Gating Tests
// ============================================================================

mod capability_gating {
    use super::*;

    #[tokio::test]
    async fn test_prompts_list_grows_with_content() {
        let (server, _rx, _dir) = test_server();

        let list = r#"{"jsonrpc":"2.0","id":1,"method":"prompts/list"}"#;
        let response = call(&server, list).await;
        let names: Vec<&str> = response["result"]["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, vec!["daybook_entry_starter"]);

        create_entry(&server, 2, "First").await;
        let response = call(&server, list).await;
        let names: Vec<&str> = response["result"]["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(names.contains(&"daybook_reflect"));
        assert!(!names.contains(&"daybook_tag_overview"));

        let tag = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"create_tag","arguments":{"name":"travel"}}}"#;
        call(&server, tag).await;
        let response = call(&server, list).await;
        let names: Vec<&str> = response["result"]["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(names.contains(&"daybook_tag_overview"));
    }

    #[tokio::test]
    async fn test_resources_list_empty_until_content() {
        let (server, _rx, _dir) = test_server();

        let list = r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#;
        let response = call(&server, list).await;
        assert_eq!(response["result"]["resources"].as_array().unwrap().len(), 0);

        create_entry(&server, 2, "First").await;
        let response = call(&server, list).await;
        let uris: Vec<&str> = response["result"]["resources"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r["uri"].as_str())
            .collect();
        assert!(uris.contains(&"daybook://entries"));
        assert!(uris.contains(&"daybook://entries/1"));
        assert!(!uris.contains(&"daybook://tags"));
    }

    #[tokio::test]
    async fn test_first_entry_flips_one_notification_per_kind() {
        let (server, mut rx, _dir) = test_server();
        assert!(
            drain(&mut rx).is_empty(),
            "startup observes initial state without notifying"
        );

        create_entry(&server, 1, "First").await;

        // Two flips (reflect prompt, entries category) collapse to one
        // notification per capability kind.
        let methods = methods(&drain(&mut rx));
        assert_eq!(
            methods,
            vec![
                "notifications/prompts/list_changed".to_string(),
                "notifications/resources/list_changed".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stable_capability_sends_nothing() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "First").await;
        drain(&mut rx);

        create_entry(&server, 2, "Second").await;
        assert!(
            drain(&mut rx).is_empty(),
            "a second entry flips nothing and nobody is subscribed"
        );
    }

    #[tokio::test]
    async fn test_delete_last_entry_flips_capabilities_off() {
        let (server, mut rx, _dir) = test_server();

        create_entry(&server, 1, "Only").await;
        drain(&mut rx);

        let delete = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"delete_entry","arguments":{"id":1}}}"#;
        call(&server, delete).await;

        let methods = methods(&drain(&mut rx));
        assert_eq!(
            methods,
            vec![
                "notifications/prompts/list_changed".to_string(),
                "notifications/resources/list_changed".to_string(),
            ]
        );

        let list = r#"{"jsonrpc":"2.0","id":3,"method":"prompts/list"}"#;
        let response = call(&server, list).await;
        assert_eq!(response["result"]["prompts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gated_prompt_rejected_until_enabled() {
        let (server, _rx, _dir) = test_server();

        let get = r#"{"jsonrpc":"2.0","id":1,"method":"prompts/get","params":{"name":"daybook_reflect","arguments":{}}}"#;
        let response = call(&server, get).await;
        assert!(response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("not found"));

        create_entry(&server, 2, "Enables reflect").await;
        let response = call(&server, get).await;
        assert!(!response["result"]["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gated_resource_read_rejected_until_enabled() {
        let (server, _rx, _dir) = test_server();

        let read = r#"{"jsonrpc":"2.0","id":1,"method":"resources/read","params":{"uri":"daybook://entries"}}"#;
        let response = call(&server, read).await;
        assert!(response.get("error").is_some());

        create_entry(&server, 2, "Enables entries").await;
        let response = call(&server, read).await;
        let text = response["result"]["contents"][0]["text"].as_str().unwrap();
        assert!(text.contains("Enables entries"));
    }
}

// ============================================================================
// Ordering Tests
// ============================================================================

mod ordering {
    use super::*;

    #[tokio::test]
    async fn test_updated_precedes_list_changed() {
        let (server, mut rx, _dir) = test_server();

        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        create_entry(&server, 1, "First").await;

        let methods = methods(&drain(&mut rx));
        assert_eq!(
            methods,
            vec![
                "notifications/resources/updated".to_string(),
                "notifications/prompts/list_changed".to_string(),
                "notifications/resources/list_changed".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_notifications_are_queued_before_response_exists() {
        let (server, mut rx, _dir) = test_server();

        subscribe(&server, "daybook://entries/1").await;
        drain(&mut rx);

        // handle_line returns the response; everything the mutation caused
        // must already be in the queue at that point.
        let response = create_entry(&server, 1, "Ordered").await;
        assert!(response["result"]["isError"] == false);
        assert!(!drain(&mut rx).is_empty());
    }
}
