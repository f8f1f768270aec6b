//! Outbound notification plumbing.
//!
//! Every line the server emits, responses and notifications alike, goes
//! through one queue drained by a single writer. That keeps stdout free of
//! interleaved partial lines and fixes a total order on what the client
//! sees, no matter which task produced it.

use crate::capabilities::CapabilityKind;
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Sending half of the outbound line queue.
///
/// Clones share the queue. Dropping every clone closes it and ends the
/// writer task.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    tx: mpsc::UnboundedSender<String>,
}

impl NotificationSink {
    /// Creates a sink and the receiver the writer task drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues one raw line.
    pub fn send_line(&self, line: String) {
        if self.tx.send(line).is_err() {
            tracing::debug!("outbound queue closed, line dropped");
        }
    }

    /// Queues a JSON-RPC notification.
    pub fn notify(&self, method: &str, params: Value) {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        match serde_json::to_string(&notification) {
            Ok(line) => {
                metrics::counter!("mcp_notifications_total", "method" => method.to_string())
                    .increment(1);
                self.send_line(line);
            }
            Err(e) => tracing::warn!(method, error = %e, "notification did not serialize"),
        }
    }

    /// Tells a subscriber that one resource changed.
    pub fn resource_updated(&self, uri: &str, title: &str) {
        self.notify(
            "notifications/resources/updated",
            json!({ "uri": uri, "title": title }),
        );
    }

    /// Tells the client that a list surface changed.
    pub fn list_changed(&self, kind: CapabilityKind) {
        self.notify(
            &format!("notifications/{}/list_changed", kind.as_str()),
            json!({}),
        );
    }

    /// Reports render progress against a request's progress token.
    pub fn progress(&self, progress_token: &Value, progress: f64, total: f64) {
        self.notify(
            "notifications/progress",
            json!({
                "progressToken": progress_token,
                "progress": progress,
                "total": total,
            }),
        );
    }
}
