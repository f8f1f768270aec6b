//! MCP server setup and lifecycle.
//!
//! Implements a JSON-RPC based MCP server over stdio. Requests are handled
//! one at a time in arrival order; every outbound line, responses and
//! notifications alike, goes through a single queue, so notifications caused
//! by a mutation are always written before that mutation's response.
//!
//! The recap render tool is the one exception to inline handling: its
//! response is deferred to a background job that streams progress
//! notifications and answers when the renderer finishes. A cancelled job
//! sends no response at all.

use crate::capabilities::{CapabilityGate, CapabilityKind, changed_kinds};
use crate::config::DaybookConfig;
use crate::events::{ChangeBus, MediaWatcher};
use crate::mcp::dispatch::McpMethod;
use crate::mcp::notifications::NotificationSink;
use crate::mcp::prompts::{PromptRegistry, REFLECT_PROMPT, TAG_OVERVIEW_PROMPT};
use crate::mcp::resources::ResourceCatalog;
use crate::mcp::tools::{RECAP_TOOL_NAME, RecapArgs, ToolRegistry, ToolResult};
use crate::media::MediaLibrary;
use crate::models::{ChangeSet, DomainCounts, ResourceCategory, ResourceUri};
use crate::render::{
    JobTracker, RenderOutcome, RenderPipeline, RendererKind, SceneSpec, artifact_name,
};
use crate::store::JournalStore;
use crate::subscriptions::SubscriptionRegistry;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name.
const SERVER_NAME: &str = "daybook";

/// Maximum request body size (1MB).
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// MCP server for daybook.
pub struct McpServer {
    /// Shared request handling state.
    ctx: Arc<ServerContext>,
    /// Receiver half of the outbound queue, taken by the stdio loop.
    outbound_rx: Option<mpsc::UnboundedReceiver<String>>,
}

/// State shared between the dispatch loop and background render jobs.
struct ServerContext {
    store: Arc<JournalStore>,
    watcher: Arc<MediaWatcher>,
    gate: Arc<CapabilityGate>,
    subscriptions: SubscriptionRegistry,
    jobs: JobTracker,
    tools: ToolRegistry,
    prompts: PromptRegistry,
    resources: ResourceCatalog,
    notifications: NotificationSink,
    command_pipeline: RenderPipeline,
    simulated_pipeline: RenderPipeline,
}

impl McpServer {
    /// Creates a new MCP server from configuration.
    ///
    /// Registers the gated prompts and resource categories, initializes the
    /// capability gate from the startup counts, and only then wires the
    /// reactive handler onto the store and watcher buses. Startup state is
    /// observed silently; notifications begin with the first real change.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing journal snapshot cannot be loaded.
    pub fn new(config: &DaybookConfig) -> Result<Self> {
        let bus = Arc::new(ChangeBus::new());
        let store = Arc::new(JournalStore::new(bus, Some(config.snapshot_path()))?);
        let library = MediaLibrary::new(&config.media_dir);
        let watcher = Arc::new(MediaWatcher::new(library.clone(), config.poll_interval));

        let gate = Arc::new(CapabilityGate::new());
        gate.register(REFLECT_PROMPT, CapabilityKind::Prompts, |c| c.entries > 0);
        gate.register(TAG_OVERVIEW_PROMPT, CapabilityKind::Prompts, |c| c.tags > 0);
        gate.register(
            ResourceCategory::Entries.as_str(),
            CapabilityKind::Resources,
            |c| c.entries > 0,
        );
        gate.register(
            ResourceCategory::Tags.as_str(),
            CapabilityKind::Resources,
            |c| c.tags > 0,
        );
        gate.register(
            ResourceCategory::Videos.as_str(),
            CapabilityKind::Resources,
            |c| c.videos > 0,
        );

        let (notifications, outbound_rx) = NotificationSink::channel();

        let renderer = if config.renderer.simulated {
            simulated_kind(config)
        } else {
            RendererKind::Command(config.renderer.command.clone())
        };

        let ctx = Arc::new(ServerContext {
            prompts: PromptRegistry::new(store.clone(), gate.clone()),
            resources: ResourceCatalog::new(store.clone(), library, gate.clone()),
            tools: ToolRegistry::new(),
            subscriptions: SubscriptionRegistry::new(),
            jobs: JobTracker::new(),
            command_pipeline: RenderPipeline::new(renderer),
            simulated_pipeline: RenderPipeline::new(simulated_kind(config)),
            notifications,
            store,
            watcher,
            gate,
        });

        ctx.gate.initialize(&ctx.domain_counts());

        // The bus lives inside the context it calls back into; a weak
        // handle keeps the context droppable.
        let reactive = Arc::downgrade(&ctx);
        ctx.store.bus().subscribe(move |change| {
            let ctx = reactive.upgrade();
            async move {
                if let Some(ctx) = ctx {
                    ctx.react_to_change(&change);
                }
                Ok(())
            }
        });
        let reactive = Arc::downgrade(&ctx);
        ctx.watcher.subscribe(move |change| {
            let ctx = reactive.upgrade();
            async move {
                if let Some(ctx) = ctx {
                    ctx.react_to_change(&change);
                }
                Ok(())
            }
        });

        Ok(Self {
            ctx,
            outbound_rx: Some(outbound_rx),
        })
    }

    /// Detaches the outbound queue receiver.
    ///
    /// The stdio loop drains it normally; tests take it to observe
    /// notifications and deferred responses directly.
    pub fn take_outbound(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.outbound_rx.take()
    }

    /// Runs the server over stdio until stdin closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server was already started or stdin fails.
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut outbound = self
            .outbound_rx
            .take()
            .ok_or_else(|| Error::OperationFailed {
                operation: "run_stdio".to_string(),
                cause: "server already started".to_string(),
            })?;

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = outbound.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdout.flush().await.is_err() {
                    break;
                }
            }
        });

        let watcher_cancel = CancellationToken::new();
        let watcher_task = tokio::spawn(self.ctx.watcher.clone().run(watcher_cancel.clone()));

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            "daybook MCP server listening on stdio"
        );

        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let result = loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => {
                    break Err(Error::OperationFailed {
                        operation: "read_stdin".to_string(),
                        cause: e.to_string(),
                    });
                }
            };

            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                self.ctx.notifications.send_line(response);
            }
        };

        watcher_cancel.cancel();
        let _ = watcher_task.await;
        writer.abort();
        result
    }

    /// Handles one inbound line.
    ///
    /// Returns the response to send, or `None` for notifications and for
    /// requests whose response a background job will deliver.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        if line.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = line.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "request exceeds maximum size limit"
            );
            return Some(format_error(
                None,
                -32600,
                &format!(
                    "Request too large: {} bytes (max: {} bytes)",
                    line.len(),
                    MAX_REQUEST_BODY_SIZE
                ),
            ));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            transport = "stdio",
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(line);
        let mut method_label = "parse_error".to_string();
        let status_label;

        let response = match parsed {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());

                if let Some(id) = req.id {
                    let id_str = id.to_string();
                    span.record("rpc.id", id_str.as_str());
                    tracing::info!(method = %method_label, "processing MCP request");

                    let dispatch = self
                        .ctx
                        .dispatch_method(&req.method, req.params, &id)
                        .instrument(span.clone())
                        .await;
                    match dispatch {
                        Dispatch::Reply(result) => {
                            status_label = if result.is_ok() { "success" } else { "error" };
                            span.record("status", status_label);
                            Some(format_response(Some(id), result))
                        }
                        Dispatch::Deferred => {
                            status_label = "deferred";
                            span.record("status", status_label);
                            None
                        }
                    }
                } else {
                    status_label = "notification";
                    span.record("status", status_label);
                    self.ctx.handle_notification(&req.method, req.params.as_ref());
                    None
                }
            }
            Err(e) => {
                status_label = "parse_error";
                span.record("status", status_label);
                Some(format_error(None, -32700, &format!("Parse error: {e}")))
            }
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label.clone(),
            "transport" => "stdio",
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_request_duration_ms",
            "method" => method_label,
            "transport" => "stdio"
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }
}

impl ServerContext {
    /// Dispatches a method call using the command pattern.
    ///
    /// Uses [`McpMethod`] for type-safe method dispatch instead of string
    /// matching.
    async fn dispatch_method(
        self: &Arc<Self>,
        method: &str,
        params: Option<Value>,
        id: &Value,
    ) -> Dispatch {
        match McpMethod::from(method) {
            McpMethod::Initialize => Dispatch::Reply(handle_initialize()),
            McpMethod::ListTools => Dispatch::Reply(self.handle_list_tools()),
            McpMethod::CallTool => self.handle_call_tool(params, id).await,
            McpMethod::ListResources => Dispatch::Reply(self.handle_list_resources()),
            McpMethod::ReadResource => Dispatch::Reply(self.handle_read_resource(params.as_ref())),
            McpMethod::SubscribeResource => {
                Dispatch::Reply(self.handle_subscribe(params.as_ref()))
            }
            McpMethod::UnsubscribeResource => {
                Dispatch::Reply(self.handle_unsubscribe(params.as_ref()))
            }
            McpMethod::ListPrompts => Dispatch::Reply(self.handle_list_prompts()),
            McpMethod::GetPrompt => Dispatch::Reply(self.handle_get_prompt(params.as_ref())),
            McpMethod::Ping => Dispatch::Reply(Ok(serde_json::json!({}))),
            McpMethod::Unknown(name) => {
                Dispatch::Reply(Err((-32601, format!("Method not found: {name}"))))
            }
        }
    }

    /// Handles a JSON-RPC notification. Never produces a response.
    fn handle_notification(&self, method: &str, params: Option<&Value>) {
        match method {
            "notifications/cancelled" => {
                let Some(request_id) = params.and_then(|p| p.get("requestId")) else {
                    tracing::debug!("cancelled notification without requestId");
                    return;
                };
                let key = request_id_key(request_id);
                if self.jobs.cancel(&key) {
                    tracing::info!(job = %key, "cancelled render job");
                }
            }
            "notifications/initialized" => {
                tracing::debug!("client initialized");
            }
            other => {
                tracing::debug!(method = other, "ignoring notification");
            }
        }
    }

    /// Handles tools/list.
    fn handle_list_tools(&self) -> DispatchResult {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        Ok(serde_json::json!({ "tools": tools }))
    }

    /// Handles tools/call.
    ///
    /// The recap tool defers its response to a background job; every other
    /// tool executes inline. Tool failures become successful responses with
    /// `isError` set, per MCP convention.
    async fn handle_call_tool(self: &Arc<Self>, params: Option<Value>, id: &Value) -> Dispatch {
        let Some(params) = params else {
            return Dispatch::Reply(Err((-32602, "Missing params".to_string())));
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Dispatch::Reply(Err((-32602, "Missing tool name".to_string())));
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        if name == RECAP_TOOL_NAME {
            return self.handle_recap_call(&params, arguments, id);
        }

        let tool_name = name.to_string();
        let span = info_span!("mcp.tool.call", tool.name = tool_name.as_str());
        let start = Instant::now();

        let (result, status_label) = match self
            .tools
            .execute(&self.store, name, arguments)
            .instrument(span)
            .await
        {
            Ok(result) => {
                let status_label = if result.is_error { "error" } else { "success" };
                (
                    Ok(serde_json::json!({
                        "content": result.content,
                        "isError": result.is_error
                    })),
                    status_label,
                )
            }
            Err(e) => (
                Ok(serde_json::json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true
                })),
                "error",
            ),
        };
        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => tool_name.clone(),
            "status" => status_label
        )
        .increment(1);
        if status_label == "error" {
            metrics::counter!(
                "mcp_tool_errors_total",
                "tool" => tool_name.clone()
            )
            .increment(1);
        }
        metrics::histogram!(
            "mcp_tool_duration_ms",
            "tool" => tool_name,
            "status" => status_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        Dispatch::Reply(result)
    }

    /// Registers a render job and spawns it.
    ///
    /// The job is registered before the spawn, so a cancellation handled on
    /// the very next line already finds it.
    fn handle_recap_call(self: &Arc<Self>, params: &Value, arguments: Value, id: &Value) -> Dispatch {
        let args: RecapArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Dispatch::Reply(Err((-32602, format!("Invalid recap arguments: {e}"))));
            }
        };

        let progress_token = params
            .get("_meta")
            .and_then(|m| m.get("progressToken"))
            .cloned();

        let job_key = request_id_key(id);
        let cancel = self.jobs.begin(job_key.clone());
        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => RECAP_TOOL_NAME,
            "status" => "deferred"
        )
        .increment(1);
        tracing::info!(
            year = args.year,
            simulate = args.simulate,
            job = %job_key,
            "starting recap render job"
        );

        let ctx = self.clone();
        let id = id.clone();
        tokio::spawn(async move {
            ctx.execute_recap(args, cancel, progress_token, id, job_key).await;
        });

        Dispatch::Deferred
    }

    /// Runs one recap render job to completion.
    ///
    /// Progress flows out as `notifications/progress` when the request
    /// carried a token. On success the media listing is refreshed before
    /// the response is queued, so the update and `list_changed`
    /// notifications for the new artifact precede it. A cancelled job
    /// drops its response entirely.
    async fn execute_recap(
        self: Arc<Self>,
        args: RecapArgs,
        cancel: CancellationToken,
        progress_token: Option<Value>,
        id: Value,
        job_key: String,
    ) {
        let scene = SceneSpec::build(args.year, &self.store.list_entries());
        let output = args.output.map_or_else(
            || self.watcher.library().dir().join(artifact_name(args.year)),
            PathBuf::from,
        );

        let pipeline = if args.simulate {
            &self.simulated_pipeline
        } else {
            &self.command_pipeline
        };

        let notifications = self.notifications.clone();
        let token = progress_token;
        let outcome = pipeline
            .render(&scene, &output, &cancel, move |ratio| {
                if let Some(token) = &token {
                    notifications.progress(token, ratio, 1.0);
                }
            })
            .await;

        self.jobs.finish(&job_key);

        match outcome {
            RenderOutcome::Completed { output } => {
                self.watcher.refresh_now().await;
                let result = ToolResult::text(format!(
                    "Recap for {} written to {}",
                    args.year,
                    output.display()
                ));
                let response = format_response(
                    Some(id),
                    Ok(serde_json::json!({
                        "content": result.content,
                        "isError": result.is_error
                    })),
                );
                self.notifications.send_line(response);
            }
            RenderOutcome::Cancelled { subject } => {
                tracing::debug!(job = %job_key, %subject, "recap job cancelled, dropping response");
            }
            RenderOutcome::Failed { reason } => {
                let result = ToolResult::error(format!("Recap render failed: {reason}"));
                let response = format_response(
                    Some(id),
                    Ok(serde_json::json!({
                        "content": result.content,
                        "isError": result.is_error
                    })),
                );
                self.notifications.send_line(response);
            }
        }
    }

    /// Handles resources/list.
    fn handle_list_resources(&self) -> DispatchResult {
        let resources: Vec<Value> = self
            .resources
            .list_resources()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "uri": r.uri,
                    "name": r.name,
                    "description": r.description,
                    "mimeType": r.mime_type
                })
            })
            .collect();

        Ok(serde_json::json!({ "resources": resources }))
    }

    /// Handles resources/read.
    fn handle_read_resource(&self, params: Option<&Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;

        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing resource URI".to_string()))?;

        let resource_kind = classify_resource_kind(uri);
        let span = info_span!(
            "mcp.resource.read",
            resource.uri = uri,
            resource.kind = resource_kind,
            status = tracing::field::Empty
        );
        let _guard = span.enter();
        let start = Instant::now();

        let result = match self.resources.read(uri) {
            Ok(content) => {
                let mut item = serde_json::json!({
                    "uri": content.uri,
                    "mimeType": content.mime_type
                });
                if let Some(text) = content.text {
                    item["text"] = serde_json::json!(text);
                }
                if let Some(blob) = content.blob {
                    item["blob"] = serde_json::json!(blob);
                }
                Ok(serde_json::json!({ "contents": [item] }))
            }
            Err(e) => Err((error_code(&e), e.to_string())),
        };

        let status_label = if result.is_ok() { "success" } else { "error" };
        span.record("status", status_label);
        metrics::counter!(
            "mcp_resource_reads_total",
            "resource_kind" => resource_kind,
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_resource_read_duration_ms",
            "resource_kind" => resource_kind,
            "status" => status_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    /// Handles resources/subscribe.
    fn handle_subscribe(&self, params: Option<&Value>) -> DispatchResult {
        let uri = subscription_uri(params)?;
        let newly = self.subscriptions.subscribe(uri);
        tracing::debug!(uri, newly, "resource subscription");
        Ok(serde_json::json!({}))
    }

    /// Handles resources/unsubscribe.
    fn handle_unsubscribe(&self, params: Option<&Value>) -> DispatchResult {
        let uri = subscription_uri(params)?;
        let removed = self.subscriptions.unsubscribe(uri);
        tracing::debug!(uri, removed, "resource unsubscription");
        Ok(serde_json::json!({}))
    }

    /// Handles prompts/list.
    fn handle_list_prompts(&self) -> DispatchResult {
        let prompts: Vec<Value> = self
            .prompts
            .list_prompts()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "description": p.description,
                    "arguments": p.arguments.iter().map(|a| {
                        serde_json::json!({
                            "name": a.name,
                            "description": a.description,
                            "required": a.required
                        })
                    }).collect::<Vec<Value>>()
                })
            })
            .collect();

        Ok(serde_json::json!({ "prompts": prompts }))
    }

    /// Handles prompts/get.
    fn handle_get_prompt(&self, params: Option<&Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing prompt name".to_string()))?;
        let span = info_span!("mcp.prompt.get", prompt.name = name);
        let _guard = span.enter();

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        let messages = self
            .prompts
            .get_prompt_messages(name, &arguments)
            .map_err(|e| (-32602, e.to_string()))?;

        let msgs: Vec<Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": m.content
                })
            })
            .collect();

        Ok(serde_json::json!({ "messages": msgs }))
    }

    /// Reacts to one committed change.
    ///
    /// Queues a `resources/updated` notification per subscribed identity the
    /// change touched, then recomputes capabilities and queues at most one
    /// `list_changed` per capability kind that flipped.
    fn react_to_change(&self, change: &ChangeSet) {
        for uri in self.subscriptions.affected(change) {
            let title = self.identity_title(&uri);
            self.notifications.resource_updated(&uri, &title);
        }

        let flips = self.gate.recompute(&self.domain_counts());
        for kind in changed_kinds(&flips) {
            self.notifications.list_changed(kind);
        }
    }

    /// Display title for a subscribed identity, for updated notifications.
    ///
    /// Deleted records fall back to the URI tail.
    fn identity_title(&self, uri: &str) -> String {
        match ResourceUri::parse(uri) {
            Ok(ResourceUri::Entry(id)) => self
                .store
                .get_entry(id)
                .map_or_else(|_| uri_tail(uri), |e| e.title),
            Ok(ResourceUri::Tag(id)) => self
                .store
                .get_tag(id)
                .map_or_else(|_| uri_tail(uri), |t| t.name),
            Ok(ResourceUri::Video(name)) => name,
            _ => uri_tail(uri),
        }
    }

    fn domain_counts(&self) -> DomainCounts {
        DomainCounts {
            entries: self.store.entry_count(),
            tags: self.store.tag_count(),
            videos: self.watcher.library().count(),
        }
    }
}

/// Handles the initialize method.
fn handle_initialize() -> DispatchResult {
    Ok(serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": true },
            "resources": { "subscribe": true, "listChanged": true },
            "prompts": { "listChanged": true }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Extracts and validates the URI param of subscribe/unsubscribe.
fn subscription_uri(params: Option<&Value>) -> std::result::Result<&str, (i32, String)> {
    let params = params.ok_or((-32602, "Missing params".to_string()))?;
    let uri = params
        .get("uri")
        .and_then(Value::as_str)
        .ok_or((-32602, "Missing resource URI".to_string()))?;
    // The identity does not have to exist yet, but the URI must parse.
    ResourceUri::parse(uri).map_err(|e| (-32602, e.to_string()))?;
    Ok(uri)
}

/// Formats a successful response.
fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        }
        Err((code, message)) => format_error(id, code, &message),
    }
}

/// Formats an error response.
fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Key a request id maps to in the job tracker.
fn request_id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const fn error_code(error: &Error) -> i32 {
    match error {
        Error::InvalidInput(_) => -32602,
        _ => -32603,
    }
}

fn classify_resource_kind(uri: &str) -> &'static str {
    ResourceUri::parse(uri).map_or("other", |parsed| parsed.category().as_str())
}

fn uri_tail(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or(uri).to_string()
}

fn simulated_kind(config: &DaybookConfig) -> RendererKind {
    RendererKind::Simulated {
        steps: config.renderer.simulated_steps,
        step_delay: config.renderer.simulated_step_delay,
    }
}

/// Outcome of dispatching one request.
enum Dispatch {
    /// Respond now.
    Reply(DispatchResult),
    /// A background job owns the response.
    Deferred,
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (required by protocol but not used in code).
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}
