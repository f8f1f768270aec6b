//! MCP server implementation.
//!
//! Provides a Model Context Protocol server over the journal.
//!
//! ## Features
//!
//! - **Tools**: entry and tag CRUD plus `generate_recap_video`
//! - **Resources**: entries, tags, and rendered videos via `daybook://` URIs,
//!   with per-identity update subscriptions
//! - **Prompts**: entry starter, yearly reflection, tag overview
//!
//! Prompt and resource availability follows the journal contents; the server
//! announces changes through `list_changed` notifications.
//!
//! ## Usage
//!
//! ### Stdio Transport (Claude Desktop)
//!
//! ```bash
//! daybook serve
//! ```
//!
//! ### Claude Desktop Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "daybook": {
//!       "command": "daybook",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

// Allow unused_self for methods kept for API consistency or future use.
#![allow(clippy::unused_self)]
// Allow unnecessary wraps for methods that return Result for API consistency.
#![allow(clippy::unnecessary_wraps)]
// Allow ok_or with function calls - the error path is uncommon.
#![allow(clippy::or_fun_call)]
// Allow option_if_let_else for clearer match statements.
#![allow(clippy::option_if_let_else)]
// Allow match_same_arms for explicit enum handling with default fallback.
#![allow(clippy::match_same_arms)]

mod dispatch;
mod notifications;
mod prompts;
mod resources;
mod server;
mod tools;

pub use dispatch::McpMethod;
pub use notifications::NotificationSink;
pub use prompts::{
    ENTRY_STARTER_PROMPT, PromptArgument, PromptContent, PromptDefinition, PromptMessage,
    PromptRegistry, REFLECT_PROMPT, TAG_OVERVIEW_PROMPT,
};
pub use resources::{ResourceCatalog, ResourceContent, ResourceDefinition};
pub use server::McpServer;
pub use tools::{
    RECAP_TOOL_NAME, RecapArgs, ToolContent, ToolDefinition, ToolRegistry, ToolResult,
};
