//! MCP method dispatch using command pattern.
//!
//! Maps wire method names to type-safe enum variants so dispatch is a match
//! over [`McpMethod`] instead of scattered string comparisons. Unknown
//! methods are captured for error reporting.

use std::fmt;

/// MCP method identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// Initialize the MCP session.
    Initialize,
    /// List available tools.
    ListTools,
    /// Call a specific tool.
    CallTool,
    /// List available resources.
    ListResources,
    /// Read a specific resource.
    ReadResource,
    /// Subscribe to update notifications for one resource.
    SubscribeResource,
    /// Drop a resource subscription.
    UnsubscribeResource,
    /// List available prompts.
    ListPrompts,
    /// Get a specific prompt.
    GetPrompt,
    /// Ping the server (health check).
    Ping,
    /// Unknown method (for error handling).
    Unknown(String),
}

impl McpMethod {
    /// Returns the MCP protocol method name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::ListResources => "resources/list",
            Self::ReadResource => "resources/read",
            Self::SubscribeResource => "resources/subscribe",
            Self::UnsubscribeResource => "resources/unsubscribe",
            Self::ListPrompts => "prompts/list",
            Self::GetPrompt => "prompts/get",
            Self::Ping => "ping",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns true if this is a known method.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns all known methods.
    #[must_use]
    pub fn known_methods() -> &'static [Self] {
        static KNOWN: [McpMethod; 10] = [
            McpMethod::Initialize,
            McpMethod::ListTools,
            McpMethod::CallTool,
            McpMethod::ListResources,
            McpMethod::ReadResource,
            McpMethod::SubscribeResource,
            McpMethod::UnsubscribeResource,
            McpMethod::ListPrompts,
            McpMethod::GetPrompt,
            McpMethod::Ping,
        ];
        &KNOWN
    }
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            "resources/list" => Self::ListResources,
            "resources/read" => Self::ReadResource,
            "resources/subscribe" => Self::SubscribeResource,
            "resources/unsubscribe" => Self::UnsubscribeResource,
            "prompts/list" => Self::ListPrompts,
            "prompts/get" => Self::GetPrompt,
            "ping" => Self::Ping,
            unknown => Self::Unknown(unknown.to_string()),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
