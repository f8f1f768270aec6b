//! MCP tool definitions and execution.
//!
//! Six tools are exposed: CRUD over entries and tags, executed inline
//! against the store, plus `generate_recap_video`, which the server
//! dispatches as a background job so progress can stream while other
//! requests keep flowing.

use crate::models::{EntryId, TagId};
use crate::store::JournalStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the deferred recap render tool.
pub const RECAP_TOOL_NAME: &str = "generate_recap_video";

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Builds a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Builds an error text result.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Arguments for the recap render tool.
///
/// Parsed by the server before the render job is spawned, so argument
/// errors surface as a normal JSON-RPC error instead of a failed job.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecapArgs {
    /// Calendar year to render.
    pub year: i32,
    /// Optional output path. Defaults into the media directory.
    pub output: Option<String>,
    /// Use the simulated renderer instead of the external command.
    #[serde(default)]
    pub simulate: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateEntryArgs {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateEntryArgs {
    id: u64,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteEntryArgs {
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateTagArgs {
    name: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteTagArgs {
    id: u64,
}

/// Registry of MCP tools.
pub struct ToolRegistry {
    /// Available tools in listing order.
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Creates a new tool registry with all daybook tools.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: vec![
                create_entry_tool(),
                update_entry_tool(),
                delete_entry_tool(),
                create_tag_tool(),
                delete_tag_tool(),
                recap_tool(),
            ],
        }
    }

    /// Returns all tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Executes an inline tool against the store.
    ///
    /// The recap tool never reaches this path; the server dispatches it
    /// as a background job before inline execution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown tools or malformed arguments
    /// and propagates store errors.
    pub async fn execute(
        &self,
        store: &JournalStore,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult> {
        match name {
            "create_entry" => {
                let args: CreateEntryArgs = parse_args(arguments)?;
                let entry = store
                    .create_entry(&args.title, &args.content, &args.tags)
                    .await?;
                Ok(ToolResult::text(format!(
                    "Created entry {}: {}",
                    entry.id.value(),
                    entry.title
                )))
            }
            "update_entry" => {
                let args: UpdateEntryArgs = parse_args(arguments)?;
                let entry = store
                    .update_entry(EntryId::new(args.id), args.title, args.content, args.tags)
                    .await?;
                Ok(ToolResult::text(format!(
                    "Updated entry {}: {}",
                    entry.id.value(),
                    entry.title
                )))
            }
            "delete_entry" => {
                let args: DeleteEntryArgs = parse_args(arguments)?;
                let entry = store.delete_entry(EntryId::new(args.id)).await?;
                Ok(ToolResult::text(format!(
                    "Deleted entry {}: {}",
                    entry.id.value(),
                    entry.title
                )))
            }
            "create_tag" => {
                let args: CreateTagArgs = parse_args(arguments)?;
                let tag = store
                    .create_tag(&args.name, args.description)
                    .await?;
                Ok(ToolResult::text(format!(
                    "Created tag {}: {}",
                    tag.id.value(),
                    tag.name
                )))
            }
            "delete_tag" => {
                let args: DeleteTagArgs = parse_args(arguments)?;
                let tag = store.delete_tag(TagId::new(args.id)).await?;
                Ok(ToolResult::text(format!(
                    "Deleted tag {}: {}",
                    tag.id.value(),
                    tag.name
                )))
            }
            RECAP_TOOL_NAME => Err(Error::InvalidInput(
                "generate_recap_video runs as a background job".to_string(),
            )),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

fn create_entry_tool() -> ToolDefinition {
    ToolDefinition {
        name: "create_entry".to_string(),
        description: "Create a new journal entry".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Entry title, must not be empty"
                },
                "content": {
                    "type": "string",
                    "description": "Entry body text"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Tag names attached to the entry"
                }
            },
            "required": ["title"]
        }),
    }
}

fn update_entry_tool() -> ToolDefinition {
    ToolDefinition {
        name: "update_entry".to_string(),
        description: "Update an existing journal entry".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "description": "Entry id"
                },
                "title": {
                    "type": "string",
                    "description": "New title"
                },
                "content": {
                    "type": "string",
                    "description": "New body text"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Replacement tag names"
                }
            },
            "required": ["id"]
        }),
    }
}

fn delete_entry_tool() -> ToolDefinition {
    ToolDefinition {
        name: "delete_entry".to_string(),
        description: "Delete a journal entry".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "description": "Entry id"
                }
            },
            "required": ["id"]
        }),
    }
}

fn create_tag_tool() -> ToolDefinition {
    ToolDefinition {
        name: "create_tag".to_string(),
        description: "Create a tag".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Tag name, unique and non-empty"
                },
                "description": {
                    "type": "string",
                    "description": "What the tag covers"
                }
            },
            "required": ["name"]
        }),
    }
}

fn delete_tag_tool() -> ToolDefinition {
    ToolDefinition {
        name: "delete_tag".to_string(),
        description: "Delete a tag".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "description": "Tag id"
                }
            },
            "required": ["id"]
        }),
    }
}

fn recap_tool() -> ToolDefinition {
    ToolDefinition {
        name: RECAP_TOOL_NAME.to_string(),
        description: "Render a recap video for one year of entries. Runs in the \
                      background and streams progress notifications."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "year": {
                    "type": "integer",
                    "description": "Calendar year to render"
                },
                "output": {
                    "type": "string",
                    "description": "Output file path, defaults into the media directory"
                },
                "simulate": {
                    "type": "boolean",
                    "description": "Use the built-in simulated renderer"
                }
            },
            "required": ["year"]
        }),
    }
}
