//! MCP pre-defined prompts.
//!
//! Three prompts ship with the server. The entry starter is always
//! available; the reflection and tag overview prompts are gated on the
//! domain actually containing entries or tags, so clients never see a
//! prompt that would come back empty.

use crate::capabilities::CapabilityGate;
use crate::store::JournalStore;
use crate::{Error, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

/// Prompt that drafts a fresh entry. Never gated.
pub const ENTRY_STARTER_PROMPT: &str = "daybook_entry_starter";

/// Prompt that reflects over existing entries. Gated on entries.
pub const REFLECT_PROMPT: &str = "daybook_reflect";

/// Prompt that summarizes tag usage. Gated on tags.
pub const TAG_OVERVIEW_PROMPT: &str = "daybook_tag_overview";

/// Definition of an MCP prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Prompt arguments.
    pub arguments: Vec<PromptArgument>,
}

/// Argument for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the argument is required.
    pub required: bool,
}

/// A message in a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Role: user, assistant, or system.
    pub role: String,
    /// Message content.
    pub content: PromptContent,
}

/// Content of a prompt message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Resource reference.
    Resource {
        /// Resource URI.
        uri: String,
    },
}

/// Registry of pre-defined prompts.
pub struct PromptRegistry {
    store: Arc<JournalStore>,
    gate: Arc<CapabilityGate>,
    prompts: Vec<PromptDefinition>,
}

impl PromptRegistry {
    /// Creates the registry.
    #[must_use]
    pub fn new(store: Arc<JournalStore>, gate: Arc<CapabilityGate>) -> Self {
        Self {
            store,
            gate,
            prompts: vec![
                Self::entry_starter_prompt(),
                Self::reflect_prompt(),
                Self::tag_overview_prompt(),
            ],
        }
    }

    fn entry_starter_prompt() -> PromptDefinition {
        PromptDefinition {
            name: ENTRY_STARTER_PROMPT.to_string(),
            description: Some("Draft a new journal entry for today".to_string()),
            arguments: vec![
                PromptArgument {
                    name: "mood".to_string(),
                    description: Some("How you are feeling right now".to_string()),
                    required: false,
                },
                PromptArgument {
                    name: "topic".to_string(),
                    description: Some("Something specific to write about".to_string()),
                    required: false,
                },
            ],
        }
    }

    fn reflect_prompt() -> PromptDefinition {
        PromptDefinition {
            name: REFLECT_PROMPT.to_string(),
            description: Some("Reflect on themes across existing entries".to_string()),
            arguments: vec![PromptArgument {
                name: "year".to_string(),
                description: Some("Restrict the reflection to one calendar year".to_string()),
                required: false,
            }],
        }
    }

    fn tag_overview_prompt() -> PromptDefinition {
        PromptDefinition {
            name: TAG_OVERVIEW_PROMPT.to_string(),
            description: Some("Summarize how tags are used across the journal".to_string()),
            arguments: Vec::new(),
        }
    }

    /// Returns the prompts visible right now.
    #[must_use]
    pub fn list_prompts(&self) -> Vec<&PromptDefinition> {
        self.prompts
            .iter()
            .filter(|p| self.visible(&p.name))
            .collect()
    }

    /// Builds the messages for a prompt.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or currently disabled prompts and
    /// `InvalidInput` for malformed arguments.
    pub fn get_prompt_messages(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<Vec<PromptMessage>> {
        if !self.visible(name) {
            return Err(Error::NotFound {
                kind: "prompt".to_string(),
                id: name.to_string(),
            });
        }

        match name {
            ENTRY_STARTER_PROMPT => Ok(Self::entry_starter_messages(arguments)),
            REFLECT_PROMPT => self.reflect_messages(arguments),
            TAG_OVERVIEW_PROMPT => Ok(self.tag_overview_messages()),
            _ => Err(Error::NotFound {
                kind: "prompt".to_string(),
                id: name.to_string(),
            }),
        }
    }

    /// A prompt is visible when it is ungated or the gate enables it.
    fn visible(&self, name: &str) -> bool {
        if name == ENTRY_STARTER_PROMPT {
            return self.prompts.iter().any(|p| p.name == name);
        }
        self.prompts.iter().any(|p| p.name == name) && self.gate.is_enabled(name)
    }

    fn entry_starter_messages(arguments: &Value) -> Vec<PromptMessage> {
        let mut text = "Help me write today's journal entry.".to_string();
        if let Some(mood) = arguments.get("mood").and_then(Value::as_str) {
            let _ = write!(text, " I'm feeling {mood}.");
        }
        if let Some(topic) = arguments.get("topic").and_then(Value::as_str) {
            let _ = write!(text, " I want to write about {topic}.");
        }
        text.push_str(
            " Ask me two or three short questions about my day, then draft an entry \
             with a title and a few paragraphs I can edit.",
        );
        vec![user_message(text)]
    }

    fn reflect_messages(&self, arguments: &Value) -> Result<Vec<PromptMessage>> {
        let year = match arguments.get("year").and_then(Value::as_str) {
            Some(raw) => Some(raw.trim().parse::<i32>().map_err(|_| {
                Error::InvalidInput(format!("year must be a number, got '{raw}'"))
            })?),
            None => None,
        };

        let entries: Vec<_> = self
            .store
            .list_entries()
            .into_iter()
            .filter(|e| year.is_none_or(|y| e.created_at.year() == y))
            .collect();

        let scope = year.map_or_else(|| "the whole journal".to_string(), |y| y.to_string());
        let mut text = format!("Here are my journal entries from {scope}:\n\n");
        if entries.is_empty() {
            text.push_str("(none recorded)\n");
        }
        for entry in &entries {
            let _ = writeln!(
                text,
                "- {}: {}",
                entry.created_at.format("%Y-%m-%d"),
                entry.title
            );
        }
        let _ = write!(
            text,
            "\nWhat themes and changes do you notice across these {} entries? \
             Point at specific entries when you answer.",
            entries.len()
        );
        Ok(vec![user_message(text)])
    }

    fn tag_overview_messages(&self) -> Vec<PromptMessage> {
        let entries = self.store.list_entries();
        let mut text = "Here is how my journal tags are used:\n\n".to_string();
        for tag in self.store.list_tags() {
            let uses = entries.iter().filter(|e| e.tags.contains(&tag.name)).count();
            let _ = writeln!(text, "- {} ({} entries)", tag.name, uses);
        }
        text.push_str(
            "\nSummarize what each tag covers and suggest tags worth merging or retiring.",
        );
        vec![user_message(text)]
    }
}

fn user_message(text: String) -> PromptMessage {
    PromptMessage {
        role: "user".to_string(),
        content: PromptContent::Text { text },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilityKind;
    use crate::events::ChangeBus;
    use crate::models::DomainCounts;
    use serde_json::json;

    fn registry() -> (PromptRegistry, Arc<JournalStore>, Arc<CapabilityGate>) {
        let store = Arc::new(JournalStore::new(Arc::new(ChangeBus::new()), None).unwrap());
        let gate = Arc::new(CapabilityGate::new());
        gate.register(REFLECT_PROMPT, CapabilityKind::Prompts, |c| c.entries > 0);
        gate.register(TAG_OVERVIEW_PROMPT, CapabilityKind::Prompts, |c| c.tags > 0);
        let registry = PromptRegistry::new(store.clone(), gate.clone());
        (registry, store, gate)
    }

    #[test]
    fn test_starter_is_visible_without_any_data() {
        let (registry, _store, gate) = registry();
        gate.initialize(&DomainCounts::default());

        let names: Vec<&str> = registry
            .list_prompts()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec![ENTRY_STARTER_PROMPT]);
    }

    #[tokio::test]
    async fn test_gated_prompts_appear_with_data() {
        let (registry, store, gate) = registry();
        store.create_entry("a", "b", &[]).await.unwrap();
        store.create_tag("travel", None).await.unwrap();
        gate.initialize(&DomainCounts {
            entries: 1,
            tags: 1,
            videos: 0,
        });

        assert_eq!(registry.list_prompts().len(), 3);
    }

    #[test]
    fn test_disabled_prompt_reads_as_not_found() {
        let (registry, _store, gate) = registry();
        gate.initialize(&DomainCounts::default());

        let err = registry
            .get_prompt_messages(REFLECT_PROMPT, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_unknown_prompt_is_not_found() {
        let (registry, _store, _gate) = registry();
        let err = registry
            .get_prompt_messages("daybook_no_such", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_starter_embeds_arguments() {
        let (registry, _store, _gate) = registry();
        let messages = registry
            .get_prompt_messages(
                ENTRY_STARTER_PROMPT,
                &json!({ "mood": "tired", "topic": "the move" }),
            )
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        let PromptContent::Text { text } = &messages[0].content else {
            panic!("expected text content");
        };
        assert!(text.contains("tired"));
        assert!(text.contains("the move"));
    }

    #[tokio::test]
    async fn test_reflect_lists_entries_for_year() {
        let (registry, store, gate) = registry();
        store.create_entry("Kept", "b", &[]).await.unwrap();
        gate.initialize(&DomainCounts {
            entries: 1,
            tags: 0,
            videos: 0,
        });

        let year = chrono::Utc::now().year().to_string();
        let messages = registry
            .get_prompt_messages(REFLECT_PROMPT, &json!({ "year": year }))
            .unwrap();
        let PromptContent::Text { text } = &messages[0].content else {
            panic!("expected text content");
        };
        assert!(text.contains("Kept"));
    }

    #[tokio::test]
    async fn test_reflect_rejects_bad_year() {
        let (registry, store, gate) = registry();
        store.create_entry("a", "b", &[]).await.unwrap();
        gate.initialize(&DomainCounts {
            entries: 1,
            tags: 0,
            videos: 0,
        });

        let err = registry
            .get_prompt_messages(REFLECT_PROMPT, &json!({ "year": "soon" }))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_tag_overview_counts_usage() {
        let (registry, store, gate) = registry();
        store.create_tag("travel", None).await.unwrap();
        store
            .create_entry("a", "b", &["travel".to_string()])
            .await
            .unwrap();
        store
            .create_entry("c", "d", &["travel".to_string()])
            .await
            .unwrap();
        gate.initialize(&DomainCounts {
            entries: 2,
            tags: 1,
            videos: 0,
        });

        let messages = registry
            .get_prompt_messages(TAG_OVERVIEW_PROMPT, &json!({}))
            .unwrap();
        let PromptContent::Text { text } = &messages[0].content else {
            panic!("expected text content");
        };
        assert!(text.contains("travel (2 entries)"));
    }
}
