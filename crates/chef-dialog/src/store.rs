//! Conversation persistence.
//!
//! The trait is the seam for a real document store; the in-memory
//! implementation backs the CLI and the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chef_core::{Conversation, ConversationSummary, Message, MessagePreview};
use chef_intent::TitleGenerator;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DialogError;

/// Title shown in listings for conversations that have none yet.
pub const UNTITLED: &str = "Nova conversa";

/// Longest last-message preview in a listing, in characters.
pub const PREVIEW_CHARS: usize = 120;

/// CRUD over conversations.
pub trait ConversationStore: Send + Sync {
    /// Create a conversation. A blank `title` is derived from
    /// `initial_messages` when possible.
    fn create(
        &self,
        title: Option<&str>,
        initial_messages: Vec<Message>,
    ) -> Result<Uuid, DialogError>;

    fn get(&self, id: Uuid) -> Result<Conversation, DialogError>;

    /// Append one message, titling the conversation while it is untitled.
    fn append(&self, id: Uuid, message: Message) -> Result<(), DialogError>;

    /// Overwrite the message list; never touches the title.
    fn replace_messages(&self, id: Uuid, messages: Vec<Message>) -> Result<(), DialogError>;

    /// Set an explicit title. Blank titles are rejected.
    fn rename(&self, id: Uuid, title: &str) -> Result<(), DialogError>;

    fn delete(&self, id: Uuid) -> Result<(), DialogError>;

    /// Summaries, most recently updated first.
    fn list(&self) -> Result<Vec<ConversationSummary>, DialogError>;
}

/// Process-local store.
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
    titles: TitleGenerator,
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            titles: TitleGenerator::new(),
        }
    }

    fn with_conversations<T>(
        &self,
        f: impl FnOnce(&mut HashMap<Uuid, Conversation>) -> Result<T, DialogError>,
    ) -> Result<T, DialogError> {
        let mut map = self
            .conversations
            .lock()
            .map_err(|e| DialogError::StorageError(format!("conversation lock poisoned: {}", e)))?;
        f(&mut map)
    }

    fn with_conversation<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Conversation) -> T,
    ) -> Result<T, DialogError> {
        self.with_conversations(|map| {
            let conversation = map
                .get_mut(&id)
                .ok_or(DialogError::ConversationNotFound(id))?;
            Ok(f(conversation))
        })
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn create(
        &self,
        title: Option<&str>,
        initial_messages: Vec<Message>,
    ) -> Result<Uuid, DialogError> {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => Some(t.to_string()),
            _ => self.titles.generate(&initial_messages),
        };
        let conversation = Conversation::new(title, initial_messages);
        let id = conversation.id;

        self.with_conversations(|map| {
            map.insert(id, conversation);
            Ok(())
        })?;
        info!(conversation_id = %id, "Conversation created");
        Ok(id)
    }

    fn get(&self, id: Uuid) -> Result<Conversation, DialogError> {
        self.with_conversation(id, |c| c.clone())
    }

    fn append(&self, id: Uuid, message: Message) -> Result<(), DialogError> {
        let titles = self.titles;
        self.with_conversation(id, |c| {
            c.messages.push(message);
            c.updated_at = Utc::now();
            if let Some(title) = titles.title_if_missing(c) {
                debug!(conversation_id = %id, title = %title, "Conversation auto-titled");
                c.title = Some(title);
            }
        })
    }

    fn replace_messages(&self, id: Uuid, messages: Vec<Message>) -> Result<(), DialogError> {
        self.with_conversation(id, |c| {
            c.messages = messages;
            c.updated_at = Utc::now();
        })
    }

    fn rename(&self, id: Uuid, title: &str) -> Result<(), DialogError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DialogError::InvalidTitle);
        }
        self.with_conversation(id, |c| {
            c.title = Some(title.to_string());
            c.updated_at = Utc::now();
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), DialogError> {
        self.with_conversations(|map| {
            map.remove(&id)
                .map(|_| ())
                .ok_or(DialogError::ConversationNotFound(id))
        })?;
        info!(conversation_id = %id, "Conversation deleted");
        Ok(())
    }

    fn list(&self) -> Result<Vec<ConversationSummary>, DialogError> {
        self.with_conversations(|map| {
            let mut summaries: Vec<ConversationSummary> = map.values().map(summarize).collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        })
    }
}

fn summarize(conversation: &Conversation) -> ConversationSummary {
    let title = match conversation.title.as_deref() {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    };
    let last_message = conversation.messages.last().map(|m| MessagePreview {
        role: m.role,
        text: m.text.chars().take(PREVIEW_CHARS).collect(),
    });
    ConversationSummary {
        id: conversation.id,
        title,
        updated_at: conversation.updated_at,
        last_message,
    }
}
