use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used when replaying history into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::User => "Usuário",
            Role::Assistant => "Assistente",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Categorical purpose inferred from a user message.
///
/// Computed fresh for every message and never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Cooking talk or general chat; the default.
    Culinary,
    /// Current weather for a city.
    Weather,
    /// Current date and time for a city.
    DateTime,
}

impl Intent {
    /// Whether this intent needs a city before it can be fulfilled.
    pub fn needs_city(&self) -> bool {
        matches!(self, Intent::Weather | Intent::DateTime)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Culinary => write!(f, "culinary"),
            Intent::Weather => write!(f, "weather"),
            Intent::DateTime => write!(f, "date_time"),
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "culinary" => Ok(Intent::Culinary),
            "weather" => Ok(Intent::Weather),
            "date_time" => Ok(Intent::DateTime),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

// =============================================================================
// Messages and conversations
// =============================================================================

/// A single exchanged message. Immutable once appended to a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// A titled, ordered list of messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// Set once, from the title generator or an explicit rename.
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: Option<String>, messages: Vec<Message>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            messages,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when no non-blank title has been assigned yet.
    pub fn is_untitled(&self) -> bool {
        self.title.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// Preview of the most recent message in a conversation listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub role: Role,
    pub text: String,
}

/// Listing entry for a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub last_message: Option<MessagePreview>,
}
