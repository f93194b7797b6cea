//! Deterministic conversation titles.
//!
//! Derives a short title from the most recent user message with a fixed
//! heuristic cascade. Never fails outward: any internal fault yields
//! [`DEFAULT_TITLE`].

use std::panic::{catch_unwind, AssertUnwindSafe};

use chef_core::{Conversation, Message, Role};
use tracing::{debug, warn};

use crate::rules::RuleTable;

/// Fallback title for conversations with no recognisable topic.
pub const DEFAULT_TITLE: &str = "Conversa culinária";

/// Longest title ever produced, in characters.
pub const MAX_TITLE_CHARS: usize = 60;

/// Title generator over the shared [`RuleTable`].
#[derive(Clone, Copy)]
pub struct TitleGenerator {
    rules: &'static RuleTable,
}

impl Default for TitleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleGenerator {
    pub fn new() -> Self {
        Self {
            rules: RuleTable::shared(),
        }
    }

    /// Generate a title for the given messages.
    ///
    /// Returns `None` for an empty list or when the selected message is blank.
    pub fn generate(&self, messages: &[Message]) -> Option<String> {
        let source = select_source(messages)?;

        let title = catch_unwind(AssertUnwindSafe(|| self.cascade(source))).unwrap_or_else(|_| {
            warn!("Title heuristics failed; using default title");
            DEFAULT_TITLE.to_string()
        });

        let title = truncate_chars(&title, MAX_TITLE_CHARS);
        debug!(title = %title, "Conversation title generated");
        Some(title)
    }

    /// Title for a conversation that has none yet; `None` once titled.
    pub fn title_if_missing(&self, conversation: &Conversation) -> Option<String> {
        if conversation.is_untitled() {
            self.generate(&conversation.messages)
        } else {
            None
        }
    }

    fn cascade(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let culinary = self.rules.has_culinary_context(&lower);

        if !culinary && self.rules.match_weather(&lower).is_some() {
            return match self.rules.extract_location(text) {
                Some(city) => format!("Clima em {}", city),
                None => "Consulta de clima".to_string(),
            };
        }

        if !culinary && self.rules.match_date_time(&lower).is_some() {
            return match self.rules.extract_location(text) {
                Some(city) => format!("Hora em {}", city),
                None => "Consulta de data/horário".to_string(),
            };
        }

        if let Some(item) = self.rules.extract_how_to(text) {
            return format!("Como fazer {}", item);
        }

        if self.rules.has_food_keyword(&lower) {
            return match self.rules.category_for(&lower) {
                Some(category) => format!("Receitas com {}", category),
                None => "Sugestões de receitas".to_string(),
            };
        }

        DEFAULT_TITLE.to_string()
    }
}

/// Generate a title with the shared rule table.
pub fn generate(messages: &[Message]) -> Option<String> {
    TitleGenerator::new().generate(messages)
}

/// Newest user message, else the newest message of any role.
fn select_source(messages: &[Message]) -> Option<&str> {
    let candidate = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User && !m.text.trim().is_empty())
        .or_else(|| messages.last())?;

    let text = candidate.text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}
