//! Message intent classification.
//!
//! Culinary framing always wins: "tempo" and "temperatura" are ambiguous
//! between the weather and a recipe, so cooking vocabulary is checked first.

use chef_core::Intent;
use tracing::debug;

use crate::rules::RuleTable;

/// Pure, total classifier over the shared [`RuleTable`].
#[derive(Clone, Copy)]
pub struct IntentClassifier {
    rules: &'static RuleTable,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            rules: RuleTable::shared(),
        }
    }

    /// Classify a message. Always returns exactly one intent; empty or
    /// unrecognised text is general chat.
    pub fn classify(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();

        let intent = if self.rules.has_culinary_context(&lower) {
            Intent::Culinary
        } else if self.rules.match_weather(&lower).is_some() {
            Intent::Weather
        } else if self.rules.match_date_time(&lower).is_some() {
            Intent::DateTime
        } else {
            Intent::Culinary
        };

        debug!(%intent, rules_version = self.rules.version(), "Message classified");
        intent
    }

    pub fn is_culinary_context(&self, text: &str) -> bool {
        self.rules.has_culinary_context(&text.to_lowercase())
    }

    /// Weather query that is not framed as cooking.
    pub fn is_weather_query(&self, text: &str) -> bool {
        self.classify(text) == Intent::Weather
    }

    /// Clock/calendar query that is not framed as cooking ("tempo de forno"
    /// is not a date/time question).
    pub fn is_date_time_query(&self, text: &str) -> bool {
        self.classify(text) == Intent::DateTime
    }
}

/// Classify with the shared rule table.
pub fn classify(text: &str) -> Intent {
    IntentClassifier::new().classify(text)
}
