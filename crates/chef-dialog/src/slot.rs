//! Per-session "which city?" slot.
//!
//! Two phases: Idle and AwaitingCity.
//! Idle -> AwaitingCity when a weather/date-time intent arrives with no city
//! cached; AwaitingCity -> Idle once a city reply is consumed. A failed
//! lookup clears the cached city so the next such query prompts again.

use chef_core::Intent;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DialogError;

/// Slot the dialog can be waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    City,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotPhase {
    Idle,
    AwaitingCity,
}

/// What the orchestrator should do with a classified message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotAction {
    /// Ask the user for their city; no external call.
    AskForCity(Intent),
    /// Look up weather or time for the cached city.
    FulfillWithCity { city: String, intent: Intent },
    ForwardToGenerativeService,
}

/// A consumed city reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotResolution {
    pub city: String,
    pub related_intent: Intent,
}

/// Slot state for one session. `related_intent` is set iff `awaiting` is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSlotState {
    awaiting: Option<Slot>,
    related_intent: Option<Intent>,
    cached_city: Option<String>,
}

impl DialogSlotState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle state with a city already known, e.g. from user settings.
    pub fn with_cached_city(city: impl Into<String>) -> Self {
        let city = city.into().trim().to_string();
        Self {
            cached_city: (!city.is_empty()).then_some(city),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SlotPhase {
        match self.awaiting {
            Some(Slot::City) => SlotPhase::AwaitingCity,
            None => SlotPhase::Idle,
        }
    }

    pub fn is_awaiting_city(&self) -> bool {
        self.phase() == SlotPhase::AwaitingCity
    }

    pub fn cached_city(&self) -> Option<&str> {
        self.cached_city.as_deref()
    }

    /// Intent waiting for the city, if any.
    pub fn related_intent(&self) -> Option<Intent> {
        self.related_intent
    }

    /// Decide the next action for a freshly classified message.
    pub fn on_classified(&mut self, intent: Intent) -> SlotAction {
        if !intent.needs_city() {
            self.awaiting = None;
            self.related_intent = None;
            return SlotAction::ForwardToGenerativeService;
        }

        match &self.cached_city {
            Some(city) => SlotAction::FulfillWithCity {
                city: city.clone(),
                intent,
            },
            None => {
                self.awaiting = Some(Slot::City);
                self.related_intent = Some(intent);
                debug!(%intent, "Awaiting city");
                SlotAction::AskForCity(intent)
            }
        }
    }

    /// Consume a reply as the city name, verbatim apart from surrounding
    /// whitespace.
    ///
    /// Fails with [`DialogError::UnexpectedSlotReply`] when no city is
    /// awaited and with [`DialogError::EmptyMessage`] for a blank reply. The
    /// state is untouched on failure.
    pub fn on_city_reply(&mut self, text: &str) -> Result<SlotResolution, DialogError> {
        let related_intent = match (self.awaiting, self.related_intent) {
            (Some(Slot::City), Some(intent)) => intent,
            _ => return Err(DialogError::UnexpectedSlotReply),
        };

        let city = text.trim();
        if city.is_empty() {
            return Err(DialogError::EmptyMessage);
        }
        let city = city.to_string();
        self.awaiting = None;
        self.related_intent = None;
        self.cached_city = Some(city.clone());
        debug!(city = %city, intent = %related_intent, "City slot filled");

        Ok(SlotResolution {
            city,
            related_intent,
        })
    }

    /// Forget the cached city after a failed lookup.
    pub fn clear_city(&mut self) {
        if let Some(city) = self.cached_city.take() {
            debug!(city = %city, "Cached city cleared");
        }
    }
}
