//! Conversation orchestrator: one user message in, one reply out.
//!
//! Composes the intent classifier, the city slot, the title generator and the
//! external collaborators. Errors never escape a turn; they become replies.

use std::sync::Arc;

use chef_core::config::DialogConfig;
use chef_core::{Intent, Message};
use chef_intent::{IntentClassifier, TitleGenerator};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::collaborator::{Connectivity, GenerativeService, WeatherService};
use crate::error::DialogError;
use crate::prompt::{build_prompt, Persona};
use crate::reply;
use crate::slot::{DialogSlotState, SlotAction};

/// Result of one turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub reply: String,
    /// History after the turn; unchanged when the turn was rejected.
    pub history: Vec<Message>,
    /// Intent the reply answered. `None` for rejected turns.
    pub intent: Option<Intent>,
    /// Title for a previously untitled conversation.
    pub title: Option<String>,
}

impl TurnOutcome {
    /// Whether the turn appended messages.
    pub fn is_applied(&self) -> bool {
        self.intent.is_some()
    }
}

/// Central coordinator for conversational turns.
pub struct ConversationOrchestrator {
    classifier: IntentClassifier,
    titles: TitleGenerator,
    generative: Arc<dyn GenerativeService>,
    weather: Arc<dyn WeatherService>,
    connectivity: Arc<dyn Connectivity>,
    persona: Persona,
    config: DialogConfig,
}

impl ConversationOrchestrator {
    pub fn new(
        config: DialogConfig,
        generative: Arc<dyn GenerativeService>,
        weather: Arc<dyn WeatherService>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let persona = Persona::resolve(None, Some(&config.persona));
        Self {
            classifier: IntentClassifier::new(),
            titles: TitleGenerator::new(),
            generative,
            weather,
            connectivity,
            persona,
            config,
        }
    }

    /// Replace the persona preamble, e.g. with a user's override.
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Run one turn.
    ///
    /// `title` is the conversation's current title; a new one is only
    /// generated while it is missing or blank. `slot` is only written once
    /// the turn completes, so a turn dropped mid-lookup leaves it as it was.
    pub async fn handle_turn(
        &self,
        slot: &mut DialogSlotState,
        history: &[Message],
        title: Option<&str>,
        user_text: &str,
    ) -> TurnOutcome {
        let mut pending = slot.clone();
        let (reply, intent) = match self.respond(&mut pending, history, user_text).await {
            Ok(answered) => answered,
            Err(e) => {
                debug_assert!(e.is_fatal_to_turn());
                warn!(error = %e, "Turn rejected");
                return TurnOutcome {
                    reply: self.rejection_reply(&e),
                    history: history.to_vec(),
                    intent: None,
                    title: None,
                };
            }
        };
        *slot = pending;

        let mut updated = Vec::with_capacity(history.len() + 2);
        updated.extend_from_slice(history);
        updated.push(Message::user(user_text.trim()));
        updated.push(Message::assistant(reply.clone()));

        let title = match title {
            Some(t) if !t.trim().is_empty() => None,
            _ => self.titles.generate(&updated),
        };

        info!(%intent, history_len = updated.len(), "Turn completed");
        TurnOutcome {
            reply,
            history: updated,
            intent: Some(intent),
            title,
        }
    }

    /// Produce the reply for a turn. `Err` only for turn-fatal errors; every
    /// other failure is already folded into the reply text.
    async fn respond(
        &self,
        slot: &mut DialogSlotState,
        history: &[Message],
        user_text: &str,
    ) -> Result<(String, Intent), DialogError> {
        if !self.connectivity.is_online() {
            return Err(DialogError::Offline);
        }
        self.validate(user_text)?;

        if slot.is_awaiting_city() {
            let resolution = slot.on_city_reply(user_text)?;
            let reply = self
                .fulfil(slot, &resolution.city, resolution.related_intent)
                .await;
            return Ok((reply, resolution.related_intent));
        }

        let intent = self.classifier.classify(user_text);
        let reply = match slot.on_classified(intent) {
            SlotAction::AskForCity(intent) => reply::ask_for_city(intent).to_string(),
            SlotAction::FulfillWithCity { city, intent } => self.fulfil(slot, &city, intent).await,
            SlotAction::ForwardToGenerativeService => self.ask_generative(history, user_text).await,
        };
        Ok((reply, intent))
    }

    fn validate(&self, user_text: &str) -> Result<(), DialogError> {
        let trimmed = user_text.trim();
        if trimmed.is_empty() {
            return Err(DialogError::EmptyMessage);
        }
        if trimmed.chars().count() > self.config.max_message_chars {
            return Err(DialogError::MessageTooLong(self.config.max_message_chars));
        }
        Ok(())
    }

    async fn fulfil(&self, slot: &mut DialogSlotState, city: &str, intent: Intent) -> String {
        match self.lookup(city, intent).await {
            Ok(text) => text,
            Err(e) => {
                if e.is_lookup_failure() {
                    warn!(city = %city, %intent, error = %e, "City lookup failed");
                } else {
                    error!(city = %city, %intent, error = %e, "Unexpected city lookup error");
                }
                slot.clear_city();
                reply::city_lookup_failed(city, intent)
            }
        }
    }

    async fn lookup(&self, city: &str, intent: Intent) -> Result<String, DialogError> {
        let location = self.weather.geocode(city).await?;
        let report = self
            .weather
            .current_conditions(location.lat, location.lon)
            .await?;
        debug!(city = %location.name, country = %location.country, "City resolved");

        Ok(match intent {
            Intent::DateTime => {
                reply::date_time_reply(&location, report.timezone_offset_secs, Utc::now())
            }
            Intent::Weather | Intent::Culinary => reply::weather_reply(&location, &report),
        })
    }

    async fn ask_generative(&self, history: &[Message], user_text: &str) -> String {
        let prompt = build_prompt(
            self.persona.as_str(),
            history,
            user_text.trim(),
            self.config.history_turns,
        );
        match self.generative.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Generative service failed");
                reply::GENERATIVE_ERROR.to_string()
            }
        }
    }

    fn rejection_reply(&self, err: &DialogError) -> String {
        match err {
            DialogError::Offline => reply::OFFLINE.to_string(),
            DialogError::EmptyMessage => reply::EMPTY_MESSAGE.to_string(),
            DialogError::MessageTooLong(max) => reply::message_too_long(*max),
            _ => reply::GENERATIVE_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{GeoLocation, WeatherReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // =====================================================================
    // Fakes
    // =====================================================================

    #[derive(Default)]
    struct EchoGenerative {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerativeService for EchoGenerative {
        async fn generate(&self, prompt: &str) -> Result<String, DialogError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(DialogError::GenerativeServiceError("quota".into()))
            } else {
                Ok("Resposta do chef".to_string())
            }
        }
    }

    #[derive(Default)]
    struct FakeWeather {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherService for FakeWeather {
        async fn geocode(&self, city: &str) -> Result<GeoLocation, DialogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if city == "Xyzzy" {
                return Err(DialogError::CityNotFound(city.to_string()));
            }
            Ok(GeoLocation {
                lat: -25.4,
                lon: -49.3,
                name: city.to_string(),
                country: "BR".to_string(),
            })
        }

        async fn current_conditions(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<WeatherReport, DialogError> {
            Ok(WeatherReport {
                temperature_c: 12.0,
                description: "chuva leve".to_string(),
                humidity: 90,
                timezone_offset_secs: -10800,
            })
        }
    }

    /// Lookups that never answer.
    struct StalledWeather;

    #[async_trait]
    impl WeatherService for StalledWeather {
        async fn geocode(&self, _city: &str) -> Result<GeoLocation, DialogError> {
            std::future::pending::<Result<GeoLocation, DialogError>>().await
        }

        async fn current_conditions(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<WeatherReport, DialogError> {
            std::future::pending::<Result<WeatherReport, DialogError>>().await
        }
    }

    /// Weather service whose errors are not lookup failures.
    struct BrokenWeather;

    #[async_trait]
    impl WeatherService for BrokenWeather {
        async fn geocode(&self, _city: &str) -> Result<GeoLocation, DialogError> {
            Err(DialogError::GenerativeServiceError("misrouted".into()))
        }

        async fn current_conditions(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<WeatherReport, DialogError> {
            Err(DialogError::GenerativeServiceError("misrouted".into()))
        }
    }

    struct Switch(AtomicBool);

    impl Connectivity for Switch {
        fn is_online(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        orchestrator: ConversationOrchestrator,
        generative: Arc<EchoGenerative>,
        weather: Arc<FakeWeather>,
        network: Arc<Switch>,
    }

    fn harness_with(generative: EchoGenerative) -> Harness {
        let generative = Arc::new(generative);
        let weather = Arc::new(FakeWeather::default());
        let network = Arc::new(Switch(AtomicBool::new(true)));
        let orchestrator = ConversationOrchestrator::new(
            DialogConfig::default(),
            generative.clone(),
            weather.clone(),
            network.clone(),
        );
        Harness {
            orchestrator,
            generative,
            weather,
            network,
        }
    }

    fn harness() -> Harness {
        harness_with(EchoGenerative::default())
    }

    fn orchestrator_over(weather: Arc<dyn WeatherService>) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            DialogConfig::default(),
            Arc::new(EchoGenerative::default()),
            weather,
            Arc::new(Switch(AtomicBool::new(true))),
        )
    }

    // =====================================================================
    // Routing
    // =====================================================================

    #[tokio::test]
    async fn test_culinary_goes_to_generative_service() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        let out = h
            .orchestrator
            .handle_turn(&mut slot, &[], None, "Como fazer brigadeiro?")
            .await;

        assert_eq!(out.reply, "Resposta do chef");
        assert_eq!(out.intent, Some(Intent::Culinary));
        assert_eq!(out.history.len(), 2);
        assert_eq!(out.history[0].text, "Como fazer brigadeiro?");
        assert_eq!(out.title.as_deref(), Some("Como fazer brigadeiro"));

        let prompts = h.generative.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(crate::prompt::DEFAULT_PERSONA));
        assert!(prompts[0].ends_with("Pergunta atual do usuário: Como fazer brigadeiro?"));
    }

    #[tokio::test]
    async fn test_weather_without_city_asks_then_fulfils() {
        let h = harness();
        let mut slot = DialogSlotState::new();

        let first = h
            .orchestrator
            .handle_turn(&mut slot, &[], None, "Vai chover hoje?")
            .await;
        assert_eq!(first.reply, reply::ask_for_city(Intent::Weather));
        assert!(slot.is_awaiting_city());
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);

        let second = h
            .orchestrator
            .handle_turn(&mut slot, &first.history, Some("Consulta de clima"), "Curitiba")
            .await;
        assert!(second.reply.starts_with("Em Curitiba, BR, a temperatura atual é de 12°C"));
        assert_eq!(second.intent, Some(Intent::Weather));
        assert_eq!(second.history.len(), 4);
        assert!(second.title.is_none());
        assert_eq!(slot.cached_city(), Some("Curitiba"));
    }

    #[tokio::test]
    async fn test_cached_city_is_reused() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        h.orchestrator.handle_turn(&mut slot, &[], None, "Que horas são?").await;
        h.orchestrator.handle_turn(&mut slot, &[], None, "Recife").await;

        let out = h
            .orchestrator
            .handle_turn(&mut slot, &[], None, "Como está o clima?")
            .await;
        assert!(out.reply.starts_with("Em Recife, BR"));
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_date_time_reply_after_city() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        h.orchestrator.handle_turn(&mut slot, &[], None, "Que horas são?").await;
        let out = h.orchestrator.handle_turn(&mut slot, &[], None, "Lisboa").await;
        assert!(out.reply.starts_with("Em Lisboa, BR:"));
        assert!(out.reply.contains("UTC-3:00"));
        assert_eq!(out.intent, Some(Intent::DateTime));
    }

    #[tokio::test]
    async fn test_city_reply_is_never_reclassified() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        h.orchestrator.handle_turn(&mut slot, &[], None, "Vai chover?").await;
        let out = h
            .orchestrator
            .handle_turn(&mut slot, &[], None, "Me passa uma receita")
            .await;

        assert!(h.generative.prompts.lock().unwrap().is_empty());
        assert!(out.reply.starts_with("Em Me passa uma receita, BR"));
    }

    // =====================================================================
    // Failures
    // =====================================================================

    #[tokio::test]
    async fn test_lookup_failure_clears_city() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        h.orchestrator.handle_turn(&mut slot, &[], None, "Vai chover?").await;
        let out = h.orchestrator.handle_turn(&mut slot, &[], None, "Xyzzy").await;

        assert_eq!(out.reply, reply::city_lookup_failed("Xyzzy", Intent::Weather));
        assert_eq!(out.history.len(), 2);
        assert!(slot.cached_city().is_none());
        assert!(!slot.is_awaiting_city());

        let again = h.orchestrator.handle_turn(&mut slot, &[], None, "Vai chover?").await;
        assert_eq!(again.reply, reply::ask_for_city(Intent::Weather));
    }

    #[tokio::test]
    async fn test_unexpected_lookup_error_also_clears_city() {
        let orchestrator = orchestrator_over(Arc::new(BrokenWeather));
        let mut slot = DialogSlotState::new();
        orchestrator.handle_turn(&mut slot, &[], None, "Que horas são?").await;
        let out = orchestrator.handle_turn(&mut slot, &[], None, "Recife").await;

        assert_eq!(out.reply, reply::city_lookup_failed("Recife", Intent::DateTime));
        assert!(out.is_applied());
        assert!(slot.cached_city().is_none());
        assert!(!slot.is_awaiting_city());
    }

    #[tokio::test]
    async fn test_abandoned_turn_leaves_slot_untouched() {
        let orchestrator = orchestrator_over(Arc::new(StalledWeather));
        let mut slot = DialogSlotState::new();
        orchestrator.handle_turn(&mut slot, &[], None, "Vai chover?").await;
        let awaiting = slot.clone();

        let turn = orchestrator.handle_turn(&mut slot, &[], None, "Recife");
        let abandoned = tokio::time::timeout(Duration::from_millis(20), turn).await;

        assert!(abandoned.is_err());
        assert_eq!(slot, awaiting);
        assert!(slot.is_awaiting_city());
        assert!(slot.cached_city().is_none());
    }

    #[tokio::test]
    async fn test_generative_failure_becomes_reply() {
        let h = harness_with(EchoGenerative {
            fail: true,
            ..Default::default()
        });
        let mut slot = DialogSlotState::new();
        let out = h.orchestrator.handle_turn(&mut slot, &[], None, "Oi").await;
        assert_eq!(out.reply, reply::GENERATIVE_ERROR);
        assert!(out.is_applied());
    }

    #[tokio::test]
    async fn test_offline_leaves_everything_untouched() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        h.orchestrator.handle_turn(&mut slot, &[], None, "Vai chover?").await;
        let before = slot.clone();

        h.network.0.store(false, Ordering::SeqCst);
        let history = vec![Message::user("Vai chover?")];
        let out = h
            .orchestrator
            .handle_turn(&mut slot, &history, None, "Curitiba")
            .await;

        assert_eq!(out.reply, reply::OFFLINE);
        assert_eq!(out.history, history);
        assert!(out.title.is_none());
        assert!(!out.is_applied());
        assert_eq!(slot, before);
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_and_long_messages_rejected() {
        let h = harness();
        let mut slot = DialogSlotState::new();

        let out = h.orchestrator.handle_turn(&mut slot, &[], None, "   ").await;
        assert_eq!(out.reply, reply::EMPTY_MESSAGE);
        assert!(out.history.is_empty());

        let long = "a".repeat(2001);
        let out = h.orchestrator.handle_turn(&mut slot, &[], None, &long).await;
        assert_eq!(out.reply, reply::message_too_long(2000));
        assert!(!out.is_applied());
        assert!(h.generative.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_title_is_not_replaced() {
        let h = harness();
        let mut slot = DialogSlotState::new();
        let out = h
            .orchestrator
            .handle_turn(&mut slot, &[], Some("Jantar"), "Como fazer risoto?")
            .await;
        assert!(out.title.is_none());

        let out = h
            .orchestrator
            .handle_turn(&mut slot, &[], Some("  "), "Como fazer risoto?")
            .await;
        assert_eq!(out.title.as_deref(), Some("Como fazer risoto"));
    }

    #[tokio::test]
    async fn test_persona_override() {
        let h = harness();
        let orchestrator = h
            .orchestrator
            .with_persona(Persona::resolve(Some("Chef vegano"), None));
        let mut slot = DialogSlotState::new();
        orchestrator.handle_turn(&mut slot, &[], None, "Oi").await;
        assert!(h.generative.prompts.lock().unwrap()[0].starts_with("Chef vegano\n\n"));
    }
}
