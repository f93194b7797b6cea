//! Multi-turn conversations through the registry, store and orchestrator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chef_core::config::DialogConfig;
use chef_core::{Intent, Role};
use chef_dialog::reply;
use chef_dialog::{
    Connectivity, ConversationOrchestrator, ConversationStore, DialogError, GenerativeService,
    GeoLocation, InMemoryConversationStore, SessionRegistry, WeatherReport, WeatherService,
};
use uuid::Uuid;

// =============================================================================
// Fakes
// =============================================================================

struct SlowChef {
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

#[async_trait]
impl GenerativeService for SlowChef {
    async fn generate(&self, prompt: &str) -> Result<String, DialogError> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        tokio::time::sleep(self.delay).await;
        Ok(format!("Resposta {}", n))
    }
}

#[derive(Default)]
struct Atlas {
    geocode_calls: AtomicUsize,
}

#[async_trait]
impl WeatherService for Atlas {
    async fn geocode(&self, city: &str) -> Result<GeoLocation, DialogError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        match city {
            "Curitiba" => Ok(GeoLocation {
                lat: -25.43,
                lon: -49.27,
                name: "Curitiba".to_string(),
                country: "BR".to_string(),
            }),
            "Lisboa" => Ok(GeoLocation {
                lat: 38.72,
                lon: -9.14,
                name: "Lisboa".to_string(),
                country: "PT".to_string(),
            }),
            other => Err(DialogError::CityNotFound(other.to_string())),
        }
    }

    async fn current_conditions(
        &self,
        lat: f64,
        _lon: f64,
    ) -> Result<WeatherReport, DialogError> {
        if lat > 0.0 {
            Ok(WeatherReport {
                temperature_c: 27.2,
                description: "céu limpo".to_string(),
                humidity: 55,
                timezone_offset_secs: 3600,
            })
        } else {
            Ok(WeatherReport {
                temperature_c: 13.0,
                description: "chuva moderada".to_string(),
                humidity: 88,
                timezone_offset_secs: -10800,
            })
        }
    }
}

struct Online;

impl Connectivity for Online {
    fn is_online(&self) -> bool {
        true
    }
}

struct World {
    registry: SessionRegistry,
    store: InMemoryConversationStore,
    orchestrator: ConversationOrchestrator,
    chef: Arc<SlowChef>,
    atlas: Arc<Atlas>,
}

fn world(delay_ms: u64) -> World {
    let config = DialogConfig::default();
    let chef = Arc::new(SlowChef {
        prompts: Mutex::new(Vec::new()),
        delay: Duration::from_millis(delay_ms),
    });
    let atlas = Arc::new(Atlas::default());
    World {
        registry: SessionRegistry::new(config.session_timeout_minutes),
        store: InMemoryConversationStore::new(),
        orchestrator: ConversationOrchestrator::new(
            config,
            chef.clone(),
            atlas.clone(),
            Arc::new(Online),
        ),
        chef,
        atlas,
    }
}

impl World {
    async fn say(&self, id: Uuid, text: &str) -> String {
        self.registry
            .run_turn(id, &self.store, &self.orchestrator, text)
            .await
            .unwrap()
            .reply
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_weather_slot_fill_then_recipe_chat() {
    let w = world(0);
    let id = w.store.create(None, vec![]).unwrap();

    let ask = w.say(id, "Qual é a previsão do tempo?").await;
    assert_eq!(ask, reply::ask_for_city(Intent::Weather));
    assert_eq!(w.store.get(id).unwrap().title.as_deref(), Some("Consulta de clima"));

    let weather = w.say(id, "Curitiba").await;
    assert!(weather.starts_with("Em Curitiba, BR, a temperatura atual é de 13°C, chuva moderada."));
    assert!(weather.contains("caldo quentinho"));
    assert!(weather.contains("aqueça o coração"));

    let chat = w.say(id, "Então me passa uma receita de sopa").await;
    assert_eq!(chat, "Resposta 1");

    let prompt = w.chef.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Usuário: Qual é a previsão do tempo?\n"));
    assert!(prompt.contains("Usuário: Curitiba\n"));
    assert!(prompt.ends_with("Pergunta atual do usuário: Então me passa uma receita de sopa"));

    let conversation = w.store.get(id).unwrap();
    assert_eq!(conversation.messages.len(), 6);
    assert_eq!(conversation.messages[5].role, Role::Assistant);
    // Title is written once and never recomputed
    assert_eq!(conversation.title.as_deref(), Some("Consulta de clima"));
}

#[tokio::test]
async fn test_cached_city_serves_date_time() {
    let w = world(0);
    let id = w.store.create(None, vec![]).unwrap();

    w.say(id, "Que horas são?").await;
    let first = w.say(id, "Lisboa").await;
    assert!(first.starts_with("Em Lisboa, PT:"));
    assert!(first.contains("UTC+1:00"));

    let weather = w.say(id, "Como está o clima?").await;
    assert!(weather.contains("27°C, céu limpo"));
    assert!(weather.contains("salada refrescante"));
    assert!(weather.contains("Com esse sol"));
    assert_eq!(w.atlas.geocode_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unknown_city_reprompts_next_time() {
    let w = world(0);
    let id = w.store.create(None, vec![]).unwrap();

    w.say(id, "Vai chover amanhã?").await;
    let failure = w.say(id, "Xyzzy").await;
    assert_eq!(failure, reply::city_lookup_failed("Xyzzy", Intent::Weather));

    let again = w.say(id, "Vai chover amanhã?").await;
    assert_eq!(again, reply::ask_for_city(Intent::Weather));
}

#[tokio::test]
async fn test_turns_in_one_session_run_sequentially() {
    let w = world(30);
    let id = w.store.create(None, vec![]).unwrap();

    let (a, b) = tokio::join!(
        w.registry.run_turn(id, &w.store, &w.orchestrator, "Tenho ovos"),
        w.registry.run_turn(id, &w.store, &w.orchestrator, "E farinha")
    );
    a.unwrap();
    b.unwrap();

    let conversation = w.store.get(id).unwrap();
    assert_eq!(conversation.messages.len(), 4);

    // The second turn saw the first turn's exchange in its history
    let prompts = w.chef.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Histórico da conversa:\n"));
    assert!(prompts[1].contains("Assistente: Resposta 1\n"));
}

#[tokio::test]
async fn test_abandoned_turn_keeps_pending_city_prompt() {
    let w = world(200);
    let id = w.store.create(None, vec![]).unwrap();
    w.say(id, "Vai chover amanhã?").await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        w.registry.run_turn(id, &w.store, &w.orchestrator, "Tenho ovos"),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(w.store.get(id).unwrap().messages.len(), 2);

    // Still awaiting the city asked for before the dropped turn
    let answer = w.say(id, "Curitiba").await;
    assert!(answer.starts_with("Em Curitiba, BR, a temperatura atual é de 13°C"));
    assert_eq!(w.store.get(id).unwrap().messages.len(), 4);
}

#[tokio::test]
async fn test_sessions_do_not_share_slot_state() {
    let w = world(0);
    let first = w.store.create(None, vec![]).unwrap();
    let second = w.store.create(None, vec![]).unwrap();

    w.say(first, "Que horas são?").await;
    // Not awaiting a city here, so this is ordinary chat
    let reply = w.say(second, "Curitiba").await;
    assert_eq!(reply, "Resposta 1");

    let answer = w.say(first, "Curitiba").await;
    assert!(answer.starts_with("Em Curitiba, BR:"));
}

#[tokio::test]
async fn test_rejected_turn_is_not_persisted() {
    let w = world(0);
    let id = w.store.create(Some("Receitas"), vec![]).unwrap();

    let outcome = w
        .registry
        .run_turn(id, &w.store, &w.orchestrator, "   ")
        .await
        .unwrap();
    assert_eq!(outcome.reply, reply::EMPTY_MESSAGE);
    assert!(w.store.get(id).unwrap().messages.is_empty());
}

#[tokio::test]
async fn test_missing_conversation_is_an_error() {
    let w = world(0);
    let id = Uuid::new_v4();
    let err = w
        .registry
        .run_turn(id, &w.store, &w.orchestrator, "Oi")
        .await
        .unwrap_err();
    assert_eq!(err, DialogError::ConversationNotFound(id));
    assert!(w.registry.is_empty());
}

#[tokio::test]
async fn test_listing_reflects_turns() {
    let w = world(0);
    let id = w.store.create(None, vec![]).unwrap();
    w.say(id, "Vou assar um frango ao forno por 40 minutos").await;

    let list = w.store.list().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "Receitas com frango");
    let preview = list[0].last_message.as_ref().unwrap();
    assert_eq!(preview.role, Role::Assistant);
    assert_eq!(preview.text, "Resposta 1");
}
