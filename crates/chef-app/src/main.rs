//! Chef assistant binary - composition root.
//!
//! 1. Parse CLI args and initialise tracing
//! 2. Load configuration from TOML, overlaying env API keys
//! 3. Build the weather and generative providers
//! 4. Run a line-based chat loop on stdin against one conversation

mod cli;

use std::sync::Arc;

use chef_core::config::ChefConfig;
use chef_dialog::{
    ConversationOrchestrator, ConversationStore, DialogSlotState, InMemoryConversationStore,
    SessionRegistry,
};
use chef_providers::{AlwaysOnline, GeminiClient, OpenWeatherClient};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::cli::CliArgs;

const HELP: &str = "Comandos: /nova (nova conversa), /conversas (listar), /sair";

struct App {
    store: InMemoryConversationStore,
    registry: SessionRegistry,
    orchestrator: ConversationOrchestrator,
    city: Option<String>,
}

impl App {
    /// Start a conversation, seeding its session with the preset city.
    async fn new_conversation(&self) -> Result<Uuid, Box<dyn std::error::Error>> {
        let id = self.store.create(None, Vec::new())?;
        if let Some(city) = &self.city {
            let handle = self.registry.session(id)?;
            handle.lock().await.slot = DialogSlotState::with_cached_city(city.as_str());
        }
        tracing::debug!(conversation_id = %id, "New conversation");
        Ok(id)
    }

    fn print_conversations(&self, current: Uuid) -> Result<(), Box<dyn std::error::Error>> {
        for summary in self.store.list()? {
            let marker = if summary.id == current { '*' } else { ' ' };
            let preview = summary
                .last_message
                .map(|m| m.text.lines().next().unwrap_or_default().to_string())
                .unwrap_or_default();
            println!(
                "{} {}  {}  {}",
                marker,
                summary.updated_at.format("%d/%m %H:%M"),
                summary.title,
                preview
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ChefConfig::load_or_default(&config_file);

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting chef v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    config.weather.api_key = args.resolve_weather_key(&config.weather.api_key);
    config.generative.api_key = args.resolve_generative_key(&config.generative.api_key);
    if config.weather.api_key.is_empty() {
        tracing::warn!("No OpenWeatherMap API key; weather and time lookups will fail");
    }
    if config.generative.api_key.is_empty() {
        tracing::warn!("No Gemini API key; chat replies will fail");
    }

    // Providers.
    let orchestrator = ConversationOrchestrator::new(
        config.dialog.clone(),
        Arc::new(GeminiClient::new(&config.generative)),
        Arc::new(OpenWeatherClient::new(&config.weather)),
        Arc::new(AlwaysOnline),
    );

    let app = App {
        store: InMemoryConversationStore::new(),
        registry: SessionRegistry::new(config.dialog.session_timeout_minutes),
        orchestrator,
        city: args.city.clone(),
    };

    let mut conversation = app.new_conversation().await?;
    let mut title_shown = false;

    println!("Mega Chef pronto! {}", HELP);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/sair" => break,
            "/nova" => {
                conversation = app.new_conversation().await?;
                title_shown = false;
                println!("Nova conversa iniciada.");
                continue;
            }
            "/conversas" => {
                app.print_conversations(conversation)?;
                continue;
            }
            "/ajuda" => {
                println!("{}", HELP);
                continue;
            }
            _ => {}
        }

        let outcome = app
            .registry
            .run_turn(conversation, &app.store, &app.orchestrator, &line)
            .await?;
        println!("\n{}\n", outcome.reply);

        if !title_shown {
            if let Some(title) = app.store.get(conversation)?.title {
                println!("[{}]\n", title);
                title_shown = true;
            }
        }

        let pruned = app.registry.prune_expired()?;
        if pruned > 0 {
            tracing::debug!(pruned, "Idle sessions dropped");
        }
    }

    tracing::info!("Goodbye");
    Ok(())
}
