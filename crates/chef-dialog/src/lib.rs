//! Slot-filling dialog engine for the chef assistant.
//!
//! Tracks the pending "which city?" slot per session, routes each turn to
//! the weather lookup or the generative service, and keeps conversation
//! history and titles up to date.

pub mod collaborator;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod reply;
pub mod session;
pub mod slot;
pub mod store;

pub use collaborator::{Connectivity, GenerativeService, GeoLocation, WeatherReport, WeatherService};
pub use error::DialogError;
pub use orchestrator::{ConversationOrchestrator, TurnOutcome};
pub use prompt::{build_prompt, resolve_persona, Persona, DEFAULT_PERSONA};
pub use session::{Session, SessionRegistry};
pub use slot::{DialogSlotState, Slot, SlotAction, SlotPhase, SlotResolution};
pub use store::{ConversationStore, InMemoryConversationStore};
