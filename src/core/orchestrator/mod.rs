//! Conversation orchestration: turn dispatch, speech interruption, and
//! the session status machine.

mod config;
mod dispatcher;
mod errors;
mod events;
mod manager;
mod playback;
mod status;


pub use config::OrchestratorConfig;
pub use dispatcher::TurnDispatcher;
pub use errors::OrchestratorError;
pub use events::SessionEvent;
pub use manager::{Collaborators, ConversationOrchestrator};
pub use playback::SpeechInterruptController;
pub use status::{ConversationStatus, StatusChannel};
