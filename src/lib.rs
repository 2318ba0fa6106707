//! Real-time voice sales-training simulator.
//!
//! A trainee pitches a product to an AI customer persona over a
//! WebSocket session: speech in, transcription, persona role-play,
//! synthesized speech out, with barge-in interruption throughout.

pub mod config;
pub mod core;
pub mod errors;
pub mod eval;
pub mod handlers;
pub mod persona;
pub mod products;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use state::AppState;
