//! WebSocket session transport.

mod handler;
mod messages;
mod session;

pub use handler::ws_handler;
pub use messages::IncomingMessage;
