/// Telegram command and message handlers
pub mod handlers;
/// Outbound messaging abstraction
pub mod messaging;
/// Message routing and URL dispatch
pub mod router;
/// Dispatcher wiring
pub mod runner;

pub use messaging::{ChatSender, TelegramSender};
pub use router::{InboundEvent, MessageRouter, RouteOutcome};
