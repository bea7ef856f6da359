//! Telegram bot integration: bot setup, relay, membership, commands, webhook

pub mod admin;
pub mod bot;
pub mod handlers;
pub mod membership;
pub mod relay;
pub mod webhook;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use membership::TelegramMembership;
pub use relay::TelegramRelay;
pub use teloxide::Bot;
