//! Telegram bot handler tree configuration
//!
//! The handlers only translate updates into upload flow events and command
//! calls, so integration tests can drive the flow without a bot.

mod commands;
mod schema;
mod types;

pub use commands::{handle_command, handle_start_command};
pub use schema::schema;
pub use types::{
    ensure_user_exists, is_group_chat, largest_photo_id, photo_event, selection_event, sender_id, HandlerDeps,
    HandlerError, UserCreationResult,
};
