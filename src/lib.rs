//! imglinker - Telegram bot that turns photos into image host links
//!
//! A photo sent to the bot is downloaded, referenced by a short id and
//! offered for upload to one of the configured image hosts.

pub mod cli;
pub mod core;
pub mod hosts;
pub mod storage;
pub mod telegram;
pub mod upload;

// Re-exports for backward compatibility and convenience
pub use self::core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, AssetStore, DbConnection, DbPool};
pub use upload::UploadFlow;
