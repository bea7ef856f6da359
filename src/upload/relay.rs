//! Outbound primitives the upload flow needs from the chat platform.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, UserId};

use crate::core::error::AppResult;

/// A photo arrived in a private chat
#[derive(Debug, Clone)]
pub struct PhotoReceived {
    pub chat: ChatId,
    pub user: UserId,
    /// Transfer handle of the largest photo size
    pub file_id: String,
}

/// A destination menu button was pressed
#[derive(Debug, Clone)]
pub struct SelectionMade {
    pub chat: ChatId,
    pub user: UserId,
    /// The menu message, edited in place with the outcome
    pub message: MessageId,
    pub query_id: String,
    /// Raw callback payload
    pub data: String,
}

/// Message primitives. All text is HTML.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        reply_to: Option<MessageId>,
    ) -> AppResult<MessageId>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()>;

    /// Acknowledges a button press, optionally with a toast or alert
    async fn answer_selection(&self, query_id: &str, text: Option<&str>, alert: bool) -> AppResult<()>;

    /// Fetches `file_id` into `destination` and returns the written path
    async fn download(&self, file_id: &str, destination: &Path) -> AppResult<PathBuf>;
}
