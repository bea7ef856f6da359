//! Handler types, dependencies, and event extraction helpers

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;

use crate::storage::db::{self, DbPool};
use crate::storage::get_connection;
use crate::upload::{PhotoReceived, Relay, SelectionMade, UploadFlow};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub flow: Arc<UploadFlow>,
    pub relay: Arc<dyn Relay>,
    /// Owner user id, 0 when unset
    pub owner_id: i64,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, flow: Arc<UploadFlow>, relay: Arc<dyn Relay>, owner_id: i64) -> Self {
        Self {
            db_pool,
            flow,
            relay,
            owner_id,
        }
    }
}

/// Sender id as stored in the database, 0 for anonymous senders
pub fn sender_id(msg: &Message) -> i64 {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}

pub fn is_group_chat(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

/// Largest size of the photo attached to `msg`
pub fn largest_photo_id(msg: &Message) -> Option<String> {
    msg.photo()
        .and_then(|sizes| sizes.iter().max_by_key(|size| size.width * size.height))
        .map(|size| size.file.id.0.clone())
}

pub fn photo_event(msg: &Message) -> Option<PhotoReceived> {
    let user = msg.from.as_ref()?;
    Some(PhotoReceived {
        chat: msg.chat.id,
        user: user.id,
        file_id: largest_photo_id(msg)?,
    })
}

/// `None` when the menu message is gone or the query carries no data
pub fn selection_event(q: &CallbackQuery) -> Option<SelectionMade> {
    let message = q.message.as_ref()?;
    Some(SelectionMade {
        chat: message.chat().id,
        user: q.from.id,
        message: message.id(),
        query_id: q.id.0.clone(),
        data: q.data.clone()?,
    })
}

/// Result of ensure_user_exists operation
#[derive(Debug, PartialEq, Eq)]
pub enum UserCreationResult {
    /// User already existed
    Existed,
    /// User was newly created
    Created,
    /// Database unavailable
    DbError,
}

/// Registers the sender of a `/start`
pub fn ensure_user_exists(db_pool: &DbPool, telegram_id: i64, username: Option<&str>) -> UserCreationResult {
    let conn = match get_connection(db_pool) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to get DB connection: {}", e);
            return UserCreationResult::DbError;
        }
    };

    match db::add_user(&conn, telegram_id, username) {
        Ok(true) => {
            log::info!("👤 New user registered: {}", telegram_id);
            UserCreationResult::Created
        }
        Ok(false) => UserCreationResult::Existed,
        Err(e) => {
            log::error!("Failed to register user {}: {}", telegram_id, e);
            UserCreationResult::DbError
        }
    }
}
