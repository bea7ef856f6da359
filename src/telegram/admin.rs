//! Owner-only commands: `/users` and `/broadcast`

use teloxide::types::{ChatId, MessageId};
use teloxide::utils::html;

use crate::core::config;
use crate::core::error::AppResult;
use crate::storage::db::{self, DbPool};
use crate::storage::get_connection;
use crate::upload::Relay;

pub const OWNER_ONLY_IN_GROUPS: &str = "🚫 This command can only be used by the bot owner in groups.";
pub const OWNER_ONLY: &str = "🚫 This command is only available to the bot owner.";
pub const BROADCAST_USAGE: &str = "Usage: <code>/broadcast [your message]</code>";

/// `false` when no owner is configured (id 0)
pub fn is_owner(owner_id: i64, user_id: i64) -> bool {
    owner_id != 0 && user_id == owner_id
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

/// Handles /users: replies with the number of stored users
pub async fn handle_users_command(relay: &dyn Relay, pool: &DbPool, chat: ChatId) -> AppResult<()> {
    let count = {
        let conn = get_connection(pool)?;
        db::count_users(&conn)?
    };
    log::info!("📊 /users: {} users", count);
    relay
        .send_text(chat, &format!("📊 Total users in database: <b>{count}</b>"), None, None)
        .await?;
    Ok(())
}

/// Handles /broadcast: sends `text` to every stored user except the owner.
///
/// Individual send failures are counted and do not stop the loop.
pub async fn handle_broadcast_command(
    relay: &dyn Relay,
    pool: &DbPool,
    chat: ChatId,
    owner_id: i64,
    text: &str,
) -> AppResult<BroadcastReport> {
    let text = text.trim();
    if text.is_empty() {
        relay.send_text(chat, BROADCAST_USAGE, None, None).await?;
        return Ok(BroadcastReport::default());
    }

    let users = {
        let conn = get_connection(pool)?;
        db::get_all_users(&conn)?
    };
    let status: MessageId = relay.send_text(chat, "🚀 Starting broadcast...", None, None).await?;

    let body = html::escape(text);
    let mut report = BroadcastReport::default();
    for user in users.iter().filter(|u| u.telegram_id != owner_id) {
        match relay.send_text(ChatId(user.telegram_id), &body, None, None).await {
            Ok(_) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!("Failed to send broadcast to user {}: {}", user.telegram_id, e);
            }
        }
        tokio::time::sleep(config::broadcast::send_delay()).await;
    }

    log::info!("📣 Broadcast done: sent={}, failed={}", report.sent, report.failed);
    relay
        .edit_text(
            chat,
            status,
            &format!(
                "✅ Broadcast complete!\n➡️ Sent to: <b>{}</b> users\n❌ Failed to send to: <b>{}</b> users",
                report.sent, report.failed
            ),
            None,
        )
        .await?;
    Ok(report)
}
