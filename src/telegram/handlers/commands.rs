//! Command handlers

use teloxide::types::Message;
use teloxide::utils::html;

use super::types::{ensure_user_exists, is_group_chat, largest_photo_id, sender_id, HandlerDeps, HandlerError};
use crate::core::metrics;
use crate::telegram::admin::{self, is_owner};
use crate::telegram::bot::Command;

const WELCOME: &str = "👋 Hello! I'm your image linking bot.\n\n\
<b>In private chat:</b> Send me an image, and I'll give you options to upload it to various hosting sites.\n\
<b>In groups:</b> Use /imgbb, /envs or /imgbox as a reply to an image, and I'll provide a link.";

const START_GATE_DENIED: &str =
    "Hello! Please join our channel to use this bot. Once you join, click 'Start' again.";

const PRIVATE_HOST_HINT: &str = "Send me an image here and pick a host from the menu.";

/// Routes a parsed command to its handler
pub async fn handle_command(deps: &HandlerDeps, msg: &Message, cmd: Command) -> Result<(), HandlerError> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

    if let Some(tag) = cmd.host_tag() {
        return handle_host_command(deps, msg, tag).await;
    }

    let user_id = sender_id(msg);
    if is_group_chat(msg) {
        if !is_owner(deps.owner_id, user_id) {
            deps.relay
                .send_text(msg.chat.id, admin::OWNER_ONLY_IN_GROUPS, None, Some(msg.id))
                .await?;
        }
        return Ok(());
    }

    match cmd {
        Command::Start => handle_start_command(deps, msg, user_id, from.username.as_deref()).await,
        Command::Users => {
            if !is_owner(deps.owner_id, user_id) {
                deps.relay.send_text(msg.chat.id, admin::OWNER_ONLY, None, None).await?;
                return Ok(());
            }
            admin::handle_users_command(deps.relay.as_ref(), &deps.db_pool, msg.chat.id).await?;
            Ok(())
        }
        Command::Broadcast(text) => {
            if !is_owner(deps.owner_id, user_id) {
                deps.relay.send_text(msg.chat.id, admin::OWNER_ONLY, None, None).await?;
                return Ok(());
            }
            admin::handle_broadcast_command(deps.relay.as_ref(), &deps.db_pool, msg.chat.id, deps.owner_id, &text)
                .await?;
            Ok(())
        }
        Command::Imgbb | Command::Envs | Command::Imgbox => Ok(()),
    }
}

/// Handles /start: registers the user, then checks the subscription gate
pub async fn handle_start_command(
    deps: &HandlerDeps,
    msg: &Message,
    user_id: i64,
    username: Option<&str>,
) -> Result<(), HandlerError> {
    ensure_user_exists(&deps.db_pool, user_id, username);

    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if !deps.flow.gate().permits(from.id).await {
        metrics::GATE_DENIALS_TOTAL.with_label_values(&["start"]).inc();
        deps.flow.deny(msg.chat.id, START_GATE_DENIED).await?;
        return Ok(());
    }

    deps.relay.send_text(msg.chat.id, WELCOME, None, None).await?;
    Ok(())
}

/// Handles /imgbb, /envs, /imgbox. In groups these must reply to a photo.
async fn handle_host_command(deps: &HandlerDeps, msg: &Message, tag: &str) -> Result<(), HandlerError> {
    if !is_group_chat(msg) {
        deps.relay.send_text(msg.chat.id, PRIVATE_HOST_HINT, None, None).await?;
        return Ok(());
    }

    let Some(file_id) = msg.reply_to_message().and_then(largest_photo_id) else {
        let hint = format!(
            "Please reply to an image with <code>/{}</code> to get a link.",
            html::escape(tag)
        );
        deps.relay.send_text(msg.chat.id, &hint, None, Some(msg.id)).await?;
        return Ok(());
    };

    deps.flow.upload_direct(msg.chat.id, msg.id, &file_id, tag).await?;
    Ok(())
}
