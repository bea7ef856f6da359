//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::handle_command;
use super::types::{photo_event, selection_event, HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same tree is used for polling and webhook mode.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_photos = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(private_photo_handler(deps_photos))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_command(&deps, &msg, cmd).await {
                    log::error!("❌ Command handler failed for chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        },
    ))
}

/// Photos sent in a private chat start the upload menu
fn private_photo_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private() && msg.photo().is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let Some(event) = photo_event(&msg) else {
                    return Ok(());
                };
                if let Err(e) = deps.flow.on_photo(event).await {
                    log::error!("❌ Photo handler failed for chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let Some(event) = selection_event(&q) else {
                // Nothing to edit, just clear the client's spinner
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };
            if let Err(e) = deps.flow.on_selection(event).await {
                log::error!("❌ Callback handler failed for query {}: {}", q.id.0, e);
            }
            Ok(())
        }
    })
}
