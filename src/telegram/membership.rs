//! Channel membership lookup via `getChatMember`

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient, UserId};

use crate::core::error::AppResult;
use crate::upload::MembershipCheck;

#[derive(Clone)]
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// `-100123` is a chat id, anything else a public `@username`
pub fn channel_recipient(channel: &str) -> Recipient {
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => {
            let name = channel.trim_start_matches('@');
            Recipient::ChannelUsername(format!("@{name}"))
        }
    }
}

#[async_trait]
impl MembershipCheck for TelegramMembership {
    async fn is_member(&self, user: UserId, channel: &str) -> AppResult<bool> {
        let member = self.bot.get_chat_member(channel_recipient(channel), user).await?;
        let present = matches!(
            member.status(),
            ChatMemberStatus::Owner | ChatMemberStatus::Administrator | ChatMemberStatus::Member
        );
        log::debug!("User {} in {}: {:?}", user, channel, member.status());
        Ok(present)
    }
}
