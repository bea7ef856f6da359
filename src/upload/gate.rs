//! Subscription gate: users must be members of a configured channel.

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::types::UserId;

use crate::core::error::AppResult;

/// Membership lookup against the chat platform
#[async_trait]
pub trait MembershipCheck: Send + Sync {
    async fn is_member(&self, user: UserId, channel: &str) -> AppResult<bool>;
}

/// Permits everyone when no channel is configured. Lookup errors deny.
#[derive(Clone)]
pub struct ChannelGate {
    channel: Option<String>,
    check: Arc<dyn MembershipCheck>,
}

impl ChannelGate {
    pub fn new(channel: Option<String>, check: Arc<dyn MembershipCheck>) -> Self {
        let channel = channel.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        Self { channel, check }
    }

    pub async fn permits(&self, user: UserId) -> bool {
        let Some(channel) = self.channel.as_deref() else {
            return true;
        };
        match self.check.is_member(user, channel).await {
            Ok(member) => member,
            Err(e) => {
                log::warn!("Membership check for {} in {} failed: {}", user, channel, e);
                false
            }
        }
    }

    /// `https://t.me/<name>` for public channels. Numeric ids have no link.
    pub fn join_link(&self) -> Option<String> {
        let channel = self.channel.as_deref()?;
        let name = channel.trim_start_matches('@');
        if name.is_empty() || name.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(format!("https://t.me/{name}"))
    }
}
