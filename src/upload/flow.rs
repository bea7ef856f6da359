//! Upload dispatcher.
//!
//! Drives one interaction from an incoming photo to a posted link:
//!
//! ```text
//! photo ──► download ──► register ──► menu ──► selection ──► claim ──► upload ──► render
//!                                                  │                     │
//!                                                  └── delete / expired ─┘──► unlink
//! ```
//!
//! Every selection claims its reference from the [`AssetStore`]. The claim is
//! atomic, so a double tap yields one upload and one "expired" reply, and the
//! claimed file is unlinked on every path out of the interaction.

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};

use super::gate::ChannelGate;
use super::relay::{PhotoReceived, Relay, SelectionMade};
use super::selection::{MenuAction, MenuSelection};
use super::texts;
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::hosts::{HostRegistry, ImageHost, UploadResult};
use crate::storage::assets::{remove_file_quietly, AssetStore, ClaimedAsset};

pub struct UploadFlow {
    relay: Arc<dyn Relay>,
    assets: Arc<AssetStore>,
    hosts: Arc<HostRegistry>,
    gate: ChannelGate,
    downloads_dir: PathBuf,
}

impl UploadFlow {
    pub fn new(
        relay: Arc<dyn Relay>,
        assets: Arc<AssetStore>,
        hosts: Arc<HostRegistry>,
        gate: ChannelGate,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            relay,
            assets,
            hosts,
            gate,
            downloads_dir: downloads_dir.into(),
        }
    }

    pub fn gate(&self) -> &ChannelGate {
        &self.gate
    }

    /// Sends the join-channel prompt
    pub async fn deny(&self, chat: ChatId, text: &str) -> AppResult<()> {
        let keyboard = texts::join_keyboard(self.gate.join_link().as_deref());
        self.relay.send_text(chat, text, keyboard, None).await?;
        Ok(())
    }

    /// Downloads a private-chat photo and offers the destination menu.
    pub async fn on_photo(&self, event: PhotoReceived) -> AppResult<()> {
        if !self.gate.permits(event.user).await {
            metrics::GATE_DENIALS_TOTAL.with_label_values(&["photo"]).inc();
            return self.deny(event.chat, texts::GATE_DENIED).await;
        }
        metrics::PHOTOS_RECEIVED_TOTAL.inc();

        let status = self.relay.send_text(event.chat, texts::DOWNLOADING, None, None).await?;

        let location = match self.fetch(&event.file_id, event.chat).await {
            Ok(location) => location,
            Err(e) => {
                log::error!("Failed to download photo for chat {}: {}", event.chat, e);
                self.relay
                    .edit_text(event.chat, status, &texts::download_failed(&e.to_string()), None)
                    .await?;
                return Ok(());
            }
        };

        let id = self.assets.register(location).await;
        log::info!("📥 Photo from user {} stored as {}", event.user, id);

        let keyboard = texts::menu_keyboard(&self.hosts, &id);
        if let Err(e) = self.relay.edit_text(event.chat, status, texts::MENU, Some(keyboard)).await {
            // Nobody can select from a menu that was never shown
            drop(self.assets.claim(&id).await);
            return Err(e);
        }
        Ok(())
    }

    /// Handles a destination menu button press.
    pub async fn on_selection(&self, event: SelectionMade) -> AppResult<()> {
        let Some(selection) = MenuSelection::parse(&event.data) else {
            log::debug!("Ignoring unknown callback payload {:?}", event.data);
            self.acknowledge(&event.query_id, None, false).await;
            return Ok(());
        };

        if !self.gate.permits(event.user).await {
            metrics::GATE_DENIALS_TOTAL.with_label_values(&["selection"]).inc();
            self.acknowledge(&event.query_id, Some(texts::GATE_DENIED), true).await;
            return Ok(());
        }

        let claimed = self.assets.claim(&selection.id).await;
        self.acknowledge(&event.query_id, None, false).await;

        let Some(asset) = claimed else {
            log::info!("Selection for expired reference {}", selection.id);
            return self.relay.edit_text(event.chat, event.message, texts::EXPIRED, None).await;
        };

        match selection.action {
            MenuAction::Delete => {
                asset.discard().await;
                log::info!("🗑️ Reference {} deleted by user {}", selection.id, event.user);
                self.relay.edit_text(event.chat, event.message, texts::DELETED, None).await
            }
            MenuAction::Upload(tag) => {
                let Some(host) = self.hosts.get(&tag) else {
                    log::warn!("Selection for unknown host {:?}", tag);
                    asset.discard().await;
                    return self
                        .relay
                        .edit_text(event.chat, event.message, &texts::failure(&tag), None)
                        .await;
                };
                self.upload_and_render(host.as_ref(), asset, event.chat, event.message).await
            }
        }
    }

    /// Uploads the photo a group message replied to, without a menu.
    pub async fn upload_direct(&self, chat: ChatId, reply_to: MessageId, file_id: &str, tag: &str) -> AppResult<()> {
        let Some(host) = self.hosts.get(tag) else {
            self.relay.send_text(chat, &texts::failure(tag), None, Some(reply_to)).await?;
            return Ok(());
        };
        metrics::PHOTOS_RECEIVED_TOTAL.inc();

        let status = self
            .relay
            .send_text(chat, &texts::downloading_for(host.display_name()), None, Some(reply_to))
            .await?;

        let asset = match self.fetch(file_id, chat).await {
            Ok(location) => ClaimedAsset::new(location),
            Err(e) => {
                log::error!("Failed to download photo for chat {}: {}", chat, e);
                return self
                    .relay
                    .edit_text(chat, status, &texts::download_failed(&e.to_string()), None)
                    .await;
            }
        };

        self.upload_and_render(host.as_ref(), asset, chat, status).await
    }

    async fn upload_and_render(
        &self,
        host: &dyn ImageHost,
        asset: ClaimedAsset,
        chat: ChatId,
        message: MessageId,
    ) -> AppResult<()> {
        if let Err(e) = self
            .relay
            .edit_text(chat, message, &texts::uploading(host.tag()), None)
            .await
        {
            log::warn!("Failed to show upload progress: {}", e);
        }

        let result = host.upload(asset.path()).await;
        metrics::record_upload(host.tag(), result.is_success());
        asset.discard().await;

        match result {
            UploadResult::Success { link } => {
                self.relay
                    .edit_text(
                        chat,
                        message,
                        &texts::link(host.tag(), &link),
                        Some(texts::open_link_keyboard(&link)),
                    )
                    .await
            }
            UploadResult::Failure { .. } => {
                self.relay
                    .edit_text(chat, message, &texts::failure(host.tag()), None)
                    .await
            }
        }
    }

    /// Downloads into a fresh file under the downloads directory. A partial
    /// file is removed on error.
    async fn fetch(&self, file_id: &str, chat: ChatId) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        let destination = self.destination_for(chat);
        match self.relay.download(file_id, &destination).await {
            Ok(location) => Ok(location),
            Err(e) => {
                remove_file_quietly(&destination).await;
                Err(e)
            }
        }
    }

    fn destination_for(&self, chat: ChatId) -> PathBuf {
        let name = format!("{}_{}.jpg", chat.0, uuid::Uuid::new_v4().simple());
        self.downloads_dir.join(name)
    }

    async fn acknowledge(&self, query_id: &str, text: Option<&str>, alert: bool) {
        if let Err(e) = self.relay.answer_selection(query_id, text, alert).await {
            log::warn!("Failed to answer callback query {}: {}", query_id, e);
        }
    }
}
