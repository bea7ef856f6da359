//! Teloxide implementation of the upload flow's [`Relay`] port

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InlineKeyboardMarkup, MessageId, ParseMode, ReplyParameters};
use teloxide::{ApiError, RequestError};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::upload::Relay;

/// Talks to the Bot API through a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramRelay {
    bot: Bot,
    client: reqwest::Client,
}

impl TelegramRelay {
    pub fn new(bot: Bot) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(config::network::timeout()).build()?;
        Ok(Self { bot, client })
    }
}

/// Where a local Bot API server keeps downloaded files
const LOCAL_SERVER_ROOT: &str = "/var/lib/telegram-bot-api/";

/// `{api}/file/bot{token}/{file_path}`
///
/// A local Bot API server reports absolute paths under its working directory;
/// only the part below that directory is served over HTTP.
pub fn build_file_url(base: &Url, token: &str, file_path: &str) -> AppResult<Url> {
    let file_path = if base.host_str() == Some("api.telegram.org") {
        file_path
    } else {
        file_path.strip_prefix(LOCAL_SERVER_ROOT).unwrap_or(file_path)
    };

    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AppError::Validation("Bot API URL cannot be a base URL".to_string()))?;
        segments.pop_if_empty();
        segments.push("file");
        segments.push(&format!("bot{token}"));
        for seg in file_path.split('/').filter(|seg| !seg.is_empty()) {
            segments.push(seg);
        }
    }
    Ok(url)
}

#[async_trait]
impl Relay for TelegramRelay {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        reply_to: Option<MessageId>,
    ) -> AppResult<MessageId> {
        let mut request = self.bot.send_message(chat, text).parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(reply_to));
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        let mut request = self
            .bot
            .edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        match request.await {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn answer_selection(&self, query_id: &str, text: Option<&str>, alert: bool) -> AppResult<()> {
        let mut request = self.bot.answer_callback_query(CallbackQueryId(query_id.to_string()));
        if let Some(text) = text {
            request = request.text(text).show_alert(alert);
        }
        request.await?;
        Ok(())
    }

    async fn download(&self, file_id: &str, destination: &Path) -> AppResult<PathBuf> {
        log::info!("📥 Starting download for file_id: {}", file_id);
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        log::debug!("File info retrieved: path = {}, size = {} bytes", file.path, file.size);

        let file_url = build_file_url(&self.bot.api_url(), self.bot.token(), &file.path)?;

        let tmp_path = destination.with_file_name(format!(
            "{}.part",
            destination.file_name().and_then(|n| n.to_str()).unwrap_or("download")
        ));

        let mut resp = self.client.get(file_url).send().await.map_err(|e| e.without_url())?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Transfer(format!("Telegram file download failed with status {status}")));
        }

        let written = async {
            let mut dst = tokio::fs::File::create(&tmp_path).await?;
            while let Some(chunk) = resp.chunk().await.map_err(|e| e.without_url())? {
                dst.write_all(&chunk).await?;
            }
            dst.flush().await?;
            drop(dst);
            tokio::fs::rename(&tmp_path, destination).await?;
            Ok::<(), AppError>(())
        }
        .await;
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                log::debug!("Partial download {:?} not removed: {}", tmp_path, cleanup);
            }
            return Err(e);
        }

        log::info!("✅ File downloaded successfully to: {:?}", destination);
        Ok(destination.to_path_buf())
    }
}
