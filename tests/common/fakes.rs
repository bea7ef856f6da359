//! In-memory stand-ins for the relay, image hosts and membership lookup

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::types::{ChatId, InlineKeyboardButtonKind, InlineKeyboardMarkup, MessageId, UserId};
use url::Url;

use imglinker::core::error::{AppError, AppResult};
use imglinker::hosts::{ImageHost, UploadError};
use imglinker::upload::{MembershipCheck, Relay};

/// One call made through the relay
#[derive(Debug, Clone)]
pub enum RelayCall {
    Send {
        chat: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
        reply_to: Option<MessageId>,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Answer {
        query_id: String,
        text: Option<String>,
        alert: bool,
    },
    Download {
        file_id: String,
        destination: PathBuf,
    },
}

/// Records every call. Downloads write `payload` unless it is `None`.
pub struct FakeRelay {
    calls: Mutex<Vec<RelayCall>>,
    next_message: AtomicI32,
    payload: Option<Vec<u8>>,
    fail_edits: AtomicBool,
    fail_sends_to: Mutex<Vec<ChatId>>,
}

impl FakeRelay {
    pub fn new() -> Arc<Self> {
        Self::with_payload(Some(b"\xFF\xD8\xFFfake-jpeg".to_vec()))
    }

    pub fn with_payload(payload: Option<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_message: AtomicI32::new(100),
            payload,
            fail_edits: AtomicBool::new(false),
            fail_sends_to: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends_to(&self, chat: ChatId) {
        self.fail_sends_to.lock().unwrap().push(chat);
    }

    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RelayCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn sends_to(&self, chat: ChatId) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RelayCall::Send { chat: c, .. } if *c == chat))
            .count()
    }

    pub fn edited_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RelayCall::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_edit(&self) -> Option<(String, Option<InlineKeyboardMarkup>)> {
        self.calls().into_iter().rev().find_map(|call| match call {
            RelayCall::Edit { text, keyboard, .. } => Some((text, keyboard)),
            _ => None,
        })
    }

    pub fn answers(&self) -> Vec<(String, Option<String>, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RelayCall::Answer { query_id, text, alert } => Some((query_id, text, alert)),
                _ => None,
            })
            .collect()
    }

    pub fn downloads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RelayCall::Download { .. }))
            .count()
    }

    fn record(&self, call: RelayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Relay for FakeRelay {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        reply_to: Option<MessageId>,
    ) -> AppResult<MessageId> {
        self.record(RelayCall::Send {
            chat,
            text: text.to_string(),
            keyboard,
            reply_to,
        });
        if self.fail_sends_to.lock().unwrap().contains(&chat) {
            return Err(AppError::Validation(format!("chat {chat} blocked the bot")));
        }
        Ok(MessageId(self.next_message.fetch_add(1, Ordering::SeqCst)))
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        self.record(RelayCall::Edit {
            chat,
            message,
            text: text.to_string(),
            keyboard,
        });
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(AppError::Validation("message to edit not found".to_string()));
        }
        Ok(())
    }

    async fn answer_selection(&self, query_id: &str, text: Option<&str>, alert: bool) -> AppResult<()> {
        self.record(RelayCall::Answer {
            query_id: query_id.to_string(),
            text: text.map(str::to_string),
            alert,
        });
        Ok(())
    }

    async fn download(&self, file_id: &str, destination: &Path) -> AppResult<PathBuf> {
        self.record(RelayCall::Download {
            file_id: file_id.to_string(),
            destination: destination.to_path_buf(),
        });
        match &self.payload {
            Some(bytes) => {
                tokio::fs::write(destination, bytes).await?;
                Ok(destination.to_path_buf())
            }
            None => Err(AppError::Transfer("file is too big".to_string())),
        }
    }
}

/// Host returning a fixed outcome, optionally after a delay
pub struct StubHost {
    tag: &'static str,
    display_name: &'static str,
    outcome: Result<Url, String>,
    delay: Duration,
    calls: AtomicUsize,
    saw_file: AtomicBool,
}

impl StubHost {
    pub fn success(tag: &'static str, link: &str) -> Arc<Self> {
        Self::build(tag, Ok(Url::parse(link).unwrap()), Duration::ZERO)
    }

    pub fn failure(tag: &'static str, reason: &str) -> Arc<Self> {
        Self::build(tag, Err(reason.to_string()), Duration::ZERO)
    }

    pub fn slow_success(tag: &'static str, link: &str, delay: Duration) -> Arc<Self> {
        Self::build(tag, Ok(Url::parse(link).unwrap()), delay)
    }

    fn build(tag: &'static str, outcome: Result<Url, String>, delay: Duration) -> Arc<Self> {
        let display_name = match tag {
            "imgbb" => "ImgBB",
            "envs" => "Envs.sh",
            "imgbox" => "Imgbox",
            other => other,
        };
        Arc::new(Self {
            tag,
            display_name,
            outcome,
            delay,
            calls: AtomicUsize::new(0),
            saw_file: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the asset still existed when the upload ran
    pub fn saw_file(&self) -> bool {
        self.saw_file.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for StubHost {
    fn tag(&self) -> &str {
        self.tag
    }

    fn display_name(&self) -> &str {
        self.display_name
    }

    async fn try_upload(&self, location: &Path) -> Result<Url, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if location.exists() {
            self.saw_file.store(true, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map_err(UploadError::Rejected)
    }
}

/// Membership lookup with a fixed answer (`None` simulates an API error)
pub struct StaticMembership {
    answer: Option<bool>,
    calls: AtomicUsize,
}

impl StaticMembership {
    pub fn member() -> Arc<Self> {
        Self::new(Some(true))
    }

    pub fn non_member() -> Arc<Self> {
        Self::new(Some(false))
    }

    pub fn unreachable() -> Arc<Self> {
        Self::new(None)
    }

    fn new(answer: Option<bool>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipCheck for StaticMembership {
    async fn is_member(&self, _user: UserId, _channel: &str) -> AppResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .ok_or_else(|| AppError::Validation("Bad Request: chat not found".to_string()))
    }
}

/// Callback payloads and URLs of every button in `keyboard`
pub fn button_targets(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
    keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
            InlineKeyboardButtonKind::Url(url) => url.to_string(),
            other => format!("{other:?}"),
        })
        .collect()
}
