//! Callback payload codec for the destination menu.
//!
//! Payloads are `<action>:<id>` where action is `upload_<tag>` or
//! `delete_image`. Telegram limits callback data to 64 bytes.

const UPLOAD_PREFIX: &str = "upload_";
const DELETE_ACTION: &str = "delete_image";

/// Telegram's limit for `callback_data`
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Upload to the host with this tag
    Upload(String),
    Delete,
}

/// A user's choice from the destination menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub action: MenuAction,
    pub id: String,
}

impl MenuSelection {
    pub fn upload(tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            action: MenuAction::Upload(tag.into()),
            id: id.into(),
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            action: MenuAction::Delete,
            id: id.into(),
        }
    }

    /// Parses a callback payload. Returns `None` for anything that is not a
    /// well-formed menu payload.
    pub fn parse(data: &str) -> Option<Self> {
        if !data.is_ascii() {
            return None;
        }
        let (action, id) = data.split_once(':')?;
        if id.is_empty() || id.contains(':') {
            return None;
        }

        let action = if action == DELETE_ACTION {
            MenuAction::Delete
        } else {
            let tag = action.strip_prefix(UPLOAD_PREFIX)?;
            if tag.is_empty() {
                return None;
            }
            MenuAction::Upload(tag.to_string())
        };

        Some(Self {
            action,
            id: id.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        match &self.action {
            MenuAction::Upload(tag) => format!("{UPLOAD_PREFIX}{tag}:{}", self.id),
            MenuAction::Delete => format!("{DELETE_ACTION}:{}", self.id),
        }
    }
}
