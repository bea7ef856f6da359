//! User-facing messages and keyboards of the upload flow (HTML parse mode)

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;
use url::Url;

use super::selection::MenuSelection;
use crate::hosts::HostRegistry;

pub const DOWNLOADING: &str = "📥 Downloading your image...";
pub const MENU: &str = "✨ Image downloaded. Choose an image host:";
pub const EXPIRED: &str = "⚠️ Image file not found or already deleted. Please send the image again.";
pub const DELETED: &str = "🗑️ Image deleted from server. You can send another image.";
pub const GATE_DENIED: &str = "Please join our channel to use this bot!";

/// Destination tags are shown upper-cased in progress and result messages
pub fn host_label(tag: &str) -> String {
    tag.to_uppercase()
}

pub fn uploading(tag: &str) -> String {
    format!("⬆️ Uploading to {}...", html::escape(&host_label(tag)))
}

pub fn downloading_for(display_name: &str) -> String {
    format!("📥 Downloading image for {} upload...", html::escape(display_name))
}

pub fn link(tag: &str, link: &Url) -> String {
    format!(
        "🔗 Your {} link:\n<code>{}</code>",
        html::escape(&host_label(tag)),
        html::escape(link.as_str())
    )
}

pub fn failure(tag: &str) -> String {
    format!("❌ Failed to upload to {}.", html::escape(&host_label(tag)))
}

pub fn download_failed(reason: &str) -> String {
    format!("❌ Error downloading image: <code>{}</code>", html::escape(reason))
}

/// One button per configured host, then the delete button
pub fn menu_keyboard(hosts: &HostRegistry, id: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = hosts
        .all()
        .iter()
        .map(|host| {
            vec![InlineKeyboardButton::callback(
                format!("🔗 Upload to {}", host.display_name()),
                MenuSelection::upload(host.tag(), id).encode(),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "🗑️ Delete Downloaded Image",
        MenuSelection::delete(id).encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn open_link_keyboard(link: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url("Open Link", link.clone())]])
}

/// `None` when the channel has no public link
pub fn join_keyboard(join_link: Option<&str>) -> Option<InlineKeyboardMarkup> {
    let url = Url::parse(join_link?).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        "📢 Join Channel",
        url,
    )]]))
}
