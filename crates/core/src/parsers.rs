//! Platform chat exports to `ChatEvent`s.

use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{ChatclipError, Result},
    types::ChatEvent,
};

pub const STICKER_MESSAGE: &str = "[SUPERCHAT STICKER]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Youtube,
    Twitch,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Twitch => "Twitch",
        }
    }
}

pub fn parse_chat(content: &str, platform: Platform) -> Result<Vec<ChatEvent>> {
    match platform {
        Platform::Youtube => Ok(parse_youtube_live_chat(content)),
        Platform::Twitch => parse_twitch_chat(content),
    }
}

pub async fn load_chat(path: &Path, platform: Platform) -> Result<Vec<ChatEvent>> {
    let content = fs::read_to_string(path).await?;
    parse_chat(&content, platform).map_err(|e| match e {
        ChatclipError::JsonError(err) => ChatclipError::ParseFailed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        other => other,
    })
}

// --- YouTube live chat replay (one JSON object per line) ---

#[derive(Deserialize)]
struct ReplayLine {
    #[serde(rename = "replayChatItemAction")]
    replay: Option<ReplayChatItemAction>,
}

#[derive(Deserialize)]
struct ReplayChatItemAction {
    #[serde(rename = "videoOffsetTimeMsec")]
    video_offset_time_msec: Option<String>,
    #[serde(default)]
    actions: Vec<ReplayAction>,
}

#[derive(Deserialize)]
struct ReplayAction {
    #[serde(rename = "addChatItemAction")]
    add_chat_item: Option<AddChatItemAction>,
}

#[derive(Deserialize)]
struct AddChatItemAction {
    item: RawChatItem,
}

#[derive(Deserialize)]
struct RawChatItem {
    #[serde(rename = "liveChatTextMessageRenderer")]
    text: Option<MessageRenderer>,
    #[serde(rename = "liveChatPaidMessageRenderer")]
    paid: Option<MessageRenderer>,
    #[serde(rename = "liveChatPaidStickerRenderer")]
    sticker: Option<MessageRenderer>,
}

#[derive(Deserialize)]
struct MessageRenderer {
    #[serde(rename = "authorName")]
    author_name: Option<SimpleText>,
    message: Option<Runs>,
    #[serde(rename = "purchaseAmountText")]
    purchase_amount_text: Option<SimpleText>,
}

#[derive(Deserialize)]
struct SimpleText {
    #[serde(rename = "simpleText")]
    simple_text: String,
}

#[derive(Deserialize)]
struct Runs {
    #[serde(default)]
    runs: Vec<Run>,
}

#[derive(Deserialize)]
struct Run {
    text: Option<String>,
}

/// The chat item shapes that carry viewer engagement.
enum ChatItem {
    TextMessage(MessageRenderer),
    PaidMessage(MessageRenderer),
    PaidSticker(MessageRenderer),
}

impl RawChatItem {
    fn into_item(self) -> Option<ChatItem> {
        if let Some(r) = self.text {
            Some(ChatItem::TextMessage(r))
        } else if let Some(r) = self.paid {
            Some(ChatItem::PaidMessage(r))
        } else {
            self.sticker.map(ChatItem::PaidSticker)
        }
    }
}

impl MessageRenderer {
    fn author(&self) -> String {
        self.author_name
            .as_ref()
            .map(|a| a.simple_text.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn text(&self) -> String {
        self.message
            .as_ref()
            .map(|m| {
                m.runs
                    .iter()
                    .filter_map(|r| r.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn amount(&self) -> Option<String> {
        self.purchase_amount_text
            .as_ref()
            .map(|a| a.simple_text.clone())
    }
}

impl ChatItem {
    fn into_event(self, offset_seconds: f64) -> Option<ChatEvent> {
        let (renderer, is_superchat, message) = match self {
            ChatItem::TextMessage(r) => {
                let text = r.text();
                (r, false, text)
            }
            ChatItem::PaidMessage(r) => {
                let text = r.text();
                (r, true, text)
            }
            ChatItem::PaidSticker(r) => (r, true, STICKER_MESSAGE.to_string()),
        };
        if message.is_empty() {
            return None;
        }
        Some(ChatEvent {
            offset_seconds,
            author_name: renderer.author(),
            superchat_amount: if is_superchat { renderer.amount() } else { None },
            is_superchat,
            message,
        })
    }
}

/// Parses a yt-dlp `.live_chat.json` replay. Lines that are malformed or
/// lack an official video offset are skipped.
pub fn parse_youtube_live_chat(content: &str) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let replay = match serde_json::from_str::<ReplayLine>(line) {
            Ok(ReplayLine { replay: Some(r) }) => r,
            Ok(_) => continue,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let Some(offset_seconds) = replay
            .video_offset_time_msec
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .map(|ms| ms as f64 / 1000.0)
        else {
            continue;
        };

        events.extend(
            replay
                .actions
                .into_iter()
                .filter_map(|a| a.add_chat_item)
                .filter_map(|a| a.item.into_item())
                .filter_map(|item| item.into_event(offset_seconds)),
        );
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed live chat lines");
    }
    finalize(events)
}

// --- Twitch (TwitchDownloaderCLI chat export) ---

#[derive(Deserialize)]
struct TwitchChat {
    #[serde(default)]
    comments: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct TwitchComment {
    content_offset_seconds: f64,
    commenter: Option<TwitchCommenter>,
    message: TwitchMessage,
}

#[derive(Deserialize)]
struct TwitchCommenter {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct TwitchMessage {
    #[serde(default)]
    body: String,
    #[serde(default)]
    bits_spent: u64,
}

/// Parses a Twitch chat export. Malformed comments are skipped; a document
/// that is not JSON at all is an error.
pub fn parse_twitch_chat(content: &str) -> Result<Vec<ChatEvent>> {
    let chat: TwitchChat = serde_json::from_str(content)?;
    let total = chat.comments.len();

    let events: Vec<ChatEvent> = chat
        .comments
        .into_iter()
        .filter_map(|value| serde_json::from_value::<TwitchComment>(value).ok())
        .filter_map(|comment| {
            let body = comment.message.body.trim();
            if body.is_empty() {
                return None;
            }
            let author = comment
                .commenter
                .and_then(|c| c.display_name)
                .unwrap_or_else(|| "Unknown".to_string());
            let bits = comment.message.bits_spent;
            Some(ChatEvent {
                offset_seconds: comment.content_offset_seconds,
                message: body.to_string(),
                author_name: author,
                is_superchat: bits > 0,
                superchat_amount: (bits > 0).then(|| format!("{bits} bits")),
            })
        })
        .collect();

    debug!(total, kept = events.len(), "parsed twitch comments");
    Ok(finalize(events))
}

/// Drops pre-stream messages and orders by offset.
fn finalize(mut events: Vec<ChatEvent>) -> Vec<ChatEvent> {
    events.retain(|e| e.offset_seconds.is_finite() && e.offset_seconds >= 0.0);
    events.sort_by(|a, b| a.offset_seconds.total_cmp(&b.offset_seconds));
    events
}
