//! Webhook payloads, limited to the fields the bot reads.
//!
//! Telegram omits empty fields, so every field has a default and unknown
//! fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::TelegramProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub poll: Option<Poll>,
    pub poll_answer: Option<PollAnswer>,
    pub chat_member: Option<ChatMemberUpdated>,
    pub my_chat_member: Option<ChatMemberUpdated>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix timestamp.
    pub date: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Vec<PhotoSize>,
    pub new_chat_members: Vec<User>,
    pub left_chat_member: Option<User>,
    pub poll: Option<Poll>,
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    pub fn sent_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.date, 0).unwrap_or_default()
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// `file_id` of the largest size, which Telegram lists last.
    pub fn largest_photo_id(&self) -> Option<&str> {
        self.photo
            .last()
            .map(|size| size.file_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

impl Chat {
    pub fn is_group(&self) -> bool {
        matches!(self.kind.as_str(), "group" | "supergroup")
    }

    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    pub fn profile(&self) -> TelegramProfile {
        TelegramProfile {
            telegram_id: self.id,
            is_bot: self.is_bot,
            first_name: self.first_name.clone(),
            username: self.username.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOption {
    pub text: String,
    pub voter_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollAnswer {
    pub poll_id: String,
    pub user: Option<User>,
    pub option_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: Option<User>,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMember {
    pub user: Option<User>,
    pub status: String,
}

impl ChatMember {
    pub fn has_left(&self) -> bool {
        matches!(self.status.as_str(), "left" | "kicked")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<User>,
    pub data: Option<String>,
    pub message: Option<Message>,
}
