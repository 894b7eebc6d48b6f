use serde::{Deserialize, Serialize};

use crate::telegram::keyboard::ReplyMarkup;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// Text plus optional keyboard, as sent with `sendMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyMarkup>,
}

#[derive(Serialize)]
pub(crate) struct GetUpdatesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: [&'static str; 2],
}

#[derive(Serialize)]
pub(crate) struct AnswerCallbackQueryBody<'a> {
    pub callback_query_id: &'a str,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutgoingMessage {
            text: text.into(),
            reply_markup: None,
        }
    }

    pub fn with_markup(text: impl Into<String>, reply_markup: ReplyMarkup) -> Self {
        OutgoingMessage {
            text: text.into(),
            reply_markup: Some(reply_markup),
        }
    }
}

impl Update {
    /// Chat the update originates from, used to reply.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }

        self.callback_query
            .as_ref()
            .map(|query| match &query.message {
                Some(message) => message.chat.id,
                None => query.from.id,
            })
    }
}
