use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::time;

use crate::telegram::keyboard::ReplyMarkup;
use crate::telegram::types::{
    AnswerCallbackQueryBody, ApiResponse, GetUpdatesBody, SendMessageBody, Update, User,
};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);
// Long polling keeps the request open for the poll timeout, give the transport some slack on top.
const POLL_GRACE: time::Duration = time::Duration::from_secs(10);

/// Thin client of the Telegram Bot API. Cloning is cheap, the underlying connection pool is
/// shared.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
    bot_token: Secret<String>,
}

#[derive(thiserror::Error)]
pub enum TelegramError {
    #[error("Failed to reach the Bot API: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Bot API answered with status {0}.")]
    Status(StatusCode),
    #[error("{0}")]
    Api(String),
}

impl std::fmt::Debug for TelegramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // The request url embeds the bot token.
        TelegramError::Request(err.without_url())
    }
}

impl TelegramClient {
    pub fn new(
        base_url: String,
        bot_token: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<TelegramClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(TelegramClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    #[tracing::instrument(name = "Fetching the bot identity", skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call(self.http_client.get(self.method_url("getMe")))
            .await
    }

    #[tracing::instrument(name = "Sending a bot message", skip(self, text, reply_markup))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let body = SendMessageBody {
            chat_id,
            text,
            reply_markup,
        };
        let request = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&body);

        self.call::<serde_json::Value>(request).await?;

        Ok(())
    }

    #[tracing::instrument(name = "Polling bot updates", skip(self))]
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesBody {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message", "callback_query"],
        };
        let request = self
            .http_client
            .post(self.method_url("getUpdates"))
            .timeout(time::Duration::from_secs(timeout_secs) + POLL_GRACE)
            .json(&body);

        self.call(request).await
    }

    #[tracing::instrument(name = "Answering a callback query", skip(self))]
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let request = self
            .http_client
            .post(self.method_url("answerCallbackQuery"))
            .json(&AnswerCallbackQueryBody { callback_query_id });

        self.call::<bool>(request).await?;

        Ok(())
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url,
            self.bot_token.expose_secret(),
            method
        )
    }

    // The Bot API reports failures as `{"ok": false, "description": ...}`, usually together with a
    // 4xx status, so the body is read before the status is looked at.
    async fn call<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, TelegramError> {
        let response = request.send().await?;
        let status = response.status();

        let body: ApiResponse<R> = match response.json().await {
            Ok(body) => body,
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => return Err(TelegramError::Status(status)),
        };

        if !body.ok {
            return Err(TelegramError::Api(
                body.description.unwrap_or_else(|| status.to_string()),
            ));
        }

        body.result
            .ok_or_else(|| TelegramError::Api(String::from("Bot API response without result")))
    }
}
