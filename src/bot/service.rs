use std::time;

use crate::bot::command::{is_command, CallbackAction};
use crate::document_store::{FirestoreClient, StoreError};
use crate::domain::item_list::{render_item_preview, ItemList};
use crate::domain::list_date::ListDate;
use crate::domain::subscriber::NewSubscriber;
use crate::domain::web_app_link::WebAppLink;
use crate::telegram::keyboard::{ButtonStyle, InlineKeyboardButton, ReplyMarkup};
use crate::telegram::types::{CallbackQuery, Message, OutgoingMessage, Update, User};
use crate::telegram::{TelegramClient, TelegramError};

const RECENT_LISTS_LIMIT: u32 = 5;
const POLL_ERROR_PAUSE: time::Duration = time::Duration::from_secs(1);

const SUBSCRIBED: &str = "✅ You're subscribed! You'll be notified for new domain lists.";
const GENERIC_ERROR: &str = "Sorry, there was an error processing your request.";
const NO_RECENT_LISTS: &str = "No recent lists found.";
const MANAGER_KEYBOARD: &str = "📌 Open Manager is pinned below the message field.";

pub struct BotSettings {
    pub web_app: WebAppLink,
    pub button_style: ButtonStyle,
    pub echo_errors: bool,
    pub poll_timeout_secs: u64,
}

/// Handles bot commands and button presses.
///
/// The bot's own username is looked up once by [`BotService::connect`] and never changes
/// afterwards; it is needed to recognise commands addressed as `/start@<username>` in groups.
pub struct BotService {
    bot_username: String,
    telegram: TelegramClient,
    store: FirestoreClient,
    settings: BotSettings,
}

impl BotService {
    pub async fn connect(
        telegram: TelegramClient,
        store: FirestoreClient,
        settings: BotSettings,
    ) -> Result<BotService, TelegramError> {
        let me = telegram.get_me().await?;
        let bot_username = me.username.unwrap_or(me.first_name);

        tracing::info!("Connected to Telegram as @{}", bot_username);

        Ok(BotService {
            bot_username,
            telegram,
            store,
            settings,
        })
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Long-polls the Bot API and handles updates one at a time. Polling errors are logged and
    /// polling resumes after a short pause.
    pub async fn run_until_stopped(self) {
        let mut offset: Option<i64> = None;

        loop {
            match self
                .telegram
                .get_updates(offset, self.settings.poll_timeout_secs)
                .await
            {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(&update).await;
                    }
                }
                Err(err) => {
                    tracing::error!("Failed to poll updates: {:?}", err);
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                }
            }
        }
    }

    #[tracing::instrument(name = "Handling a bot update", skip(self, update), fields(update_id = %update.update_id))]
    pub async fn handle_update(&self, update: &Update) {
        if let Some(message) = &update.message {
            self.handle_message(message).await;
        } else if let Some(query) = &update.callback_query {
            self.handle_callback(query).await;
        }
    }

    async fn handle_message(&self, message: &Message) {
        let (Some(text), Some(user)) = (&message.text, &message.from) else {
            return;
        };

        if is_command(text, "start", &self.bot_username) {
            self.handle_start(message.chat.id, user).await;
        }
    }

    #[tracing::instrument(name = "Handling the start command", skip(self, user), fields(user_id = %user.id))]
    async fn handle_start(&self, chat_id: i64, user: &User) {
        let new_subscriber = NewSubscriber::from(user);

        if let Err(err) = self.store.upsert_subscriber(&new_subscriber).await {
            tracing::error!("Failed to store subscriber {}: {:?}", user.id, err);
            self.reply_error(chat_id, "START_COMMAND", &err.to_string()).await;
            return;
        }

        self.reply(chat_id, OutgoingMessage::text(SUBSCRIBED)).await;

        if self.settings.button_style == ButtonStyle::WebApp {
            let keyboard =
                ReplyMarkup::web_app_keyboard("Open Manager", self.settings.web_app.as_ref());

            self.reply(chat_id, OutgoingMessage::with_markup(MANAGER_KEYBOARD, keyboard))
                .await;
        }

        self.reply(chat_id, self.manager_menu()).await;

        match self.store.recent_lists(1).await {
            Ok(lists) => {
                let message = match lists.first() {
                    Some(list) => self.list_button(&list_date_or_today(list)),
                    None => OutgoingMessage::text(NO_RECENT_LISTS),
                };

                self.reply(chat_id, message).await;
            }
            Err(err) => {
                tracing::error!("Failed to fetch the most recent list: {:?}", err);

                if self.settings.echo_errors {
                    self.reply(chat_id, debug_message("RECENT_LIST", &err.to_string()))
                        .await;
                }
            }
        }
    }

    #[tracing::instrument(name = "Handling a callback query", skip(self, query), fields(user_id = %query.from.id))]
    async fn handle_callback(&self, query: &CallbackQuery) {
        if let Err(err) = self.telegram.answer_callback_query(&query.id).await {
            tracing::warn!("Failed to answer callback query {}: {:?}", query.id, err);
        }

        let chat_id = query
            .message
            .as_ref()
            .map(|message| message.chat.id)
            .unwrap_or(query.from.id);
        let action = match query.data.as_deref().map(CallbackAction::parse) {
            Some(Ok(action)) => action,
            Some(Err(err)) => {
                tracing::warn!("Ignoring callback query: {}", err);
                return;
            }
            None => return,
        };

        let result = match action {
            CallbackAction::Menu => Ok(self.manager_menu()),
            CallbackAction::Status => self.subscription_status(query.from.id).await,
            CallbackAction::RecentLists => self.recent_lists().await,
            CallbackAction::ViewList(date) => self.list_items(&date).await,
        };

        match result {
            Ok(message) => self.reply(chat_id, message).await,
            Err(err) => {
                tracing::error!("Failed to handle callback query: {:?}", err);
                self.reply_error(chat_id, "CALLBACK", &err.to_string()).await;
            }
        }
    }

    async fn subscription_status(&self, user_id: i64) -> Result<OutgoingMessage, StoreError> {
        let text = match self.store.get_subscriber(user_id).await? {
            Some(subscriber) => match subscriber.subscribed_at {
                Some(subscribed_at) => format!(
                    "✅ You're subscribed since {}.",
                    subscribed_at.format("%Y-%m-%d")
                ),
                None => String::from("✅ You're subscribed."),
            },
            None => String::from("You're not subscribed yet. Send /start to subscribe."),
        };

        Ok(OutgoingMessage::text(text))
    }

    async fn recent_lists(&self) -> Result<OutgoingMessage, StoreError> {
        let lists = self.store.recent_lists(RECENT_LISTS_LIMIT).await?;
        let mut rows: Vec<Vec<InlineKeyboardButton>> = lists
            .iter()
            .filter_map(|list| list.date.as_ref())
            .filter_map(|date| {
                let data = CallbackAction::ViewList(date.clone()).encode()?;

                Some(vec![InlineKeyboardButton::callback(format!("📋 {}", date), data)])
            })
            .collect();

        if rows.is_empty() {
            return Ok(OutgoingMessage::text(NO_RECENT_LISTS));
        }

        if let Some(data) = CallbackAction::Menu.encode() {
            rows.push(vec![InlineKeyboardButton::callback("⬅️ Menu", data)]);
        }

        Ok(OutgoingMessage::with_markup(
            "📋 Recent lists:",
            ReplyMarkup::inline(rows),
        ))
    }

    async fn list_items(&self, date: &str) -> Result<OutgoingMessage, StoreError> {
        let Some(list) = self.store.list_by_date(date).await? else {
            return Ok(OutgoingMessage::text(format!("List ({}) not found.", date)));
        };

        let items = self.store.get_items(list.preview_refs()).await?;
        let list_date = list_date_or_today(&list);
        let text = render_item_preview(&list_date.formatted(), &items, list.hidden_count());

        Ok(OutgoingMessage {
            text,
            reply_markup: self.list_button(&list_date).reply_markup,
        })
    }

    fn manager_menu(&self) -> OutgoingMessage {
        let manager_url = self.settings.web_app.as_ref();
        let mut rows = vec![vec![InlineKeyboardButton::link(
            self.settings.button_style,
            "Open Manager",
            manager_url,
        )]];

        for (text, action) in [
            ("📬 Subscription status", CallbackAction::Status),
            ("🗂 Recent lists", CallbackAction::RecentLists),
        ] {
            if let Some(data) = action.encode() {
                rows.push(vec![InlineKeyboardButton::callback(text, data)]);
            }
        }

        OutgoingMessage::with_markup(
            "Use the buttons below to open the list manager:",
            ReplyMarkup::inline(rows),
        )
    }

    fn list_button(&self, date: &ListDate) -> OutgoingMessage {
        let label = format!("View List ({})", date.formatted());
        let button = InlineKeyboardButton::link(
            self.settings.button_style,
            label.clone(),
            self.settings.web_app.for_date(date),
        );

        OutgoingMessage::with_markup(format!("📋 {}", label), ReplyMarkup::single_button(button))
    }

    async fn reply(&self, chat_id: i64, message: OutgoingMessage) {
        if let Err(err) = self
            .telegram
            .send_message(chat_id, &message.text, message.reply_markup.as_ref())
            .await
        {
            tracing::error!("Failed to reply to chat {}: {:?}", chat_id, err);
        }
    }

    async fn reply_error(&self, chat_id: i64, stage: &str, error: &str) {
        self.reply(chat_id, OutgoingMessage::text(GENERIC_ERROR)).await;

        if self.settings.echo_errors {
            self.reply(chat_id, debug_message(stage, error)).await;
        }
    }
}

// Lists written without a date are shown under today's date.
fn list_date_or_today(list: &ItemList) -> ListDate {
    list.date
        .clone()
        .and_then(|date| ListDate::parse(date).ok())
        .unwrap_or_else(ListDate::today)
}

fn debug_message(stage: &str, error: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!("🐞 Debug [{}]:\n{}", stage, error))
}
