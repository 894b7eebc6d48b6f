use async_trait::async_trait;

use crate::document_store::{FirestoreClient, StoreError};
use crate::domain::list_date::ListDate;
use crate::domain::notification_report::{DeliveryOutcome, NotificationReport};
use crate::domain::subscriber::{MalformedSubscriber, Subscriber};
use crate::domain::web_app_link::WebAppLink;
use crate::telegram::keyboard::{ButtonStyle, InlineKeyboardButton, ReplyMarkup};
use crate::telegram::types::OutgoingMessage;
use crate::telegram::{TelegramClient, TelegramError};

const NEW_LIST_NOTICE: &str = "🆕 New list posted!";
const ERROR_NOTICE_LENGTH: usize = 100;

/// Source of the subscribers a notification goes to. Records that cannot be read are kept so
/// they are counted as failed deliveries.
#[async_trait]
pub trait SubscriberSource: Send + Sync {
    async fn subscribers(&self) -> Result<Vec<Result<Subscriber, MalformedSubscriber>>, StoreError>;
}

/// Delivers a single message to a single recipient.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient: i64, message: &OutgoingMessage) -> Result<(), TelegramError>;
}

#[async_trait]
impl SubscriberSource for FirestoreClient {
    async fn subscribers(&self) -> Result<Vec<Result<Subscriber, MalformedSubscriber>>, StoreError> {
        self.list_subscribers().await
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, recipient: i64, message: &OutgoingMessage) -> Result<(), TelegramError> {
        self.send_message(recipient, &message.text, message.reply_markup.as_ref())
            .await
    }
}

#[derive(thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to get subscribers from the document store.")]
    SubscribersUnavailable(#[source] StoreError),
}

impl std::fmt::Debug for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::SubscribersUnavailable(err) => {
                write!(f, "{}\nCaused by:\n\t({})", self, err)
            }
        }
    }
}

/// Fans a "new list" notification out to every subscriber.
pub struct Notifier<S, M> {
    source: S,
    sender: M,
    web_app: WebAppLink,
    button_style: ButtonStyle,
    echo_errors: bool,
}

pub type AppNotifier = Notifier<FirestoreClient, TelegramClient>;

impl<S, M> Notifier<S, M>
where
    S: SubscriberSource,
    M: MessageSender,
{
    pub fn new(source: S, sender: M, web_app: WebAppLink, button_style: ButtonStyle) -> Self {
        Notifier {
            source,
            sender,
            web_app,
            button_style,
            echo_errors: false,
        }
    }

    /// Also tell a subscriber about its own delivery failure. The notice is best effort and does
    /// not change the counts.
    pub fn with_echo_errors(mut self, echo_errors: bool) -> Self {
        self.echo_errors = echo_errors;
        self
    }

    /// Sends the notice and the list button to each subscriber, one subscriber at a time. Both
    /// messages are always attempted; a subscriber counts as delivered only if both went
    /// through.
    #[tracing::instrument(name = "Notifying all subscribers", skip(self, list_date), fields(list_date = %list_date))]
    pub async fn notify_all(&self, list_date: &ListDate) -> Result<NotificationReport, NotifyError> {
        let subscribers = self
            .source
            .subscribers()
            .await
            .map_err(NotifyError::SubscribersUnavailable)?;

        if subscribers.is_empty() {
            tracing::info!("No subscribers found");
            return Ok(NotificationReport::no_subscribers());
        }

        let messages = self.notification(list_date);
        let mut outcomes = Vec::with_capacity(subscribers.len());

        for subscriber in &subscribers {
            let outcome = match subscriber {
                Ok(subscriber) => self.deliver(subscriber.user_id, &messages).await,
                Err(malformed) => {
                    DeliveryOutcome::failed(&malformed.document_id, malformed.reason.clone())
                }
            };

            outcomes.push(outcome);
        }

        let report = NotificationReport::from_outcomes(&outcomes);

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            "{}",
            report.message
        );

        Ok(report)
    }

    pub fn notification(&self, list_date: &ListDate) -> [OutgoingMessage; 2] {
        let label = format!("View List ({})", list_date.formatted());
        let button =
            InlineKeyboardButton::link(self.button_style, label.clone(), self.web_app.for_date(list_date));

        [
            OutgoingMessage::text(NEW_LIST_NOTICE),
            OutgoingMessage::with_markup(format!("📋 {}", label), ReplyMarkup::single_button(button)),
        ]
    }

    async fn deliver(&self, user_id: i64, messages: &[OutgoingMessage]) -> DeliveryOutcome {
        let mut errors = vec![];

        for message in messages {
            if let Err(err) = self.sender.send(user_id, message).await {
                tracing::error!("Failed to send notification to user {}: {:?}", user_id, err);
                errors.push(err.to_string());
            }
        }

        if errors.is_empty() {
            return DeliveryOutcome::delivered(user_id);
        }

        let error = errors.join("; ");

        if self.echo_errors {
            self.echo_error(user_id, &error).await;
        }

        DeliveryOutcome::failed(user_id, error)
    }

    async fn echo_error(&self, user_id: i64, error: &str) {
        let truncated: String = error.chars().take(ERROR_NOTICE_LENGTH).collect();
        let notice = OutgoingMessage::text(format!("⚠️ Error sending notification: {}", truncated));

        if let Err(err) = self.sender.send(user_id, &notice).await {
            tracing::warn!("Failed to send error notice to user {}: {:?}", user_id, err);
        }
    }
}
