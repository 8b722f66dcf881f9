//! Outbound Telegram Bot API calls.
//!
//! Everything the bot sends goes through [`TelegramApi`] so the web process,
//! the worker and the tests can share handler code while swapping the
//! transport.

use std::future::Future;

use anyhow::{anyhow, Result};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, ChatAction, MessageId, ParseMode};
use url::Url;

use crate::config::Config;

/// Poll message returned by `sendPoll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPoll {
    pub message_id: i64,
    pub poll_id: String,
    pub question: String,
}

pub trait TelegramApi: Clone + Send + Sync + 'static {
    /// Sends `text` with legacy Markdown and link previews disabled.
    /// Returns the message id.
    fn send_message(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Sends a non-anonymous, single answer poll.
    fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[&str],
    ) -> impl Future<Output = Result<SentPoll>> + Send;

    fn pin_message(&self, chat_id: i64, message_id: i64) -> impl Future<Output = Result<()>> + Send;

    fn send_typing(&self, chat_id: i64) -> impl Future<Output = Result<()>> + Send;

    /// Resolves a `file_id` and downloads the file contents.
    fn download_file(&self, file_id: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// True for the chat owner and administrators.
    fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> impl Future<Output = Result<bool>> + Send;

    fn answer_callback_query(&self, callback_query_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Currently registered webhook URL, if any.
    fn webhook_url(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> impl Future<Output = Result<()>> + Send;
}

/// Updates the webhook subscribes to.
pub const ALLOWED_UPDATES: [AllowedUpdate; 4] = [
    AllowedUpdate::Message,
    AllowedUpdate::Poll,
    AllowedUpdate::PollAnswer,
    AllowedUpdate::ChatMember,
];

/// [`TelegramApi`] backed by a teloxide [`Bot`].
#[derive(Clone)]
pub struct TeloxideClient {
    bot: Bot,
}

impl TeloxideClient {
    pub fn new(token: &str) -> Self {
        Self { bot: Bot::new(token) }
    }
}

impl TelegramApi for TeloxideClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        tracing::debug!("SEND [{}]: {}", chat_id, text);
        #[allow(deprecated)]
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown)
            .disable_web_page_preview(true)
            .await?;
        Ok(i64::from(message.id.0))
    }

    async fn send_poll(&self, chat_id: i64, question: &str, options: &[&str]) -> Result<SentPoll> {
        let message = self
            .bot
            .send_poll(
                ChatId(chat_id),
                question,
                options.iter().map(|option| option.to_string()),
            )
            .is_anonymous(false)
            .allows_multiple_answers(false)
            .await?;

        let poll = message
            .poll()
            .ok_or_else(|| anyhow!("sendPoll response carried no poll"))?;

        Ok(SentPoll {
            message_id: i64::from(message.id.0),
            poll_id: poll.id.clone(),
            question: poll.question.clone(),
        })
    }

    async fn pin_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let message_id = i32::try_from(message_id)?;
        self.bot
            .pin_chat_message(ChatId(chat_id), MessageId(message_id))
            .disable_notification(false)
            .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.bot.get_file(file_id).await?;
        let mut contents = Vec::new();
        self.bot.download_file(&file.path, &mut contents).await?;
        Ok(contents)
    }

    async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        let user_id = u64::try_from(user_id)?;
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        Ok(member.kind.is_privileged())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.bot.answer_callback_query(callback_query_id).await?;
        Ok(())
    }

    async fn webhook_url(&self) -> Result<Option<String>> {
        let info = self.bot.get_webhook_info().await?;
        Ok(info.url.map(|url| url.to_string()))
    }

    async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let url = Url::parse(url)?;
        let mut request = self
            .bot
            .set_webhook(url)
            .allowed_updates(ALLOWED_UPDATES);
        if let Some(secret) = secret_token {
            request = request.secret_token(secret);
        }
        request.await?;
        Ok(())
    }
}

/// Registers the configured webhook unless Telegram already points at it.
/// Returns whether a webhook is in place afterwards.
pub async fn ensure_webhook<T: TelegramApi>(telegram: &T, config: &Config) -> Result<bool> {
    let Some(wanted) = config.telegram_webhook_url.as_deref() else {
        tracing::info!("TELEGRAM_WEBHOOK_URL not set, skipping webhook setup");
        return Ok(false);
    };

    let current = telegram.webhook_url().await?;
    if current.as_deref() == Some(wanted) {
        tracing::info!("Webhook already set to: {}", wanted);
        return Ok(true);
    }

    tracing::info!("Setting webhook to: {}", wanted);
    telegram
        .set_webhook(wanted, config.telegram_webhook_secret.as_deref())
        .await?;
    tracing::info!("Webhook set successfully");
    Ok(true)
}
