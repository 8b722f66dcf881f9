#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use hackabot::config::{Config, Environment};
use hackabot::database::connection::DatabaseManager;
use hackabot::services::telegram::{SentPoll, TelegramApi};
use hackabot::services::AppState;
use tempfile::{tempdir, TempDir};

pub const PHOTO_CHAT_ID: i64 = -5117513714;
pub const GLOBAL_CHAT_ID: i64 = -1001000000000;
pub const WEBHOOK_SECRET: &str = "test-secret_123";

#[derive(Default)]
struct Recorded {
    messages: Vec<(i64, String)>,
    polls: Vec<(i64, String, Vec<String>)>,
    pins: Vec<(i64, i64)>,
    typing: Vec<i64>,
    callback_answers: Vec<String>,
    webhooks: Vec<(String, Option<String>)>,
    next_id: i64,
}

/// Records every outbound call instead of talking to Telegram.
#[derive(Clone, Default)]
pub struct FakeTelegram {
    recorded: Arc<Mutex<Recorded>>,
    admin: bool,
    download: Option<Vec<u8>>,
    fail_pin: bool,
    fail_sends: Arc<AtomicBool>,
    send_delay: Option<Duration>,
    current_webhook: Option<String>,
}

impl FakeTelegram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_download(mut self, bytes: Vec<u8>) -> Self {
        self.download = Some(bytes);
        self
    }

    pub fn with_failing_pin(mut self) -> Self {
        self.fail_pin = true;
        self
    }

    /// Messages and polls fail until `set_failing_sends(false)`.
    pub fn with_failing_sends(self) -> Self {
        self.set_failing_sends(true);
        self
    }

    pub fn set_failing_sends(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// Makes every message and poll take this long, like a slow Bot API.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn with_webhook(mut self, url: &str) -> Self {
        self.current_webhook = Some(url.to_string());
        self
    }

    pub fn messages(&self) -> Vec<(i64, String)> {
        self.recorded.lock().unwrap().messages.clone()
    }

    pub fn message_texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|(_, text)| text).collect()
    }

    pub fn polls(&self) -> Vec<(i64, String, Vec<String>)> {
        self.recorded.lock().unwrap().polls.clone()
    }

    pub fn pins(&self) -> Vec<(i64, i64)> {
        self.recorded.lock().unwrap().pins.clone()
    }

    pub fn typing(&self) -> Vec<i64> {
        self.recorded.lock().unwrap().typing.clone()
    }

    pub fn callback_answers(&self) -> Vec<String> {
        self.recorded.lock().unwrap().callback_answers.clone()
    }

    pub fn webhooks(&self) -> Vec<(String, Option<String>)> {
        self.recorded.lock().unwrap().webhooks.clone()
    }

    async fn before_send(&self) -> Result<()> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(anyhow!("Bad Gateway"));
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.next_id += 1;
        recorded.next_id
    }
}

impl TelegramApi for FakeTelegram {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.before_send().await?;
        let id = self.next_id();
        self.recorded.lock().unwrap().messages.push((chat_id, text.to_string()));
        Ok(id)
    }

    async fn send_poll(&self, chat_id: i64, question: &str, options: &[&str]) -> Result<SentPoll> {
        self.before_send().await?;
        let id = self.next_id();
        self.recorded.lock().unwrap().polls.push((
            chat_id,
            question.to_string(),
            options.iter().map(|option| option.to_string()).collect(),
        ));
        Ok(SentPoll {
            message_id: id,
            poll_id: format!("poll-{id}"),
            question: question.to_string(),
        })
    }

    async fn pin_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        if self.fail_pin {
            return Err(anyhow!("not enough rights to pin a message"));
        }
        self.recorded.lock().unwrap().pins.push((chat_id, message_id));
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.recorded.lock().unwrap().typing.push(chat_id);
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.download
            .clone()
            .ok_or_else(|| anyhow!("file {file_id} not found"))
    }

    async fn is_chat_admin(&self, _chat_id: i64, _user_id: i64) -> Result<bool> {
        Ok(self.admin)
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .callback_answers
            .push(callback_query_id.to_string());
        Ok(())
    }

    async fn webhook_url(&self) -> Result<Option<String>> {
        Ok(self.current_webhook.clone())
    }

    async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .webhooks
            .push((url.to_string(), secret_token.map(str::to_string)));
        Ok(())
    }
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        environment: Environment::Dev,
        telegram_bot_token: "123456:TEST".to_string(),
        telegram_webhook_url: None,
        telegram_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        sentry_dsn: None,
        database_url: database_url.to_string(),
        http_port: 8000,
        photo_upload_chat_id: PHOTO_CHAT_ID,
        global_chat_id: Some(GLOBAL_CHAT_ID),
    }
}

pub async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

pub async fn setup_state(telegram: FakeTelegram) -> Result<(AppState<FakeTelegram>, TempDir)> {
    let (db, temp_dir) = setup_test_db().await?;
    let config = test_config("sqlite::memory:");
    Ok((AppState::new(Arc::new(db), telegram, Arc::new(config)), temp_dir))
}

/// A small valid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}
