use anyhow::{anyhow, Result};
use std::env;
use std::fmt;

use crate::utils::validation::validate_webhook_secret;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/hackabot.db";
const DEFAULT_HTTP_PORT: u16 = 8000;
const PRODUCTION_PHOTO_UPLOAD_CHAT_ID: i64 = -1002257954378;
const DEV_PHOTO_UPLOAD_CHAT_ID: i64 = -5117513714;

/// Deployment environment selected with `HACKABOT_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "dev" => Ok(Environment::Dev),
            "production" => Ok(Environment::Production),
            _ => Err(anyhow!("HACKABOT_ENV must be one of: dev/production")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub telegram_bot_token: String,
    pub telegram_webhook_url: Option<String>,
    pub telegram_webhook_secret: Option<String>,
    pub sentry_dsn: Option<String>,
    pub database_url: String,
    pub http_port: u16,
    pub photo_upload_chat_id: i64,
    pub global_chat_id: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let environment = Environment::parse(&env::var("HACKABOT_ENV").unwrap_or_default())?;

        let token = non_empty_var("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;
        let telegram_bot_token = normalize_bot_token(&token);

        let telegram_webhook_url = non_empty_var("TELEGRAM_WEBHOOK_URL");

        let telegram_webhook_secret = non_empty_var("TELEGRAM_WEBHOOK_SECRET");
        match (&telegram_webhook_secret, environment) {
            (Some(secret), _) => validate_webhook_secret(secret)
                .map_err(|e| anyhow!("Invalid TELEGRAM_WEBHOOK_SECRET: {}", e))?,
            (None, Environment::Production) => {
                return Err(anyhow!("TELEGRAM_WEBHOOK_SECRET must be set in production"));
            }
            (None, Environment::Dev) => {}
        }

        let database_url = match (non_empty_var("DATABASE_URL"), environment) {
            (Some(url), _) => url,
            (None, Environment::Production) => {
                return Err(anyhow!("DATABASE_URL must be set in production"));
            }
            (None, Environment::Dev) => DEFAULT_DATABASE_URL.to_string(),
        };

        let http_port = match non_empty_var("HTTP_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT"))?,
            None => DEFAULT_HTTP_PORT,
        };

        let photo_upload_chat_id = match non_empty_var("PHOTO_UPLOAD_CHAT_ID") {
            Some(id) => id
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid PHOTO_UPLOAD_CHAT_ID"))?,
            None => match environment {
                Environment::Production => PRODUCTION_PHOTO_UPLOAD_CHAT_ID,
                Environment::Dev => DEV_PHOTO_UPLOAD_CHAT_ID,
            },
        };

        let global_chat_id = non_empty_var("HACKA_NETWORK_GLOBAL_CHAT_ID")
            .map(|id| {
                id.trim()
                    .parse()
                    .map_err(|_| anyhow!("Invalid HACKA_NETWORK_GLOBAL_CHAT_ID"))
            })
            .transpose()?;

        Ok(Config {
            environment,
            telegram_bot_token,
            telegram_webhook_url,
            telegram_webhook_secret,
            sentry_dsn: non_empty_var("SENTRY_DSN"),
            database_url,
            http_port,
            photo_upload_chat_id,
            global_chat_id,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Accepts tokens copied from API URLs, which carry a `bot` prefix.
pub fn normalize_bot_token(token: &str) -> String {
    let token = token.trim();
    token.strip_prefix("bot").unwrap_or(token).to_string()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bot_token() {
        assert_eq!(normalize_bot_token("123456:ABC"), "123456:ABC");
        assert_eq!(normalize_bot_token("bot123456:ABC"), "123456:ABC");
        assert_eq!(normalize_bot_token("  123456:ABC \n"), "123456:ABC");
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev").ok(), Some(Environment::Dev));
        assert_eq!(Environment::parse("production").ok(), Some(Environment::Production));
        assert!(Environment::parse("staging").is_err());
        assert!(Environment::parse("").is_err());
    }
}
