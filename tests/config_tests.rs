use hackabot::config::{Config, Environment};
use std::env;
use std::sync::Mutex;

// Environment variables are process-wide, so config tests run one at a time.
static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 9] = [
    "HACKABOT_ENV",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_WEBHOOK_URL",
    "TELEGRAM_WEBHOOK_SECRET",
    "SENTRY_DSN",
    "DATABASE_URL",
    "HTTP_PORT",
    "PHOTO_UPLOAD_CHAT_ID",
    "HACKA_NETWORK_GLOBAL_CHAT_ID",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_config_dev_defaults() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("HACKABOT_ENV", "dev");
    env::set_var("TELEGRAM_BOT_TOKEN", "bot123456:ABC");

    let config = Config::from_env().unwrap();

    assert_eq!(config.environment, Environment::Dev);
    assert!(!config.is_production());
    assert_eq!(config.telegram_bot_token, "123456:ABC");
    assert_eq!(config.database_url, "sqlite:./data/hackabot.db");
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.photo_upload_chat_id, -5117513714);
    assert_eq!(config.telegram_webhook_secret, None);
    assert_eq!(config.global_chat_id, None);

    clear_env();
}

#[test]
fn test_config_with_all_vars() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("HACKABOT_ENV", "production");
    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC");
    env::set_var("TELEGRAM_WEBHOOK_URL", "https://bot.hacka.network/webhook/telegram/");
    env::set_var("TELEGRAM_WEBHOOK_SECRET", "s3cret-token_value");
    env::set_var("SENTRY_DSN", "https://key@sentry.example.com/1");
    env::set_var("DATABASE_URL", "sqlite:/data/prod.db");
    env::set_var("HTTP_PORT", "8080");
    env::set_var("PHOTO_UPLOAD_CHAT_ID", "-10042");
    env::set_var("HACKA_NETWORK_GLOBAL_CHAT_ID", "-100777");

    let config = Config::from_env().unwrap();

    assert!(config.is_production());
    assert_eq!(config.telegram_webhook_secret.as_deref(), Some("s3cret-token_value"));
    assert_eq!(config.database_url, "sqlite:/data/prod.db");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.photo_upload_chat_id, -10042);
    assert_eq!(config.global_chat_id, Some(-100777));
    assert!(config.sentry_dsn.is_some());

    clear_env();
}

#[test]
fn test_config_requires_token_and_environment() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC");
    assert!(Config::from_env().is_err());

    env::set_var("HACKABOT_ENV", "dev");
    env::remove_var("TELEGRAM_BOT_TOKEN");
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_production_requires_secret_and_database() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("HACKABOT_ENV", "production");
    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC");
    env::set_var("DATABASE_URL", "sqlite:/data/prod.db");

    assert!(Config::from_env().is_err());

    env::set_var("TELEGRAM_WEBHOOK_SECRET", "s3cret");
    env::remove_var("DATABASE_URL");
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_invalid_values_are_rejected() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("HACKABOT_ENV", "dev");
    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC");

    env::set_var("HTTP_PORT", "not-a-port");
    assert!(Config::from_env().is_err());
    env::remove_var("HTTP_PORT");

    env::set_var("TELEGRAM_WEBHOOK_SECRET", "bad secret!");
    assert!(Config::from_env().is_err());
    env::remove_var("TELEGRAM_WEBHOOK_SECRET");

    env::set_var("HACKA_NETWORK_GLOBAL_CHAT_ID", "global");
    assert!(Config::from_env().is_err());

    clear_env();
}
