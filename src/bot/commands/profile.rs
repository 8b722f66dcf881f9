//! `/x`, `/privacy` and `/bio`: the public profile shown on hacka.network.
//!
//! Each handler returns the reply to send back.

use anyhow::Result;

use crate::bot::commands::{command_argument, privacy_status, PRIVACY_NUDGE};
use crate::database::models::Person;
use crate::utils::logging::log_validation_error;
use crate::utils::markdown::escape_underscores;
use crate::utils::text::html_unescape;
use crate::utils::validation::{validate_bio, validate_x_username};

pub async fn handle_x(pool: &sqlx::SqlitePool, person: &mut Person, text: &str) -> Result<String> {
    let username = match validate_x_username(command_argument(text)) {
        Ok(username) => username,
        Err(e) => {
            log_validation_error("x", "username", &e.to_string(), person.telegram_id);
            return Ok(format!("❌ {}", e));
        }
    };

    person.set_username_x(pool, &username).await?;

    let mut reply = format!(
        "✅ Your X/Twitter username has been set to @{}",
        escape_underscores(&username)
    );
    if person.privacy {
        reply.push_str(PRIVACY_NUDGE);
    }
    Ok(reply)
}

/// Without a valid `on`/`off` argument this only reports the current mode.
pub async fn handle_privacy(pool: &sqlx::SqlitePool, person: &mut Person, text: &str) -> Result<String> {
    let lowered = text.to_lowercase();
    let wanted = match lowered.split_whitespace().nth(1) {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    };

    let Some(privacy) = wanted else {
        let explanation = if person.privacy {
            "You are hidden from hacka.network"
        } else {
            "You are listed on hacka.network for your nodes"
        };
        return Ok(format!(
            "🛡️ Your privacy mode is currently *{}*\n{}\n\nUse `/privacy on` or `/privacy off` to change it.",
            privacy_status(person.privacy),
            explanation
        ));
    };

    person.set_privacy(pool, privacy).await?;

    let explanation = if privacy {
        "You are now hidden from hacka.network"
    } else {
        "You are now listed on hacka.network for your nodes"
    };
    Ok(format!("✅ Privacy mode is now *{}*\n{}", privacy_status(privacy), explanation))
}

pub async fn handle_bio(pool: &sqlx::SqlitePool, person: &mut Person, text: &str) -> Result<String> {
    let Some(bio) = command_argument(text) else {
        let current = if person.bio.is_empty() {
            "not set".to_string()
        } else {
            format!("_{}_", person.bio)
        };
        return Ok(format!(
            "📝 Your bio is currently: {}\n\nUse `/bio your text` to set it, or `/bio unset` to clear it.",
            current
        ));
    };

    if bio.eq_ignore_ascii_case("unset") {
        person.set_bio(pool, "").await?;
        return Ok("✅ Your bio has been cleared.".to_string());
    }

    if let Err(e) = validate_bio(bio) {
        log_validation_error("bio", "bio", &e.to_string(), person.telegram_id);
        return Ok(format!("❌ {}", e));
    }

    let bio = html_unescape(bio);
    person.set_bio(pool, &bio).await?;

    let mut reply = format!("✅ Your bio has been set to:\n\n_{}_", bio);
    if person.privacy {
        reply.push_str(PRIVACY_NUDGE);
    }
    Ok(reply)
}
