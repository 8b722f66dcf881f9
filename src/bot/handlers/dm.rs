use anyhow::Result;

use crate::bot::commands::{help::help_text, people::handle_people, profile, Command};
use crate::bot::handlers::upsert_person;
use crate::bot::updates::Message;
use crate::services::telegram::TelegramApi;
use crate::services::AppState;
use crate::utils::logging::{log_command_start, log_command_success};

pub const JOIN_PROMPT: &str = "👋 Hey! I'm the bot for the Hacka* network.\n\nTo use me, you need to be a member of at least one Hacka* node.\n\nHead to https://hacka.network to find and apply to your local one!";

pub const UNKNOWN_COMMAND: &str = "🤔 I don't recognise that command.\n\nType /help to see what I can do!";

/// Direct messages. Only members of a node's group get past the join
/// prompt.
pub async fn handle_dm<T: TelegramApi>(state: &AppState<T>, message: &Message) -> Result<()> {
    let Some(user) = &message.from else {
        tracing::warn!("DM without sender, skipping");
        return Ok(());
    };

    let pool = &state.db.pool;
    let chat_id = message.chat.id;
    let mut person = upsert_person(pool, user).await?;
    let nodes = person.nodes(pool).await?;

    if nodes.is_empty() {
        tracing::info!("{} is not in any node, sending join prompt", person.first_name);
        state.telegram.send_message(chat_id, JOIN_PROMPT).await?;
        return Ok(());
    }

    let text = message.text().trim();
    let command = Command::parse(text);
    log_command_start(command.name(), &person.first_name, person.telegram_id, chat_id);

    let reply = match command {
        Command::Help => help_text(&person, &nodes),
        Command::X => profile::handle_x(pool, &mut person, text).await?,
        Command::Privacy => profile::handle_privacy(pool, &mut person, text).await?,
        Command::Bio => profile::handle_bio(pool, &mut person, text).await?,
        Command::People => handle_people(pool, &nodes).await?,
        Command::Unknown => UNKNOWN_COMMAND.to_string(),
    };

    state.telegram.send_message(chat_id, &reply).await?;
    log_command_success(command.name(), &person.first_name, person.telegram_id, chat_id, None);
    Ok(())
}
