use anyhow::Result;

use crate::bot::handlers::{upsert_group, upsert_person};
use crate::bot::updates::ChatMemberUpdated;
use crate::database::models::{Group, GroupPerson, Person};
use crate::services::telegram::TelegramApi;
use crate::services::AppState;
use crate::utils::markdown::mention;

pub async fn handle_chat_member<T: TelegramApi>(state: &AppState<T>, update: &ChatMemberUpdated) -> Result<()> {
    let pool = &state.db.pool;
    let Some(group) = upsert_group(pool, &update.chat).await? else {
        tracing::warn!("chat_member update for non-group chat {}, skipping", update.chat.id);
        return Ok(());
    };

    let Some(user) = &update.new_chat_member.user else {
        tracing::warn!("chat_member update without user, skipping");
        return Ok(());
    };

    let mut person = upsert_person(pool, user).await?;
    let has_left = update.new_chat_member.has_left();
    GroupPerson::set_left(pool, group.id, person.id, has_left).await?;

    if has_left {
        tracing::info!("{} left {}", person.first_name, group.display_name);
        return Ok(());
    }

    tracing::info!("{} joined {}", person.first_name, group.display_name);
    onboard_member(state, &mut person, &group).await
}

/// The bot itself was added, removed or promoted.
pub async fn handle_my_chat_member(pool: &sqlx::SqlitePool, update: &ChatMemberUpdated) -> Result<()> {
    tracing::info!("Bot status in {} changed to {}", update.chat.id, update.new_chat_member.status);
    upsert_group(pool, &update.chat).await?;
    Ok(())
}

/// Welcomes a person into a node's group and marks them onboarded. Bots and
/// groups without a node are skipped.
pub async fn onboard_member<T: TelegramApi>(state: &AppState<T>, person: &mut Person, group: &Group) -> Result<()> {
    if person.is_bot {
        return Ok(());
    }

    let pool = &state.db.pool;
    if !group.has_node(pool).await? {
        tracing::info!("Skipping onboarding of {}: {} has no node", person.first_name, group.display_name);
        return Ok(());
    }

    let welcome = format!(
        "👋 Welcome {}! Introduce yourself — what are you building? (DM me to set up your profile)",
        mention(&person.first_name, person.telegram_id)
    );
    state.telegram.send_message(group.telegram_id, &welcome).await?;

    person.mark_onboarded(pool).await?;
    tracing::info!("Onboarded {} in {}", person.first_name, group.display_name);
    Ok(())
}
