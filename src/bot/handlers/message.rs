use anyhow::Result;

use crate::bot::handlers::{photo, poll, upsert_group, upsert_person};
use crate::bot::updates::Message;
use crate::database::models::{ActivityDay, GroupPerson, Node};
use crate::services::telegram::TelegramApi;
use crate::services::AppState;

/// Membership, activity and poll bookkeeping for a non-private chat, plus
/// the photo flows of the photo upload chat. Message text is never stored.
pub async fn handle_group_message<T: TelegramApi>(state: &AppState<T>, message: &Message) -> Result<()> {
    let pool = &state.db.pool;
    let Some(group) = upsert_group(pool, &message.chat).await? else {
        tracing::debug!("Skipping message from non-group chat {}", message.chat.id);
        return Ok(());
    };

    for user in &message.new_chat_members {
        let person = upsert_person(pool, user).await?;
        GroupPerson::set_left(pool, group.id, person.id, false).await?;
        tracing::info!("{} joined {}", person.first_name, group.display_name);
    }

    if let Some(user) = &message.left_chat_member {
        let person = upsert_person(pool, user).await?;
        GroupPerson::set_left(pool, group.id, person.id, true).await?;
        tracing::info!("{} left {}", person.first_name, group.display_name);
    }

    let has_text = message.text.as_deref().is_some_and(|text| !text.is_empty());
    if has_text {
        if let Some(user) = &message.from {
            let person = upsert_person(pool, user).await?;
            let sent_at = message.sent_at();
            GroupPerson::touch(pool, group.id, person.id, sent_at).await?;
            ActivityDay::increment(pool, person.id, group.id, sent_at.date_naive()).await?;
        }
    }

    if let Some(embedded) = &message.poll {
        let node_id = Node::first_for_group(pool, group.id).await?.map(|node| node.id);
        poll::handle_poll(pool, embedded, Some(node_id)).await?;
    }

    if message.chat.id == state.config.photo_upload_chat_id {
        handle_photo_chat(state, message).await?;
    }

    Ok(())
}

async fn handle_photo_chat<T: TelegramApi>(state: &AppState<T>, message: &Message) -> Result<()> {
    let pool = &state.db.pool;

    if !message.photo.is_empty() {
        let caption = message.caption.as_deref().unwrap_or_default();
        if !caption.is_empty() {
            if let Some(node) = photo::find_node_from_hashtags(pool, caption).await? {
                photo::upload_photo(state, message, &node, message.chat.id).await?;
            }
        }
    }

    let text = message.text();
    if text.is_empty() {
        return Ok(());
    }

    if text.trim().eq_ignore_ascii_case("delete") {
        photo::handle_delete_reply(state, message).await?;
    }

    photo::handle_hashtag_reply(state, message).await
}
