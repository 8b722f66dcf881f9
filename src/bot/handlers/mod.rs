pub mod callback;
pub mod dm;
pub mod member;
pub mod message;
pub mod photo;
pub mod poll;

use anyhow::Result;

use crate::bot::updates::{Chat, Update, User};
use crate::database::models::{Group, Person};
use crate::services::telegram::TelegramApi;
use crate::services::AppState;
use crate::utils::logging::{log_database_operation, log_update_received};

/// Runs every update kind present in `update`, in a fixed order.
pub async fn handle_update<T: TelegramApi>(state: &AppState<T>, update: &Update) -> Result<()> {
    if let Some(message) = &update.message {
        log_update_received("message", Some(message.chat.id));
        if message.chat.is_private() {
            dm::handle_dm(state, message).await?;
        } else {
            message::handle_group_message(state, message).await?;
        }
    }

    if let Some(poll) = &update.poll {
        log_update_received("poll", None);
        poll::handle_poll(&state.db.pool, poll, None).await?;
    }

    if let Some(answer) = &update.poll_answer {
        log_update_received("poll_answer", None);
        poll::handle_poll_answer(&state.db.pool, answer).await?;
    }

    if let Some(member) = &update.chat_member {
        log_update_received("chat_member", Some(member.chat.id));
        member::handle_chat_member(state, member).await?;
    }

    if let Some(member) = &update.my_chat_member {
        log_update_received("my_chat_member", Some(member.chat.id));
        member::handle_my_chat_member(&state.db.pool, member).await?;
    }

    if let Some(query) = &update.callback_query {
        log_update_received("callback_query", None);
        callback::handle_callback_query(&state.telegram, query).await?;
    }

    Ok(())
}

/// Upserts the group for a group or supergroup chat; other chats have none.
pub async fn upsert_group(pool: &sqlx::SqlitePool, chat: &Chat) -> Result<Option<Group>> {
    if !chat.is_group() {
        return Ok(None);
    }

    let title = chat.title.as_deref().unwrap_or_default();
    let group = Group::upsert(pool, chat.id, title).await?;
    log_database_operation("upsert", "groups", Some(&group.display_name));
    Ok(Some(group))
}

pub async fn upsert_person(pool: &sqlx::SqlitePool, user: &User) -> Result<Person> {
    let person = Person::upsert(pool, &user.profile()).await?;
    log_database_operation("upsert", "people", Some(&person.first_name));
    Ok(person)
}
