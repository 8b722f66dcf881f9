use anyhow::Result;
use chrono::Utc;

use crate::bot::handlers::upsert_person;
use crate::bot::updates::Message;
use crate::database::models::{Node, Photo};
use crate::services::images::process_image;
use crate::services::telegram::TelegramApi;
use crate::services::AppState;
use crate::utils::datetime::event_date_for;
use crate::utils::markdown::escape_markdown;
use crate::utils::text::{extract_hashtags, sequence_ratio};

/// Minimum similarity for a misspelt hashtag to count as a node name.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.85;

/// Node named by a hashtag in `text`. An exact name slug wins, otherwise
/// the closest name at or above [`FUZZY_MATCH_THRESHOLD`].
pub async fn find_node_from_hashtags(pool: &sqlx::SqlitePool, text: &str) -> Result<Option<Node>> {
    let hashtags = extract_hashtags(text);
    if hashtags.is_empty() {
        return Ok(None);
    }

    let nodes = Node::find_enabled(pool).await?;
    Ok(match_node(nodes, &hashtags))
}

fn match_node(nodes: Vec<Node>, hashtags: &[String]) -> Option<Node> {
    let slugs: Vec<String> = nodes.iter().map(Node::name_slug).collect();

    if let Some(index) = slugs.iter().position(|slug| hashtags.contains(slug)) {
        return nodes.into_iter().nth(index);
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, slug) in slugs.iter().enumerate() {
        for hashtag in hashtags {
            let ratio = sequence_ratio(slug, hashtag);
            let better = best.map_or(true, |(_, best_ratio)| ratio > best_ratio);
            if ratio >= FUZZY_MATCH_THRESHOLD && better {
                best = Some((index, ratio));
            }
        }
    }

    best.and_then(|(index, _)| nodes.into_iter().nth(index))
}

/// Stores the largest size of the photo in `message` for `node`, replying
/// in `chat_id`. A photo that is already stored is skipped silently.
pub async fn upload_photo<T: TelegramApi>(
    state: &AppState<T>,
    message: &Message,
    node: &Node,
    chat_id: i64,
) -> Result<()> {
    let pool = &state.db.pool;
    let telegram = &state.telegram;

    let Some(file_id) = message.largest_photo_id() else {
        telegram
            .send_message(chat_id, "Hmm, something went wrong with that photo. Try again?")
            .await?;
        return Ok(());
    };

    if Photo::exists_for_file_id(pool, file_id).await? {
        tracing::debug!("Photo {} already stored", file_id);
        return Ok(());
    }

    if let Err(e) = telegram.send_typing(chat_id).await {
        tracing::warn!("Failed to send typing action to {}: {}", chat_id, e);
    }

    let uploader = match &message.from {
        Some(user) => Some(upsert_person(pool, user).await?.id),
        None => None,
    };

    let bytes = match telegram.download_file(file_id).await {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            tracing::warn!("Downloaded photo {} was empty", file_id);
            telegram.send_message(chat_id, "Couldn't download that photo. Try again?").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::warn!("Failed to download photo {}: {}", file_id, e);
            telegram.send_message(chat_id, "Couldn't download that photo. Try again?").await?;
            return Ok(());
        }
    };

    let processed = match process_image(&bytes) {
        Ok(processed) => processed,
        Err(e) => {
            tracing::warn!("Failed to process photo {}: {}", file_id, e);
            telegram
                .send_message(chat_id, "Couldn't process that image. Is it a valid photo?")
                .await?;
            return Ok(());
        }
    };

    let created = event_date_for(Utc::now(), node.event_weekday(), node.tz());
    Photo::create(pool, node.id, file_id, &processed, uploader, created).await?;

    let reply = format!(
        "Thanks! Added your {} {} photo to hacka.network",
        node.emoji,
        escape_markdown(&node.name)
    );
    telegram.send_message(chat_id, &reply).await?;
    tracing::info!("Saved photo for {} ({} bytes)", node.name, processed.len());
    Ok(())
}

/// `delete` sent as a reply to a stored photo removes it from the website.
/// Only chat admins may do this.
pub async fn handle_delete_reply<T: TelegramApi>(state: &AppState<T>, message: &Message) -> Result<()> {
    let Some(file_id) = message
        .reply_to_message
        .as_deref()
        .and_then(Message::largest_photo_id)
    else {
        return Ok(());
    };

    let pool = &state.db.pool;
    let telegram = &state.telegram;
    let chat_id = message.chat.id;

    let is_admin = match &message.from {
        Some(user) => telegram.is_chat_admin(chat_id, user.id).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to check admin status of {}: {}", user.id, e);
            false
        }),
        None => false,
    };
    if !is_admin {
        telegram.send_message(chat_id, "Only group admins can delete photos").await?;
        return Ok(());
    }

    let Some(photo) = Photo::find_by_file_id(pool, file_id).await? else {
        telegram.send_message(chat_id, "That photo isn't on the website").await?;
        return Ok(());
    };

    let node = Node::find_by_id(pool, photo.node_id).await?;
    Photo::delete(pool, photo.id).await?;

    let (emoji, name) = node
        .map(|node| (node.emoji, node.name))
        .unwrap_or_default();
    let reply = format!("Removed {} {} photo from hacka.network", emoji, escape_markdown(&name));
    telegram.send_message(chat_id, &reply).await?;
    tracing::info!("Deleted photo {} of {}", photo.id, name);
    Ok(())
}

/// A hashtag sent as a reply to a photo that is not stored yet uploads it.
pub async fn handle_hashtag_reply<T: TelegramApi>(state: &AppState<T>, message: &Message) -> Result<()> {
    let Some(reply_to) = message.reply_to_message.as_deref() else {
        return Ok(());
    };
    let Some(file_id) = reply_to.largest_photo_id() else {
        return Ok(());
    };

    let pool = &state.db.pool;
    if Photo::exists_for_file_id(pool, file_id).await? {
        tracing::debug!("Photo {} already stored, ignoring hashtag reply", file_id);
        return Ok(());
    }

    let Some(node) = find_node_from_hashtags(pool, message.text()).await? else {
        return Ok(());
    };

    upload_photo(state, reply_to, &node, message.chat.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewNode;
    use chrono::TimeZone;

    fn node(id: i64, name: &str) -> Node {
        let new = NewNode::named(name);
        Node {
            id,
            slug: format!("node-{id}"),
            group_id: None,
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            established: None,
            name: new.name,
            emoji: String::new(),
            signup_url: String::new(),
            location: String::new(),
            timezone: new.timezone,
            disabled: false,
            event_day: 3,
            last_poll_sent_at: None,
        }
    }

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|tag| tag.to_string()).collect()
    }

    #[test]
    fn test_exact_slug_beats_fuzzy() {
        let nodes = vec![node(1, "Hackabrightn"), node(2, "Hackabrighton")];
        let found = match_node(nodes, &tags(&["hackabrighton"])).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let nodes = vec![node(1, "Hackabrighton"), node(2, "Hackalondon")];
        let found = match_node(nodes, &tags(&["hackabrigton"])).unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn test_no_match_below_threshold() {
        let nodes = vec![node(1, "Hackabrighton")];
        assert!(match_node(nodes, &tags(&["party"])).is_none());
    }
}
