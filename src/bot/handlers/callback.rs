use anyhow::Result;

use crate::bot::updates::CallbackQuery;
use crate::services::telegram::TelegramApi;

/// No inline keyboards are active, so every button press is only
/// acknowledged to stop the client spinner.
pub async fn handle_callback_query<T: TelegramApi>(telegram: &T, query: &CallbackQuery) -> Result<()> {
    let chat_id = query.message.as_ref().map(|message| message.chat.id).unwrap_or_default();
    if query.id.is_empty() || chat_id == 0 {
        tracing::warn!("Callback query without id or chat, skipping");
        return Ok(());
    }

    tracing::info!(
        "Unknown callback data '{}' in chat {}",
        query.data.as_deref().unwrap_or_default(),
        chat_id
    );
    telegram.answer_callback_query(&query.id).await
}
