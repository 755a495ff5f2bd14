use std::sync::Arc;
use teloxide::prelude::*;

use super::HandlerResult;
use crate::bot::controller::SessionController;
use crate::bot::messenger::Messenger;
use crate::bot::settings::SettingsSelector;
use crate::database::repository::ChatRepository;
use crate::error::BotError;
use crate::utils::logging::log_command_success;

pub async fn callback_handler<R: ChatRepository, M: Messenger>(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<SessionController<R, M>>,
) -> HandlerResult {
    let data = q.data.clone().unwrap_or_default();

    // Stop the button's loading spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        tracing::warn!("Failed to answer callback query {}: {}", q.id, e);
    }

    let Some(message) = q.message.as_ref() else {
        tracing::warn!("Callback '{}' from user {} without a message", data, q.from.id.0);
        return Ok(());
    };
    let chat_id = message.chat.id.0;

    tracing::info!("Callback received: '{}' in chat {}", data, chat_id);

    let result = if SettingsSelector::is_settings_data(&data) {
        controller
            .on_settings_selection(chat_id, message.id.0, &data)
            .await
    } else {
        Err(BotError::InvalidSettingsSelector(data.clone()))
    };

    match result {
        Ok(()) => log_command_success("settings", chat_id, Some(&data)),
        Err(e) => controller.report("settings", chat_id, &e).await,
    }
    Ok(())
}
