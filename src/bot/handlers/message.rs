use std::sync::Arc;
use teloxide::prelude::*;

use super::HandlerResult;
use crate::bot::commands::Command;
use crate::bot::controller::SessionController;
use crate::bot::messenger::Messenger;
use crate::database::repository::ChatRepository;
use crate::utils::logging::{log_command_start, log_command_success};

pub async fn command_handler<R: ChatRepository, M: Messenger>(
    msg: Message,
    cmd: Command,
    controller: Arc<SessionController<R, M>>,
) -> HandlerResult {
    let chat_id = msg.chat.id.0;
    let name = match cmd {
        Command::Help => "/help",
        Command::Start => "/start",
        Command::Settings => "/settings",
    };
    log_command_start(name, chat_id, None);

    let result = match cmd {
        Command::Help => controller.on_help(chat_id).await,
        Command::Start => controller.on_start(chat_id).await,
        Command::Settings => controller.on_settings(chat_id).await,
    };

    match result {
        Ok(()) => log_command_success(name, chat_id, None),
        Err(e) => controller.report(name, chat_id, &e).await,
    }
    Ok(())
}

/// Anything that is not a known command: quiz answers and stray text
pub async fn text_handler<R: ChatRepository, M: Messenger>(
    msg: Message,
    controller: Arc<SessionController<R, M>>,
) -> HandlerResult {
    let chat_id = msg.chat.id.0;

    // Stickers, photos and the like carry no text to answer with
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Err(e) = controller.on_text(chat_id, text).await {
        controller.report("text", chat_id, &e).await;
    }
    Ok(())
}
