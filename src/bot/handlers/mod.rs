pub mod callback;
pub mod message;

use std::sync::Arc;
use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    prelude::*,
};

use crate::bot::commands::Command;
use crate::bot::controller::SessionController;
use crate::bot::messenger::TelegramMessenger;
use crate::database::connection::DatabaseManager;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The controller wired to SQLite and Telegram
pub type BotController = SessionController<DatabaseManager, TelegramMessenger>;

pub struct BotHandler {
    pub controller: Arc<BotController>,
}

impl BotHandler {
    pub fn new(controller: Arc<BotController>) -> Self {
        Self { controller }
    }

    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        let commands = self.controller.clone();
        let texts = self.controller.clone();
        let callbacks = self.controller.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |msg: Message, cmd: Command| {
                        let controller = commands.clone();
                        async move { message::command_handler(msg, cmd, controller).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |msg: Message| {
                let controller = texts.clone();
                async move { message::text_handler(msg, controller).await }
            }))
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let controller = callbacks.clone();
                    async move { callback::callback_handler(bot, q, controller).await }
                }),
            )
    }
}
