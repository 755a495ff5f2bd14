use std::future::Future;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    MessageId, ReplyMarkup,
};

use crate::error::BotError;

/// One inline button: visible label and callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

/// Keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Reply keyboard with one button per answer label
    Answers(Vec<String>),
    /// Inline buttons, row by row
    Inline(Vec<Vec<InlineButton>>),
    /// Hide a previously shown reply keyboard
    Remove,
}

/// Outgoing side of the chat transport. Holds no quiz state.
pub trait Messenger: Send + Sync + 'static {
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> impl Future<Output = Result<(), BotError>> + Send;

    /// Replaces the text of an already sent message
    fn edit_message(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
    ) -> impl Future<Output = Result<(), BotError>> + Send;
}

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl From<Keyboard> for ReplyMarkup {
    fn from(keyboard: Keyboard) -> Self {
        match keyboard {
            Keyboard::Answers(labels) => {
                let row = labels.into_iter().map(KeyboardButton::new).collect::<Vec<_>>();
                KeyboardMarkup::new(vec![row]).resize_keyboard(true).into()
            }
            Keyboard::Inline(rows) => InlineKeyboardMarkup::new(rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.label, b.data))
                    .collect::<Vec<_>>()
            }))
            .into(),
            Keyboard::Remove => KeyboardRemove::new().into(),
        }
    }
}

fn delivery_failure(chat_id: i64, e: teloxide::RequestError) -> BotError {
    BotError::DeliveryFailure {
        chat_id,
        reason: e.to_string(),
    }
}

impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), BotError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let result = match keyboard {
            Some(keyboard) => request.reply_markup(ReplyMarkup::from(keyboard)).await,
            None => request.await,
        };
        result.map(|_| ()).map_err(|e| delivery_failure(chat_id, e))
    }

    async fn edit_message(&self, chat_id: i64, message_id: i32, text: &str) -> Result<(), BotError> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await
            .map(|_| ())
            .map_err(|e| delivery_failure(chat_id, e))
    }
}
