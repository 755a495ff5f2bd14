use chrono::NaiveTime;
use std::future::Future;

use super::connection::DatabaseManager;
use super::models::Chat;
use crate::error::BotError;
use crate::utils::logging::{log_database_error, log_database_operation};

/// Storage for chat records, shared by the dispatcher and the daily sweep.
pub trait ChatRepository: Send + Sync + 'static {
    /// Loads a chat, or a fresh default one if the id was never saved
    fn load_chat(&self, chat_id: i64) -> impl Future<Output = Result<Chat, BotError>> + Send;

    /// Upserts the chat keyed by its id
    fn save_chat(&self, chat: &Chat) -> impl Future<Output = Result<(), BotError>> + Send;

    /// Ids of subscribed chats whose daily slot is `slot`
    fn list_due_subscriptions(
        &self,
        slot: NaiveTime,
    ) -> impl Future<Output = Result<Vec<i64>, BotError>> + Send;
}

impl ChatRepository for DatabaseManager {
    async fn load_chat(&self, chat_id: i64) -> Result<Chat, BotError> {
        log_database_operation("SELECT", "chats", Some(&format!("chat_id={chat_id}")));
        match Chat::find_by_id(&self.pool, chat_id).await {
            Ok(chat) => Ok(chat.unwrap_or_else(|| Chat::new(chat_id))),
            Err(e) => {
                log_database_error("SELECT", "chats", &e.to_string(), None);
                Err(e.into())
            }
        }
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), BotError> {
        log_database_operation("UPSERT", "chats", Some(&format!("chat_id={}", chat.id)));
        chat.upsert(&self.pool).await.map_err(|e| {
            log_database_error("UPSERT", "chats", &e.to_string(), None);
            e
        })
    }

    async fn list_due_subscriptions(&self, slot: NaiveTime) -> Result<Vec<i64>, BotError> {
        Chat::find_due(&self.pool, slot).await.map_err(|e| {
            log_database_error("SELECT", "chats", &e.to_string(), Some("due subscriptions"));
            e.into()
        })
    }
}
