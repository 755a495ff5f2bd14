use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::word::Card;
use crate::error::BotError;
use crate::utils::datetime::format_slot;
use crate::utils::validation::parse_time_slot;

/// Progress of the one quiz a chat may have running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    /// Total number of questions
    pub length: u32,
    /// 1-based index of the current question
    pub pos: u32,
    /// Word currently asked
    pub question: String,
    /// Correct article for `question`
    pub answer: String,
    /// Correct answers so far
    pub correctly: u32,
    /// Cards still to be asked, in order
    pub pending: Vec<Card>,
    /// Set once the last question has been answered
    pub finished: bool,
}

impl QuizState {
    /// Position, score and remaining cards agree with each other
    pub fn is_consistent(&self) -> bool {
        let remaining = if self.finished {
            0
        } else {
            self.length.saturating_sub(self.pos) as usize
        };
        self.pos >= 1
            && self.pos <= self.length
            && self.correctly <= self.pos
            && self.pending.len() == remaining
            && (!self.finished || self.pos == self.length)
    }
}

/// Persisted state of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: i64,
    pub subscribed: bool,
    /// Daily quiz slot; `None` until the chat first subscribes
    pub quiz_time: Option<NaiveTime>,
    /// Preferred quiz length; `None` means the configured default
    pub quiz_length: Option<u32>,
    pub quiz: Option<QuizState>,
}

impl Chat {
    /// A chat seen for the first time: not subscribed, no quiz
    pub fn new(id: i64) -> Self {
        Self {
            id,
            subscribed: false,
            quiz_time: None,
            quiz_length: None,
            quiz: None,
        }
    }

    /// The quiz still waiting for an answer, if any
    pub fn active_quiz(&self) -> Option<&QuizState> {
        self.quiz.as_ref().filter(|q| !q.finished)
    }
}

#[derive(Debug, FromRow)]
struct ChatRow {
    chat_id: i64,
    subscribed: bool,
    quiz_time: Option<String>,
    quiz_length: Option<i64>,
    quiz: Option<String>,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        // Unreadable fields are dropped rather than failing the whole chat
        let quiz_time = row.quiz_time.and_then(|raw| match parse_time_slot(&raw) {
            Ok(slot) => Some(slot),
            Err(e) => {
                tracing::warn!("Chat {} has unreadable quiz_time '{}': {}", row.chat_id, raw, e);
                None
            }
        });

        let quiz = row.quiz.and_then(|raw| match serde_json::from_str::<QuizState>(&raw) {
            Ok(quiz) if quiz.is_consistent() => Some(quiz),
            Ok(quiz) => {
                tracing::warn!(
                    "Chat {} has an inconsistent quiz (pos {}/{}, {} pending), dropping it",
                    row.chat_id,
                    quiz.pos,
                    quiz.length,
                    quiz.pending.len()
                );
                None
            }
            Err(e) => {
                tracing::warn!("Chat {} has unreadable quiz state: {}", row.chat_id, e);
                None
            }
        });

        Chat {
            id: row.chat_id,
            subscribed: row.subscribed,
            quiz_time,
            quiz_length: row
                .quiz_length
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0),
            quiz,
        }
    }
}

impl Chat {
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, ChatRow>(
            "SELECT chat_id, subscribed, quiz_time, quiz_length, quiz FROM chats WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Chat::from))
    }

    /// Inserts the chat or replaces every stored field
    pub async fn upsert(&self, pool: &sqlx::SqlitePool) -> Result<(), BotError> {
        let quiz = self.quiz.as_ref().map(serde_json::to_string).transpose()?;
        let quiz_time = self.quiz_time.map(format_slot);
        let quiz_length = self.quiz_length.map(i64::from);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO chats (chat_id, subscribed, quiz_time, quiz_length, quiz, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
                subscribed = excluded.subscribed,
                quiz_time = excluded.quiz_time,
                quiz_length = excluded.quiz_length,
                quiz = excluded.quiz,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(self.id)
        .bind(self.subscribed)
        .bind(quiz_time)
        .bind(quiz_length)
        .bind(quiz)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Ids of subscribed chats whose daily slot is `slot`
    pub async fn find_due(
        pool: &sqlx::SqlitePool,
        slot: NaiveTime,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT chat_id FROM chats WHERE subscribed = TRUE AND quiz_time = ? ORDER BY chat_id",
        )
        .bind(format_slot(slot))
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chats")
            .fetch_one(pool)
            .await
    }

    pub async fn count_subscribed(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chats WHERE subscribed = TRUE")
            .fetch_one(pool)
            .await
    }
}
