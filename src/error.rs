use thiserror::Error;

/// Failures the quiz core can run into while handling one chat event.
///
/// None of these are fatal to the process: the dispatcher and the daily sweep
/// report them per chat and carry on.
#[derive(Debug, Error)]
pub enum BotError {
    /// Not enough words to build a quiz of the requested length
    #[error("not enough words for a quiz: need {needed}, have {available}")]
    InsufficientVocabulary { needed: usize, available: usize },

    /// An answer or prompt was requested while no quiz is running
    #[error("no quiz in progress for chat {0}")]
    NoActiveQuiz(i64),

    /// Unknown or forged settings callback
    #[error("invalid settings selector: {0}")]
    InvalidSettingsSelector(String),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] sqlx::Error),

    /// A chat record that could not be encoded, decoded or trusted
    #[error("corrupt chat record: {0}")]
    CorruptRecord(String),

    #[error("message delivery to chat {chat_id} failed: {reason}")]
    DeliveryFailure { chat_id: i64, reason: String },
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        BotError::CorruptRecord(e.to_string())
    }
}

impl BotError {
    /// Short tag used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::InsufficientVocabulary { .. } => "insufficient_vocabulary",
            BotError::NoActiveQuiz(_) => "no_active_quiz",
            BotError::InvalidSettingsSelector(_) => "invalid_settings_selector",
            BotError::PersistenceUnavailable(_) => "persistence_unavailable",
            BotError::CorruptRecord(_) => "corrupt_record",
            BotError::DeliveryFailure { .. } => "delivery_failure",
        }
    }
}
