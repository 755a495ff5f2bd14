//! Per-chat state machine: commands, quiz play and the settings menu.
//!
//! Every entry point takes the chat's lock before loading its record and keeps
//! it until the record is saved and the reply is sent, so the dispatcher and the
//! daily sweep never interleave on the same chat. Different chats never wait on
//! each other.

use chrono::Local;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::bot::messenger::{Keyboard, Messenger};
use crate::bot::settings::{MenuId, SettingsAction, SettingsMenu, SettingsSelector};
use crate::config::QuizSettings;
use crate::database::models::Chat;
use crate::database::repository::ChatRepository;
use crate::error::BotError;
use crate::services::quiz::{rate, QuizEngine};
use crate::utils::datetime::{format_datetime, format_slot, next_occurrence};
use crate::utils::logging::{log_command_error, log_quiz_event, log_validation_error};
use crate::utils::validation::recognize_answer;

pub const HELP_TEXT: &str =
    "Type /start to start the quiz, /settings to change the quiz length or the daily quiz time.";

pub const WELCOME_TEXT: &str = "Hi! I'm Dasbot. My mission is to help you memorize German articles.\n\
    I'll be sending you a short quiz every day once you pick a time.\n\
    To change the preferred quiz time (or turn it off), send /settings command.\n\
    You can also practice any time by typing /start.";

pub const DAILY_HELLO_TEXT: &str = "Hi, it's Dasbot! Here's your daily German articles quiz:";

pub const FALLBACK_TEXT: &str = "Type /start to begin a quiz, or /help for more info.";

pub const APOLOGY_TEXT: &str = "Sorry, I can't put a quiz together right now. Please try again later.";

pub const RETRY_TEXT: &str = "Something went wrong with that button, please retry with /settings.";

pub const UNAVAILABLE_TEXT: &str = "Sorry, something went wrong on my side. Please try again in a minute.";

/// How a quiz start greets the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    /// `/start` typed by the user
    Welcome,
    /// Daily scheduled quiz
    DailyHello,
}

impl Greeting {
    fn text(&self) -> &'static str {
        match self {
            Greeting::Welcome => WELCOME_TEXT,
            Greeting::DailyHello => DAILY_HELLO_TEXT,
        }
    }
}

/// Held for one chat event; forgets the chat's mutex once nobody else waits on it
struct ChatLock<'a> {
    chat_id: i64,
    locks: &'a DashMap<i64, Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ChatLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: no holder, no waiter
        self.locks
            .remove_if(&self.chat_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct SessionController<R, M> {
    repo: R,
    messenger: M,
    engine: QuizEngine,
    menu: SettingsMenu,
    settings: QuizSettings,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl<R: ChatRepository, M: Messenger> SessionController<R, M> {
    pub fn new(
        repo: R,
        messenger: M,
        engine: QuizEngine,
        menu: SettingsMenu,
        settings: QuizSettings,
    ) -> Self {
        Self {
            repo,
            messenger,
            engine,
            menu,
            settings,
            locks: DashMap::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    async fn lock_chat(&self, chat_id: i64) -> ChatLock<'_> {
        // Clone the Arc out so no map shard stays locked across the await
        let lock = self.locks.entry(chat_id).or_default().clone();
        ChatLock {
            chat_id,
            locks: &self.locks,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Chats whose lock is currently held or awaited
    pub fn locked_chats(&self) -> usize {
        self.locks.len()
    }

    pub async fn on_help(&self, chat_id: i64) -> Result<(), BotError> {
        self.messenger.send_text(chat_id, HELP_TEXT, None).await
    }

    /// `/start`: welcome text, then a fresh quiz
    pub async fn on_start(&self, chat_id: i64) -> Result<(), BotError> {
        self.start_quiz(chat_id, Greeting::Welcome).await
    }

    /// Scheduled variant of [`Self::on_start`]
    pub async fn on_daily_quiz(&self, chat_id: i64) -> Result<(), BotError> {
        self.start_quiz(chat_id, Greeting::DailyHello).await
    }

    async fn start_quiz(&self, chat_id: i64, greeting: Greeting) -> Result<(), BotError> {
        let _guard = self.lock_chat(chat_id).await;
        let mut chat = self.repo.load_chat(chat_id).await?;

        let length = chat.quiz_length.unwrap_or(self.settings.default_length);
        self.engine.start(&mut chat, length)?;
        self.repo.save_chat(&chat).await?;
        log_quiz_event("started", chat_id, &format!("{length} questions, {greeting:?}"));

        self.messenger.send_text(chat_id, greeting.text(), None).await?;
        self.ask_question(&chat).await
    }

    async fn ask_question(&self, chat: &Chat) -> Result<(), BotError> {
        let prompt = self.engine.current_prompt(chat)?;
        let keyboard = Keyboard::Answers(self.settings.answer_labels.clone());
        self.messenger.send_text(chat.id, &prompt, Some(keyboard)).await
    }

    /// Free text: an answer while a quiz runs, otherwise a pointer to /start
    pub async fn on_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let _guard = self.lock_chat(chat_id).await;
        let mut chat = self.repo.load_chat(chat_id).await?;

        if chat.active_quiz().is_none() {
            return self.messenger.send_text(chat_id, FALLBACK_TEXT, None).await;
        }

        let Some(answer) = recognize_answer(&self.settings.answer_labels, text) else {
            log_validation_error("answer", text, "not an article", chat_id);
            let hint = format!("Please answer with {}.", self.settings.answer_labels.join(", "));
            self.messenger.send_text(chat_id, &hint, None).await?;
            return self.ask_question(&chat).await;
        };

        let outcome = self.engine.submit_answer(&mut chat, answer)?;
        log_quiz_event(
            "answered",
            chat_id,
            &format!("{} ({} {})", outcome.correct, outcome.answer, outcome.question),
        );

        let feedback = format!(
            "{}, {} {}",
            if outcome.correct { "Correct" } else { "Incorrect" },
            outcome.answer,
            outcome.question
        );

        if outcome.has_next {
            self.repo.save_chat(&chat).await?;
            self.messenger.send_text(chat_id, &feedback, None).await?;
            return self.ask_question(&chat).await;
        }

        let (correctly, length) = chat
            .quiz
            .as_ref()
            .map(|q| (q.correctly, q.length))
            .ok_or(BotError::NoActiveQuiz(chat_id))?;
        self.engine.clear(&mut chat);
        self.repo.save_chat(&chat).await?;
        log_quiz_event("finished", chat_id, &format!("{correctly}/{length}"));

        self.messenger.send_text(chat_id, &feedback, None).await?;
        let result = format!(
            "{} out of {}{}\nTo start over, type /start, or /help for more info.",
            correctly,
            length,
            rate(correctly, length).message()
        );
        self.messenger
            .send_text(chat_id, &result, Some(Keyboard::Remove))
            .await
    }

    /// `/settings`: the top-level menu
    pub async fn on_settings(&self, chat_id: i64) -> Result<(), BotError> {
        self.send_menu(chat_id, MenuId::Main).await
    }

    async fn send_menu(&self, chat_id: i64, id: MenuId) -> Result<(), BotError> {
        let keyboard = self
            .menu
            .keyboard(id)
            .ok_or_else(|| BotError::InvalidSettingsSelector(id.as_str().to_string()))?;
        self.messenger
            .send_text(chat_id, id.prompt(), Some(keyboard))
            .await
    }

    /// A settings button press. `message_id` is the message holding the keyboard.
    pub async fn on_settings_selection(
        &self,
        chat_id: i64,
        message_id: i32,
        data: &str,
    ) -> Result<(), BotError> {
        let selector = SettingsSelector::decode(data)?;
        let action = self.menu.resolve(&selector)?;

        let text = match action {
            SettingsAction::OpenMenu(id) => return self.send_menu(chat_id, id).await,
            SettingsAction::SetQuizLength(length) => {
                self.update_chat(chat_id, |chat| chat.quiz_length = Some(length))
                    .await?;
                format!("Quiz length is set to {length} questions")
            }
            SettingsAction::Subscribe(slot) => {
                self.update_chat(chat_id, |chat| {
                    chat.subscribed = true;
                    chat.quiz_time = Some(slot);
                })
                .await?;
                let mut text = format!("Daily quiz time is set to {}", format_slot(slot));
                if let Some(next) = next_occurrence(slot, &Local::now()) {
                    text.push_str(&format!("\nNext quiz: {}", format_datetime(&next)));
                }
                text
            }
            SettingsAction::Unsubscribe => {
                self.update_chat(chat_id, |chat| chat.subscribed = false)
                    .await?;
                "Daily quiz is off".to_string()
            }
        };

        self.messenger.edit_message(chat_id, message_id, &text).await
    }

    async fn update_chat<F>(&self, chat_id: i64, apply: F) -> Result<(), BotError>
    where
        F: FnOnce(&mut Chat) + Send,
    {
        let _guard = self.lock_chat(chat_id).await;
        let mut chat = self.repo.load_chat(chat_id).await?;
        apply(&mut chat);
        self.repo.save_chat(&chat).await
    }

    /// Logs a failed event and tells the user whatever they need to know
    pub async fn report(&self, command: &str, chat_id: i64, error: &BotError) {
        log_command_error(command, chat_id, error.kind(), &error.to_string());

        let reply = match error {
            BotError::InsufficientVocabulary { .. } => APOLOGY_TEXT,
            BotError::InvalidSettingsSelector(_) => RETRY_TEXT,
            BotError::PersistenceUnavailable(_) | BotError::CorruptRecord(_) => UNAVAILABLE_TEXT,
            BotError::NoActiveQuiz(_) | BotError::DeliveryFailure { .. } => return,
        };

        if let Err(e) = self.messenger.send_text(chat_id, reply, None).await {
            tracing::warn!("Could not report error to chat {}: {}", chat_id, e);
        }
    }
}
