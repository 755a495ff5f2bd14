#![allow(dead_code)]

use chrono::NaiveTime;
use dasbot::bot::controller::SessionController;
use dasbot::bot::messenger::{Keyboard, Messenger};
use dasbot::bot::settings::SettingsMenu;
use dasbot::config::QuizSettings;
use dasbot::database::connection::DatabaseManager;
use dasbot::database::models::{Card, Vocabulary};
use dasbot::error::BotError;
use dasbot::services::quiz::QuizEngine;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Something the controller asked the transport to do
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        chat_id: i64,
        message_id: i32,
        text: String,
    },
}

/// Messenger that records every call and can be told to fail for some chats
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<Sent>>>,
    failing: Arc<Mutex<HashSet<i64>>>,
    delays: Arc<Mutex<HashMap<i64, Duration>>>,
}

impl RecordingMessenger {
    pub fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    /// Every send to `chat_id` first waits `delay`
    pub fn slow_for(&self, chat_id: i64, delay: Duration) {
        self.delays.lock().unwrap().insert(chat_id, delay);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { chat_id: id, text, .. } if id == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn check(&self, chat_id: i64) -> Result<(), BotError> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(BotError::DeliveryFailure {
                chat_id,
                reason: "bot was blocked by the user".to_string(),
            });
        }
        Ok(())
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), BotError> {
        let delay = self.delays.lock().unwrap().get(&chat_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(chat_id)?;
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_message(&self, chat_id: i64, message_id: i32, text: &str) -> Result<(), BotError> {
        self.check(chat_id)?;
        self.sent.lock().unwrap().push(Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

pub type TestController = SessionController<DatabaseManager, RecordingMessenger>;

pub async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db = DatabaseManager::new(&database_url)
        .await
        .expect("Failed to create test database");
    db.run_migrations().await.expect("Failed to run migrations");

    (db, temp_dir)
}

pub fn slot(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

/// Small deterministic options: quizzes of 3, slots at 09:00, 10:00 and 21:00
pub fn test_settings() -> QuizSettings {
    QuizSettings {
        default_length: 3,
        length_options: vec![3, 5],
        time_slots: vec![slot(9), slot(10), slot(21)],
        answer_labels: vec!["der".into(), "die".into(), "das".into()],
    }
}

/// `count` words cycling through der/die/das
pub fn vocabulary(count: usize) -> Vocabulary {
    let articles = ["der", "die", "das"];
    let cards = (0..count)
        .map(|i| Card::new(articles[i % 3], format!("Wort{i}")))
        .collect();
    Vocabulary::new(cards, &test_settings().answer_labels)
}

pub fn controller_with(
    db: DatabaseManager,
    messenger: RecordingMessenger,
    vocabulary: Vocabulary,
) -> Arc<TestController> {
    let settings = test_settings();
    let menu = SettingsMenu::new(&settings).expect("menu should validate");
    Arc::new(SessionController::new(
        db,
        messenger,
        QuizEngine::new(Arc::new(vocabulary)),
        menu,
        settings,
    ))
}
