use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use std::env;

use crate::utils::validation::{parse_answer_labels, parse_quiz_lengths, parse_time_slots};

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/dasbot.db";
const DEFAULT_TIME_SLOTS: &str = "09:00,12:00,15:00,18:00,21:00,00:00,03:00,06:00";
const DEFAULT_LENGTH_OPTIONS: &str = "5,10,20,50";
const DEFAULT_ANSWERS: &str = "der,die,das";
const DEFAULT_QUIZ_LENGTH: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub quiz: QuizSettings,
}

/// Quiz options injected into the engine, the controller and the settings menu.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    /// Question count used until a chat picks its own
    pub default_length: u32,
    /// Lengths offered in the settings menu
    pub length_options: Vec<u32>,
    /// Allowed daily quiz times
    pub time_slots: Vec<NaiveTime>,
    /// The three recognized answers, in keyboard order
    pub answer_labels: Vec<String>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_length: DEFAULT_QUIZ_LENGTH,
            length_options: vec![5, 10, 20, 50],
            time_slots: [9, 12, 15, 18, 21, 0, 3, 6]
                .into_iter()
                .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
                .collect(),
            answer_labels: vec!["der".into(), "die".into(), "das".into()],
        }
    }
}

impl QuizSettings {
    pub fn from_env() -> Result<Self> {
        let default_length = match non_empty_var("QUIZ_LENGTH") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("Invalid QUIZ_LENGTH"))?,
            None => DEFAULT_QUIZ_LENGTH,
        };

        let length_options = parse_quiz_lengths(
            &non_empty_var("QUIZ_LENGTH_OPTIONS").unwrap_or_else(|| DEFAULT_LENGTH_OPTIONS.into()),
        )
        .map_err(|e| anyhow!("Invalid QUIZ_LENGTH_OPTIONS: {e}"))?;

        let time_slots = parse_time_slots(
            &non_empty_var("QUIZ_TIME_SLOTS").unwrap_or_else(|| DEFAULT_TIME_SLOTS.into()),
        )
        .map_err(|e| anyhow!("Invalid QUIZ_TIME_SLOTS: {e}"))?;

        let answer_labels = parse_answer_labels(
            &non_empty_var("QUIZ_ANSWERS").unwrap_or_else(|| DEFAULT_ANSWERS.into()),
        )
        .map_err(|e| anyhow!("Invalid QUIZ_ANSWERS: {e}"))?;

        Ok(Self {
            default_length,
            length_options,
            time_slots,
            answer_labels,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = Self::database_url_from_env();

        let port_str = env::var("HTTP_PORT").unwrap_or_else(|_| "3000".to_string());
        let http_port = port_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        Ok(Config {
            telegram_bot_token: token.trim().to_string(),
            database_url,
            http_port,
            quiz: QuizSettings::from_env()?,
        })
    }

    /// Database location alone, for tools that never talk to Telegram
    pub fn database_url_from_env() -> String {
        non_empty_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
