//! # Dasbot
//!
//! A Telegram bot that helps memorize the articles of German nouns.
//!
//! ## Features
//! - Multiple-choice quizzes (`der` / `die` / `das`) on demand with `/start`
//! - A daily quiz at a chosen time slot
//! - Per-chat quiz length and schedule settings through an inline menu
//! - Persistent storage with SQLite

/// Telegram commands, handlers and the per-chat session controller
pub mod bot;
/// Configuration from environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Error taxonomy of the quiz core
pub mod error;
/// Quiz engine, daily scheduler and health endpoint
pub mod services;
/// Utility functions for datetime, validation, and logging
pub mod utils;
