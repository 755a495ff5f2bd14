//! # Dasbot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database and the word
//! list, starts the daily quiz scheduler, and runs the Telegram bot.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dasbot::bot::controller::SessionController;
use dasbot::bot::handlers::BotHandler;
use dasbot::bot::messenger::TelegramMessenger;
use dasbot::bot::settings::SettingsMenu;
use dasbot::config::Config;
use dasbot::database::connection::DatabaseManager;
use dasbot::database::models::Vocabulary;
use dasbot::services::health::HealthService;
use dasbot::services::quiz::QuizEngine;
use dasbot::services::scheduler::{DailyQuizScheduler, DailyQuizSweep};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dasbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Dasbot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, default quiz length: {}",
        config.database_url, config.http_port, config.quiz.default_length
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    let vocabulary = Vocabulary::load(&db_arc.pool, &config.quiz.answer_labels).await?;
    if vocabulary.len() < config.quiz.default_length as usize {
        tracing::warn!(
            "Only {} word(s) loaded, fewer than the default quiz length; import words with `migrate import`",
            vocabulary.len()
        );
    } else {
        info!("{} words loaded", vocabulary.len());
    }

    let menu = SettingsMenu::new(&config.quiz)?;

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let controller = Arc::new(SessionController::new(
        db_arc.as_ref().clone(),
        TelegramMessenger::new(bot.clone()),
        QuizEngine::new(Arc::new(vocabulary)),
        menu,
        config.quiz.clone(),
    ));
    let handler = BotHandler::new(controller.clone());
    info!("Telegram bot initialized successfully");

    // Initialize and start the daily quiz scheduler
    info!("Initializing daily quiz scheduler...");
    let sweep = Arc::new(DailyQuizSweep::new(controller));
    let mut scheduler = match DailyQuizScheduler::new(sweep).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("Failed to create daily quiz scheduler: {}", e);
            return Err(anyhow::anyhow!("Failed to create daily quiz scheduler: {}", e));
        }
    };

    if let Err(e) = scheduler.start().await {
        tracing::error!("Failed to start daily quiz scheduler: {}", e);
    } else {
        info!("Daily quiz scheduler started successfully");
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    // Stop the scheduler on shutdown
    if let Err(e) = scheduler.stop().await {
        tracing::warn!("Error stopping daily quiz scheduler: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
