use anyhow::{anyhow, Result};
use dasbot::config::Config;
use dasbot::database::connection::{sqlite_path, DatabaseManager};
use dasbot::database::models::{Card, Chat};
use std::env;
use std::io;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize basic logging for the migration
    env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "import" => match args.get(2) {
            Some(path) => import_words(path).await,
            None => {
                eprintln!("Missing word list path");
                print_help();
                std::process::exit(1);
            }
        },
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn database_url() -> String {
    dotenvy::dotenv().ok();
    Config::database_url_from_env()
}

async fn connect(database_url: &str) -> Result<DatabaseManager> {
    DatabaseManager::new(database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Dasbot - Database Migration Tool");
    println!("===================================");

    let database_url = database_url();
    println!("📊 Database URL: {}", mask_url(&database_url));
    println!("🚀 Running database migrations...");

    let db_manager = connect(&database_url).await?;

    match db_manager.run_migrations().await {
        Ok(_) => {
            println!("✅ Migrations completed successfully!");
            println!("\n🎯 Your Dasbot database is ready!");
        }
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    let database_url = database_url();
    println!("📊 Database URL: {}", mask_url(&database_url));

    let db_manager = connect(&database_url).await?;

    match check_tables(&db_manager).await {
        Ok(tables) => {
            println!("✅ Database connection successful!");
            println!("📋 Found tables:");
            for table in tables {
                println!("  • {table}");
            }
        }
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
            return Ok(());
        }
    }

    match (
        Chat::count(&db_manager.pool).await,
        Chat::count_subscribed(&db_manager.pool).await,
        Card::count(&db_manager.pool).await,
    ) {
        (Ok(chats), Ok(subscribed), Ok(words)) => {
            println!("💬 {chats} chat(s), {subscribed} subscribed");
            println!("📚 {words} word(s)");
        }
        _ => println!("💡 Schema incomplete, try running 'migrate up'"),
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL data in the database!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let database_url = database_url();

    // For SQLite, we can just delete the file
    let Some(db_path) = sqlite_path(&database_url) else {
        return Err(anyhow!("Reset is only supported for SQLite file databases"));
    };
    if db_path.exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {}", db_path.display());
    }

    // Run migrations to recreate the schema
    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");

    Ok(())
}

/// Loads `article word` lines into the words table
async fn import_words(path: &str) -> Result<()> {
    println!("📥 Importing words from {path}");

    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path, e))?;

    let database_url = database_url();
    let db_manager = connect(&database_url).await?;
    db_manager.run_migrations().await?;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Card::parse_line(line) {
            Some(card) => {
                card.upsert(&db_manager.pool).await?;
                imported += 1;
            }
            None => {
                eprintln!("⚠️  Line {}: cannot parse '{}'", number + 1, line);
                skipped += 1;
            }
        }
    }

    println!("✅ Imported {imported} word(s), skipped {skipped} line(s)");
    println!("📚 {} word(s) in the database", Card::count(&db_manager.pool).await?);
    Ok(())
}

async fn check_tables(db_manager: &DatabaseManager) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM sqlite_master WHERE type='table'")
        .fetch_all(&db_manager.pool)
        .await?;

    Ok(names)
}

fn mask_url(url: &str) -> String {
    // Only show the file name of SQLite databases
    match sqlite_path(url).and_then(Path::file_name) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("📚 Dasbot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up     Run database migrations (default)");
    println!("    check           Check database connection and schema");
    println!("    reset           Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    import <file>   Load 'article word' lines (e.g. 'der Tisch') into the word list");
    println!("    help            Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL    Database connection string (default: sqlite:./data/dasbot.db)");
    println!();
    println!("EXAMPLES:");
    println!("    migrate                    # Run migrations");
    println!("    migrate import words.txt   # Import the word list");
    println!("    migrate check              # Check database status");
    println!("    migrate reset              # Reset database (careful!)");
    println!();
}
