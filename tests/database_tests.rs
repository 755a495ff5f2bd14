use anyhow::Result;
use chrono::NaiveTime;
use dasbot::database::connection::DatabaseManager;
use dasbot::database::models::*;
use dasbot::database::repository::ChatRepository;
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn nine() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn sample_quiz() -> QuizState {
    QuizState {
        length: 3,
        pos: 2,
        question: "Tisch".to_string(),
        answer: "der".to_string(),
        correctly: 1,
        pending: vec![Card::new("das", "Haus")],
        finished: false,
    }
}

#[tokio::test]
async fn test_unknown_chat_loads_as_default() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let chat = db.load_chat(12345).await?;
    assert_eq!(chat, Chat::new(12345));

    // Loading never creates a row
    assert!(Chat::find_by_id(&db.pool, 12345).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_chat_round_trips_every_field() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let chat = Chat {
        id: -100200300,
        subscribed: true,
        quiz_time: Some(nine()),
        quiz_length: Some(20),
        quiz: Some(sample_quiz()),
    };
    db.save_chat(&chat).await?;

    assert_eq!(db.load_chat(chat.id).await?, chat);
    Ok(())
}

#[tokio::test]
async fn test_save_overwrites_existing_record() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let mut chat = Chat::new(7);
    chat.quiz = Some(sample_quiz());
    db.save_chat(&chat).await?;

    chat.quiz = None;
    chat.quiz_length = Some(5);
    db.save_chat(&chat).await?;

    let loaded = db.load_chat(7).await?;
    assert!(loaded.quiz.is_none());
    assert_eq!(loaded.quiz_length, Some(5));
    assert_eq!(Chat::count(&db.pool).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_due_subscriptions_match_slot_and_flag() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

    for (id, subscribed, time) in [
        (3, true, Some(nine())),
        (1, true, Some(nine())),
        (2, false, Some(nine())),
        (4, true, Some(ten)),
        (5, false, None),
    ] {
        let mut chat = Chat::new(id);
        chat.subscribed = subscribed;
        chat.quiz_time = time;
        db.save_chat(&chat).await?;
    }

    assert_eq!(db.list_due_subscriptions(nine()).await?, vec![1, 3]);
    assert_eq!(db.list_due_subscriptions(ten).await?, vec![4]);
    assert!(db
        .list_due_subscriptions(NaiveTime::from_hms_opt(21, 0, 0).unwrap())
        .await?
        .is_empty());
    assert_eq!(Chat::count_subscribed(&db.pool).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_quiz_is_dropped_not_fatal() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    sqlx::query(
        "INSERT INTO chats (chat_id, subscribed, quiz_time, quiz_length, quiz, updated_at) \
         VALUES (?, TRUE, 'half past nine', 10, '{not json', '2024-01-01T00:00:00Z')",
    )
    .bind(99i64)
    .execute(&db.pool)
    .await?;

    let chat = db.load_chat(99).await?;
    assert!(chat.subscribed);
    assert_eq!(chat.quiz_length, Some(10));
    assert!(chat.quiz_time.is_none());
    assert!(chat.quiz.is_none());
    Ok(())
}

#[tokio::test]
async fn test_incomplete_or_inconsistent_quiz_is_dropped() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let mut short = sample_quiz();
    short.pending.clear();
    let stored = [
        (5i64, r#"{"length":10,"pos":4,"question":"Haus","answer":"das","correctly":2}"#.to_string()),
        (6i64, serde_json::to_string(&short)?),
        (7i64, serde_json::to_string(&sample_quiz())?),
    ];

    for (chat_id, quiz) in &stored {
        sqlx::query(
            "INSERT INTO chats (chat_id, subscribed, quiz, updated_at) VALUES (?, FALSE, ?, ?)",
        )
        .bind(chat_id)
        .bind(quiz)
        .bind("2024-01-01T00:00:00Z")
        .execute(&db.pool)
        .await?;
    }

    // No pending cards recorded at all
    assert!(db.load_chat(5).await?.quiz.is_none());
    // At 2/3 with nothing left to ask
    assert!(db.load_chat(6).await?.quiz.is_none());
    assert_eq!(db.load_chat(7).await?.quiz, Some(sample_quiz()));
    Ok(())
}

#[tokio::test]
async fn test_words_upsert_and_vocabulary_filtering() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    Card::new("der", "Tisch").upsert(&db.pool).await?;
    Card::new("die", "Tür").upsert(&db.pool).await?;
    Card::new("das", "Tür").upsert(&db.pool).await?;
    Card::new("den", "Hund").upsert(&db.pool).await?;

    assert_eq!(Card::count(&db.pool).await?, 3);

    let labels: Vec<String> = vec!["der".into(), "die".into(), "das".into()];
    let vocabulary = Vocabulary::load(&db.pool, &labels).await?;
    assert_eq!(vocabulary.len(), 2);
    assert!(vocabulary.cards().contains(&Card::new("das", "Tür")));
    assert!(!vocabulary.cards().iter().any(|c| c.word == "Hund"));
    Ok(())
}
