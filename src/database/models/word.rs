use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One vocabulary entry: a noun and its article
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Card {
    pub word: String,
    pub article: String,
}

impl Card {
    pub fn new(article: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            article: article.into(),
        }
    }

    /// Parses an `article word` line such as `der Tisch`
    pub fn parse_line(line: &str) -> Option<Self> {
        let (article, word) = line.trim().split_once(char::is_whitespace)?;
        let word = word.trim();
        if article.is_empty() || word.is_empty() {
            return None;
        }
        Some(Self::new(article.to_lowercase(), word))
    }

    pub async fn all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>("SELECT word, article FROM words ORDER BY word")
            .fetch_all(pool)
            .await
    }

    /// Inserts or overwrites the article for this word
    pub async fn upsert(&self, pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO words (word, article) VALUES (?, ?) \
             ON CONFLICT(word) DO UPDATE SET article = excluded.article",
        )
        .bind(&self.word)
        .bind(&self.article)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM words")
            .fetch_one(pool)
            .await
    }
}

/// The word pool quizzes are drawn from, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    cards: Vec<Card>,
}

impl Vocabulary {
    /// Keeps only cards whose article is one of `labels`
    pub fn new(cards: Vec<Card>, labels: &[String]) -> Self {
        let (cards, rejected): (Vec<_>, Vec<_>) = cards
            .into_iter()
            .partition(|card| labels.contains(&card.article));

        for card in &rejected {
            tracing::warn!("Skipping '{}': unknown article '{}'", card.word, card.article);
        }

        Self { cards }
    }

    pub async fn load(pool: &sqlx::SqlitePool, labels: &[String]) -> Result<Self, sqlx::Error> {
        Ok(Self::new(Card::all(pool).await?, labels))
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
