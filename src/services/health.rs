use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::database::connection::DatabaseManager;
use crate::database::models::{Card, Chat};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub database: DatabaseHealth,
    pub quiz: QuizHealth,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub connection_pool_size: u32,
    pub response_time_ms: u64,
}

/// Row counts behind the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizHealth {
    pub chats: i64,
    pub subscribers: i64,
    pub words: i64,
}

#[derive(Clone)]
struct HealthState {
    db: Arc<DatabaseManager>,
    started_at: DateTime<Utc>,
}

/// HTTP probes served next to the bot
pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        let state = HealthState {
            db,
            started_at: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check))
            .route("/health/live", get(liveness_check))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state);

        Self { router }
    }
}

async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let probe_started = Instant::now();
    let counts = quiz_counts(&state.db).await;
    let response_time_ms = u64::try_from(probe_started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (code, status, quiz) = match counts {
        Ok(quiz) => (StatusCode::OK, "healthy", quiz),
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            let empty = QuizHealth { chats: 0, subscribers: 0, words: 0 };
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", empty)
        }
    };

    let uptime_seconds = u64::try_from(
        Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
    )
    .unwrap_or(0);

    let body = HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: status.to_string(),
            connection_pool_size: state.db.pool.size(),
            response_time_ms,
        },
        quiz,
        uptime_seconds,
    };
    (code, Json(body))
}

/// Ready once the database answers and holds at least one word to quiz on
async fn readiness_check(
    State(state): State<HealthState>,
) -> Result<Json<&'static str>, (StatusCode, Json<&'static str>)> {
    match quiz_counts(&state.db).await {
        Ok(counts) if counts.words > 0 => Ok(Json("ready")),
        Ok(_) => Err((StatusCode::SERVICE_UNAVAILABLE, Json("no words imported"))),
        Err(_) => Err((StatusCode::SERVICE_UNAVAILABLE, Json("database unavailable"))),
    }
}

async fn liveness_check() -> Json<&'static str> {
    Json("alive")
}

async fn quiz_counts(db: &DatabaseManager) -> Result<QuizHealth, sqlx::Error> {
    Ok(QuizHealth {
        chats: Chat::count(&db.pool).await?,
        subscribers: Chat::count_subscribed(&db.pool).await?,
        words: Card::count(&db.pool).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use tempfile::TempDir;

    async fn health_server() -> (TestServer, Arc<DatabaseManager>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_url = format!("sqlite://{}", temp_dir.path().join("health.db").display());

        let db = Arc::new(
            DatabaseManager::new(&db_url)
                .await
                .expect("Failed to create test database"),
        );
        db.run_migrations().await.expect("Failed to run migrations");

        let server = TestServer::new(HealthService::new(db.clone()).router)
            .expect("Failed to create test server");
        (server, db, temp_dir)
    }

    #[tokio::test]
    async fn test_health_reports_quiz_counts() {
        let (server, db, _temp_dir) = health_server().await;

        let mut subscriber = Chat::new(42);
        subscriber.subscribed = true;
        subscriber.upsert(&db.pool).await.expect("Failed to save chat");
        Chat::new(43).upsert(&db.pool).await.expect("Failed to save chat");
        Card::new("der", "Tisch").upsert(&db.pool).await.expect("Failed to save word");

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let health: HealthResponse = response.json();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            health.quiz,
            QuizHealth { chats: 2, subscribers: 1, words: 1 }
        );
    }

    #[tokio::test]
    async fn test_not_ready_without_words() {
        let (server, db, _temp_dir) = health_server().await;

        let response = server.get("/health/ready").expect_failure().await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<String>(), "no words imported");

        Card::new("die", "Tür").upsert(&db.pool).await.expect("Failed to save word");

        let response = server.get("/health/ready").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<String>(), "ready");
    }

    #[tokio::test]
    async fn test_liveness_endpoint() {
        let (server, _db, _temp_dir) = health_server().await;

        let response = server.get("/health/live").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<String>(), "alive");
    }
}
