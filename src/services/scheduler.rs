use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::bot::controller::SessionController;
use crate::bot::messenger::Messenger;
use crate::database::repository::ChatRepository;
use crate::utils::datetime::{advance_by_one_day, format_datetime, truncate_to_minute};
use crate::utils::logging::{log_system_event, log_timeout};

/// Fires at second zero of every minute
const EVERY_MINUTE: &str = "0 * * * * *";
const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);
/// How far back swept minutes are remembered
const SWEPT_WINDOW_HOURS: i64 = 3;

/// What one sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Local wall-clock minute that was swept
    pub minute: Option<NaiveDateTime>,
    /// Distinct chats due at that minute
    pub due: usize,
    pub started: usize,
    pub failed: usize,
    /// `true` when the minute had already been swept
    pub skipped: bool,
}

/// Finds the chats due at a given minute and starts their daily quiz.
pub struct DailyQuizSweep<R, M> {
    controller: Arc<SessionController<R, M>>,
    chat_timeout: Duration,
    swept_minutes: Mutex<BTreeSet<NaiveDateTime>>,
}

impl<R: ChatRepository, M: Messenger> DailyQuizSweep<R, M> {
    pub fn new(controller: Arc<SessionController<R, M>>) -> Self {
        Self {
            controller,
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            swept_minutes: Mutex::new(BTreeSet::new()),
        }
    }

    /// Upper bound for one chat's quiz start
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Starts one daily quiz per chat whose slot matches `now` truncated to the minute.
    ///
    /// A minute is swept at most once, so a retried or late tick does not send a
    /// second quiz. Per-chat failures are logged and counted, never propagated.
    pub async fn sweep<Tz>(&self, now: &DateTime<Tz>) -> SweepReport
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let minute = truncate_to_minute(now);
        let minute_key = minute.naive_local();
        let slot = NaiveTime::from_hms_opt(minute.hour(), minute.minute(), 0);
        let next_fire = advance_by_one_day(&minute, now).map(|t| format_datetime(&t));

        let mut report = SweepReport {
            minute: Some(minute_key),
            ..SweepReport::default()
        };

        if !self.claim_minute(minute_key) {
            tracing::debug!("Minute {} already swept, skipping", minute_key);
            report.skipped = true;
            return report;
        }

        let Some(slot) = slot else {
            return report;
        };

        let due = match self.controller.repo().list_due_subscriptions(slot).await {
            Ok(ids) => ids.into_iter().collect::<BTreeSet<i64>>(),
            Err(e) => {
                tracing::error!("Failed to list due chats for {}: {}", minute_key, e);
                // Let a retried tick for this minute try again
                self.release_minute(minute_key);
                report.failed = 1;
                return report;
            }
        };
        report.due = due.len();

        if due.is_empty() {
            return report;
        }
        tracing::info!("{} chat(s) due for the {} daily quiz", due.len(), minute_key);

        let mut tasks = JoinSet::new();
        for chat_id in due {
            let controller = self.controller.clone();
            let timeout = self.chat_timeout;
            tasks.spawn(async move {
                let outcome = tokio::time::timeout(timeout, controller.on_daily_quiz(chat_id)).await;
                (chat_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((chat_id, Ok(Ok(())))) => {
                    report.started += 1;
                    if let Some(next) = &next_fire {
                        tracing::debug!("Daily quiz sent to chat {}, next one {}", chat_id, next);
                    }
                }
                Ok((chat_id, Ok(Err(e)))) => {
                    report.failed += 1;
                    self.controller.report("daily_quiz", chat_id, &e).await;
                }
                Ok((chat_id, Err(_elapsed))) => {
                    report.failed += 1;
                    log_timeout(
                        "daily_quiz",
                        self.chat_timeout.as_secs(),
                        Some(&format!("chat {chat_id}")),
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Daily quiz task panicked: {}", e);
                }
            }
        }

        log_system_event(
            "daily sweep",
            Some(&format!(
                "{}: {} due, {} started, {} failed",
                minute_key, report.due, report.started, report.failed
            )),
        );
        report
    }

    fn claim_minute(&self, minute: NaiveDateTime) -> bool {
        let Ok(mut swept) = self.swept_minutes.lock() else {
            return true;
        };
        if !swept.insert(minute) {
            return false;
        }
        if let Some(newest) = swept.last().copied() {
            let horizon = newest - chrono::Duration::hours(SWEPT_WINDOW_HOURS);
            *swept = swept.split_off(&horizon);
        }
        true
    }

    fn release_minute(&self, minute: NaiveDateTime) {
        if let Ok(mut swept) = self.swept_minutes.lock() {
            swept.remove(&minute);
        }
    }
}

/// Runs [`DailyQuizSweep`] on the local clock once a minute.
pub struct DailyQuizScheduler<R, M> {
    sweep: Arc<DailyQuizSweep<R, M>>,
    scheduler: JobScheduler,
}

impl<R: ChatRepository, M: Messenger> DailyQuizScheduler<R, M> {
    pub async fn new(
        sweep: Arc<DailyQuizSweep<R, M>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self { sweep, scheduler })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let sweep = self.sweep.clone();

        let job = Job::new_async(EVERY_MINUTE, move |_uuid, _l| {
            let sweep = sweep.clone();
            Box::pin(async move {
                sweep.sweep(&Local::now()).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        tracing::info!("Daily quiz scheduler started - checking every minute");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Sweeps the current minute right away, outside the cron tick
    pub async fn sweep_now(&self) -> SweepReport {
        self.sweep.sweep(&Local::now()).await
    }
}
