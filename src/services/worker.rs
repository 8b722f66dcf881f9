use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Config;
use crate::database::{connection::DatabaseManager, models::*};
use crate::services::notifications::{send_event_reminder, send_node_poll, send_weekly_summary};
use crate::services::schedule::{
    should_cleanup_photos, should_send_event_reminder, should_send_poll, should_send_weekly_summary,
};
use crate::services::telegram::{ensure_webhook, TelegramApi};
use crate::utils::logging::{log_job_error, log_job_sent, log_system_event};

/// Every 30 seconds, so each minute of the day is seen at least once.
const TICK_SCHEDULE: &str = "*/30 * * * * *";
pub const DEFAULT_MAX_PHOTOS: i64 = 500;

/// Periodic jobs: weekly polls, event reminders, the weekly summary and
/// photo cleanup.
#[derive(Clone)]
pub struct Worker<T: TelegramApi> {
    telegram: T,
    db: Arc<DatabaseManager>,
    config: Arc<Config>,
    max_photos: i64,
    /// Held for a whole tick; shared by clones so scheduled runs never overlap.
    tick_lock: Arc<Mutex<()>>,
}

impl<T: TelegramApi> Worker<T> {
    pub fn new(telegram: T, db: Arc<DatabaseManager>, config: Arc<Config>) -> Self {
        Self {
            telegram,
            db,
            config,
            max_photos: DEFAULT_MAX_PHOTOS,
            tick_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_max_photos(mut self, max_photos: i64) -> Self {
        self.max_photos = max_photos;
        self
    }

    /// Checks the webhook once, then schedules the tick job. The returned
    /// scheduler keeps running until shut down.
    pub async fn start(&self) -> Result<JobScheduler> {
        if let Err(e) = ensure_webhook(&self.telegram, &self.config).await {
            log_job_error("webhook", "startup", &e);
        }

        let scheduler = JobScheduler::new().await?;
        let worker = self.clone();

        let tick_job = Job::new_async(TICK_SCHEDULE, move |_uuid, _l| {
            let worker = worker.clone();
            Box::pin(async move {
                if let Err(e) = worker.check_all_nodes(Utc::now()).await {
                    log_job_error("tick", "all nodes", &e);
                }
            })
        })?;

        scheduler.add(tick_job).await?;
        scheduler.start().await?;

        log_system_event("Worker started", Some("checking every 30 seconds"));
        Ok(scheduler)
    }

    /// One tick: every node with a group, then the global jobs. Returns
    /// `false` without doing anything while another tick is still running.
    pub async fn check_all_nodes(&self, now: DateTime<Utc>) -> Result<bool> {
        let Ok(_tick) = self.tick_lock.try_lock() else {
            tracing::warn!("Previous tick still running, skipping tick at {}", now);
            return Ok(false);
        };

        for node in Node::find_with_group(&self.db.pool).await? {
            self.process_node_poll(&node, now).await;
            self.process_node_events(&node, now).await?;
        }

        self.process_weekly_summary(now).await?;
        self.process_photo_cleanup(now).await;
        Ok(true)
    }

    /// Returns whether a poll went out.
    pub async fn process_node_poll(&self, node: &Node, now: DateTime<Utc>) -> bool {
        if !should_send_poll(node.last_poll_sent_at, now) {
            return false;
        }

        let result = async {
            send_node_poll(&self.telegram, &self.db.pool, node, now).await?;
            Node::mark_poll_sent(&self.db.pool, node.id, now).await?;
            anyhow::Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                log_job_sent("poll", &node.name);
                true
            }
            Err(e) => {
                log_job_error("poll", &node.name, &e);
                false
            }
        }
    }

    /// Returns how many reminders went out.
    pub async fn process_node_events(&self, node: &Node, now: DateTime<Utc>) -> Result<usize> {
        let tz = node.tz();
        let event_day = node.event_weekday();
        let mut sent = 0;

        for event in Event::find_by_node(&self.db.pool, node.id).await? {
            if !should_send_event_reminder(event.time, event.last_reminder_sent_at, event_day, tz, now) {
                continue;
            }

            let target = format!("{} {}", node.name, event.kind);
            let result = async {
                send_event_reminder(&self.telegram, &self.db.pool, node, &event).await?;
                Event::mark_reminder_sent(&self.db.pool, event.id, now).await?;
                anyhow::Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    log_job_sent("reminder", &target);
                    sent += 1;
                }
                Err(e) => log_job_error("reminder", &target, &e),
            }
        }

        Ok(sent)
    }

    /// Returns whether a summary went out. Needs the global chat configured
    /// and already known as a group.
    pub async fn process_weekly_summary(&self, now: DateTime<Utc>) -> Result<bool> {
        let Some(global_chat_id) = self.config.global_chat_id else {
            return Ok(false);
        };
        let Some(global_group) = Group::find_by_telegram_id(&self.db.pool, global_chat_id).await? else {
            return Ok(false);
        };

        if !should_send_weekly_summary(global_group.last_weekly_summary_sent_at, now) {
            return Ok(false);
        }

        let result = async {
            let sent = send_weekly_summary(&self.telegram, &self.db.pool, &global_group, now).await?;
            if sent {
                Group::mark_weekly_summary_sent(&self.db.pool, global_group.id, now).await?;
            }
            anyhow::Ok(sent)
        }
        .await;

        match result {
            Ok(sent) => {
                if sent {
                    log_job_sent("weekly summary", &global_group.display_name);
                }
                Ok(sent)
            }
            Err(e) => {
                log_job_error("weekly summary", &global_group.display_name, &e);
                Ok(false)
            }
        }
    }

    /// Keeps only the newest photos. Returns how many were deleted.
    pub async fn process_photo_cleanup(&self, now: DateTime<Utc>) -> u64 {
        if !should_cleanup_photos(now) {
            return 0;
        }

        match Photo::prune_oldest(&self.db.pool, self.max_photos).await {
            Ok(removed) => {
                if removed > 0 {
                    log_system_event("Photo cleanup", Some(&format!("removed {} photos", removed)));
                }
                removed
            }
            Err(e) => {
                log_job_error("photo cleanup", "photos", &anyhow::Error::from(e));
                0
            }
        }
    }
}
