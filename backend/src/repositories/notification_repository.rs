use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ScheduleNotification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// One pending row per user, written all-or-nothing.
    async fn create_batch(
        &self,
        schedule_id: Uuid,
        user_ids: &[Uuid],
        notification_type: &str,
    ) -> Result<Vec<ScheduleNotification>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleNotification>, AppError>;

    /// Newest first, with the total count for the schedule.
    async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleNotification>, i64), AppError>;

    /// Oldest first.
    async fn find_pending(&self, limit: i64) -> Result<Vec<ScheduleNotification>, AppError>;

    /// Transitions apply only from `pending`; `None` otherwise.
    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ScheduleNotification>, AppError>;

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
    ) -> Result<Option<ScheduleNotification>, AppError>;
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create_batch(
        &self,
        schedule_id: Uuid,
        user_ids: &[Uuid],
        notification_type: &str,
    ) -> Result<Vec<ScheduleNotification>, AppError> {
        ScheduleNotification::create_batch(&self.pool, schedule_id, user_ids, notification_type).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleNotification>, AppError> {
        ScheduleNotification::find_by_id(&self.pool, id).await
    }

    async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleNotification>, i64), AppError> {
        let notifications =
            ScheduleNotification::find_by_schedule(&self.pool, schedule_id, limit, offset).await?;
        let total = ScheduleNotification::count_by_schedule(&self.pool, schedule_id).await?;
        Ok((notifications, total))
    }

    async fn find_pending(&self, limit: i64) -> Result<Vec<ScheduleNotification>, AppError> {
        ScheduleNotification::find_pending(&self.pool, limit).await
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ScheduleNotification>, AppError> {
        ScheduleNotification::mark_sent(&self.pool, id, sent_at).await
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
    ) -> Result<Option<ScheduleNotification>, AppError> {
        ScheduleNotification::mark_failed(&self.pool, id, error_message).await
    }
}
