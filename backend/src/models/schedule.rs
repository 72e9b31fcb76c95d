use admission_shared::{NotificationStatus, PriorityLevel, ScheduleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::AppError;

const SCHEDULE_COLUMNS: &str = "id, academic_year_id, title, description, start_date, end_date, \
                                schedule_type, priority, is_active, remind_before, location, \
                                created_by, updated_by, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str = "id, schedule_id, user_id, type AS notification_type, status, \
                                    sent_at, error_message, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub academic_year_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub schedule_type: ScheduleType,
    pub priority: PriorityLevel,
    pub is_active: bool,
    /// Minutes before `start_date`.
    pub remind_before: Option<i32>,
    pub location: Option<String>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub academic_year_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub schedule_type: ScheduleType,
    pub priority: PriorityLevel,
    pub remind_before: Option<i32>,
    pub location: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct ScheduleChanges {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub schedule_type: ScheduleType,
    pub priority: PriorityLevel,
    pub remind_before: Option<i32>,
    pub location: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ScheduleNotification {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn has_started_at(&self, now: DateTime<Utc>) -> bool {
        now > self.start_date
    }

    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }

    pub fn is_ongoing_at(&self, now: DateTime<Utc>) -> bool {
        self.has_started_at(now) && !self.has_ended_at(now)
    }

    pub fn has_started(&self) -> bool {
        self.has_started_at(Utc::now())
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended_at(Utc::now())
    }

    pub fn is_ongoing(&self) -> bool {
        self.is_ongoing_at(Utc::now())
    }

    /// Whole days until start, negative once started.
    pub fn days_until_start_at(&self, now: DateTime<Utc>) -> i64 {
        (self.start_date - now).num_days()
    }

    pub fn days_until_start(&self) -> i64 {
        self.days_until_start_at(Utc::now())
    }

    /// Half-open interval test: `[s1, e1)` and `[s2, e2)` intersect iff `s1 < e2 && s2 < e1`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_date < end && start < self.end_date
    }

    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, new: &NewSchedule) -> Result<Self, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            INSERT INTO schedules
                (academic_year_id, title, description, start_date, end_date, schedule_type,
                 priority, is_active, remind_before, location, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10)
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(new.academic_year_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.schedule_type)
        .bind(new.priority)
        .bind(new.remind_before)
        .bind(&new.location)
        .bind(new.created_by)
        .fetch_one(executor)
        .await?;

        Ok(schedule)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(schedule)
    }

    pub async fn find_all<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let schedules = sqlx::query_as::<_, Schedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY start_date ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(schedules)
    }

    pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schedules")
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    pub async fn find_by_academic_year<'e, E: PgExecutor<'e>>(
        executor: E,
        academic_year_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let schedules = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE academic_year_id = $1
            ORDER BY start_date ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(academic_year_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(schedules)
    }

    pub async fn count_by_academic_year<'e, E: PgExecutor<'e>>(
        executor: E,
        academic_year_id: Uuid,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM schedules WHERE academic_year_id = $1",
        )
        .bind(academic_year_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    pub async fn find_upcoming<'e, E: PgExecutor<'e>>(
        executor: E,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, AppError> {
        let schedules = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE is_active = TRUE AND end_date > $1
            ORDER BY start_date ASC
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(schedules)
    }

    /// Active schedules intersecting `[start, end)`, optionally ignoring one id.
    pub async fn find_overlapping<'e, E: PgExecutor<'e>>(
        executor: E,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Self>, AppError> {
        let schedules = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE is_active = TRUE
              AND start_date < $2
              AND $1 < end_date
              AND ($3::uuid IS NULL OR id <> $3)
            ORDER BY start_date ASC
            "#
        ))
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_all(executor)
        .await?;

        Ok(schedules)
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        changes: &ScheduleChanges,
    ) -> Result<Option<Self>, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedules
            SET title = $2, description = $3, start_date = $4, end_date = $5,
                schedule_type = $6, priority = $7, remind_before = $8, location = $9,
                updated_by = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.schedule_type)
        .bind(changes.priority)
        .bind(changes.remind_before)
        .bind(&changes.location)
        .bind(changes.updated_by)
        .fetch_optional(executor)
        .await?;

        Ok(schedule)
    }

    pub async fn set_status<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedules SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;

        Ok(schedule)
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ScheduleNotification {
    /// Inserts one pending row per user in a single statement.
    pub async fn create_batch<'e, E: PgExecutor<'e>>(
        executor: E,
        schedule_id: Uuid,
        user_ids: &[Uuid],
        notification_type: &str,
    ) -> Result<Vec<Self>, AppError> {
        let notifications = sqlx::query_as::<_, ScheduleNotification>(&format!(
            r#"
            INSERT INTO schedule_notifications (schedule_id, user_id, type, status)
            SELECT $1, user_id, $2, 'pending'
            FROM UNNEST($3::uuid[]) AS t(user_id)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(schedule_id)
        .bind(notification_type)
        .bind(user_ids)
        .fetch_all(executor)
        .await?;

        Ok(notifications)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let notification = sqlx::query_as::<_, ScheduleNotification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM schedule_notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(notification)
    }

    pub async fn find_by_schedule<'e, E: PgExecutor<'e>>(
        executor: E,
        schedule_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let notifications = sqlx::query_as::<_, ScheduleNotification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM schedule_notifications
            WHERE schedule_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(schedule_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(notifications)
    }

    pub async fn count_by_schedule<'e, E: PgExecutor<'e>>(
        executor: E,
        schedule_id: Uuid,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM schedule_notifications WHERE schedule_id = $1",
        )
        .bind(schedule_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    pub async fn find_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
    ) -> Result<Vec<Self>, AppError> {
        let notifications = sqlx::query_as::<_, ScheduleNotification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM schedule_notifications
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(notifications)
    }

    /// Moves a pending notification to `sent`. `None` if it is missing or no longer pending.
    pub async fn mark_sent<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<Self>, AppError> {
        let notification = sqlx::query_as::<_, ScheduleNotification>(&format!(
            r#"
            UPDATE schedule_notifications
            SET status = 'sent', sent_at = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(sent_at)
        .fetch_optional(executor)
        .await?;

        Ok(notification)
    }

    pub async fn mark_failed<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        error_message: &str,
    ) -> Result<Option<Self>, AppError> {
        let notification = sqlx::query_as::<_, ScheduleNotification>(&format!(
            r#"
            UPDATE schedule_notifications
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(error_message)
        .fetch_optional(executor)
        .await?;

        Ok(notification)
    }

    pub async fn delete_by_schedule<'e, E: PgExecutor<'e>>(
        executor: E,
        schedule_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM schedule_notifications WHERE schedule_id = $1")
            .bind(schedule_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
