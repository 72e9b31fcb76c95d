use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewSchedule, Schedule, ScheduleChanges, ScheduleNotification};

/// Advisory lock key serializing schedule placement across connections.
const SCHEDULE_PLACEMENT_LOCK: i64 = 0x5343_4844;

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Inserts an active schedule. Fails with `Overlap` if an active schedule
    /// claims an intersecting window at write time.
    async fn create(&self, new: NewSchedule) -> Result<Schedule, AppError>;

    /// Ordered by start date, with the total row count.
    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<Schedule>, i64), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError>;

    async fn find_by_academic_year(
        &self,
        academic_year_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Schedule>, i64), AppError>;

    /// Active schedules ending after `now`, soonest start first.
    async fn find_upcoming(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, AppError>;

    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Schedule>, AppError>;

    /// Same overlap guarantee as `create`, ignoring the schedule itself.
    async fn update(&self, id: Uuid, changes: ScheduleChanges) -> Result<Option<Schedule>, AppError>;

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<Option<Schedule>, AppError>;

    /// Removes the schedule and all of its notifications together.
    async fn delete_with_notifications(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_placement(conn: &mut sqlx::PgConnection) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEDULE_PLACEMENT_LOCK)
        .execute(conn)
        .await?;
    Ok(())
}

fn overlap_error(conflicts: &[Schedule]) -> AppError {
    AppError::Overlap {
        conflicting: conflicts.iter().map(|s| s.id).collect(),
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn create(&self, new: NewSchedule) -> Result<Schedule, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_placement(&mut *tx).await?;

        let conflicts = Schedule::find_overlapping(&mut *tx, new.start_date, new.end_date, None).await?;
        if !conflicts.is_empty() {
            return Err(overlap_error(&conflicts));
        }

        let schedule = Schedule::create(&mut *tx, &new).await?;
        tx.commit().await?;
        Ok(schedule)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<Schedule>, i64), AppError> {
        let schedules = Schedule::find_all(&self.pool, limit, offset).await?;
        let total = Schedule::count(&self.pool).await?;
        Ok((schedules, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError> {
        Schedule::find_by_id(&self.pool, id).await
    }

    async fn find_by_academic_year(
        &self,
        academic_year_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Schedule>, i64), AppError> {
        let schedules = Schedule::find_by_academic_year(&self.pool, academic_year_id, limit, offset).await?;
        let total = Schedule::count_by_academic_year(&self.pool, academic_year_id).await?;
        Ok((schedules, total))
    }

    async fn find_upcoming(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, AppError> {
        Schedule::find_upcoming(&self.pool, now, limit).await
    }

    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Schedule>, AppError> {
        Schedule::find_overlapping(&self.pool, start, end, exclude_id).await
    }

    async fn update(&self, id: Uuid, changes: ScheduleChanges) -> Result<Option<Schedule>, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_placement(&mut *tx).await?;

        let conflicts =
            Schedule::find_overlapping(&mut *tx, changes.start_date, changes.end_date, Some(id)).await?;
        if !conflicts.is_empty() {
            return Err(overlap_error(&conflicts));
        }

        let schedule = Schedule::update(&mut *tx, id, &changes).await?;
        tx.commit().await?;
        Ok(schedule)
    }

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<Option<Schedule>, AppError> {
        Schedule::set_status(&self.pool, id, is_active).await
    }

    async fn delete_with_notifications(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = ScheduleNotification::delete_by_schedule(&mut *tx, id).await?;
        let deleted = Schedule::delete(&mut *tx, id).await?;

        if !deleted {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!("Removed {} notification(s) with schedule {}", removed, id);
        Ok(true)
    }
}
