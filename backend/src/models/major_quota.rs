use admission_shared::QuotaActionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::AppError;

const QUOTA_COLUMNS: &str = "id, academic_year_id, major_id, total_quota, filled_quota, \
                             remaining_quota, notes, created_by, updated_by, created_at, updated_at";
const LOG_COLUMNS: &str = "id, major_quota_id, action_type, old_total_quota, new_total_quota, \
                           old_filled_quota, new_filled_quota, notes, created_by, created_at";

/// Admission capacity for one major in one academic year.
///
/// `remaining_quota` is generated by the database and never written directly.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MajorQuota {
    pub id: Uuid,
    pub academic_year_id: Uuid,
    pub major_id: Uuid,
    pub total_quota: i32,
    pub filled_quota: i32,
    pub remaining_quota: i32,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMajorQuota {
    pub academic_year_id: Uuid,
    pub major_id: Uuid,
    pub total_quota: i32,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Append-only audit entry for a quota mutation.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MajorQuotaLog {
    pub id: Uuid,
    pub major_quota_id: Uuid,
    pub action_type: QuotaActionType,
    pub old_total_quota: Option<i32>,
    pub new_total_quota: i32,
    pub old_filled_quota: Option<i32>,
    pub new_filled_quota: i32,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMajorQuotaLog {
    pub major_quota_id: Uuid,
    pub action_type: QuotaActionType,
    pub old_total_quota: Option<i32>,
    pub new_total_quota: i32,
    pub old_filled_quota: Option<i32>,
    pub new_filled_quota: i32,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

impl NewMajorQuotaLog {
    /// Log entry describing a transition from `before` to `after`.
    pub fn transition(
        action_type: QuotaActionType,
        before: Option<&MajorQuota>,
        after: &MajorQuota,
        actor: Uuid,
    ) -> Self {
        Self {
            major_quota_id: after.id,
            action_type,
            old_total_quota: before.map(|q| q.total_quota),
            new_total_quota: after.total_quota,
            old_filled_quota: before.map(|q| q.filled_quota),
            new_filled_quota: after.filled_quota,
            notes: after.notes.clone(),
            created_by: actor,
        }
    }
}

impl MajorQuota {
    pub fn has_capacity(&self) -> bool {
        self.filled_quota < self.total_quota
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        new: &NewMajorQuota,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MajorQuota>(&format!(
            r#"
            INSERT INTO major_quotas (academic_year_id, major_id, total_quota, notes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {QUOTA_COLUMNS}
            "#
        ))
        .bind(new.academic_year_id)
        .bind(new.major_id)
        .bind(new.total_quota)
        .bind(&new.notes)
        .bind(new.created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            "SELECT {QUOTA_COLUMNS} FROM major_quotas WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    /// Row-locking read used before mutations that must see a stable `filled_quota`.
    pub async fn find_by_id_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            "SELECT {QUOTA_COLUMNS} FROM major_quotas WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    pub async fn find_by_major_and_year<'e, E: PgExecutor<'e>>(
        executor: E,
        major_id: Uuid,
        academic_year_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            "SELECT {QUOTA_COLUMNS} FROM major_quotas WHERE major_id = $1 AND academic_year_id = $2"
        ))
        .bind(major_id)
        .bind(academic_year_id)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    pub async fn find_all<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let quotas = sqlx::query_as::<_, MajorQuota>(&format!(
            "SELECT {QUOTA_COLUMNS} FROM major_quotas ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(quotas)
    }

    pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM major_quotas")
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    /// Only applies when the new total still covers the filled count.
    pub async fn update_total<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        total_quota: i32,
        notes: Option<&str>,
        updated_by: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            r#"
            UPDATE major_quotas
            SET total_quota = $2, notes = $3, updated_by = $4, updated_at = NOW()
            WHERE id = $1 AND filled_quota <= $2
            RETURNING {QUOTA_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(total_quota)
        .bind(notes)
        .bind(updated_by)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    /// Conditional increment. `None` means the quota is full or missing.
    pub async fn increment_filled<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        updated_by: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            r#"
            UPDATE major_quotas
            SET filled_quota = filled_quota + 1, updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND filled_quota < total_quota
            RETURNING {QUOTA_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updated_by)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    /// Conditional decrement. `None` means the count is already zero or the quota is missing.
    pub async fn decrement_filled<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        updated_by: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            r#"
            UPDATE major_quotas
            SET filled_quota = filled_quota - 1, updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND filled_quota > 0
            RETURNING {QUOTA_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updated_by)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    pub async fn reset_filled<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        updated_by: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let quota = sqlx::query_as::<_, MajorQuota>(&format!(
            r#"
            UPDATE major_quotas
            SET filled_quota = 0, updated_by = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {QUOTA_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updated_by)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    pub async fn delete_unfilled<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM major_quotas WHERE id = $1 AND filled_quota = 0")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl MajorQuotaLog {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        new: &NewMajorQuotaLog,
    ) -> Result<Self, AppError> {
        let log = sqlx::query_as::<_, MajorQuotaLog>(&format!(
            r#"
            INSERT INTO major_quota_logs
                (major_quota_id, action_type, old_total_quota, new_total_quota,
                 old_filled_quota, new_filled_quota, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(new.major_quota_id)
        .bind(new.action_type)
        .bind(new.old_total_quota)
        .bind(new.new_total_quota)
        .bind(new.old_filled_quota)
        .bind(new.new_filled_quota)
        .bind(&new.notes)
        .bind(new.created_by)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    /// Newest first.
    pub async fn find_by_quota<'e, E: PgExecutor<'e>>(
        executor: E,
        major_quota_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let logs = sqlx::query_as::<_, MajorQuotaLog>(&format!(
            r#"
            SELECT {LOG_COLUMNS} FROM major_quota_logs
            WHERE major_quota_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(major_quota_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }

    pub async fn count_by_quota<'e, E: PgExecutor<'e>>(
        executor: E,
        major_quota_id: Uuid,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM major_quota_logs WHERE major_quota_id = $1",
        )
        .bind(major_quota_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    pub async fn delete_by_quota<'e, E: PgExecutor<'e>>(
        executor: E,
        major_quota_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM major_quota_logs WHERE major_quota_id = $1")
            .bind(major_quota_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
