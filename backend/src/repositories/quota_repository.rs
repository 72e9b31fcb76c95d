use admission_shared::QuotaActionType;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{MajorQuota, MajorQuotaLog, NewMajorQuota, NewMajorQuotaLog};

pub(crate) const DUPLICATE_QUOTA: &str = "Quota already exists for this major and academic year";

/// Storage for quotas and their audit trail.
///
/// Every mutating method writes its log entry atomically with the change.
/// Fill adjustments are conditional at the storage layer: `None` signals that
/// the bound held (full on increase, zero on decrease) or the quota is missing.
#[async_trait]
pub trait QuotaRepository: Send + Sync {
    async fn create(&self, new: NewMajorQuota) -> Result<MajorQuota, AppError>;

    /// Newest first, with the total row count.
    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<MajorQuota>, i64), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MajorQuota>, AppError>;

    async fn find_by_major_and_year(
        &self,
        major_id: Uuid,
        academic_year_id: Uuid,
    ) -> Result<Option<MajorQuota>, AppError>;

    /// `None` when the quota is missing or `total_quota` would drop below `filled_quota`.
    async fn update(
        &self,
        id: Uuid,
        total_quota: i32,
        notes: Option<String>,
        actor: Uuid,
    ) -> Result<Option<MajorQuota>, AppError>;

    /// Removes an unfilled quota and its logs. False when missing or filled.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn increase_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError>;

    async fn decrease_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError>;

    async fn reset_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError>;

    /// Newest first, with the total log count for the quota.
    async fn find_logs(
        &self,
        quota_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MajorQuotaLog>, i64), AppError>;
}

#[derive(Clone)]
pub struct PgQuotaRepository {
    pool: PgPool,
}

impl PgQuotaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaRepository for PgQuotaRepository {
    async fn create(&self, new: NewMajorQuota) -> Result<MajorQuota, AppError> {
        let mut tx = self.pool.begin().await?;

        let quota = MajorQuota::create(&mut *tx, &new)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_QUOTA))?;

        let log = NewMajorQuotaLog::transition(QuotaActionType::Create, None, &quota, new.created_by);
        MajorQuotaLog::create(&mut *tx, &log).await?;

        tx.commit().await?;
        Ok(quota)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<MajorQuota>, i64), AppError> {
        let quotas = MajorQuota::find_all(&self.pool, limit, offset).await?;
        let total = MajorQuota::count(&self.pool).await?;
        Ok((quotas, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MajorQuota>, AppError> {
        MajorQuota::find_by_id(&self.pool, id).await
    }

    async fn find_by_major_and_year(
        &self,
        major_id: Uuid,
        academic_year_id: Uuid,
    ) -> Result<Option<MajorQuota>, AppError> {
        MajorQuota::find_by_major_and_year(&self.pool, major_id, academic_year_id).await
    }

    async fn update(
        &self,
        id: Uuid,
        total_quota: i32,
        notes: Option<String>,
        actor: Uuid,
    ) -> Result<Option<MajorQuota>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = MajorQuota::find_by_id_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };

        let Some(after) =
            MajorQuota::update_total(&mut *tx, id, total_quota, notes.as_deref(), actor).await?
        else {
            return Ok(None);
        };

        let log = NewMajorQuotaLog::transition(QuotaActionType::Update, Some(&before), &after, actor);
        MajorQuotaLog::create(&mut *tx, &log).await?;

        tx.commit().await?;
        Ok(Some(after))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let logs = MajorQuotaLog::delete_by_quota(&mut *tx, id).await?;
        let deleted = MajorQuota::delete_unfilled(&mut *tx, id).await?;

        if !deleted {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!("Removed {} log entries with quota {}", logs, id);
        Ok(true)
    }

    async fn increase_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(after) = MajorQuota::increment_filled(&mut *tx, id, actor).await? else {
            return Ok(None);
        };

        let log = fill_log(QuotaActionType::Increase, &after, after.filled_quota - 1, actor);
        MajorQuotaLog::create(&mut *tx, &log).await?;

        tx.commit().await?;
        Ok(Some(after))
    }

    async fn decrease_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(after) = MajorQuota::decrement_filled(&mut *tx, id, actor).await? else {
            return Ok(None);
        };

        let log = fill_log(QuotaActionType::Decrease, &after, after.filled_quota + 1, actor);
        MajorQuotaLog::create(&mut *tx, &log).await?;

        tx.commit().await?;
        Ok(Some(after))
    }

    async fn reset_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = MajorQuota::find_by_id_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        let Some(after) = MajorQuota::reset_filled(&mut *tx, id, actor).await? else {
            return Ok(None);
        };

        let log = NewMajorQuotaLog::transition(QuotaActionType::Reset, Some(&before), &after, actor);
        MajorQuotaLog::create(&mut *tx, &log).await?;

        tx.commit().await?;
        Ok(Some(after))
    }

    async fn find_logs(
        &self,
        quota_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MajorQuotaLog>, i64), AppError> {
        let logs = MajorQuotaLog::find_by_quota(&self.pool, quota_id, limit, offset).await?;
        let total = MajorQuotaLog::count_by_quota(&self.pool, quota_id).await?;
        Ok((logs, total))
    }
}

/// Log entry for a single-step fill change, where the prior count is implied by the returned row.
pub(crate) fn fill_log(
    action_type: QuotaActionType,
    after: &MajorQuota,
    old_filled: i32,
    actor: Uuid,
) -> NewMajorQuotaLog {
    NewMajorQuotaLog {
        major_quota_id: after.id,
        action_type,
        old_total_quota: Some(after.total_quota),
        new_total_quota: after.total_quota,
        old_filled_quota: Some(old_filled),
        new_filled_quota: after.filled_quota,
        notes: after.notes.clone(),
        created_by: actor,
    }
}
