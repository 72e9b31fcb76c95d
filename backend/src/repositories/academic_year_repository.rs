use admission_shared::{CreateAcademicYearRequest, UpdateAcademicYearRequest};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AcademicYear;

pub(crate) const ACTIVE_YEAR_TAKEN: &str = "Another academic year is already active";
pub(crate) const ACADEMIC_YEAR_IN_USE: &str = "Academic year still has quotas or schedules";

#[async_trait]
pub trait AcademicYearRepository: Send + Sync {
    async fn create(&self, request: &CreateAcademicYearRequest) -> Result<AcademicYear, AppError>;

    /// Newest `year_start` first, with the total row count.
    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<AcademicYear>, i64), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AcademicYear>, AppError>;

    async fn find_active(&self) -> Result<Option<AcademicYear>, AppError>;

    async fn update(
        &self,
        id: Uuid,
        request: &UpdateAcademicYearRequest,
    ) -> Result<Option<AcademicYear>, AppError>;

    /// Removes an inactive year. Returns false when the year is missing or active,
    /// and fails with `Conflict` while quotas or schedules still reference it.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Deactivates every year and activates `id` as one atomic step.
    async fn set_active(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_inactive(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgAcademicYearRepository {
    pool: PgPool,
}

impl PgAcademicYearRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcademicYearRepository for PgAcademicYearRepository {
    async fn create(&self, request: &CreateAcademicYearRequest) -> Result<AcademicYear, AppError> {
        AcademicYear::create(&self.pool, request)
            .await
            .map_err(|e| AppError::from_unique_violation(e, ACTIVE_YEAR_TAKEN))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<AcademicYear>, i64), AppError> {
        let years = AcademicYear::find_all(&self.pool, limit, offset).await?;
        let total = AcademicYear::count(&self.pool).await?;
        Ok((years, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AcademicYear>, AppError> {
        AcademicYear::find_by_id(&self.pool, id).await
    }

    async fn find_active(&self) -> Result<Option<AcademicYear>, AppError> {
        AcademicYear::find_active(&self.pool).await
    }

    async fn update(
        &self,
        id: Uuid,
        request: &UpdateAcademicYearRequest,
    ) -> Result<Option<AcademicYear>, AppError> {
        AcademicYear::update(&self.pool, id, request).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        AcademicYear::delete_inactive(&self.pool, id)
            .await
            .map_err(|e| AppError::from_foreign_key_violation(e, ACADEMIC_YEAR_IN_USE))
    }

    async fn set_active(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        AcademicYear::deactivate_all(&mut *tx).await?;
        // A concurrent switch that committed first trips the single-active index.
        let activated = AcademicYear::set_active_flag(&mut *tx, id, true)
            .await
            .map_err(|e| AppError::from_unique_violation(e, ACTIVE_YEAR_TAKEN))?;

        if !activated {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_inactive(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(AcademicYear::set_active_flag(&self.pool, id, false).await?)
    }
}
