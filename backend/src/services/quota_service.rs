use admission_shared::{CreateMajorQuotaRequest, PaginationMeta, UpdateMajorQuotaRequest};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{page_offset, MajorQuota, MajorQuotaLog, NewMajorQuota};
use crate::repositories::{AcademicYearRepository, MajorRepository, QuotaRepository, Repositories};
use crate::utils::validate_request;


/// Per-major admission capacity with an audit trail.
///
/// Fill adjustments go straight to the repository's conditional update and
/// never read-modify-write, so concurrent callers cannot push `filled_quota`
/// outside `0..=total_quota`.
#[derive(Clone)]
pub struct QuotaService {
    quotas: Arc<dyn QuotaRepository>,
    academic_years: Arc<dyn AcademicYearRepository>,
    majors: Arc<dyn MajorRepository>,
}

impl QuotaService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            quotas: repositories.quotas.clone(),
            academic_years: repositories.academic_years.clone(),
            majors: repositories.majors.clone(),
        }
    }

    pub async fn create(&self, request: CreateMajorQuotaRequest, actor: Uuid) -> Result<MajorQuota, AppError> {
        validate_request(&request)?;

        let year = self
            .academic_years
            .find_by_id(request.academic_year_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Academic year not found".to_string()))?;
        if !year.is_active {
            return Err(AppError::Inactive("Academic year is not active".to_string()));
        }

        let major = self
            .majors
            .find_by_id(request.major_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Major not found".to_string()))?;
        if !major.is_active {
            return Err(AppError::Inactive("Major is not active".to_string()));
        }

        if self
            .quotas
            .find_by_major_and_year(major.id, year.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Quota already exists for this major and academic year".to_string(),
            ));
        }

        let quota = self
            .quotas
            .create(NewMajorQuota {
                academic_year_id: year.id,
                major_id: major.id,
                total_quota: request.total_quota,
                notes: request.notes,
                created_by: actor,
            })
            .await?;

        info!(
            "Created quota {} for major {} in {} (total {})",
            quota.id,
            major.code,
            year.formatted_name(),
            quota.total_quota
        );
        Ok(quota)
    }

    pub async fn get_all(&self, page: i64, limit: i64) -> Result<(Vec<MajorQuota>, PaginationMeta), AppError> {
        let (quotas, total) = self.quotas.find_all(limit, page_offset(page, limit)).await?;
        Ok((quotas, PaginationMeta::new(page, limit, total)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<MajorQuota, AppError> {
        self.quotas
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quota not found".to_string()))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateMajorQuotaRequest,
        actor: Uuid,
    ) -> Result<MajorQuota, AppError> {
        validate_request(&request)?;

        let current = self.get_by_id(id).await?;
        if request.total_quota < current.filled_quota {
            return Err(shrink_error(request.total_quota, current.filled_quota));
        }

        match self
            .quotas
            .update(id, request.total_quota, request.notes, actor)
            .await?
        {
            Some(quota) => {
                info!("Updated quota {} total {} -> {}", id, current.total_quota, quota.total_quota);
                Ok(quota)
            }
            // Filled count moved after the read above.
            None => {
                let latest = self.get_by_id(id).await?;
                Err(lost_update(request.total_quota, &latest))
            }
        }
    }

    /// Deletes an unfilled quota and its log entries together.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let quota = self.get_by_id(id).await?;
        if quota.filled_quota > 0 {
            return Err(AppError::Conflict(
                "Cannot delete a quota that has already been filled".to_string(),
            ));
        }

        if !self.quotas.delete(id).await? {
            self.get_by_id(id).await?;
            return Err(AppError::Conflict(
                "Cannot delete a quota that has already been filled".to_string(),
            ));
        }

        info!("Deleted quota {}", id);
        Ok(())
    }

    pub async fn increase_filled(&self, id: Uuid, actor: Uuid) -> Result<MajorQuota, AppError> {
        match self.quotas.increase_filled(id, actor).await? {
            Some(quota) => {
                info!("Quota {} filled {}/{}", id, quota.filled_quota, quota.total_quota);
                Ok(quota)
            }
            None => {
                self.get_by_id(id).await?;
                warn!("Quota {} is exhausted", id);
                Err(AppError::QuotaExhausted("Quota is already full".to_string()))
            }
        }
    }

    pub async fn decrease_filled(&self, id: Uuid, actor: Uuid) -> Result<MajorQuota, AppError> {
        match self.quotas.decrease_filled(id, actor).await? {
            Some(quota) => {
                info!("Quota {} filled {}/{}", id, quota.filled_quota, quota.total_quota);
                Ok(quota)
            }
            None => {
                self.get_by_id(id).await?;
                Err(AppError::Validation("Filled quota is already zero".to_string()))
            }
        }
    }

    pub async fn reset_filled(&self, id: Uuid, actor: Uuid) -> Result<MajorQuota, AppError> {
        let quota = self
            .quotas
            .reset_filled(id, actor)
            .await?
            .ok_or_else(|| AppError::NotFound("Quota not found".to_string()))?;

        info!("Reset filled count of quota {}", id);
        Ok(quota)
    }

    /// Newest entries first.
    pub async fn get_quota_logs(
        &self,
        quota_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<MajorQuotaLog>, PaginationMeta), AppError> {
        self.get_by_id(quota_id).await?;

        let (logs, total) = self
            .quotas
            .find_logs(quota_id, limit, page_offset(page, limit))
            .await?;
        Ok((logs, PaginationMeta::new(page, limit, total)))
    }

    /// Read-only admission precheck for a (major, academic year) pair.
    pub async fn validate_available_quota(&self, major_id: Uuid, academic_year_id: Uuid) -> Result<(), AppError> {
        let quota = self
            .quotas
            .find_by_major_and_year(major_id, academic_year_id)
            .await?
            .ok_or_else(|| AppError::NotQuotaSet("Quota has not been set for this major".to_string()))?;

        if !quota.has_capacity() {
            let name = self
                .majors
                .find_by_id(major_id)
                .await?
                .map(|m| m.name)
                .unwrap_or_else(|| major_id.to_string());
            return Err(AppError::QuotaExhausted(format!("Quota for major {} is full", name)));
        }

        Ok(())
    }
}

fn shrink_error(total_quota: i32, filled_quota: i32) -> AppError {
    AppError::Validation(format!(
        "Total quota ({}) cannot be less than filled quota ({})",
        total_quota, filled_quota
    ))
}

/// Error for a conditional total update that matched no row. The filled
/// count may have dropped again since, in which case the request was valid.
fn lost_update(total_quota: i32, latest: &MajorQuota) -> AppError {
    if total_quota < latest.filled_quota {
        shrink_error(total_quota, latest.filled_quota)
    } else {
        AppError::Conflict("Quota changed concurrently, please retry".to_string())
    }
}
