use admission_shared::{CreateAcademicYearRequest, PaginationMeta, UpdateAcademicYearRequest};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{page_offset, AcademicYear};
use crate::repositories::{AcademicYearRepository, Repositories};
use crate::utils::validate_request;

#[cfg(test)]
mod tests;

/// Academic year lifecycle, including the single-active-year rule.
#[derive(Clone)]
pub struct AcademicYearService {
    academic_years: Arc<dyn AcademicYearRepository>,
}

fn check_ranges(
    year_start: i32,
    year_end: i32,
    registration_start: DateTime<Utc>,
    registration_end: DateTime<Utc>,
) -> Result<(), AppError> {
    if year_end <= year_start {
        return Err(AppError::Validation(
            "End year must be greater than start year".to_string(),
        ));
    }
    if registration_end <= registration_start {
        return Err(AppError::Validation(
            "Registration end must be after registration start".to_string(),
        ));
    }
    Ok(())
}

impl AcademicYearService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            academic_years: repositories.academic_years.clone(),
        }
    }

    pub async fn create(&self, request: CreateAcademicYearRequest) -> Result<AcademicYear, AppError> {
        validate_request(&request)?;
        check_ranges(
            request.year_start,
            request.year_end,
            request.registration_start,
            request.registration_end,
        )?;

        if request.is_active && self.academic_years.find_active().await?.is_some() {
            return Err(AppError::Conflict(
                "Another academic year is already active".to_string(),
            ));
        }

        let year = self.academic_years.create(&request).await?;
        info!("Created academic year {} ({})", year.formatted_name(), year.id);
        Ok(year)
    }

    pub async fn get_all(&self, page: i64, limit: i64) -> Result<(Vec<AcademicYear>, PaginationMeta), AppError> {
        let (years, total) = self
            .academic_years
            .find_all(limit, page_offset(page, limit))
            .await?;
        Ok((years, PaginationMeta::new(page, limit, total)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<AcademicYear, AppError> {
        self.academic_years
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Academic year not found".to_string()))
    }

    pub async fn get_active(&self) -> Result<AcademicYear, AppError> {
        self.academic_years
            .find_active()
            .await?
            .ok_or_else(|| AppError::NotFound("No active academic year".to_string()))
    }

    pub async fn update(&self, id: Uuid, request: UpdateAcademicYearRequest) -> Result<AcademicYear, AppError> {
        validate_request(&request)?;
        check_ranges(
            request.year_start,
            request.year_end,
            request.registration_start,
            request.registration_end,
        )?;

        let year = self
            .academic_years
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Academic year not found".to_string()))?;

        info!("Updated academic year {}", id);
        Ok(year)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let year = self.get_by_id(id).await?;
        if year.is_active {
            return Err(AppError::Conflict(
                "Cannot delete an active academic year".to_string(),
            ));
        }

        if !self.academic_years.delete(id).await? {
            return Err(AppError::Conflict(
                "Academic year changed while deleting, try again".to_string(),
            ));
        }

        info!("Deleted academic year {}", id);
        Ok(())
    }

    /// Activating a year deactivates every other year atomically.
    pub async fn set_status(&self, id: Uuid, is_active: bool) -> Result<AcademicYear, AppError> {
        let changed = if is_active {
            self.academic_years.set_active(id).await?
        } else {
            self.academic_years.set_inactive(id).await?
        };

        if !changed {
            return Err(AppError::NotFound("Academic year not found".to_string()));
        }

        info!("Academic year {} is_active={}", id, is_active);
        self.get_by_id(id).await
    }
}
