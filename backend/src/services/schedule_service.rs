use admission_shared::{
    CreateScheduleRequest, PaginationMeta, PriorityLevel, ScheduleType, UpdateScheduleRequest,
    NOTIFICATION_DELIVERY_EMAIL,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{page_offset, NewSchedule, Schedule, ScheduleChanges, ScheduleNotification};
use crate::repositories::{
    AcademicYearRepository, NotificationRepository, Repositories, ScheduleRepository,
};
use crate::utils::validate_request;

#[cfg(test)]
mod tests;

/// Admission event placement and notification bookkeeping.
///
/// Active schedules may not overlap anywhere in the system. The check here
/// reports conflicts early; the repository repeats it atomically with the write.
#[derive(Clone)]
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleRepository>,
    notifications: Arc<dyn NotificationRepository>,
    academic_years: Arc<dyn AcademicYearRepository>,
}

fn parse_kind(schedule_type: &str, priority: &str) -> Result<(ScheduleType, PriorityLevel), AppError> {
    let schedule_type = schedule_type
        .parse::<ScheduleType>()
        .map_err(|_| AppError::Validation(format!("Invalid schedule type: {}", schedule_type)))?;
    let priority = priority
        .parse::<PriorityLevel>()
        .map_err(|_| AppError::Validation(format!("Invalid priority level: {}", priority)))?;
    Ok((schedule_type, priority))
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    Ok(())
}

impl ScheduleService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            schedules: repositories.schedules.clone(),
            notifications: repositories.notifications.clone(),
            academic_years: repositories.academic_years.clone(),
        }
    }

    async fn require_active_year(&self, academic_year_id: Uuid) -> Result<(), AppError> {
        let year = self
            .academic_years
            .find_by_id(academic_year_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Academic year not found".to_string()))?;

        if !year.is_active {
            return Err(AppError::Inactive("Academic year is not active".to_string()));
        }
        Ok(())
    }

    async fn ensure_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let conflicts = self.schedules.find_overlapping(start, end, exclude_id).await?;
        if conflicts.is_empty() {
            return Ok(());
        }

        let conflicting: Vec<Uuid> = conflicts.iter().map(|s| s.id).collect();
        warn!("Schedule window {} - {} overlaps {:?}", start, end, conflicting);
        Err(AppError::Overlap { conflicting })
    }

    pub async fn create(&self, request: CreateScheduleRequest, actor: Uuid) -> Result<Schedule, AppError> {
        validate_request(&request)?;
        check_window(request.start_date, request.end_date)?;
        self.require_active_year(request.academic_year_id).await?;
        let (schedule_type, priority) = parse_kind(&request.schedule_type, &request.priority)?;
        self.ensure_free(request.start_date, request.end_date, None).await?;

        let schedule = self
            .schedules
            .create(NewSchedule {
                academic_year_id: request.academic_year_id,
                title: request.title,
                description: request.description,
                start_date: request.start_date,
                end_date: request.end_date,
                schedule_type,
                priority,
                remind_before: request.remind_before,
                location: request.location,
                created_by: actor,
            })
            .await?;

        info!("Created {} schedule {} starting {}", schedule.schedule_type, schedule.id, schedule.start_date);
        Ok(schedule)
    }

    pub async fn get_all(&self, page: i64, limit: i64) -> Result<(Vec<Schedule>, PaginationMeta), AppError> {
        let (schedules, total) = self.schedules.find_all(limit, page_offset(page, limit)).await?;
        Ok((schedules, PaginationMeta::new(page, limit, total)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Schedule, AppError> {
        self.schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))
    }

    pub async fn get_by_academic_year(
        &self,
        academic_year_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Schedule>, PaginationMeta), AppError> {
        let (schedules, total) = self
            .schedules
            .find_by_academic_year(academic_year_id, limit, page_offset(page, limit))
            .await?;
        Ok((schedules, PaginationMeta::new(page, limit, total)))
    }

    /// Re-runs every create-time check, with the schedule excluded from its own overlap test.
    pub async fn update(&self, id: Uuid, request: UpdateScheduleRequest, actor: Uuid) -> Result<Schedule, AppError> {
        validate_request(&request)?;
        check_window(request.start_date, request.end_date)?;

        let current = self.get_by_id(id).await?;
        self.require_active_year(current.academic_year_id).await?;
        let (schedule_type, priority) = parse_kind(&request.schedule_type, &request.priority)?;
        self.ensure_free(request.start_date, request.end_date, Some(id)).await?;

        let schedule = self
            .schedules
            .update(
                id,
                ScheduleChanges {
                    title: request.title,
                    description: request.description,
                    start_date: request.start_date,
                    end_date: request.end_date,
                    schedule_type,
                    priority,
                    remind_before: request.remind_before,
                    location: request.location,
                    updated_by: actor,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

        info!("Updated schedule {}", id);
        Ok(schedule)
    }

    /// Only schedules that have not started can be deleted; their notifications go with them.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let schedule = self.get_by_id(id).await?;
        if schedule.has_started() {
            return Err(AppError::Conflict(
                "Cannot delete a schedule that has already started".to_string(),
            ));
        }

        if !self.schedules.delete_with_notifications(id).await? {
            return Err(AppError::NotFound("Schedule not found".to_string()));
        }

        info!("Deleted schedule {}", id);
        Ok(())
    }

    pub async fn set_status(&self, id: Uuid, is_active: bool) -> Result<Schedule, AppError> {
        let schedule = self
            .schedules
            .set_status(id, is_active)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

        info!("Schedule {} is_active={}", id, is_active);
        Ok(schedule)
    }

    pub async fn get_upcoming(&self, limit: i64) -> Result<Vec<Schedule>, AppError> {
        self.schedules.find_upcoming(Utc::now(), limit).await
    }

    /// Queues one pending email notification per user, all-or-nothing.
    pub async fn create_notification(
        &self,
        schedule_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<ScheduleNotification>, AppError> {
        self.get_by_id(schedule_id).await?;
        if user_ids.is_empty() {
            return Err(AppError::Validation("At least one user is required".to_string()));
        }

        let notifications = self
            .notifications
            .create_batch(schedule_id, user_ids, NOTIFICATION_DELIVERY_EMAIL)
            .await?;

        info!("Queued {} notification(s) for schedule {}", notifications.len(), schedule_id);
        Ok(notifications)
    }

    pub async fn get_notifications(
        &self,
        schedule_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ScheduleNotification>, PaginationMeta), AppError> {
        self.get_by_id(schedule_id).await?;

        let (notifications, total) = self
            .notifications
            .find_by_schedule(schedule_id, limit, page_offset(page, limit))
            .await?;
        Ok((notifications, PaginationMeta::new(page, limit, total)))
    }

    pub async fn get_pending_notifications(&self, limit: i64) -> Result<Vec<ScheduleNotification>, AppError> {
        self.notifications.find_pending(limit).await
    }

    pub async fn mark_notification_sent(&self, id: Uuid) -> Result<ScheduleNotification, AppError> {
        match self.notifications.mark_sent(id, Utc::now()).await? {
            Some(notification) => Ok(notification),
            None => Err(self.not_pending(id).await),
        }
    }

    pub async fn mark_notification_failed(
        &self,
        id: Uuid,
        error_message: &str,
    ) -> Result<ScheduleNotification, AppError> {
        match self.notifications.mark_failed(id, error_message).await? {
            Some(notification) => {
                warn!("Notification {} failed: {}", id, error_message);
                Ok(notification)
            }
            None => Err(self.not_pending(id).await),
        }
    }

    async fn not_pending(&self, id: Uuid) -> AppError {
        match self.notifications.find_by_id(id).await {
            Ok(Some(notification)) => AppError::Conflict(format!(
                "Notification is already {}",
                notification.status
            )),
            Ok(None) => AppError::NotFound("Notification not found".to_string()),
            Err(e) => e,
        }
    }
}
