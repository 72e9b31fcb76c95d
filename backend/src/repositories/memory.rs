//! Process-local storage implementing every repository trait.
//!
//! All tables live behind one `parking_lot::Mutex`, so each trait method is a
//! single critical section. That gives the conditional fill updates, the
//! overlap re-check and the multi-row deletes the same all-or-nothing
//! behaviour the Postgres implementations get from transactions.

use admission_shared::{
    AddMajorFileRequest, CreateAcademicYearRequest, CreateMajorRequest, NotificationStatus,
    QuotaActionType, UpdateAcademicYearRequest, UpdateMajorRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::academic_year_repository::{AcademicYearRepository, ACADEMIC_YEAR_IN_USE, ACTIVE_YEAR_TAKEN};
use super::major_repository::{MajorRepository, DUPLICATE_MAJOR_CODE, MAJOR_IN_USE};
use super::notification_repository::NotificationRepository;
use super::quota_repository::{fill_log, QuotaRepository, DUPLICATE_QUOTA};
use super::schedule_repository::ScheduleRepository;
use crate::error::AppError;
use crate::models::{
    AcademicYear, Major, MajorFile, MajorQuota, MajorQuotaLog, NewMajorQuota, NewMajorQuotaLog,
    NewSchedule, Schedule, ScheduleChanges, ScheduleNotification,
};

#[derive(Default)]
struct MemoryState {
    academic_years: Vec<AcademicYear>,
    majors: Vec<Major>,
    major_files: Vec<MajorFile>,
    quotas: Vec<MajorQuota>,
    quota_logs: Vec<MajorQuotaLog>,
    schedules: Vec<Schedule>,
    notifications: Vec<ScheduleNotification>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(rows: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let page = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

impl MemoryState {
    fn append_log(&mut self, new: NewMajorQuotaLog) {
        self.quota_logs.push(MajorQuotaLog {
            id: Uuid::new_v4(),
            major_quota_id: new.major_quota_id,
            action_type: new.action_type,
            old_total_quota: new.old_total_quota,
            new_total_quota: new.new_total_quota,
            old_filled_quota: new.old_filled_quota,
            new_filled_quota: new.new_filled_quota,
            notes: new.notes,
            created_by: new.created_by,
            created_at: Utc::now(),
        });
    }

    fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>, exclude_id: Option<Uuid>) -> Vec<Schedule> {
        let mut conflicts: Vec<Schedule> = self
            .schedules
            .iter()
            .filter(|s| s.is_active && Some(s.id) != exclude_id && s.overlaps(start, end))
            .cloned()
            .collect();
        conflicts.sort_by_key(|s| s.start_date);
        conflicts
    }

    /// Applies a fill adjustment to a quota if `allowed` holds, logging it.
    fn adjust_filled(
        &mut self,
        id: Uuid,
        actor: Uuid,
        action: QuotaActionType,
        allowed: impl Fn(&MajorQuota) -> bool,
        apply: impl Fn(i32) -> i32,
    ) -> Option<MajorQuota> {
        let quota = self.quotas.iter_mut().find(|q| q.id == id)?;
        if !allowed(quota) {
            return None;
        }

        let old_filled = quota.filled_quota;
        quota.filled_quota = apply(old_filled);
        quota.remaining_quota = quota.total_quota - quota.filled_quota;
        quota.updated_by = Some(actor);
        quota.updated_at = Utc::now();
        let after = quota.clone();

        self.append_log(fill_log(action, &after, old_filled, actor));
        Some(after)
    }
}

#[async_trait]
impl AcademicYearRepository for MemoryStore {
    async fn create(&self, request: &CreateAcademicYearRequest) -> Result<AcademicYear, AppError> {
        let mut state = self.state.lock();
        if request.is_active && state.academic_years.iter().any(|y| y.is_active) {
            return Err(AppError::Conflict(ACTIVE_YEAR_TAKEN.to_string()));
        }

        let now = Utc::now();
        let year = AcademicYear {
            id: Uuid::new_v4(),
            year_start: request.year_start,
            year_end: request.year_end,
            is_active: request.is_active,
            registration_start: request.registration_start,
            registration_end: request.registration_end,
            description: request.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.academic_years.push(year.clone());
        Ok(year)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<AcademicYear>, i64), AppError> {
        let mut years = self.state.lock().academic_years.clone();
        years.sort_by(|a, b| b.year_start.cmp(&a.year_start));
        Ok(paginate(years, limit, offset))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AcademicYear>, AppError> {
        Ok(self.state.lock().academic_years.iter().find(|y| y.id == id).cloned())
    }

    async fn find_active(&self) -> Result<Option<AcademicYear>, AppError> {
        Ok(self.state.lock().academic_years.iter().find(|y| y.is_active).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        request: &UpdateAcademicYearRequest,
    ) -> Result<Option<AcademicYear>, AppError> {
        let mut state = self.state.lock();
        let Some(year) = state.academic_years.iter_mut().find(|y| y.id == id) else {
            return Ok(None);
        };

        year.year_start = request.year_start;
        year.year_end = request.year_end;
        year.registration_start = request.registration_start;
        year.registration_end = request.registration_end;
        year.description = request.description.clone();
        year.updated_at = Utc::now();
        Ok(Some(year.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        if !state.academic_years.iter().any(|y| y.id == id && !y.is_active) {
            return Ok(false);
        }
        if state.quotas.iter().any(|q| q.academic_year_id == id)
            || state.schedules.iter().any(|s| s.academic_year_id == id)
        {
            return Err(AppError::Conflict(ACADEMIC_YEAR_IN_USE.to_string()));
        }

        let before = state.academic_years.len();
        state.academic_years.retain(|y| !(y.id == id && !y.is_active));
        Ok(state.academic_years.len() < before)
    }

    async fn set_active(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        if !state.academic_years.iter().any(|y| y.id == id) {
            return Ok(false);
        }

        let now = Utc::now();
        for year in state.academic_years.iter_mut() {
            let activate = year.id == id;
            if year.is_active != activate {
                year.is_active = activate;
                year.updated_at = now;
            }
        }
        Ok(true)
    }

    async fn set_inactive(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        let Some(year) = state.academic_years.iter_mut().find(|y| y.id == id) else {
            return Ok(false);
        };
        year.is_active = false;
        year.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl MajorRepository for MemoryStore {
    async fn create(&self, request: &CreateMajorRequest) -> Result<Major, AppError> {
        let mut state = self.state.lock();
        if state.majors.iter().any(|m| m.code == request.code) {
            return Err(AppError::Conflict(DUPLICATE_MAJOR_CODE.to_string()));
        }

        let now = Utc::now();
        let major = Major {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            code: request.code.clone(),
            description: request.description.clone(),
            is_active: request.is_active,
            icon_url: None,
            created_at: now,
            updated_at: now,
        };
        state.majors.push(major.clone());
        Ok(major)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Major>, AppError> {
        Ok(self.state.lock().majors.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Major>, AppError> {
        Ok(self.state.lock().majors.iter().find(|m| m.code == code).cloned())
    }

    async fn search(
        &self,
        keyword: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Major>, i64), AppError> {
        let needle = keyword.map(str::to_lowercase);
        let matches = |m: &Major| match &needle {
            None => true,
            Some(k) => {
                m.name.to_lowercase().contains(k)
                    || m.code.to_lowercase().contains(k)
                    || m.description.as_deref().is_some_and(|d| d.to_lowercase().contains(k))
            }
        };

        let majors: Vec<Major> = self
            .state
            .lock()
            .majors
            .iter()
            .rev()
            .filter(|m| matches(m) && is_active.map_or(true, |active| m.is_active == active))
            .cloned()
            .collect();
        Ok(paginate(majors, limit, offset))
    }

    async fn update(&self, id: Uuid, request: &UpdateMajorRequest) -> Result<Option<Major>, AppError> {
        let mut state = self.state.lock();
        if state.majors.iter().any(|m| m.id != id && m.code == request.code) {
            return Err(AppError::Conflict(DUPLICATE_MAJOR_CODE.to_string()));
        }

        let Some(major) = state.majors.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        major.name = request.name.clone();
        major.code = request.code.clone();
        major.description = request.description.clone();
        major.updated_at = Utc::now();
        Ok(Some(major.clone()))
    }

    async fn delete_with_files(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        if !state.majors.iter().any(|m| m.id == id && !m.is_active) {
            return Ok(false);
        }
        if state.quotas.iter().any(|q| q.major_id == id) {
            return Err(AppError::Conflict(MAJOR_IN_USE.to_string()));
        }

        state.major_files.retain(|f| f.major_id != id);
        state.majors.retain(|m| m.id != id);
        Ok(true)
    }

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        let Some(major) = state.majors.iter_mut().find(|m| m.id == id) else {
            return Ok(false);
        };
        major.is_active = is_active;
        major.updated_at = Utc::now();
        Ok(true)
    }

    async fn add_file(&self, major_id: Uuid, request: &AddMajorFileRequest) -> Result<MajorFile, AppError> {
        let now = Utc::now();
        let file = MajorFile {
            id: Uuid::new_v4(),
            major_id,
            title: request.title.clone(),
            file_type: request.file_type,
            file_path: request.file_path.clone(),
            file_size: request.file_size,
            mime_type: request.mime_type.clone(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().major_files.push(file.clone());
        Ok(file)
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<MajorFile>, AppError> {
        Ok(self.state.lock().major_files.iter().find(|f| f.id == id).cloned())
    }

    async fn find_files(&self, major_id: Uuid) -> Result<Vec<MajorFile>, AppError> {
        Ok(self
            .state
            .lock()
            .major_files
            .iter()
            .filter(|f| f.major_id == major_id)
            .cloned()
            .collect())
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        let before = state.major_files.len();
        state.major_files.retain(|f| f.id != id);
        Ok(state.major_files.len() < before)
    }
}

#[async_trait]
impl QuotaRepository for MemoryStore {
    async fn create(&self, new: NewMajorQuota) -> Result<MajorQuota, AppError> {
        let mut state = self.state.lock();
        let taken = state
            .quotas
            .iter()
            .any(|q| q.major_id == new.major_id && q.academic_year_id == new.academic_year_id);
        if taken {
            return Err(AppError::Conflict(DUPLICATE_QUOTA.to_string()));
        }

        let now = Utc::now();
        let quota = MajorQuota {
            id: Uuid::new_v4(),
            academic_year_id: new.academic_year_id,
            major_id: new.major_id,
            total_quota: new.total_quota,
            filled_quota: 0,
            remaining_quota: new.total_quota,
            notes: new.notes,
            created_by: new.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        state.quotas.push(quota.clone());
        state.append_log(NewMajorQuotaLog::transition(
            QuotaActionType::Create,
            None,
            &quota,
            quota.created_by,
        ));
        Ok(quota)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<MajorQuota>, i64), AppError> {
        let quotas: Vec<MajorQuota> = self.state.lock().quotas.iter().rev().cloned().collect();
        Ok(paginate(quotas, limit, offset))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MajorQuota>, AppError> {
        Ok(self.state.lock().quotas.iter().find(|q| q.id == id).cloned())
    }

    async fn find_by_major_and_year(
        &self,
        major_id: Uuid,
        academic_year_id: Uuid,
    ) -> Result<Option<MajorQuota>, AppError> {
        Ok(self
            .state
            .lock()
            .quotas
            .iter()
            .find(|q| q.major_id == major_id && q.academic_year_id == academic_year_id)
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        total_quota: i32,
        notes: Option<String>,
        actor: Uuid,
    ) -> Result<Option<MajorQuota>, AppError> {
        let mut state = self.state.lock();
        let Some(quota) = state.quotas.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };
        if total_quota < quota.filled_quota {
            return Ok(None);
        }

        let before = quota.clone();
        quota.total_quota = total_quota;
        quota.remaining_quota = total_quota - quota.filled_quota;
        quota.notes = notes;
        quota.updated_by = Some(actor);
        quota.updated_at = Utc::now();
        let after = quota.clone();

        state.append_log(NewMajorQuotaLog::transition(
            QuotaActionType::Update,
            Some(&before),
            &after,
            actor,
        ));
        Ok(Some(after))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        if !state.quotas.iter().any(|q| q.id == id && q.filled_quota == 0) {
            return Ok(false);
        }

        state.quota_logs.retain(|l| l.major_quota_id != id);
        state.quotas.retain(|q| q.id != id);
        Ok(true)
    }

    async fn increase_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        Ok(self.state.lock().adjust_filled(
            id,
            actor,
            QuotaActionType::Increase,
            |q| q.filled_quota < q.total_quota,
            |filled| filled + 1,
        ))
    }

    async fn decrease_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        Ok(self.state.lock().adjust_filled(
            id,
            actor,
            QuotaActionType::Decrease,
            |q| q.filled_quota > 0,
            |filled| filled - 1,
        ))
    }

    async fn reset_filled(&self, id: Uuid, actor: Uuid) -> Result<Option<MajorQuota>, AppError> {
        Ok(self.state.lock().adjust_filled(
            id,
            actor,
            QuotaActionType::Reset,
            |_| true,
            |_| 0,
        ))
    }

    async fn find_logs(
        &self,
        quota_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MajorQuotaLog>, i64), AppError> {
        let logs: Vec<MajorQuotaLog> = self
            .state
            .lock()
            .quota_logs
            .iter()
            .rev()
            .filter(|l| l.major_quota_id == quota_id)
            .cloned()
            .collect();
        Ok(paginate(logs, limit, offset))
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn create(&self, new: NewSchedule) -> Result<Schedule, AppError> {
        let mut state = self.state.lock();
        let conflicts = state.overlapping(new.start_date, new.end_date, None);
        if !conflicts.is_empty() {
            return Err(AppError::Overlap {
                conflicting: conflicts.iter().map(|s| s.id).collect(),
            });
        }

        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            academic_year_id: new.academic_year_id,
            title: new.title,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            schedule_type: new.schedule_type,
            priority: new.priority,
            is_active: true,
            remind_before: new.remind_before,
            location: new.location,
            created_by: new.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        state.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> Result<(Vec<Schedule>, i64), AppError> {
        let mut schedules = self.state.lock().schedules.clone();
        schedules.sort_by_key(|s| s.start_date);
        Ok(paginate(schedules, limit, offset))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError> {
        Ok(self.state.lock().schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_academic_year(
        &self,
        academic_year_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Schedule>, i64), AppError> {
        let mut schedules: Vec<Schedule> = self
            .state
            .lock()
            .schedules
            .iter()
            .filter(|s| s.academic_year_id == academic_year_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.start_date);
        Ok(paginate(schedules, limit, offset))
    }

    async fn find_upcoming(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, AppError> {
        let mut schedules: Vec<Schedule> = self
            .state
            .lock()
            .schedules
            .iter()
            .filter(|s| s.is_active && s.end_date > now)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.start_date);
        schedules.truncate(limit.max(0) as usize);
        Ok(schedules)
    }

    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Schedule>, AppError> {
        Ok(self.state.lock().overlapping(start, end, exclude_id))
    }

    async fn update(&self, id: Uuid, changes: ScheduleChanges) -> Result<Option<Schedule>, AppError> {
        let mut state = self.state.lock();
        let conflicts = state.overlapping(changes.start_date, changes.end_date, Some(id));
        if !conflicts.is_empty() {
            return Err(AppError::Overlap {
                conflicting: conflicts.iter().map(|s| s.id).collect(),
            });
        }

        let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        schedule.title = changes.title;
        schedule.description = changes.description;
        schedule.start_date = changes.start_date;
        schedule.end_date = changes.end_date;
        schedule.schedule_type = changes.schedule_type;
        schedule.priority = changes.priority;
        schedule.remind_before = changes.remind_before;
        schedule.location = changes.location;
        schedule.updated_by = Some(changes.updated_by);
        schedule.updated_at = Utc::now();
        Ok(Some(schedule.clone()))
    }

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<Option<Schedule>, AppError> {
        let mut state = self.state.lock();
        let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        schedule.is_active = is_active;
        schedule.updated_at = Utc::now();
        Ok(Some(schedule.clone()))
    }

    async fn delete_with_notifications(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        if !state.schedules.iter().any(|s| s.id == id) {
            return Ok(false);
        }

        state.notifications.retain(|n| n.schedule_id != id);
        state.schedules.retain(|s| s.id != id);
        Ok(true)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create_batch(
        &self,
        schedule_id: Uuid,
        user_ids: &[Uuid],
        notification_type: &str,
    ) -> Result<Vec<ScheduleNotification>, AppError> {
        let now = Utc::now();
        let batch: Vec<ScheduleNotification> = user_ids
            .iter()
            .map(|user_id| ScheduleNotification {
                id: Uuid::new_v4(),
                schedule_id,
                user_id: *user_id,
                notification_type: notification_type.to_string(),
                status: NotificationStatus::Pending,
                sent_at: None,
                error_message: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.state.lock().notifications.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleNotification>, AppError> {
        Ok(self.state.lock().notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleNotification>, i64), AppError> {
        let notifications: Vec<ScheduleNotification> = self
            .state
            .lock()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.schedule_id == schedule_id)
            .cloned()
            .collect();
        Ok(paginate(notifications, limit, offset))
    }

    async fn find_pending(&self, limit: i64) -> Result<Vec<ScheduleNotification>, AppError> {
        Ok(self
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ScheduleNotification>, AppError> {
        let mut state = self.state.lock();
        let Some(notification) = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.status == NotificationStatus::Pending)
        else {
            return Ok(None);
        };
        notification.status = NotificationStatus::Sent;
        notification.sent_at = Some(sent_at);
        notification.updated_at = Utc::now();
        Ok(Some(notification.clone()))
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
    ) -> Result<Option<ScheduleNotification>, AppError> {
        let mut state = self.state.lock();
        let Some(notification) = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.status == NotificationStatus::Pending)
        else {
            return Ok(None);
        };
        notification.status = NotificationStatus::Failed;
        notification.error_message = Some(error_message.to_string());
        notification.updated_at = Utc::now();
        Ok(Some(notification.clone()))
    }
}
