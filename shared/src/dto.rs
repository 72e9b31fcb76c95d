use crate::constants::*;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, pagination: PaginationMeta) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            pagination: Some(pagination),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}

// Pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total_data: i64,
    pub total_page: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total_data: i64) -> Self {
        let total_page = if limit > 0 {
            total_data / limit + i64::from(total_data % limit != 0)
        } else {
            0
        };
        Self {
            page,
            limit,
            total_data,
            total_page,
        }
    }
}

/// Raw `?page=&limit=` query. Values that are missing, non-numeric or below
/// one fall back to the defaults instead of rejecting the request. `limit`
/// is capped at `MAX_PAGE_LIMIT`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PaginationQuery {
    pub fn page(&self) -> i64 {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|v| *v >= 1)
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<String>,
}

impl UpcomingQuery {
    pub fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_UPCOMING_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

// Academic year DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAcademicYearRequest {
    #[validate(range(min = 1900, max = 9999))]
    pub year_start: i32,

    #[validate(range(min = 1900, max = 9999))]
    pub year_end: i32,

    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAcademicYearRequest {
    #[validate(range(min = 1900, max = 9999))]
    pub year_start: i32,

    #[validate(range(min = 1900, max = 9999))]
    pub year_end: i32,

    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

// Major DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMajorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 20))]
    pub code: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateMajorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 20))]
    pub code: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchMajorQuery {
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SearchMajorQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page.clone(),
            limit: self.limit.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddMajorFileRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub file_type: FileType,

    #[validate(length(min = 1, max = 255))]
    pub file_path: String,

    #[validate(range(min = 1))]
    pub file_size: i64,

    #[validate(length(min = 1, max = 100))]
    pub mime_type: String,
}

// Major quota DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMajorQuotaRequest {
    pub academic_year_id: Uuid,
    pub major_id: Uuid,

    #[validate(range(min = 0))]
    pub total_quota: i32,

    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateMajorQuotaRequest {
    #[validate(range(min = 0))]
    pub total_quota: i32,

    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaAvailabilityQuery {
    pub major_id: Uuid,
    pub academic_year_id: Uuid,
}

// Schedule DTOs
//
// `schedule_type` and `priority` stay strings on the wire so an unknown value
// surfaces as a domain validation error rather than a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub academic_year_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    pub schedule_type: String,
    pub priority: String,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(range(min = 1, max = 10080))]
    pub remind_before: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    pub schedule_type: String,
    pub priority: String,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(range(min = 1, max = 10080))]
    pub remind_before: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScheduleNotificationsRequest {
    #[validate(length(min = 1))]
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MarkNotificationFailedRequest {
    #[validate(length(min = 1, max = 2000))]
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_falls_back_on_missing_or_invalid_values() {
        let query = PaginationQuery::default();
        assert_eq!((query.page(), query.limit()), (1, 10));

        let query = PaginationQuery {
            page: Some("abc".to_string()),
            limit: Some("0".to_string()),
        };
        assert_eq!((query.page(), query.limit()), (1, 10));

        let query = PaginationQuery {
            page: Some("3".to_string()),
            limit: Some("25".to_string()),
        };
        assert_eq!((query.page(), query.limit()), (3, 25));
    }

    #[test]
    fn pagination_caps_oversized_values() {
        let query = PaginationQuery {
            page: Some(i64::MAX.to_string()),
            limit: Some(i64::MAX.to_string()),
        };
        assert_eq!(query.page(), i64::MAX);
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);

        let upcoming = UpcomingQuery {
            limit: Some(i64::MAX.to_string()),
        };
        assert_eq!(upcoming.limit(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn total_page_does_not_overflow() {
        assert_eq!(PaginationMeta::new(1, i64::MAX, 1).total_page, 1);
        assert_eq!(PaginationMeta::new(1, i64::MAX, i64::MAX).total_page, 1);
        assert_eq!(PaginationMeta::new(1, 1, i64::MAX).total_page, i64::MAX);
    }

    #[test]
    fn total_page_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 10, 0).total_page, 0);
        assert_eq!(PaginationMeta::new(1, 10, 10).total_page, 1);
        assert_eq!(PaginationMeta::new(1, 10, 11).total_page, 2);
        assert_eq!(PaginationMeta::new(2, 3, 7).total_page, 3);
    }

    #[test]
    fn quota_request_rejects_negative_total() {
        let request = CreateMajorQuotaRequest {
            academic_year_id: Uuid::new_v4(),
            major_id: Uuid::new_v4(),
            total_quota: -1,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn schedule_request_rejects_out_of_range_reminder() {
        let now = Utc::now();
        let mut request = CreateScheduleRequest {
            academic_year_id: Uuid::new_v4(),
            title: "Entrance test".to_string(),
            description: None,
            start_date: now,
            end_date: now + chrono::Duration::hours(2),
            schedule_type: "test".to_string(),
            priority: "high".to_string(),
            location: None,
            remind_before: Some(0),
        };
        assert!(request.validate().is_err());

        request.remind_before = Some(60);
        assert!(request.validate().is_ok());
    }
}
