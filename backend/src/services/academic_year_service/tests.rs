use super::*;
use admission_shared::{CreateMajorRequest, PriorityLevel, ScheduleType};
use chrono::Duration;

use crate::models::{NewMajorQuota, NewSchedule};

fn service() -> AcademicYearService {
    AcademicYearService::new(&Repositories::in_memory())
}

fn request(year_start: i32, is_active: bool) -> CreateAcademicYearRequest {
    let now = Utc::now();
    CreateAcademicYearRequest {
        year_start,
        year_end: year_start + 1,
        registration_start: now - Duration::days(1),
        registration_end: now + Duration::days(30),
        description: None,
        is_active,
    }
}

#[tokio::test]
async fn test_second_active_year_is_rejected() {
    let service = service();
    service.create(request(2024, true)).await.unwrap();

    let result = service.create(request(2025, true)).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let inactive = service.create(request(2025, false)).await.unwrap();
    assert!(!inactive.is_active);
}

#[tokio::test]
async fn test_year_and_registration_order_are_validated() {
    let service = service();

    let mut bad_years = request(2025, false);
    bad_years.year_end = 2025;
    assert!(matches!(service.create(bad_years).await, Err(AppError::Validation(_))));

    let mut bad_window = request(2025, false);
    bad_window.registration_end = bad_window.registration_start;
    assert!(matches!(service.create(bad_window).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_activation_leaves_exactly_one_active_year() {
    let service = service();
    let first = service.create(request(2024, true)).await.unwrap();
    let second = service.create(request(2025, false)).await.unwrap();

    let activated = service.set_status(second.id, true).await.unwrap();
    assert!(activated.is_active);

    assert!(!service.get_by_id(first.id).await.unwrap().is_active);
    assert_eq!(service.get_active().await.unwrap().id, second.id);

    let (years, _) = service.get_all(1, 10).await.unwrap();
    assert_eq!(years.iter().filter(|y| y.is_active).count(), 1);
}

#[tokio::test]
async fn test_activating_unknown_year_keeps_current_active() {
    let service = service();
    let current = service.create(request(2024, true)).await.unwrap();

    let result = service.set_status(Uuid::new_v4(), true).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(service.get_active().await.unwrap().id, current.id);
}

#[tokio::test]
async fn test_active_year_cannot_be_deleted() {
    let service = service();
    let year = service.create(request(2024, true)).await.unwrap();

    assert!(matches!(service.delete(year.id).await, Err(AppError::Conflict(_))));

    service.set_status(year.id, false).await.unwrap();
    service.delete(year.id).await.unwrap();
    assert!(matches!(service.get_by_id(year.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_get_active_without_active_year() {
    let service = service();
    service.create(request(2024, false)).await.unwrap();
    assert!(matches!(service.get_active().await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_listing_is_newest_first_with_pagination() {
    let service = service();
    for year in [2022, 2024, 2023] {
        service.create(request(year, false)).await.unwrap();
    }

    let (years, meta) = service.get_all(1, 2).await.unwrap();
    assert_eq!(years.iter().map(|y| y.year_start).collect::<Vec<_>>(), vec![2024, 2023]);
    assert_eq!((meta.total_data, meta.total_page), (3, 2));
}

#[tokio::test]
async fn test_year_with_quotas_or_schedules_cannot_be_deleted() {
    let repositories = Repositories::in_memory();
    let service = AcademicYearService::new(&repositories);
    let year = service.create(request(2024, false)).await.unwrap();
    let major = repositories
        .majors
        .create(&CreateMajorRequest {
            name: "Multimedia".to_string(),
            code: "MM".to_string(),
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    let quota = repositories
        .quotas
        .create(NewMajorQuota {
            academic_year_id: year.id,
            major_id: major.id,
            total_quota: 10,
            notes: None,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert!(matches!(service.delete(year.id).await, Err(AppError::Conflict(_))));

    repositories.quotas.delete(quota.id).await.unwrap();
    let start = Utc::now() + Duration::days(5);
    repositories
        .schedules
        .create(NewSchedule {
            academic_year_id: year.id,
            title: "Registration opens".to_string(),
            description: None,
            start_date: start,
            end_date: start + Duration::hours(4),
            schedule_type: ScheduleType::Announcement,
            priority: PriorityLevel::Low,
            remind_before: None,
            location: None,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert!(matches!(service.delete(year.id).await, Err(AppError::Conflict(_))));
    assert!(service.get_by_id(year.id).await.is_ok());
}
