use super::*;
use admission_shared::{CreateAcademicYearRequest, NotificationStatus};
use chrono::{Duration, TimeZone};
use futures_util::future::join_all;

struct Fixture {
    service: ScheduleService,
    repositories: Repositories,
    year_id: Uuid,
    actor: Uuid,
}

async fn fixture() -> Fixture {
    let repositories = Repositories::in_memory();
    let now = Utc::now();
    let year = repositories
        .academic_years
        .create(&CreateAcademicYearRequest {
            year_start: 2025,
            year_end: 2026,
            registration_start: now - Duration::days(30),
            registration_end: now + Duration::days(30),
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    Fixture {
        service: ScheduleService::new(&repositories),
        repositories,
        year_id: year.id,
        actor: Uuid::new_v4(),
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()
}

impl Fixture {
    fn request(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateScheduleRequest {
        CreateScheduleRequest {
            academic_year_id: self.year_id,
            title: "Entrance test".to_string(),
            description: Some("Written test for all applicants".to_string()),
            start_date: start,
            end_date: end,
            schedule_type: "test".to_string(),
            priority: "high".to_string(),
            location: Some("Main hall".to_string()),
            remind_before: Some(60),
        }
    }

    async fn schedule(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Schedule {
        self.service.create(self.request(start, end), self.actor).await.unwrap()
    }

    async fn future_schedule(&self, offset_days: i64, length_days: i64) -> Schedule {
        let start = Utc::now() + Duration::days(offset_days);
        self.schedule(start, start + Duration::days(length_days)).await
    }
}

fn update_from(schedule: &Schedule, start: DateTime<Utc>, end: DateTime<Utc>) -> UpdateScheduleRequest {
    UpdateScheduleRequest {
        title: schedule.title.clone(),
        description: schedule.description.clone(),
        start_date: start,
        end_date: end,
        schedule_type: schedule.schedule_type.to_string(),
        priority: schedule.priority.to_string(),
        location: schedule.location.clone(),
        remind_before: schedule.remind_before,
    }
}

#[tokio::test]
async fn test_half_open_overlap_example() {
    let f = fixture().await;
    let a = f.schedule(day(1), day(10)).await;

    match f.service.create(f.request(day(5), day(15)), f.actor).await {
        Err(AppError::Overlap { conflicting }) => assert_eq!(conflicting, vec![a.id]),
        other => panic!("expected overlap, got {:?}", other.map(|s| s.id)),
    }

    let c = f.service.create(f.request(day(10), day(20)), f.actor).await.unwrap();
    assert!(c.is_active);
    assert_eq!(c.created_by, f.actor);
}

#[tokio::test]
async fn test_overlap_is_system_wide() {
    let f = fixture().await;
    f.schedule(day(1), day(10)).await;

    // A different academic year still competes for the same window.
    f.repositories.academic_years.set_inactive(f.year_id).await.unwrap();
    let other_year = f
        .repositories
        .academic_years
        .create(&CreateAcademicYearRequest {
            year_start: 2026,
            year_end: 2027,
            registration_start: day(1),
            registration_end: day(20),
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    let mut request = f.request(day(3), day(4));
    request.academic_year_id = other_year.id;
    let result = f.service.create(request, f.actor).await;
    assert!(matches!(result, Err(AppError::Overlap { .. })));
}

#[tokio::test]
async fn test_inactive_schedules_do_not_block() {
    let f = fixture().await;
    let a = f.schedule(day(1), day(10)).await;

    f.service.set_status(a.id, false).await.unwrap();
    f.schedule(day(2), day(5)).await;

    // Reactivation is not re-checked.
    let reactivated = f.service.set_status(a.id, true).await.unwrap();
    assert!(reactivated.is_active);
}

#[tokio::test]
async fn test_invalid_kind_and_window_are_rejected() {
    let f = fixture().await;

    let mut bad_type = f.request(day(1), day(2));
    bad_type.schedule_type = "meeting".to_string();
    assert!(matches!(f.service.create(bad_type, f.actor).await, Err(AppError::Validation(_))));

    let mut bad_priority = f.request(day(1), day(2));
    bad_priority.priority = "urgent".to_string();
    assert!(matches!(f.service.create(bad_priority, f.actor).await, Err(AppError::Validation(_))));

    let reversed = f.request(day(2), day(1));
    assert!(matches!(f.service.create(reversed, f.actor).await, Err(AppError::Validation(_))));

    let mut no_reminder = f.request(day(1), day(2));
    no_reminder.remind_before = Some(0);
    assert!(matches!(f.service.create(no_reminder, f.actor).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_year_must_exist_and_be_active() {
    let f = fixture().await;

    let mut missing = f.request(day(1), day(2));
    missing.academic_year_id = Uuid::new_v4();
    assert!(matches!(f.service.create(missing, f.actor).await, Err(AppError::NotFound(_))));

    f.repositories.academic_years.set_inactive(f.year_id).await.unwrap();
    let result = f.service.create(f.request(day(1), day(2)), f.actor).await;
    assert!(matches!(result, Err(AppError::Inactive(_))));
}

#[tokio::test]
async fn test_update_excludes_itself_from_overlap() {
    let f = fixture().await;
    let a = f.schedule(day(1), day(10)).await;
    let b = f.schedule(day(10), day(20)).await;

    let widened = f
        .service
        .update(a.id, update_from(&a, day(1), day(9)), f.actor)
        .await
        .unwrap();
    assert_eq!(widened.end_date, day(9));
    assert_eq!(widened.updated_by, Some(f.actor));

    match f.service.update(a.id, update_from(&a, day(5), day(12)), f.actor).await {
        Err(AppError::Overlap { conflicting }) => assert_eq!(conflicting, vec![b.id]),
        other => panic!("expected overlap, got {:?}", other.map(|s| s.id)),
    }

    let mut bad = update_from(&a, day(1), day(9));
    bad.schedule_type = "party".to_string();
    assert!(matches!(f.service.update(a.id, bad, f.actor).await, Err(AppError::Validation(_))));

    let missing = f.service.update(Uuid::new_v4(), update_from(&a, day(25), day(26)), f.actor).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_started_schedule_cannot_be_deleted() {
    let f = fixture().await;
    let now = Utc::now();
    let ongoing = f.schedule(now - Duration::hours(1), now + Duration::hours(1)).await;

    assert!(matches!(f.service.delete(ongoing.id).await, Err(AppError::Conflict(_))));
    assert!(f.service.get_by_id(ongoing.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_removes_notifications() {
    let f = fixture().await;
    let schedule = f.future_schedule(3, 1).await;
    let users = vec![Uuid::new_v4(), Uuid::new_v4()];
    f.service.create_notification(schedule.id, &users).await.unwrap();

    f.service.delete(schedule.id).await.unwrap();

    assert!(matches!(f.service.get_by_id(schedule.id).await, Err(AppError::NotFound(_))));
    let (left, total) = f.repositories.notifications.find_by_schedule(schedule.id, 10, 0).await.unwrap();
    assert!(left.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_upcoming_is_active_future_and_sorted() {
    let f = fixture().await;
    let now = Utc::now();
    f.schedule(now - Duration::days(10), now - Duration::days(9)).await;
    let ongoing = f.schedule(now - Duration::hours(2), now + Duration::hours(2)).await;

    for offset in [12, 2, 6, 4, 8, 10] {
        f.future_schedule(offset, 1).await;
    }
    let hidden = f.future_schedule(20, 1).await;
    f.service.set_status(hidden.id, false).await.unwrap();

    let upcoming = f.service.get_upcoming(5).await.unwrap();
    assert_eq!(upcoming.len(), 5);
    assert!(upcoming.iter().all(|s| s.is_active && s.end_date > now));
    assert!(upcoming.windows(2).all(|w| w[0].start_date <= w[1].start_date));
    assert_eq!(upcoming[0].id, ongoing.id);
    assert!(!upcoming.iter().any(|s| s.id == hidden.id));
}

#[tokio::test]
async fn test_notification_batch_and_transitions() {
    let f = fixture().await;
    let schedule = f.future_schedule(5, 1).await;
    let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    let created = f.service.create_notification(schedule.id, &users).await.unwrap();
    assert_eq!(created.len(), 3);
    assert!(created
        .iter()
        .all(|n| n.status == NotificationStatus::Pending && n.notification_type == "email"));

    let missing = f.service.create_notification(Uuid::new_v4(), &users).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let sent = f.service.mark_notification_sent(created[0].id).await.unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
    assert!(sent.sent_at.is_some());

    let failed = f
        .service
        .mark_notification_failed(created[1].id, "mailbox unavailable")
        .await
        .unwrap();
    assert_eq!(failed.status, NotificationStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("mailbox unavailable"));

    // Each notification leaves pending exactly once.
    let again = f.service.mark_notification_failed(created[0].id, "late").await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    let unknown = f.service.mark_notification_sent(Uuid::new_v4()).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let pending = f.service.get_pending_notifications(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, created[2].id);

    let (page, meta) = f.service.get_notifications(schedule.id, 1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!((meta.total_data, meta.total_page), (3, 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_creates_admit_one() {
    let f = fixture().await;

    let handles = (0..16).map(|i| {
        let service = f.service.clone();
        let request = f.request(day(1) + Duration::hours(i), day(3));
        let actor = f.actor;
        tokio::spawn(async move { service.create(request, actor).await })
    });
    let results: Vec<_> = join_all(handles).await.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(AppError::Overlap { .. }))));
}

#[tokio::test]
async fn test_listing_by_year_is_paginated() {
    let f = fixture().await;
    for d in [7, 1, 4] {
        f.schedule(day(d), day(d + 1)).await;
    }

    let (schedules, meta) = f.service.get_by_academic_year(f.year_id, 1, 2).await.unwrap();
    assert_eq!(schedules.iter().map(|s| s.start_date).collect::<Vec<_>>(), vec![day(1), day(4)]);
    assert_eq!((meta.total_data, meta.total_page), (3, 2));

    let (all, _) = f.service.get_all(1, 10).await.unwrap();
    assert_eq!(all.len(), 3);

    let (none, meta) = f.service.get_by_academic_year(Uuid::new_v4(), 1, 10).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(meta.total_page, 0);
}
