//! Postgres-backed repository tests. Each test migrates a private schema and
//! drops it afterwards; they are skipped when `DATABASE_URL` is not set.

use super::*;
use admission_shared::{
    CreateAcademicYearRequest, CreateMajorQuotaRequest, CreateMajorRequest, PriorityLevel, ScheduleType,
    UpdateMajorQuotaRequest,
};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::NewSchedule;
use crate::services::QuotaService;

struct TestDb {
    pool: PgPool,
    url: String,
    schema: String,
}

async fn test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let schema = format!("test_{}", Uuid::new_v4().simple());
    let admin = PgPool::connect(&url).await.unwrap();
    admin.execute(format!("CREATE SCHEMA {schema}").as_str()).await.unwrap();
    admin.close().await;

    let search_path = format!("SET search_path TO {schema}");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                conn.execute(search_path.as_str()).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    Some(TestDb { pool, url, schema })
}

impl TestDb {
    fn repositories(&self) -> Repositories {
        Repositories::postgres(self.pool.clone())
    }

    async fn teardown(self) {
        self.pool.close().await;
        let admin = PgPool::connect(&self.url).await.unwrap();
        admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .unwrap();
        admin.close().await;
    }
}

fn year_request(year_start: i32, is_active: bool) -> CreateAcademicYearRequest {
    let now = Utc::now();
    CreateAcademicYearRequest {
        year_start,
        year_end: year_start + 1,
        registration_start: now - Duration::days(1),
        registration_end: now + Duration::days(60),
        description: None,
        is_active,
    }
}

fn major_request(code: &str) -> CreateMajorRequest {
    CreateMajorRequest {
        name: format!("Major {}", code),
        code: code.to_string(),
        description: None,
        is_active: true,
    }
}

fn new_schedule(academic_year_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> NewSchedule {
    NewSchedule {
        academic_year_id,
        title: "Entrance test".to_string(),
        description: None,
        start_date: start,
        end_date: end,
        schedule_type: ScheduleType::Test,
        priority: PriorityLevel::High,
        remind_before: Some(60),
        location: None,
        created_by: Uuid::new_v4(),
    }
}

/// Active year, active major and a quota of `total_quota` seats.
async fn seed_quota(repositories: &Repositories, total_quota: i32) -> (QuotaService, Uuid) {
    let year = repositories.academic_years.create(&year_request(2025, true)).await.unwrap();
    let major = repositories.majors.create(&major_request("TKJ")).await.unwrap();

    let service = QuotaService::new(repositories);
    let quota = service
        .create(
            CreateMajorQuotaRequest {
                academic_year_id: year.id,
                major_id: major.id,
                total_quota,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    (service, quota.id)
}

async fn fill_concurrently(service: &QuotaService, quota_id: Uuid, callers: usize) -> (usize, usize) {
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.increase_filled(quota_id, Uuid::new_v4()).await })
        })
        .collect();

    let mut accepted = 0;
    let mut exhausted = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::QuotaExhausted(_)) => exhausted += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    (accepted, exhausted)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fill_of_single_seat() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let (service, quota_id) = seed_quota(&repositories, 1).await;

    let (accepted, exhausted) = fill_concurrently(&service, quota_id, 16).await;
    assert_eq!(accepted, 1);
    assert_eq!(exhausted, 15);

    let quota = service.get_by_id(quota_id).await.unwrap();
    assert_eq!(quota.filled_quota, 1);
    assert_eq!(quota.remaining_quota, 0);

    let (_, pagination) = service.get_quota_logs(quota_id, 1, 50).await.unwrap();
    assert_eq!(pagination.total_data, 2);

    db.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fill_stops_at_total() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let (service, quota_id) = seed_quota(&repositories, 3).await;

    let (accepted, exhausted) = fill_concurrently(&service, quota_id, 20).await;
    assert_eq!(accepted, 3);
    assert_eq!(exhausted, 17);

    let quota = service.get_by_id(quota_id).await.unwrap();
    assert_eq!(quota.filled_quota, 3);
    assert_eq!(quota.remaining_quota, 0);

    db.teardown().await;
}

#[tokio::test]
async fn test_decrease_at_zero_and_shrink_below_filled_are_rejected() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let (service, quota_id) = seed_quota(&repositories, 5).await;
    let actor = Uuid::new_v4();

    let result = service.decrease_filled(quota_id, actor).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let (_, pagination) = service.get_quota_logs(quota_id, 1, 10).await.unwrap();
    assert_eq!(pagination.total_data, 1);

    service.increase_filled(quota_id, actor).await.unwrap();
    service.increase_filled(quota_id, actor).await.unwrap();

    let shrink = UpdateMajorQuotaRequest {
        total_quota: 1,
        notes: None,
    };
    assert!(matches!(
        service.update(quota_id, shrink, actor).await,
        Err(AppError::Validation(_))
    ));

    let quota = service.get_by_id(quota_id).await.unwrap();
    assert_eq!(quota.total_quota, 5);
    assert_eq!(quota.filled_quota, 2);

    db.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_schedules_admit_one() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let year = repositories.academic_years.create(&year_request(2025, true)).await.unwrap();
    let start = Utc::now() + Duration::days(14);

    let handles: Vec<_> = (0..8i64)
        .map(|i| {
            let schedules = repositories.schedules.clone();
            let new = new_schedule(year.id, start + Duration::hours(i), start + Duration::hours(i + 24));
            tokio::spawn(async move { schedules.create(new).await })
        })
        .collect();

    let mut created = Vec::new();
    let mut rejected = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(schedule) => created.push(schedule.id),
            Err(AppError::Overlap { conflicting }) => {
                assert!(!conflicting.is_empty());
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(created.len(), 1);
    assert_eq!(rejected, 7);

    let (stored, total) = repositories.schedules.find_all(50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(stored[0].id, created[0]);

    db.teardown().await;
}

#[tokio::test]
async fn test_notification_batch_is_all_or_nothing() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let year = repositories.academic_years.create(&year_request(2025, true)).await.unwrap();
    let start = Utc::now() + Duration::days(3);
    let schedule = repositories
        .schedules
        .create(new_schedule(year.id, start, start + Duration::hours(2)))
        .await
        .unwrap();

    let users = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let batch = repositories
        .notifications
        .create_batch(schedule.id, &users, "email")
        .await
        .unwrap();
    assert_eq!(batch.len(), 3);

    let pending = repositories.notifications.find_pending(10).await.unwrap();
    assert_eq!(pending.len(), 3);

    let missing = Uuid::new_v4();
    let result = repositories
        .notifications
        .create_batch(missing, &users, "email")
        .await;
    assert!(result.is_err());

    let (rows, total) = repositories
        .notifications
        .find_by_schedule(missing, 10, 0)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 0);
    assert_eq!(repositories.notifications.find_pending(10).await.unwrap().len(), 3);

    db.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_activation_leaves_one_active_year() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();

    let mut years = Vec::new();
    for year_start in 2021..2025 {
        let year = repositories
            .academic_years
            .create(&year_request(year_start, false))
            .await
            .unwrap();
        years.push(year.id);
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let academic_years = repositories.academic_years.clone();
            let id = years[i % years.len()];
            tokio::spawn(async move { academic_years.set_active(id).await })
        })
        .collect();

    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(activated) => assert!(activated),
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let (stored, _) = repositories.academic_years.find_all(10, 0).await.unwrap();
    assert_eq!(stored.iter().filter(|y| y.is_active).count(), 1);

    db.teardown().await;
}

#[tokio::test]
async fn test_referenced_year_and_major_cannot_be_deleted() {
    let Some(db) = test_db().await else { return };
    let repositories = db.repositories();
    let (service, quota_id) = seed_quota(&repositories, 10).await;
    let quota = service.get_by_id(quota_id).await.unwrap();

    repositories.academic_years.set_inactive(quota.academic_year_id).await.unwrap();
    repositories.majors.set_status(quota.major_id, false).await.unwrap();

    let year_result = repositories.academic_years.delete(quota.academic_year_id).await;
    assert!(matches!(year_result, Err(AppError::Conflict(_))));

    let major_result = repositories.majors.delete_with_files(quota.major_id).await;
    assert!(matches!(major_result, Err(AppError::Conflict(_))));
    assert!(repositories.majors.find_by_id(quota.major_id).await.unwrap().is_some());

    service.delete(quota_id).await.unwrap();
    assert!(repositories.academic_years.delete(quota.academic_year_id).await.unwrap());
    assert!(repositories.majors.delete_with_files(quota.major_id).await.unwrap());

    db.teardown().await;
}
