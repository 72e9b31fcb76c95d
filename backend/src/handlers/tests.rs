use super::*;
use actix_web::dev::Service as _;
use actix_web::{http::header, http::StatusCode, test, App};
use admission_shared::{CreateAcademicYearRequest, CreateMajorRequest};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::repositories::Repositories;
use crate::services::{AcademicYearService, MajorService, QuotaService, ScheduleService};

const TEST_SECRET: &str = "handler-test-secret-with-at-least-32-bytes";

macro_rules! test_app {
    ($repositories:expr, $jwt:expr) => {{
        let repositories: &Repositories = &$repositories;
        let jwt: JwtService = $jwt.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(AcademicYearService::new(repositories)))
                .app_data(web::Data::new(MajorService::new(repositories)))
                .app_data(web::Data::new(QuotaService::new(repositories)))
                .app_data(web::Data::new(ScheduleService::new(repositories)))
                .configure(move |cfg| configure_routes(cfg, jwt)),
        )
        .await
    }};
}

fn bearer(jwt: &JwtService, role: UserRole) -> (header::HeaderName, String) {
    let token = jwt.generate_access_token(Uuid::new_v4(), role).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

async fn seed_year_and_major(repositories: &Repositories) -> (Uuid, Uuid) {
    let now = Utc::now();
    let year = repositories
        .academic_years
        .create(&CreateAcademicYearRequest {
            year_start: 2025,
            year_end: 2026,
            registration_start: now - Duration::days(1),
            registration_end: now + Duration::days(60),
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    let major = repositories
        .majors
        .create(&CreateMajorRequest {
            name: "Software Engineering".to_string(),
            code: "RPL".to_string(),
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    (year.id, major.id)
}

#[actix_web::test]
async fn test_health_check_is_public() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    let app = test_app!(repositories, jwt);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "admission-backend");
}

#[actix_web::test]
async fn test_mutations_require_admin_token() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    let app = test_app!(repositories, jwt);
    let payload = json!({ "name": "Multimedia", "code": "MM", "is_active": true });

    let req = test::TestRequest::post()
        .uri("/api/v1/majors")
        .set_json(&payload)
        .to_request();
    let err = app.call(req).await.unwrap_err();
    assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/majors")
        .insert_header(bearer(&jwt, UserRole::Student))
        .set_json(&payload)
        .to_request();
    let err = app.call(req).await.unwrap_err();
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/majors")
        .insert_header(bearer(&jwt, UserRole::Admin))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["data"]["code"], "MM");
}

#[actix_web::test]
async fn test_invalid_pagination_falls_back_to_defaults() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    seed_year_and_major(&repositories).await;
    let app = test_app!(repositories, jwt);

    let req = test::TestRequest::get()
        .uri("/api/v1/majors?page=abc&limit=0")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["total_data"], 1);
    assert_eq!(body["pagination"]["total_page"], 1);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_quota_fills_until_exhausted() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    let (year_id, major_id) = seed_year_and_major(&repositories).await;
    let app = test_app!(repositories, jwt);

    let req = test::TestRequest::post()
        .uri("/api/v1/quotas")
        .insert_header(bearer(&jwt, UserRole::Admin))
        .set_json(json!({
            "academic_year_id": year_id,
            "major_id": major_id,
            "total_quota": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let quota_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/quotas/{}/increase", quota_id))
        .insert_header(bearer(&jwt, UserRole::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["filled_quota"], 1);
    assert_eq!(body["data"]["remaining_quota"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/quotas/{}/increase", quota_id))
        .insert_header(bearer(&jwt, UserRole::Admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["error"], "quota_exhausted");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/quotas/availability?major_id={}&academic_year_id={}",
            major_id, year_id
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/quotas/{}/logs", quota_id))
        .insert_header(bearer(&jwt, UserRole::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total_data"], 2);
    assert_eq!(body["data"][0]["action_type"], "INCREASE");
    assert_eq!(body["data"][1]["action_type"], "CREATE");
}

#[actix_web::test]
async fn test_unknown_quota_is_not_found() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    let app = test_app!(repositories, jwt);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/quotas/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_overlapping_schedule_reports_conflicts() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    let (year_id, _) = seed_year_and_major(&repositories).await;
    let app = test_app!(repositories, jwt);
    let start = Utc::now() + Duration::days(10);

    let req = test::TestRequest::post()
        .uri("/api/v1/schedules")
        .insert_header(bearer(&jwt, UserRole::Admin))
        .set_json(json!({
            "academic_year_id": year_id,
            "title": "Entrance test",
            "start_date": start,
            "end_date": start + Duration::days(2),
            "schedule_type": "test",
            "priority": "high"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let first_id = body["data"]["id"].clone();

    let req = test::TestRequest::post()
        .uri("/api/v1/schedules")
        .insert_header(bearer(&jwt, UserRole::Admin))
        .set_json(json!({
            "academic_year_id": year_id,
            "title": "Interview",
            "start_date": start + Duration::days(1),
            "end_date": start + Duration::days(3),
            "schedule_type": "interview",
            "priority": "medium"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "schedule_overlap");
    assert_eq!(body["conflicting_schedule_ids"], json!([first_id]));

    let req = test::TestRequest::get().uri("/api/v1/schedules/upcoming").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_oversized_pagination_is_capped() {
    let repositories = Repositories::in_memory();
    let jwt = JwtService::new(TEST_SECRET).unwrap();
    seed_year_and_major(&repositories).await;
    let app = test_app!(repositories, jwt);

    let req = test::TestRequest::get()
        .uri("/api/v1/majors?page=9223372036854775807&limit=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["pagination"]["total_data"], 1);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}
